// API client module: a small blocking HTTP client for the DoodStream REST
// API. Every call is a single GET with query parameters, except the local
// upload which first asks for an upload server and then streams a
// multipart POST to it.

use reqwest::blocking::{multipart, Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::ApiError;
use crate::progress::{ProgressReader, UploadProgress};

/// Holds the reqwest blocking client, the API base URL and the key that is
/// attached to every request.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

/// Bulk operations on the remote upload queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteUploadAction {
    RestartErrors,
    ClearErrors,
    ClearAll,
    DeleteCode,
}

impl RemoteUploadAction {
    /// Query parameter name the service expects for this action.
    pub fn as_param(self) -> &'static str {
        match self {
            RemoteUploadAction::RestartErrors => "restart_errors",
            RemoteUploadAction::ClearErrors => "clear_errors",
            RemoteUploadAction::ClearAll => "clear_all",
            RemoteUploadAction::DeleteCode => "delete_code",
        }
    }
}

/// Shape of the `upload/server` reply. `result` carries the upload URL.
#[derive(Deserialize, Debug)]
struct UploadServer {
    status: Option<i64>,
    msg: Option<String>,
    result: Option<String>,
}

/// Query parameters of one request, in insertion order. The API key is
/// appended by [`ApiClient::get`], never here.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Params(Vec<(&'static str, String)>);

impl Params {
    fn new() -> Self {
        Params::default()
    }

    fn with(mut self, name: &'static str, value: impl ToString) -> Self {
        self.0.push((name, value.to_string()));
        self
    }

    /// Only `None` is left out: an explicit `0` or empty string is sent.
    fn with_opt<T: ToString>(self, name: &'static str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.with(name, v),
            None => self,
        }
    }

    fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(|(k, _)| *k).collect()
    }
}

impl ApiClient {
    /// Build a client from resolved settings. Sends `Accept: application/json`
    /// and a crate user agent on every request.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .user_agent(concat!("doodstream-cli/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;
        Ok(ApiClient {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Issue `GET <base>/<endpoint>?<params>&key=<key>` and decode the body.
    fn get(&self, endpoint: &str, params: Params) -> Result<Value, ApiError> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|source| ApiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                source,
            })?;
        debug!(endpoint, params = ?params.names(), "GET");

        let mut query = params.0;
        query.push(("key", self.api_key.clone()));
        let res = self.client.get(url).query(&query).send()?;
        Self::decode(res)
    }

    /// Turn a response into JSON, failing on any non-2xx status.
    fn decode(res: Response) -> Result<Value, ApiError> {
        let status = res.status();
        if !status.is_success() {
            let body = res.text().unwrap_or_default();
            warn!(%status, "request rejected");
            return Err(ApiError::Status { status, body });
        }
        let bytes = res.bytes()?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Ask the service which server should receive the next upload.
    pub fn upload_server(&self) -> Result<Value, ApiError> {
        self.get("upload/server", Params::new())
    }

    /// Upload a local file. Looks up the upload server first, then streams
    /// the file as multipart form data straight to the URL it returned,
    /// reporting bytes sent to `progress`.
    pub fn upload_file(
        &self,
        file_path: &Path,
        fld_id: Option<&str>,
        progress: Arc<dyn UploadProgress>,
    ) -> Result<Value, ApiError> {
        let upload_url = upload_target(self.upload_server()?)?;

        let io_err = |source| ApiError::Io {
            path: file_path.to_path_buf(),
            source,
        };
        let file = File::open(file_path).map_err(io_err)?;
        let total = file.metadata().map_err(io_err)?.len();
        let file_name = file_path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                ApiError::InvalidInput(format!("{} has no file name", file_path.display()))
            })?
            .to_string();

        let reader = ProgressReader::new(file, total, Arc::clone(&progress));
        let part = multipart::Part::reader_with_length(reader, total)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;
        let mut form = multipart::Form::new()
            .text("api_key", self.api_key.clone())
            .part("file", part);
        if let Some(id) = fld_id {
            form = form.text("fld_id", id.to_string());
        }

        debug!(bytes = total, "POST upload");
        let res = self.client.post(upload_url.as_str()).multipart(form).send();
        progress.finish();
        Self::decode(res?)
    }

    /// Copy someone else's file into this account.
    pub fn clone_file(&self, file_code: &str, fld_id: Option<&str>) -> Result<Value, ApiError> {
        let params = Params::new()
            .with("file_code", file_code)
            .with_opt("fld_id", fld_id);
        self.get("file/clone", params)
    }

    /// Queue a server-side fetch of `url`.
    pub fn remote_upload(
        &self,
        url: &str,
        fld_id: Option<&str>,
        new_title: Option<&str>,
    ) -> Result<Value, ApiError> {
        let params = Params::new()
            .with("url", url)
            .with_opt("fld_id", fld_id)
            .with_opt("new_title", new_title);
        self.get("upload/url", params)
    }

    pub fn remote_upload_list(&self) -> Result<Value, ApiError> {
        self.get("urlupload/list", Params::new())
    }

    pub fn remote_upload_status(&self, file_code: &str) -> Result<Value, ApiError> {
        self.get("urlupload/status", Params::new().with("file_code", file_code))
    }

    pub fn remote_upload_slots(&self) -> Result<Value, ApiError> {
        self.get("urlupload/slots", Params::new())
    }

    /// Run a bulk action on the remote upload queue. `delete_code` needs the
    /// code of the entry to drop; the other actions ignore `file_code`.
    pub fn remote_upload_actions(
        &self,
        action: RemoteUploadAction,
        file_code: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.get("urlupload/actions", action_params(action, file_code)?)
    }

    pub fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<Value, ApiError> {
        let params = Params::new()
            .with("name", name)
            .with_opt("parent_id", parent_id);
        self.get("folder/create", params)
    }

    pub fn rename_folder(&self, fld_id: &str, name: &str) -> Result<Value, ApiError> {
        let params = Params::new().with("fld_id", fld_id).with("name", name);
        self.get("folder/rename", params)
    }

    /// List a folder; `None` lists the root folder `0`.
    pub fn list_folder(&self, fld_id: Option<&str>) -> Result<Value, ApiError> {
        self.get(
            "folder/list",
            Params::new().with("fld_id", fld_id.unwrap_or("0")),
        )
    }

    pub fn list_files(
        &self,
        page: Option<u32>,
        per_page: Option<u32>,
        fld_id: Option<&str>,
        created: Option<&str>,
    ) -> Result<Value, ApiError> {
        let params = Params::new()
            .with_opt("page", page)
            .with_opt("per_page", per_page)
            .with_opt("fld_id", fld_id)
            .with_opt("created", created);
        self.get("file/list", params)
    }

    pub fn file_status(&self, file_code: &str) -> Result<Value, ApiError> {
        self.get("file/check", Params::new().with("file_code", file_code))
    }

    pub fn file_info(&self, file_code: &str) -> Result<Value, ApiError> {
        self.get("file/info", Params::new().with("file_code", file_code))
    }

    pub fn file_image(&self, file_code: &str) -> Result<Value, ApiError> {
        self.get("file/image", Params::new().with("file_code", file_code))
    }

    pub fn rename_file(&self, file_code: &str, title: &str) -> Result<Value, ApiError> {
        let params = Params::new()
            .with("file_code", file_code)
            .with("title", title);
        self.get("file/rename", params)
    }

    pub fn move_file(&self, file_code: &str, fld_id: &str) -> Result<Value, ApiError> {
        let params = Params::new()
            .with("file_code", file_code)
            .with("fld_id", fld_id);
        self.get("file/move", params)
    }

    pub fn search_files(&self, search_term: &str) -> Result<Value, ApiError> {
        self.get(
            "search/videos",
            Params::new().with("search_term", search_term),
        )
    }
}

fn action_params(action: RemoteUploadAction, file_code: Option<&str>) -> Result<Params, ApiError> {
    let params = Params::new().with(action.as_param(), 1);
    if action != RemoteUploadAction::DeleteCode {
        return Ok(params);
    }
    match file_code {
        Some(code) => Ok(params.with("file_code", code)),
        None => Err(ApiError::InvalidInput(
            "delete_code requires --file-code".into(),
        )),
    }
}

/// Pull the upload URL out of an `upload/server` reply. The service
/// reports its own failures inside a 200 response, so the embedded status
/// has to be checked too.
fn upload_target(reply: Value) -> Result<Url, ApiError> {
    let server: UploadServer = serde_json::from_value(reply)?;
    match (server.status, server.result) {
        (Some(200), Some(url)) => Url::parse(&url).map_err(|e| ApiError::Remote {
            status: Some(200),
            msg: format!("upload server returned an invalid URL {url}: {e}"),
        }),
        (status, _) => Err(ApiError::Remote {
            status,
            msg: server
                .msg
                .unwrap_or_else(|| "Failed to get upload server".into()),
        }),
    }
}
