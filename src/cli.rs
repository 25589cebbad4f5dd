// Command-line surface for `doodstream`: one subcommand per API call.
// Each run resolves the key, performs exactly one operation and prints
// the JSON the service returned.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{ApiClient, RemoteUploadAction};
use crate::config::Config;
use crate::error::ApiError;
use crate::progress::console_bar;

#[derive(Parser, Debug)]
#[command(name = "doodstream", version, about = "DoodStream API client", long_about = None)]
pub struct Cli {
    /// DoodStream API key
    #[arg(long, global = true, env = "DOODSTREAM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// API base URL
    #[arg(long, global = true, env = "DOODSTREAM_API_URL")]
    pub base_url: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Hide the upload progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the server that will receive the next upload
    UploadServer,
    /// Upload a local file
    Upload {
        /// Path to the file to upload
        file_path: PathBuf,
        /// Folder ID to upload to
        #[arg(long)]
        folder_id: Option<String>,
    },
    /// Clone a file
    Clone {
        /// File code to clone
        file_code: String,
        /// Folder ID to clone to
        #[arg(long)]
        folder_id: Option<String>,
    },
    /// Add a remote upload
    RemoteUpload {
        /// URL to upload
        url: String,
        /// Folder ID to upload to
        #[arg(long)]
        folder_id: Option<String>,
        /// New title for the file
        #[arg(long)]
        title: Option<String>,
    },
    /// List remote uploads
    RemoteUploadList,
    /// Check remote upload status
    RemoteUploadStatus {
        /// File code to check status
        file_code: String,
    },
    /// Check remote upload slots
    RemoteUploadSlots,
    /// Perform remote upload actions
    RemoteUploadActions {
        action: ActionArg,
        /// File code for delete action
        #[arg(long)]
        file_code: Option<String>,
    },
    /// Create a new folder
    CreateFolder {
        /// Name of the folder to create
        name: String,
        /// Parent folder ID
        #[arg(long)]
        parent_id: Option<String>,
    },
    /// Rename a folder
    RenameFolder {
        /// ID of the folder to rename
        folder_id: String,
        /// New name for the folder
        name: String,
    },
    /// List folder contents
    ListContents {
        /// Folder ID to list (root when omitted)
        #[arg(long)]
        folder_id: Option<String>,
    },
    /// List files
    ListFiles {
        /// Folder ID to list files from
        #[arg(long)]
        folder_id: Option<String>,
        /// Page number
        #[arg(long)]
        page: Option<u32>,
        /// Results per page
        #[arg(long)]
        per_page: Option<u32>,
        /// Only files uploaded after this time (e.g. "2024-01-31 10:00:00")
        #[arg(long)]
        created: Option<String>,
    },
    /// Check file status
    FileStatus {
        /// File code to check status
        file_code: String,
    },
    /// Get file information
    FileInfo {
        /// File code to get info
        file_code: String,
    },
    /// Get file image information
    FileImage {
        /// File code to get image info
        file_code: String,
    },
    /// Rename a file
    RenameFile {
        /// File code to rename
        file_code: String,
        /// New title for the file
        title: String,
    },
    /// Move a file
    MoveFile {
        /// File code to move
        file_code: String,
        /// Folder ID to move the file to
        folder_id: String,
    },
    /// Search for files
    Search {
        /// Search term
        search_term: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionArg {
    #[value(name = "restart_errors")]
    RestartErrors,
    #[value(name = "clear_errors")]
    ClearErrors,
    #[value(name = "clear_all")]
    ClearAll,
    #[value(name = "delete_code")]
    DeleteCode,
}

impl From<ActionArg> for RemoteUploadAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::RestartErrors => RemoteUploadAction::RestartErrors,
            ActionArg::ClearErrors => RemoteUploadAction::ClearErrors,
            ActionArg::ClearAll => RemoteUploadAction::ClearAll,
            ActionArg::DeleteCode => RemoteUploadAction::DeleteCode,
        }
    }
}

impl Cli {
    /// Resolve settings and perform the selected command, returning the
    /// service's reply. Fails before any request when no key is set.
    pub fn execute(&self) -> Result<Value, ApiError> {
        let config = Config::resolve(self.api_key.as_deref(), self.base_url.as_deref())?;
        let api = ApiClient::new(&config)?;
        self.dispatch(&api)
    }

    /// [`execute`](Self::execute), then print the reply to `out`.
    pub fn run(&self, out: &mut dyn Write) -> anyhow::Result<()> {
        let result = self.execute()?;
        print_json(out, &result)
    }

    fn dispatch(&self, api: &ApiClient) -> Result<Value, ApiError> {
        match &self.command {
            Commands::UploadServer => api.upload_server(),
            Commands::Upload {
                file_path,
                folder_id,
            } => {
                let bar = console_bar(0, self.quiet);
                api.upload_file(file_path, folder_id.as_deref(), Arc::new(bar))
            }
            Commands::Clone {
                file_code,
                folder_id,
            } => api.clone_file(file_code, folder_id.as_deref()),
            Commands::RemoteUpload {
                url,
                folder_id,
                title,
            } => api.remote_upload(url, folder_id.as_deref(), title.as_deref()),
            Commands::RemoteUploadList => api.remote_upload_list(),
            Commands::RemoteUploadStatus { file_code } => api.remote_upload_status(file_code),
            Commands::RemoteUploadSlots => api.remote_upload_slots(),
            Commands::RemoteUploadActions { action, file_code } => {
                api.remote_upload_actions((*action).into(), file_code.as_deref())
            }
            Commands::CreateFolder { name, parent_id } => {
                api.create_folder(name, parent_id.as_deref())
            }
            Commands::RenameFolder { folder_id, name } => api.rename_folder(folder_id, name),
            Commands::ListContents { folder_id } => api.list_folder(folder_id.as_deref()),
            Commands::ListFiles {
                folder_id,
                page,
                per_page,
                created,
            } => api.list_files(*page, *per_page, folder_id.as_deref(), created.as_deref()),
            Commands::FileStatus { file_code } => api.file_status(file_code),
            Commands::FileInfo { file_code } => api.file_info(file_code),
            Commands::FileImage { file_code } => api.file_image(file_code),
            Commands::RenameFile { file_code, title } => api.rename_file(file_code, title),
            Commands::MoveFile {
                file_code,
                folder_id,
            } => api.move_file(file_code, folder_id),
            Commands::Search { search_term } => api.search_files(search_term),
        }
    }
}

/// Pretty-print with serde_json's two-space indent.
pub fn print_json(out: &mut dyn Write, value: &Value) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    writeln!(out, "{rendered}").context("failed to write output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_optional_flags() {
        let cli = Cli::try_parse_from([
            "doodstream",
            "--api-key",
            "k",
            "list-files",
            "--page",
            "2",
            "--folder-id",
            "0",
        ])
        .expect("parse");
        assert_eq!(cli.api_key.as_deref(), Some("k"));
        match cli.command {
            Commands::ListFiles {
                folder_id,
                page,
                per_page,
                created,
            } => {
                assert_eq!(folder_id.as_deref(), Some("0"));
                assert_eq!(page, Some(2));
                assert_eq!(per_page, None);
                assert_eq!(created, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["doodstream", "file-info", "ABC123", "--api-key", "k"])
            .expect("parse");
        assert_eq!(cli.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn rejects_unknown_action() {
        let err = Cli::try_parse_from(["doodstream", "remote-upload-actions", "nuke"]);
        assert!(err.is_err());
    }

    #[test]
    fn action_names_use_underscores() {
        let cli = Cli::try_parse_from(["doodstream", "remote-upload-actions", "delete_code"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Commands::RemoteUploadActions {
                action: ActionArg::DeleteCode,
                file_code: None
            }
        ));
    }

    #[test]
    fn missing_positional_is_a_parse_error() {
        assert!(Cli::try_parse_from(["doodstream", "rename-file", "ABC123"]).is_err());
    }

    #[test]
    fn prints_two_space_indent() {
        let mut out = Vec::new();
        print_json(&mut out, &json!({"status": 200, "result": {"title": "x"}})).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\n  \"status\": 200,\n  \"result\": {\n    \"title\": \"x\"\n  }\n}\n"
        );
    }
}
