// Library root
// -----------
// The binary (`main.rs`) is a thin wrapper over these modules so the
// client and the command dispatcher can be tested without a terminal.
//
// Module responsibilities:
// - `api`: the DoodStream HTTP client, one method per endpoint, plus the
//   two-step local upload.
// - `cli`: clap command surface; maps each subcommand to one `api` call
//   and prints the reply.
// - `config`: resolves the API key and base URL.
// - `error`: the `ApiError` type every fallible call returns.
// - `progress`: upload progress reporting.
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod progress;

pub use api::ApiClient;
pub use error::ApiError;
