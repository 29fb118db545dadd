// Library root
// -----------
// The binary (`main.rs`) is a thin shell around these modules so the
// command logic can be tested without a terminal or a live server.
//
// Module responsibilities:
// - `session`: decides whether a login is needed and with which
//   credentials, then applies that decision to the host application.
// - `rawput`: validates an instruction file and sends it as a PUT.
// - `types`: lists the resource types of the logged in service.
// - `app`: the `RestApp` seam and the real application that owns the
//   current session and its on-disk cache.
// - `api`: blocking HTTP calls against the Redfish service.
// - `ui`: what ends up on stdout/stderr.
// - `cli`, `config`, `error`: command line, configuration file, errors.
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod rawput;
pub mod session;
pub mod types;
pub mod ui;

pub use app::{App, DispatchOutcome, HeaderSet, PutRequest, RestApp};
pub use error::{CliError, CliResult};
