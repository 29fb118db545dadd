// Error taxonomy for command handlers.
// Validation problems get their own variants so `main` can map them to
// distinct exit codes. Anything raised by the login or dispatch layer is
// carried through untouched in `Remote`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Wrong number or shape of arguments.
    #[error("{0}")]
    InvalidCommandLine(String),

    /// A `--headers` entry that is not exactly `NAME:VALUE`.
    #[error("Invalid format for --headers option: '{0}'")]
    InvalidHeaderFormat(String),

    /// The input file could not be read or is not valid JSON.
    #[error("Error accessing the input file: {0}")]
    InvalidFileInput(String),

    /// The input file is valid JSON but lacks required keys.
    #[error("{0}")]
    InvalidFileFormatting(String),

    #[error("Secondary (BIOS) password was rejected: {0}")]
    SecondaryAuthRejected(String),

    #[error("No active session found")]
    NoCurrentSession,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unable to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Header formatting errors are reported as command line errors.
    pub fn is_command_line_error(&self) -> bool {
        matches!(
            self,
            CliError::InvalidCommandLine(_) | CliError::InvalidHeaderFormat(_)
        )
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Remote(_) | CliError::Output(_) => 1,
            CliError::InvalidCommandLine(_) | CliError::InvalidHeaderFormat(_) => 2,
            CliError::InvalidFileInput(_) => 3,
            CliError::InvalidFileFormatting(_) => 4,
            CliError::SecondaryAuthRejected(_) => 5,
            CliError::NoCurrentSession => 6,
            CliError::Configuration(_) => 7,
        }
    }
}
