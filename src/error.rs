// Failure kinds a command handler can end in. Each one is rendered to the
// operator by the UI loop; none of them stop the program.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    /// No response was obtained from the server.
    #[error("failed to contact server, please check your connection and try again")]
    Transport,
    /// The server answered with something other than 200.
    #[error("request failed with status {status}: {message}")]
    Protocol { status: u16, message: String },
    /// A body that should have been JSON was not.
    #[error("could not decode server response: {0}")]
    Decode(String),
    /// A token-gated command was issued without logging in.
    #[error("you must log in first")]
    NotAuthenticated,
    /// The per-user config file could not be written after login.
    #[error("could not save session config: {0}")]
    Persist(#[from] std::io::Error),
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        CommandError::Decode(err.to_string())
    }
}

pub type CommandResult<T> = std::result::Result<T, CommandError>;
