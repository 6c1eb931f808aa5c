use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    /// Text was empty or whitespace only.
    #[error("message text is empty")]
    EmptyMessage,

    #[error("unknown contact: {0}")]
    UnknownContact(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

pub type ChatResult<T> = Result<T, ChatError>;
