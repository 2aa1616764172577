//! Error types for the fallible edges of the toy. The simulation itself never fails.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error writing snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("chat is disabled")]
    Disabled,

    #[error("chat transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat provider answered HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("chat provider returned an empty reply")]
    EmptyReply,

    #[error("chat worker went away before replying")]
    WorkerGone,
}
