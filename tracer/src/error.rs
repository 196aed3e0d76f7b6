use thiserror::Error;

#[derive(Debug, Error)]
pub enum TracerError {
    #[error("unable to launch {path}: {reason}")]
    Launch { path: String, reason: String },

    #[error("no tracee is attached")]
    NoTracee,

    #[error("ptrace operation failed: {0}")]
    Ptrace(#[from] pete::Error),
}
