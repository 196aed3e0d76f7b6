use thiserror::Error;

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("unable to access dump at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
