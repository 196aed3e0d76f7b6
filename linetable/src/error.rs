use thiserror::Error;

#[derive(Debug, Error)]
pub enum LineTableError {
    #[error("unable to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse object file: {0}")]
    Object(String),

    #[error("unable to initialize DWARF reader: {0}")]
    Dwarf(#[from] gimli::Error),
}
