use std::io;
use std::path::PathBuf;

/// Errors returned while loading the country file or an ADIF log.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid UTF-8: {source}", path.display())]
    Utf8 {
        path: PathBuf,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("country file parse error: {0}")]
    CountryFile(String),

    #[error("ADIF parse error at byte {offset}: {reason}")]
    Adif { offset: usize, reason: String },

    #[error("unknown character encoding {0:?}")]
    UnknownEncoding(String),
}

pub type Result<T> = std::result::Result<T, Error>;
