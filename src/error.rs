use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwitchError {
    #[error("credential store not found at {0}")]
    StoreMissing(PathBuf),

    #[error("credential store at {path} is not valid JSON")]
    StoreCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read credential store at {path}")]
    StoreRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write credential store to {path}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode credential store")]
    StoreEncode(#[source] serde_json::Error),

    #[error("failed to write config file {path}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to execute wifi scan: {0}")]
    ScanFailed(String),
}
