use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaktError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no package manager detected for distro '{0}'")]
    UnknownDistro(String),

    #[error("distro detection failed: {0}")]
    Detection(String),

    #[error("unsupported action or package manager: {action} via [{managers}]")]
    Unsupported { action: String, managers: String },

    #[error("'{command}' exited with {status}")]
    Execution { command: String, status: String },

    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error at '{path}': {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed tracking store '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serializing tracking store: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PaktError>;
