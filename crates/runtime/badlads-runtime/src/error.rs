use std::path::PathBuf;
use thiserror::Error;

/// A module that cannot be wired to the host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("export `{name}` has signature {found}, expected {expected}")]
    SignatureMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("required export `{0}` is missing")]
    MissingExport(&'static str),

    #[error("import `{module}::{name}` is not provided by this host")]
    UnknownImport { module: String, name: String },

    #[error("import `{name}` has signature {found}, the host provides {expected}")]
    ImportMismatch {
        name: &'static str,
        expected: String,
        found: String,
    },
}

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to compile plugin: {0}")]
    Compile(String),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("failed to instantiate plugin: {0}")]
    Instantiate(String),

    #[error("`{event}` trapped: {message}")]
    Trap { event: &'static str, message: String },

    /// The new build replaced the old one during a reload, then failed in `onStart`.
    #[error("reloaded plugin failed to start: {0}")]
    ReloadStart(#[source] Box<RuntimeError>),

    #[error("no plugin loaded")]
    NotLoaded,
}
