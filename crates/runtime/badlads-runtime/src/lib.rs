//! Reference host for BadLads plugins.
//!
//! Loads a plugin module, checks its exports against the event manifest, links the
//! `badlads` host imports to a [`GameHost`], and dispatches game events. The plugin
//! can be swapped at runtime with [`PluginHost::reload`].

pub mod config;
pub mod error;
pub mod guest;
pub mod host;
pub mod linker;
pub mod metrics;
pub mod plugin;
pub mod scan;

pub use config::RuntimeConfig;
pub use error::{RuntimeError, ScanError};
pub use host::{shared, GameHost, JobFlags, NullGame, SharedGame, StoreData};
pub use linker::register_host_functions;
pub use plugin::PluginHost;
pub use scan::{scan_module, HandlerTable, ScanReport};
