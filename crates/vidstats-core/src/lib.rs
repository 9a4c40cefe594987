//! vidstats core crate - shared table model, CSV artifacts, configuration and errors.

pub mod artifact;
pub mod config;
pub mod error;
pub mod types;

pub use config::VidstatsConfig;
pub use error::{Result, VidstatsError};
pub use types::{Table, Value};
