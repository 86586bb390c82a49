//! # ECAL Common Library
//!
//! Shared code for both emissions pipelines:
//! - Error type (`Error`, `Result`)
//! - TOML configuration loading with CLI/ENV/file priority
//! - Tracing initialisation and build identification banner

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
pub use logging::BuildInfo;
