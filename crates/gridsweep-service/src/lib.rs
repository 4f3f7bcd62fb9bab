//! gridsweep Service - request pipeline
//!
//! Wires the coverage engine to a store:
//! - Loads configuration (TOML plus environment overrides)
//! - Installs structured logging
//! - Validates, computes and persists each request
//! - Wraps outcomes into a success/failure envelope
//!
//! # Example
//!
//! ```rust,ignore
//! use gridsweep_service::{CoverageService, ServiceConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let service = CoverageService::from_config(&ServiceConfig::new())?;
//! let response = service.respond(&request, &CancellationToken::new()).await;
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod service;

// Re-exports for convenience
pub use config::{ConfigError, LogConfig, RetryConfig, ServiceConfig, StoreConfig, StoreKind};
pub use error::{FailureKind, ServiceError, CONFLICT_EXHAUSTED_MESSAGE};
pub use service::{CoverageService, ServiceResponse};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
