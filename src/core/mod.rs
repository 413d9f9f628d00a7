//! The core module of the inspection engine.
//!
//! This module contains the fundamental components shared by both engine
//! backends, including:
//! - Configuration management and validation
//! - Error handling
//!
//! It also provides re-exports of commonly used types and functions for convenience.

pub mod config;
pub mod errors;

pub use config::{
    BurrConfig, ConfigError, ConfigValidator, CrackConfig, EngineConfig, EngineKind, FlashConfig,
    HoleShiftConfig, OvalityConfig, RuleConfig, SurfaceConfig,
};
pub use errors::InspectError;

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and formatting layer.
/// It's typically called at the start of an application to enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
