// ABOUTME: Logging configuration and structured logging setup for hosting applications
// ABOUTME: Env-driven level and format selection over tracing-subscriber
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Fitlink Project

//! Logging setup for hosts embedding the crate.
//!
//! The crate itself only emits `tracing` events; initializing a subscriber
//! is the host's decision. [`init_logging`] is a convenience for hosts
//! without their own telemetry stack.

use std::env;
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Failure to install the global subscriber (usually: one is already set)
#[derive(Debug, Error)]
#[error("failed to initialize logging: {0}")]
pub struct LoggingInitError(String);

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for space-constrained environments
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter when `RUST_LOG` is unset (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Build a configuration from `LOG_LEVEL` and `LOG_FORMAT`
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };
        Self { level, format }
    }
}

/// Install a global subscriber per the configuration.
///
/// `RUST_LOG` takes precedence over the configured level when set.
///
/// # Errors
/// Returns [`LoggingInitError`] if a global subscriber is already installed
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Json => registry.with(fmt::layer().with_target(true).json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false))
            .try_init(),
    };

    result.map_err(|e| LoggingInitError(e.to_string()))
}
