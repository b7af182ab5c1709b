// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::error::Error;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` when verbose.
/// Calling this twice is harmless.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Render an error followed by its source chain
pub fn error_chain<E>(err: E) -> String
where
    E: Error + Send + Sync + 'static,
{
    format!("{:#}", anyhow::Error::new(err))
}

/// Log an error with every cause
pub fn log_error_chain<E>(err: E)
where
    E: Error + Send + Sync + 'static,
{
    error!("❌ {}", error_chain(err));
}
