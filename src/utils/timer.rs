// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::future::Future;
use std::time::Instant;
use tracing::info;

/// Run a future, logging when it starts and how long it took
///
/// Returns the future's output together with the elapsed milliseconds.
pub async fn block_timer<F, T>(label: &str, fut: F) -> (T, u64)
where
    F: Future<Output = T>,
{
    info!("{}...", label);
    let start = Instant::now();
    let output = fut.await;
    let elapsed_ms = start.elapsed().as_millis() as u64;
    info!("{} done in {} ms", label, elapsed_ms);
    (output, elapsed_ms)
}
