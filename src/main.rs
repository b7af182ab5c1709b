// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use edge_image_inference::{run, utils::init_logging, version, AppOptions};

#[tokio::main]
async fn main() {
    // Optional .env file in the working directory
    dotenv::dotenv().ok();

    let options = match AppOptions::parse_args(std::env::args_os()) {
        Ok(options) => options,
        Err(code) => std::process::exit(code),
    };

    init_logging(options.verbose);
    tracing::info!("🚀 {}", version::get_version_string());
    tracing::info!("   Features: {}", version::FEATURES.join(", "));

    let code = run(options).await;
    std::process::exit(code);
}
