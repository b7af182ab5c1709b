// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod logging;
pub mod timer;

pub use logging::{error_chain, init_logging, log_error_chain};
pub use timer::block_timer;
