// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub mod backup;
pub mod balance;
pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod models;
pub mod quick;
pub mod stats;
pub mod store;
pub mod utils;

pub use error::{LedgerError, Result};

static TRACING: Once = Once::new();

/// Installs the global `tracing` subscriber. `RUST_LOG` overrides the
/// default `billbook=info`. Safe to call more than once.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("billbook=info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
