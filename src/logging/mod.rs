// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Logging utilities.
//!
//! Corsac emits all diagnostics through the `log` facade; embedding
//! applications that already install a logger can ignore this module.
//! [`init`] wires up `env_logger` for hosts that do not.

use log::{LevelFilter, info};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging with the specified level.
///
/// This function ensures logging is only initialized once.
pub fn init(level: Option<LevelFilter>) {
    INIT.call_once(|| {
        let env = env_logger::Env::default().filter_or(
            "RUST_LOG",
            level.map_or("info", |l| match l {
                LevelFilter::Trace => "trace",
                LevelFilter::Debug => "debug",
                LevelFilter::Info => "info",
                LevelFilter::Warn => "warn",
                LevelFilter::Error => "error",
                LevelFilter::Off => "off",
            }),
        );

        env_logger::Builder::from_env(env)
            .format_timestamp_millis()
            .format_target(true)
            .init();

        info!("Logging initialized at level: {}", log::max_level());
    });
}
