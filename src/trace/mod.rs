// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Append-only diagnostic trace sink.
//!
//! Routing decisions and reload events are recorded as timestamped lines
//! in the file named by `settings.logFile`. The sink is best-effort by
//! contract: every failure is swallowed, because a broken trace file must
//! never disturb request routing.


use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{SecondsFormat, Utc};

/// Append one timestamped line to the trace file.
///
/// A `None` path disables tracing. Errors opening or writing the file are
/// silently dropped.
pub fn record(path: Option<&Path>, message: &str) {
    let Some(path) = path else { return };

    let line = format!(
        "{} {message}\n",
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    );
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = file.write_all(line.as_bytes());
    }
}
