//! Human-readable run output on stdout

use std::io::Write;
use std::time::Duration;

use dirpush_core::ports::{IStatusReporter, StatusLine};

/// Prints one status line per reconciled entry
pub struct StdoutReporter;

impl IStatusReporter for StdoutReporter {
    fn report(&self, line: &StatusLine) {
        let mut out = std::io::stdout().lock();
        // A closed stdout must not abort the run.
        let _ = writeln!(out, "{line}");
    }
}

/// Formats the run duration, e.g. `850ms`, `12.304s`, `3m7.120s`
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis < 1_000 {
        return format!("{millis}ms");
    }
    let minutes = millis / 60_000;
    let seconds = (millis % 60_000) as f64 / 1_000.0;
    if minutes == 0 {
        format!("{seconds:.3}s")
    } else {
        format!("{minutes}m{seconds:.3}s")
    }
}
