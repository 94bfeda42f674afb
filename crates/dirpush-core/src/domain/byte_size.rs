//! Human-readable byte sizes for status lines
//!
//! Uses SI (base-1000) units: `10 B`, `1.5 kB`, `83 MB`.

const UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

/// Format a byte count into a human-readable string
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 10 {
        return format!("{} B", bytes);
    }

    let mut exp = 0usize;
    let mut scaled = bytes;
    while scaled >= 1000 && exp < UNITS.len() - 1 {
        scaled /= 1000;
        exp += 1;
    }

    let divisor = 1000f64.powi(exp as i32);
    let value = ((bytes as f64 / divisor) * 10.0 + 0.5).floor() / 10.0;

    if value < 10.0 {
        format!("{:.1} {}", value, UNITS[exp])
    } else {
        format!("{:.0} {}", value, UNITS[exp])
    }
}
