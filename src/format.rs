//! Human-readable metric formatting for the before/after report.

/// Format a byte count using base-1024 units with up to two decimal places.
///
/// Trailing zero decimals are dropped: `1536` is `"1.5 KB"`, `1048576` is
/// `"1 MB"`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const K: f64 = 1024.0;
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= K && unit < UNITS.len() - 1 {
        value /= K;
        unit += 1;
    }

    format!("{} {}", trim_trailing_zeros(value), UNITS[unit])
}

/// Percentage size reduction, `(1 - compressed/original) * 100`, rounded to
/// two decimals.
pub fn reduction_percent(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    let pct = (1.0 - compressed as f64 / original as f64) * 100.0;
    (pct * 100.0).round() / 100.0
}

/// Render `value` with two decimals, then drop trailing zero decimals.
fn trim_trailing_zeros(value: f64) -> String {
    let s = format!("{value:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
