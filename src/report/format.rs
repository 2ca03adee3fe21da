//! Human-readable numbers for report text.

/// Byte-size suffixes, each 1000 times the previous one
pub const SIZE_SUFFIXES: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Index into [`SIZE_SUFFIXES`] for `bytes`: floor(log1000(bytes)).
///
/// Zero, and any count too large for the table, fall back to plain bytes.
pub fn size_suffix_index(bytes: u128) -> usize {
    let mut index = 0;
    let mut scaled = bytes;
    while scaled >= 1000 {
        scaled /= 1000;
        index += 1;
    }

    if index >= SIZE_SUFFIXES.len() {
        0
    } else {
        index
    }
}

/// Format a byte count with two decimals and a 1000-based suffix, e.g. `1.50 KB`
pub fn format_size(bytes: u128) -> String {
    let index = size_suffix_index(bytes);
    let value = bytes as f64 / 1000f64.powi(index as i32);
    format!("{:.2} {}", value, SIZE_SUFFIXES[index])
}

/// Format an integer with comma thousands separators, e.g. `1,234,567`
pub fn comma_number(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// `part` as a percentage of `total`, or 0 when there is no total
pub fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}
