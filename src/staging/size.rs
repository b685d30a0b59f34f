//! Byte size labels for the pending file list.

/// Format a byte count as a one-decimal `kb` or `mb` label.
///
/// The size is first rounded to the nearest 100 bytes. Up to 1000.0 kb it is
/// shown in kilobytes, above that in megabytes (decimal units, not `/1024`).
///
/// ```
/// use station_media::staging::format_size;
///
/// assert_eq!(format_size(950_000), "950.0 kb");
/// assert_eq!(format_size(1_048_576), "1.0 mb");
/// ```
pub fn format_size(bytes: u64) -> String {
    // Math.round semantics: halves round up
    let hundreds = bytes / 100 + u64::from(bytes % 100 >= 50);

    if hundreds > 10_000 {
        format!("{} mb", tenths(megabyte_tenths(hundreds)))
    } else {
        format!("{} kb", tenths(hundreds))
    }
}

/// Megabytes in tenths, rounded the way `Number.toFixed(1)` rounds `hundreds / 10000`.
fn megabyte_tenths(hundreds: u64) -> u64 {
    let whole = hundreds / 1000;
    let rest = hundreds % 1000;

    match rest.cmp(&500) {
        std::cmp::Ordering::Less => whole,
        std::cmp::Ordering::Greater => whole + 1,
        // The f64 holding hundreds / 10000 sits on, above or below the
        // decimal tie. Exact ties round up. The fused residual has the exact sign.
        std::cmp::Ordering::Equal => {
            let value = hundreds as f64 / 10_000.0;
            if value.mul_add(10_000.0, -(hundreds as f64)) >= 0.0 {
                whole + 1
            } else {
                whole
            }
        }
    }
}

fn tenths(value: u64) -> String {
    format!("{}.{}", value / 10, value % 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kilobyte_tier() {
        assert_eq!(format_size(0), "0.0 kb");
        assert_eq!(format_size(49), "0.0 kb");
        assert_eq!(format_size(50), "0.1 kb");
        assert_eq!(format_size(950_000), "950.0 kb");
        assert_eq!(format_size(123_456), "123.5 kb");
    }

    #[test]
    fn test_threshold_is_strict() {
        // round(1_000_000 / 100) / 10 == 1000, not above the threshold
        assert_eq!(format_size(1_000_000), "1000.0 kb");
        assert_eq!(format_size(1_000_049), "1000.0 kb");
        // round(10000.5) == 10001 -> 1000.1 kb-equivalent -> mb tier
        assert_eq!(format_size(1_000_050), "1.0 mb");
    }

    #[test]
    fn test_megabyte_tier() {
        assert_eq!(format_size(1_048_576), "1.0 mb");
        assert_eq!(format_size(150_000_000), "150.0 mb");
        assert_eq!(format_size(20_000_000), "20.0 mb");
        assert_eq!(format_size(1_960_000), "2.0 mb");
    }

    #[test]
    fn test_megabyte_ties_follow_to_fixed() {
        // 1.25 is exact in binary, toFixed rounds it up
        assert_eq!(format_size(1_250_000), "1.3 mb");
        // 1.05 is stored as 1.0500000000000000444, rounds up
        assert_eq!(format_size(1_050_000), "1.1 mb");
        // 1.15 is stored as 1.1499999999999999112, rounds down
        assert_eq!(format_size(1_150_000), "1.1 mb");
    }
}
