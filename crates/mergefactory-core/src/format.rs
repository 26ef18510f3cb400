//! Display helpers for front-ends.

/// `$1.5K`, `$2.0M`, `$3.4B`, `$1.0T`; whole dollars below a thousand.
pub fn format_currency(amount: f64) -> String {
    const SUFFIXES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];
    for (scale, suffix) in SUFFIXES {
        if amount.abs() >= scale {
            return format!("${:.1}{suffix}", amount / scale);
        }
    }
    format!("${}", amount.floor())
}

/// Production rate per second, one decimal below a thousand.
pub fn format_rate(per_second: f64) -> String {
    if per_second.abs() >= 1e3 {
        return format!("{}/s", format_currency(per_second));
    }
    format!("${per_second:.1}/s")
}

/// `1h 5m`, `3m 20s`, `45s`.
pub fn format_duration(ms: f64) -> String {
    let seconds = (ms.max(0.0) / 1000.0).floor() as u64;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else if minutes > 0 {
        format!("{minutes}m {}s", seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_suffixes() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.9), "$999");
        assert_eq!(format_currency(1_500.0), "$1.5K");
        assert_eq!(format_currency(2_000_000.0), "$2.0M");
        assert_eq!(format_currency(3.4e9), "$3.4B");
        assert_eq!(format_currency(1e12), "$1.0T");
    }

    #[test]
    fn rates() {
        assert_eq!(format_rate(2.5), "$2.5/s");
        assert_eq!(format_rate(12_500.0), "$12.5K/s");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(45_999.0), "45s");
        assert_eq!(format_duration(200_000.0), "3m 20s");
        assert_eq!(format_duration(3_900_000.0), "1h 5m");
        assert_eq!(format_duration(-5.0), "0s");
    }
}
