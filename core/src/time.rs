use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the number of milliseconds since UNIX EPOCH
#[inline]
pub fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or_default()
}

/// Returns the number of whole seconds since UNIX EPOCH, the unit of header timestamps
#[inline]
pub fn unix_now_secs() -> i64 {
    (unix_now() / 1000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_units_agree() {
        let millis = unix_now();
        let secs = unix_now_secs();
        assert!((secs - (millis / 1000) as i64).abs() <= 1);
        // Later than 2020-01-01
        assert!(secs > 1_577_836_800);
    }
}
