//! Shared utility functions

use std::time::Duration;

/// Convert a cooldown in seconds to a `Duration`.
///
/// Negative, NaN and out-of-range values become zero.
///
/// # Example
///
/// ```
/// use key_counter::utils::secs_to_duration;
/// use std::time::Duration;
///
/// assert_eq!(secs_to_duration(2.5), Duration::from_millis(2500));
/// assert_eq!(secs_to_duration(-1.0), Duration::ZERO);
/// ```
pub fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    } else {
        Duration::ZERO
    }
}

/// Format a duration as `MM:SS`, or `H:MM:SS` past one hour
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (hours, mins, secs) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_and_fractional_seconds() {
        assert_eq!(secs_to_duration(0.0), Duration::ZERO);
        assert_eq!(secs_to_duration(2.0), Duration::from_secs(2));
        assert_eq!(secs_to_duration(2.1), Duration::from_secs_f64(2.1));
    }

    #[test]
    fn invalid_seconds_are_zero() {
        assert_eq!(secs_to_duration(-0.5), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::NAN), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::INFINITY), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::MAX), Duration::ZERO);
    }

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "00:00");
        assert_eq!(format_elapsed(Duration::from_secs(75)), "01:15");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "1:02:05");
    }
}
