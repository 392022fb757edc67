use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// Time duration with sub-millisecond precision (stored as fractional seconds).
///
/// Negative inputs clamp to zero: every delay in an experience is a
/// single-shot wait forward from some event.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Duration {
    /// Duration in seconds.
    seconds: f64,
}

impl Duration {
    /// Create a duration from seconds.
    pub fn from_seconds(s: f64) -> Self {
        Self {
            seconds: if s.is_finite() { s.max(0.0) } else { 0.0 },
        }
    }

    /// Create a duration from milliseconds.
    pub fn from_millis(ms: f64) -> Self {
        Self::from_seconds(ms / 1000.0)
    }

    /// Create a zero duration.
    pub fn zero() -> Self {
        Self { seconds: 0.0 }
    }

    /// Get duration as seconds.
    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Get duration as milliseconds.
    pub fn as_millis(&self) -> f64 {
        self.seconds * 1000.0
    }

    pub fn is_zero(&self) -> bool {
        self.seconds == 0.0
    }

    /// Convert to a std duration, for driving real timers.
    pub fn to_std(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.seconds)
    }
}

impl Default for Duration {
    fn default() -> Self {
        Duration::zero()
    }
}

impl Add for Duration {
    type Output = Duration;
    fn add(self, rhs: Duration) -> Duration {
        Duration::from_seconds(self.seconds + rhs.seconds)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.seconds < 1.0 {
            write!(f, "{:.0}ms", self.seconds * 1000.0)
        } else {
            write!(f, "{:.2}s", self.seconds)
        }
    }
}

/// A point in time since the interpreter was created.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Timestamp {
    /// Time in seconds from interpreter creation.
    seconds: f64,
}

impl Timestamp {
    /// Create a timestamp from seconds.
    pub fn from_seconds(s: f64) -> Self {
        Self {
            seconds: if s.is_finite() { s.max(0.0) } else { 0.0 },
        }
    }

    /// Create a timestamp from milliseconds.
    pub fn from_millis(ms: u64) -> Self {
        Self::from_seconds(ms as f64 / 1000.0)
    }

    /// Create a timestamp at the start (0.0).
    pub fn zero() -> Self {
        Self { seconds: 0.0 }
    }

    /// Get the time in seconds.
    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Whole milliseconds, rounded to nearest. Used as a totally ordered key.
    pub fn as_millis(&self) -> u64 {
        (self.seconds * 1000.0).round() as u64
    }

}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::zero()
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;
    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp::from_seconds(self.seconds + rhs.as_seconds())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_ms = self.as_millis();
        let minutes = total_ms / 60_000;
        let secs = (total_ms % 60_000) / 1_000;
        let ms = total_ms % 1_000;
        write!(f, "{:02}:{:02}.{:03}", minutes, secs, ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_from_seconds() {
        let d = Duration::from_seconds(2.5);
        assert!((d.as_seconds() - 2.5).abs() < 0.001);
        assert!((d.as_millis() - 2500.0).abs() < 0.1);
    }

    #[test]
    fn test_duration_clamps_negative_and_nan() {
        assert!(Duration::from_seconds(-3.0).is_zero());
        assert!(Duration::from_seconds(f64::NAN).is_zero());
    }

    #[test]
    fn test_duration_arithmetic() {
        let a = Duration::from_seconds(1.0);
        let b = Duration::from_seconds(0.5);
        assert!(((a + b).as_seconds() - 1.5).abs() < 0.001);
        let at = Timestamp::from_seconds(2.0) + a;
        assert_eq!(at.as_millis(), 3000);
    }

    #[test]
    fn test_duration_display() {
        assert_eq!(format!("{}", Duration::from_seconds(2.5)), "2.50s");
        assert_eq!(format!("{}", Duration::from_millis(500.0)), "500ms");
    }

    #[test]
    fn test_timestamp_millis_key() {
        let ts = Timestamp::zero() + Duration::from_millis(10.0);
        assert_eq!(ts.as_millis(), 10);
        assert_eq!(Timestamp::from_millis(7000).as_seconds(), 7.0);
    }

    #[test]
    fn test_timestamp_display() {
        let ts = Timestamp::from_seconds(61.5);
        assert_eq!(format!("{}", ts), "01:01.500");
    }
}
