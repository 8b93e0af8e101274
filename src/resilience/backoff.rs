//! Fixed backoff with jitter.

use std::time::Duration;
use rand::Rng;

/// `base` plus a random jitter of up to `jitter_ratio` of it.
pub fn jittered(base: Duration, jitter_ratio: f64) -> Duration {
    let base_ms = base.as_millis() as u64;
    let jitter_range = (base_ms as f64 * jitter_ratio.clamp(0.0, 1.0)) as u64;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(base_ms + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_bounds() {
        let base = Duration::from_millis(300);
        for _ in 0..100 {
            let d = jittered(base, 0.1);
            assert!(d >= base);
            assert!(d < Duration::from_millis(330));
        }
    }

    #[test]
    fn test_no_jitter() {
        assert_eq!(jittered(Duration::from_millis(500), 0.0), Duration::from_millis(500));
        assert_eq!(jittered(Duration::ZERO, 0.5), Duration::ZERO);
    }
}
