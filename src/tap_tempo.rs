use log::debug;

/// Number of taps kept when no explicit capacity is configured.
pub const DEFAULT_TAP_HISTORY: usize = 5;

/// Largest window the estimator accepts from configuration.
pub const MAX_TAP_HISTORY: usize = 16;

const MS_PER_MINUTE: u32 = 60_000;

/// Tap-based tempo estimator.
///
/// Keeps the most recent taps in a bounded window and reports the average
/// interval across the whole window, so one sloppy tap only nudges the
/// estimate instead of replacing it.
///
/// Typical usage:
///
/// ```text
/// let mut estimator = TempoEstimator::new(5);
/// if let Some(interval_ms) = estimator.record_tap(now_ms) {
///     println!("Interval: {interval_ms} ms");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TempoEstimator {
    capacity: usize,
    taps: Vec<u32>,
    last_interval: Option<u32>,
}

impl TempoEstimator {
    /// Create a new estimator.
    ///
    /// * `capacity` – number of most recent taps the average is computed over.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity >= 2,
            "at least two taps are required to compute an interval"
        );
        assert!(
            capacity <= MAX_TAP_HISTORY,
            "tap window is limited to {MAX_TAP_HISTORY} taps"
        );

        Self {
            capacity,
            taps: Vec::with_capacity(capacity),
            last_interval: None,
        }
    }

    /// Register a tap at the supplied timestamp (milliseconds).
    ///
    /// Timestamps are expected to be non-decreasing. Once the window is full
    /// the oldest tap is dropped before the new one is appended.
    ///
    /// Returns the rounded average interval over the whole window, or `None`
    /// while fewer than two taps are present.
    pub fn record_tap(&mut self, timestamp_ms: u32) -> Option<u32> {
        if self.taps.len() == self.capacity {
            self.taps.remove(0);
        }
        self.taps.push(timestamp_ms);

        self.last_interval = self.average_interval();
        debug!(
            "tap @ {timestamp_ms} ms, {} in window, interval {:?}",
            self.taps.len(),
            self.last_interval
        );
        self.last_interval
    }

    /// BPM derived from the latest `record_tap` result.
    ///
    /// A zero interval (two taps within the same millisecond) counts as no
    /// estimate.
    pub fn current_bpm(&self) -> Option<u32> {
        self.last_interval.and_then(bpm_from_interval)
    }

    /// Forget every tap of the current session.
    pub fn reset(&mut self) {
        self.taps.clear();
        self.last_interval = None;
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    #[cfg(test)]
    fn history(&self) -> &[u32] {
        &self.taps
    }

    fn average_interval(&self) -> Option<u32> {
        let (&oldest, &newest) = (self.taps.first()?, self.taps.last()?);
        let gaps = self.taps.len() as u64 - 1;
        if gaps == 0 {
            return None;
        }

        // Regressing timestamps are outside the input contract; saturate
        // instead of underflowing.
        let span = u64::from(newest.saturating_sub(oldest));
        let rounded = (span + gaps / 2) / gaps;
        Some(rounded as u32)
    }
}

impl Default for TempoEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_TAP_HISTORY)
    }
}

/// Convert an interval between beats into BPM, truncating like the interval
/// itself. `None` for a zero interval.
pub fn bpm_from_interval(interval_ms: u32) -> Option<u32> {
    MS_PER_MINUTE.checked_div(interval_ms)
}
