//! Frame throttling for the analysis path
//!
//! FFT and banding must never compete with the render deadline, so only one
//! delivered buffer out of every `skip_count + 1` is analyzed. The rest pass
//! through untouched.

/// Admits one buffer out of every `skip_count + 1` deliveries
///
/// The first call is always admitted, then `skip_count` calls are skipped,
/// and the pattern repeats.
///
/// # Example
/// ```
/// use audiofft_core::audio::throttle::FrameThrottle;
///
/// let mut throttle = FrameThrottle::new(2);
/// let pattern: Vec<bool> = (0..6).map(|_| throttle.should_analyze()).collect();
/// assert_eq!(pattern, [true, false, false, true, false, false]);
/// ```
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    /// Number of buffers skipped after each admitted one
    skip_count: u32,
    /// Buffers seen since the last admission
    since_admission: u32,
}

impl FrameThrottle {
    /// Create a throttle that skips `skip_count` buffers between admissions
    pub fn new(skip_count: u32) -> Self {
        Self {
            skip_count,
            // Primed so the very first delivery is admitted
            since_admission: skip_count,
        }
    }

    /// Decide whether the buffer being delivered right now gets analyzed
    pub fn should_analyze(&mut self) -> bool {
        if self.since_admission >= self.skip_count {
            self.since_admission = 0;
            true
        } else {
            self.since_admission += 1;
            false
        }
    }

    /// Configured skip count
    pub fn skip_count(&self) -> u32 {
        self.skip_count
    }

    /// Restart the pattern so the next delivery is admitted
    pub fn reset(&mut self) {
        self.since_admission = self.skip_count;
    }
}
