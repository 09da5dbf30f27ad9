//! Video timeline sampling.
//!
//! The generative model observes the video at a low, fixed sampling rate
//! (0.8 fps by default for UI recordings). This module computes the ordered
//! sequence of sampling instants once, then answers nearest/bracket lookups
//! by binary search over the immutable window array.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A single video sampling instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleWindow {
    /// 0-based ordinal in the sampling sequence
    pub index: usize,
    /// Seconds since video start
    pub timestamp: f64,
}

/// The full, immutable sequence of sample windows for one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleTimeline {
    windows: Vec<SampleWindow>,
    duration: f64,
    fps: f64,
}

impl SampleTimeline {
    /// Compute the timeline for a video of `duration` seconds sampled at
    /// `fps` windows per second.
    ///
    /// Windows sit at `i / fps` for `i = 0, 1, ...` while the instant stays
    /// within the video. A final window at exactly `duration` is appended
    /// when the last computed instant falls short of the video end by more
    /// than half a sample period, so end-of-video context is never lost.
    pub fn build(duration: f64, fps: f64) -> Result<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(Error::InvalidDuration(duration));
        }
        if !fps.is_finite() || fps <= 0.0 {
            return Err(Error::Config(format!("fps must be > 0, got {}", fps)));
        }

        let period = 1.0 / fps;
        let mut windows = Vec::new();
        let mut i = 0usize;
        loop {
            let timestamp = i as f64 / fps;
            if timestamp > duration {
                break;
            }
            windows.push(SampleWindow { index: i, timestamp });
            i += 1;
        }

        // windows is never empty here: 0.0 <= duration always holds
        let last = windows[windows.len() - 1].timestamp;
        if duration - last > period / 2.0 {
            windows.push(SampleWindow {
                index: windows.len(),
                timestamp: duration,
            });
        }

        Ok(Self {
            windows,
            duration,
            fps,
        })
    }

    /// Sampling rate this timeline was built with
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Video duration this timeline was built with
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Seconds between consecutive regular windows
    pub fn period(&self) -> f64 {
        1.0 / self.fps
    }

    /// Number of windows
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// All windows, ordered by timestamp
    pub fn windows(&self) -> &[SampleWindow] {
        &self.windows
    }

    /// Last window of the timeline
    pub fn last(&self) -> SampleWindow {
        self.windows[self.windows.len() - 1]
    }

    /// The window minimizing `|window.timestamp - t|`.
    ///
    /// An exact tie between two neighbors resolves to the earlier window.
    pub fn nearest(&self, t: f64) -> SampleWindow {
        let idx = self.partition_index(t);
        if idx == 0 {
            return self.windows[0];
        }
        if idx == self.windows.len() {
            return self.windows[idx - 1];
        }
        let before = self.windows[idx - 1];
        let after = self.windows[idx];
        // <= keeps the floor tie-break: equal distance picks the earlier one
        if t - before.timestamp <= after.timestamp - t {
            before
        } else {
            after
        }
    }

    /// The windows bracketing `t`: `(at_or_before, strictly_after)`.
    ///
    /// Either side is `None` past the corresponding timeline boundary.
    pub fn bracket(&self, t: f64) -> (Option<SampleWindow>, Option<SampleWindow>) {
        let idx = self.partition_index(t);
        // partition_index returns the count of windows with timestamp <= t
        let before = if idx > 0 {
            Some(self.windows[idx - 1])
        } else {
            None
        };
        let after = self.windows.get(idx).copied();
        (before, after)
    }

    /// Number of windows with `timestamp <= t` (binary search)
    fn partition_index(&self, t: f64) -> usize {
        self.windows.partition_point(|w| w.timestamp <= t)
    }
}
