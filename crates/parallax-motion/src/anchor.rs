use crate::stats::{CircularWindow, VectorStats};
use crate::types::OrientationSample;
use glam::Vec2;
use parallax_config::{AxisConvention, MotionConfig};
use std::fmt;

/// Turns raw tilt samples into a bounded steering vector.
///
/// Each tilt axis keeps a circular window of recent samples. Whenever both
/// windows are quiet (variance under the threshold) the home anchor jumps to
/// the window means, so the zero-tilt reference follows however the user is
/// currently holding the device. A second, current anchor chases the home
/// anchor exponentially and is what gets subtracted from the raw reading.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationAnchorTracker {
    config: MotionConfig,
    beta: AxisAnchor,
    gamma: AxisAnchor,
}

#[derive(Debug, Clone, PartialEq)]
struct AxisAnchor {
    window: CircularWindow,
    /// Slow, variance-gated reference.
    home: Option<f64>,
    /// Smoothed copy of `home` that is subtracted from samples.
    current: Option<f64>,
}

impl AxisAnchor {
    fn new(window_size: usize) -> Self {
        Self {
            window: CircularWindow::new(window_size),
            home: None,
            current: None,
        }
    }

    /// Seed the anchors if needed and step `current` toward `home`.
    fn settle(&mut self, sample: f64, inertia: f64) -> f64 {
        let home = *self.home.get_or_insert(sample);
        let current = self.current.get_or_insert(home);
        *current += (home - *current) * inertia;
        *current
    }

    fn clear(&mut self) {
        self.home = None;
        self.current = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorState {
    /// No home anchor yet; the next accepted sample seeds it.
    Uninitialized,
    Tracking,
}

/// Result of one accepted sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerOutput {
    /// Steering vector, each component in `[-1, 1]`.
    pub target: Vec2,
    pub diagnostics: Diagnostics,
}

/// Per-sample observability record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostics {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    /// Tilt relative to the current anchor, in degrees, before clamping.
    pub offset: [f64; 2],
    pub target: Vec2,
    pub beta_stats: VectorStats,
    pub gamma_stats: VectorStats,
    /// Window slot the next sample will be written to.
    pub index: usize,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ɑ={} β={} γ={} x={} y={} target=({}, {}) avgβ={} varβ={} avgγ={} varγ={} index={}",
            Signed(self.alpha),
            Signed(self.beta),
            Signed(self.gamma),
            Signed(self.offset[0]),
            Signed(self.offset[1]),
            Signed(self.target.x as f64),
            Signed(self.target.y as f64),
            Signed(self.beta_stats.mean),
            Signed(self.beta_stats.variance),
            Signed(self.gamma_stats.mean),
            Signed(self.gamma_stats.variance),
            self.index,
        )
    }
}

/// Two decimals with an explicit sign.
struct Signed(f64);

impl fmt::Display for Signed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+.2}", self.0)
    }
}

impl OrientationAnchorTracker {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            beta: AxisAnchor::new(config.window_size),
            gamma: AxisAnchor::new(config.window_size),
            config,
        }
    }

    /// Feed one sample. Returns `None` (and leaves every bit of state
    /// untouched) when any axis is missing.
    pub fn update(&mut self, sample: &OrientationSample) -> Option<TrackerOutput> {
        let (alpha, beta, gamma) = sample.complete()?;

        self.beta.window.push(beta);
        self.gamma.window.push(gamma);

        let beta_stats = self.beta.window.stats();
        let gamma_stats = self.gamma.window.stats();

        // Joint gate: a device still on one axis but shaking on the other
        // re-anchors neither.
        let threshold = self.config.variance_threshold;
        if self.config.drift_correction
            && beta_stats.variance < threshold
            && gamma_stats.variance < threshold
        {
            self.beta.home = Some(beta_stats.mean);
            self.gamma.home = Some(gamma_stats.mean);
        }

        if self.state() == AnchorState::Uninitialized {
            tracing::debug!(beta, gamma, "Home anchor seeded");
        }

        let inertia = self.config.home_inertia;
        let offset = [
            beta - self.beta.settle(beta, inertia),
            gamma - self.gamma.settle(gamma, inertia),
        ];

        let [max_x, max_y] = self.config.max_tilt_degrees;
        let x = offset[0].clamp(-max_x, max_x) / max_x;
        let y = offset[1].clamp(-max_y, max_y) / max_y;
        let target = match self.config.axis_convention {
            AxisConvention::InvertY => Vec2::new(x as f32, -y as f32),
            AxisConvention::InvertX => Vec2::new(-x as f32, y as f32),
        };

        Some(TrackerOutput {
            target,
            diagnostics: Diagnostics {
                alpha,
                beta,
                gamma,
                offset,
                target,
                beta_stats,
                gamma_stats,
                index: self.beta.window.cursor(),
            },
        })
    }

    /// Forget both anchors. Window history is kept, so variance-gated
    /// re-anchoring resumes from it; the next sample reseeds immediately.
    pub fn reset(&mut self) {
        self.beta.clear();
        self.gamma.clear();
        tracing::info!("Orientation anchors reset");
    }

    /// Replace the whole configuration. A different window size starts a
    /// fresh zero-filled window; anchors survive either way.
    pub fn reconfigure(&mut self, config: MotionConfig) {
        if config.window_size != self.config.window_size {
            self.beta.window = CircularWindow::new(config.window_size);
            self.gamma.window = CircularWindow::new(config.window_size);
        }
        tracing::info!(window_size = config.window_size, "Tracker reconfigured");
        self.config = config;
    }

    pub fn state(&self) -> AnchorState {
        if self.beta.home.is_some() && self.gamma.home.is_some() {
            AnchorState::Tracking
        } else {
            AnchorState::Uninitialized
        }
    }

    /// `[beta, gamma]` home anchor.
    pub fn home_anchor(&self) -> Option<[f64; 2]> {
        Some([self.beta.home?, self.gamma.home?])
    }

    /// `[beta, gamma]` smoothed anchor.
    pub fn current_anchor(&self) -> Option<[f64; 2]> {
        Some([self.beta.current?, self.gamma.current?])
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 30;

    fn tracker() -> OrientationAnchorTracker {
        OrientationAnchorTracker::new(MotionConfig {
            window_size: N,
            ..MotionConfig::default()
        })
    }

    fn feed(tracker: &mut OrientationAnchorTracker, beta: f64, gamma: f64, times: usize) -> Vec2 {
        let mut last = Vec2::ZERO;
        for _ in 0..times {
            last = tracker
                .update(&OrientationSample::new(0.0, beta, gamma))
                .unwrap()
                .target;
        }
        last
    }

    #[test]
    fn first_sample_seeds_anchor() {
        let mut t = tracker();
        assert_eq!(t.state(), AnchorState::Uninitialized);

        let target = feed(&mut t, 20.0, -4.0, 1);
        assert_eq!(t.state(), AnchorState::Tracking);
        assert_eq!(t.home_anchor(), Some([20.0, -4.0]));
        assert_eq!(target, Vec2::ZERO);
    }

    #[test]
    fn still_window_re_anchors_to_mean() {
        let mut t = tracker();
        feed(&mut t, 10.0, 5.0, N);
        assert_eq!(t.home_anchor(), Some([10.0, 5.0]));
        assert_eq!(t.current_anchor(), Some([10.0, 5.0]));

        // Until the window is quiet again the anchor stays at (10, 5).
        let max_tilt = MotionConfig::default().max_tilt_degrees[0];
        for _ in 0..N - 1 {
            let target = feed(&mut t, 12.0, 5.0, 1);
            assert!((target.x as f64 - 2.0 / max_tilt).abs() < 1e-6);
            assert!(target.y.abs() < 1e-6);
        }
        assert_eq!(t.home_anchor(), Some([10.0, 5.0]));

        // A full window of 12s is quiet: the reference drifts to the new pose.
        feed(&mut t, 12.0, 5.0, 1);
        assert_eq!(t.home_anchor(), Some([12.0, 5.0]));
    }

    #[test]
    fn gate_is_joint_across_axes() {
        let mut t = tracker();
        feed(&mut t, 10.0, 5.0, N);

        // Beta holds steady, gamma trembles: neither axis re-anchors.
        for i in 0..3 * N {
            let gamma = if i % 2 == 0 { 4.0 } else { 6.0 };
            feed(&mut t, 11.0, gamma, 1);
        }
        assert_eq!(t.home_anchor(), Some([10.0, 5.0]));
    }

    #[test]
    fn current_anchor_chases_home_exponentially() {
        let mut t = tracker();
        feed(&mut t, 0.0, 0.0, N);
        // Quiet window at 3 degrees pulls home to 3 after N samples, then
        // the current anchor closes 5% of the gap per sample.
        feed(&mut t, 3.0, 0.0, N);
        assert_eq!(t.home_anchor(), Some([3.0, 0.0]));
        let before = t.current_anchor().unwrap()[0];
        feed(&mut t, 3.0, 0.0, 1);
        let after = t.current_anchor().unwrap()[0];
        assert!((after - (before + (3.0 - before) * 0.05)).abs() < 1e-9);
        assert!(after < 3.0);
    }

    #[test]
    fn incomplete_sample_leaves_state_untouched() {
        let mut t = tracker();
        feed(&mut t, 7.0, 2.0, 5);
        let before = t.clone();

        let dropped = OrientationSample {
            alpha: Some(0.0),
            beta: Some(9.0),
            gamma: None,
        };
        assert!(t.update(&dropped).is_none());
        assert_eq!(t, before);
    }

    #[test]
    fn output_is_clamped_and_normalized() {
        let mut t = tracker();
        feed(&mut t, 0.0, 0.0, 1);
        let target = feed(&mut t, 90.0, 90.0, 1);
        assert_eq!(target, Vec2::new(1.0, -1.0));

        let target = feed(&mut t, -7.5, -90.0, 1);
        assert!((target.x + 0.5).abs() < 1e-6);
        assert!((target.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn invert_x_convention() {
        let mut t = OrientationAnchorTracker::new(MotionConfig {
            axis_convention: AxisConvention::InvertX,
            max_tilt_degrees: [10.0, 10.0],
            ..MotionConfig::default()
        });
        feed(&mut t, 0.0, 0.0, 1);
        let target = feed(&mut t, 5.0, 5.0, 1);
        assert!((target.x + 0.5).abs() < 1e-6);
        assert!((target.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn fixed_anchor_without_drift_correction() {
        let mut t = OrientationAnchorTracker::new(MotionConfig {
            drift_correction: false,
            ..MotionConfig::default()
        });
        feed(&mut t, 10.0, 5.0, 1);
        feed(&mut t, 12.0, 5.0, 3 * N);
        assert_eq!(t.home_anchor(), Some([10.0, 5.0]));
    }

    #[test]
    fn reset_reseeds_from_next_sample_and_keeps_window() {
        let mut t = tracker();
        feed(&mut t, 10.0, 5.0, 7);
        let window_before = t.beta.window.clone();

        t.reset();
        assert_eq!(t.state(), AnchorState::Uninitialized);
        assert_eq!(t.beta.window, window_before);

        let target = feed(&mut t, 14.0, 1.0, 1);
        assert_eq!(t.home_anchor(), Some([14.0, 1.0]));
        assert_eq!(target, Vec2::ZERO);
        assert_eq!(t.beta.window.cursor(), 8);
    }

    #[test]
    fn reconfigure_with_new_window_size_restarts_window() {
        let mut t = tracker();
        feed(&mut t, 10.0, 5.0, 4);
        t.reconfigure(MotionConfig {
            window_size: 10,
            ..MotionConfig::default()
        });
        assert_eq!(t.beta.window.len(), 10);
        assert_eq!(t.beta.window.cursor(), 0);
        assert_eq!(t.home_anchor(), Some([10.0, 5.0]));
    }

    #[test]
    fn diagnostics_line() {
        let mut t = tracker();
        let output = t.update(&OrientationSample::new(1.0, 2.0, -3.0)).unwrap();
        let line = output.diagnostics.to_string();
        assert!(line.starts_with("ɑ=+1.00 β=+2.00 γ=-3.00"));
        assert!(line.ends_with("index=1"));
    }
}
