//! Progress windows and the pipeline-wide progress value.

use crate::error::{PipelineError, Result};

/// Clamp a percentage into `[0, 100]`. NaN maps to 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// The `[start, start + width)` slice of total progress allotted to a stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressWindow {
    pub start: f64,
    pub width: f64,
}

impl ProgressWindow {
    pub const fn new(start: f64, width: f64) -> Self {
        Self { start, width }
    }

    pub fn end(&self) -> f64 {
        self.start + self.width
    }

    /// Map stage-local progress (0–100) into this window.
    ///
    /// ```
    /// use reel_pipeline::ProgressWindow;
    ///
    /// let window = ProgressWindow::new(30.0, 10.0);
    /// assert_eq!(window.remap(30.0), 33.0);
    /// assert_eq!(window.remap(250.0), 40.0);
    /// ```
    pub fn remap(&self, local: f64) -> f64 {
        clamp_percent(self.start + clamp_percent(local) * self.width / 100.0)
    }
}

/// Check that windows are in bounds, increasing, and non-overlapping.
pub fn validate_windows<'a, I>(windows: I) -> Result<()>
where
    I: IntoIterator<Item = &'a ProgressWindow>,
{
    let mut previous_end = 0.0;
    let mut total_width = 0.0;
    for window in windows {
        if window.width < 0.0 || window.start < 0.0 || window.end() > 100.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "progress window [{}, {}) is outside 0-100",
                window.start,
                window.end()
            )));
        }
        if window.start < previous_end {
            return Err(PipelineError::InvalidConfig(format!(
                "progress window starting at {} overlaps the previous one ending at {}",
                window.start, previous_end
            )));
        }
        previous_end = window.end();
        total_width += window.width;
    }
    if total_width > 100.0 {
        return Err(PipelineError::InvalidConfig(format!(
            "progress windows add up to {}",
            total_width
        )));
    }
    Ok(())
}

/// Total pipeline progress.
///
/// Values are clamped to 0–100 and never move backwards within a run;
/// only [`reset`](Self::reset) lowers the value.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    current: f64,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Rounded value for display.
    pub fn display(&self) -> u8 {
        self.current.round() as u8
    }

    /// Raise progress to `percent`. Returns the new value if it changed.
    pub fn advance(&mut self, percent: f64) -> Option<f64> {
        let percent = clamp_percent(percent);
        if percent > self.current {
            self.current = percent;
            Some(percent)
        } else {
            None
        }
    }

    pub fn reset(&mut self) -> f64 {
        self.current = 0.0;
        self.current
    }
}
