//! Frame selection and its lazy clamping.
//!
//! Raw values are stored exactly as entered. Clamping against the
//! composition length happens on every read so that a change of
//! `duration_in_frames` re-derives the range from the original input.

/// Frame inputs for still and sequence renders.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameSelection {
    /// Frame for still renders, as entered.
    pub unclamped_frame: f64,
    /// First frame of a sequence; `None` means the first frame.
    pub start_raw: Option<f64>,
    /// Last frame of a sequence; `None` means the last frame.
    pub end_raw: Option<f64>,
}

impl FrameSelection {
    pub fn new(unclamped_frame: f64) -> Self {
        Self {
            unclamped_frame,
            start_raw: None,
            end_raw: None,
        }
    }

    /// `clamp(floor(unclamped_frame), 0, duration - 1)`
    pub fn frame(&self, duration_in_frames: u64) -> u64 {
        clamp_frame(self.unclamped_frame, 0, last_frame(duration_in_frames))
    }

    /// `clamp(end_raw, 0, duration - 1)`, defaulting to the last frame.
    ///
    /// The end never drops below frame 1 while the composition has at least
    /// two frames, which leaves room for a start frame before it.
    pub fn end_frame(&self, duration_in_frames: u64) -> u64 {
        let last = last_frame(duration_in_frames);
        match self.end_raw {
            Some(raw) => clamp_frame(raw, last.min(1), last),
            None => last as u64,
        }
    }

    /// `clamp(start_raw, 0, end_frame - 1)`, defaulting to 0.
    ///
    /// With a one-frame composition `end_frame` is 0 and the range is
    /// degenerate; the start then stays at 0.
    pub fn start_frame(&self, duration_in_frames: u64) -> u64 {
        let end = self.end_frame(duration_in_frames) as i64;
        match self.start_raw {
            Some(raw) => clamp_frame(raw, 0, end - 1),
            None => 0,
        }
    }
}

/// Index of the last frame, saturating at `i64::MAX` for absurd durations.
fn last_frame(duration_in_frames: u64) -> i64 {
    i64::try_from(duration_in_frames.saturating_sub(1)).unwrap_or(i64::MAX)
}

/// Floor `raw` and bring it into `[lo, hi]`; an empty range collapses to `lo`.
fn clamp_frame(raw: f64, lo: i64, hi: i64) -> u64 {
    let floored = raw.floor() as i64;
    floored.min(hi).max(lo) as u64
}
