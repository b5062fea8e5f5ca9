// src/drivers/view.rs
use ndarray::Array1;

use crate::types::CombinedFrame;

/// Visible window of one panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelRange {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

impl PanelRange {
    /// X spans the axis exactly, Y spans the values padded by one
    /// population standard deviation on each side.
    pub fn fit(xs: &Array1<f64>, ys: &Array1<f64>) -> Self {
        let (x_lo, x_hi) = min_max(xs);
        let (y_lo, y_hi) = min_max(ys);
        let pad = if ys.is_empty() { 0.0 } else { ys.std(0.0) };
        Self {
            x: widen((x_lo, x_hi)),
            y: widen((y_lo - pad, y_hi + pad)),
        }
    }
}

impl Default for PanelRange {
    fn default() -> Self {
        Self {
            x: (0.0, 1.0),
            y: (0.0, 1.0),
        }
    }
}

fn min_max(values: &Array1<f64>) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

// a zero-width axis can't be drawn
fn widen((lo, hi): (f64, f64)) -> (f64, f64) {
    if (hi - lo).abs() < f64::EPSILON {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

/// Display-side state, owned by the sink and updated once per frame.
#[derive(Clone, Debug, Default)]
pub struct ViewState {
    pub waveform: PanelRange,
    pub spectrum: PanelRange,
    pub frames_drawn: u64,
    pub last_sequence: Option<u64>,
    snapshot_taken: bool,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, frame: &CombinedFrame) {
        if let Some(last) = self.last_sequence.filter(|&last| frame.sequence() <= last) {
            log::warn!("frame {} drawn after frame {last}", frame.sequence());
        }
        self.waveform = PanelRange::fit(frame.time(), frame.amplitude());
        self.spectrum = PanelRange::fit(frame.frequency(), frame.magnitude());
        self.frames_drawn += 1;
        self.last_sequence = Some(frame.sequence());
    }

    /// True exactly once per view: the first time a frame has been drawn.
    pub fn claim_snapshot(&mut self) -> bool {
        if self.snapshot_taken || self.frames_drawn == 0 {
            return false;
        }
        self.snapshot_taken = true;
        true
    }

    #[cfg(test)]
    pub fn snapshot_taken(&self) -> bool {
        self.snapshot_taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::fft::SpectrumBuilder;
    use crate::types::SignalSample;
    use ndarray::array;

    fn frame(sequence: u64, amplitude: Array1<f64>) -> CombinedFrame {
        let n = amplitude.len();
        let sample = SignalSample::new(sequence, Array1::linspace(-1.0, 1.0, n), amplitude);
        CombinedFrame::from_signal(sample, &SpectrumBuilder::new())
    }

    #[test]
    fn range_pads_by_one_standard_deviation() {
        let range = PanelRange::fit(&array![0.0, 1.0, 2.0, 3.0], &array![1.0, 3.0, 1.0, 3.0]);
        assert_eq!(range.x, (0.0, 3.0));
        // population std of [1, 3, 1, 3] is 1
        assert_eq!(range.y, (0.0, 4.0));
    }

    #[test]
    fn flat_values_get_a_drawable_range() {
        let range = PanelRange::fit(&array![2.0, 2.0], &array![5.0, 5.0]);
        assert_eq!(range.x, (1.5, 2.5));
        assert_eq!(range.y, (4.5, 5.5));
    }

    #[test]
    fn absorb_tracks_latest_frame() {
        let mut view = ViewState::new();
        view.absorb(&frame(0, array![0.0, 1.0, 0.0, -1.0]));
        view.absorb(&frame(1, array![0.0, 2.0, 0.0, -2.0]));
        assert_eq!(view.frames_drawn, 2);
        assert_eq!(view.last_sequence, Some(1));
        assert!((view.waveform.x.0 + 1.0).abs() < 1e-12);
        assert!((view.waveform.x.1 - 1.0).abs() < 1e-12);
        assert!(view.waveform.y.0 < -2.0 && view.waveform.y.1 > 2.0);
    }

    #[test]
    fn snapshot_is_claimed_once() {
        let mut view = ViewState::new();
        assert!(!view.claim_snapshot());
        view.absorb(&frame(0, array![1.0, 2.0]));
        assert!(view.claim_snapshot());
        for seq in 1..50 {
            view.absorb(&frame(seq, array![1.0, 2.0]));
            assert!(!view.claim_snapshot());
        }
        assert!(view.snapshot_taken());
    }
}
