// src/drivers/fft.rs
use ndarray::Array1;
use rustfft::{num_complex::Complex64, FftPlanner};

use crate::types::{SignalSample, SpectrumSample};

/// Helper that computes centered real FFTs of signal samples.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpectrumBuilder;

impl SpectrumBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(&self, sample: &SignalSample) -> SpectrumSample {
        let n = sample.len();
        let mut buffer: Vec<Complex64> = sample
            .amplitude
            .iter()
            .map(|&v| Complex64::new(v, 0.0))
            .collect();
        if n > 0 {
            let mut planner = FftPlanner::<f64>::new();
            let fft = planner.plan_fft_forward(n);
            fft.process(&mut buffer);
        }
        let real: Vec<f64> = buffer.iter().map(|c| c.re).collect();
        SpectrumSample {
            frequency: Array1::from_vec(fftshift(&fft_frequencies(n))),
            magnitude: Array1::from_vec(fftshift(&real)),
        }
    }
}

/// Sample frequencies for an `n`-point transform with unit spacing,
/// in standard (unshifted) order: `0, 1/n, ..., -1/n`.
pub fn fft_frequencies(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let positive = (n - 1) / 2 + 1;
    (0..n)
        .map(|k| {
            let bin = if k < positive {
                k as f64
            } else {
                k as f64 - n as f64
            };
            bin / n as f64
        })
        .collect()
}

/// Moves the zero-frequency bin to index `n / 2`.
pub fn fftshift<T: Clone>(values: &[T]) -> Vec<T> {
    let mut out = values.to_vec();
    let n = out.len();
    out.rotate_right(n / 2);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ifftshift<T: Clone>(values: &[T]) -> Vec<T> {
        let mut out = values.to_vec();
        let n = out.len();
        out.rotate_left(n / 2);
        out
    }

    fn sample_of(values: Vec<f64>) -> SignalSample {
        let n = values.len();
        SignalSample::new(
            0,
            Array1::linspace(0.0, 1.0, n),
            Array1::from_vec(values),
        )
    }

    #[test]
    fn frequencies_match_standard_order() {
        assert_eq!(fft_frequencies(4), vec![0.0, 0.25, -0.5, -0.25]);
        assert_eq!(fft_frequencies(5), vec![0.0, 0.2, 0.4, -0.4, -0.2]);
        assert!(fft_frequencies(0).is_empty());
    }

    #[test]
    fn shift_centers_zero_bin() {
        let shifted = fftshift(&fft_frequencies(256));
        assert_eq!(shifted.len(), 256);
        assert_eq!(shifted[128], 0.0);
        assert_eq!(shifted[0], -0.5);
        assert!(shifted.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn ifftshift_undoes_fftshift() {
        for n in 0..12 {
            let original: Vec<usize> = (0..n).collect();
            assert_eq!(ifftshift(&fftshift(&original)), original, "n = {n}");
        }
    }

    #[test]
    fn double_shift_is_identity_for_even_lengths() {
        for n in (0..20).step_by(2) {
            let original: Vec<usize> = (0..n).collect();
            assert_eq!(fftshift(&fftshift(&original)), original);
        }
    }

    #[test]
    fn constant_signal_lands_on_zero_bin() {
        let spectrum = SpectrumBuilder::new().compute(&sample_of(vec![1.0; 8]));
        assert_eq!(spectrum.magnitude.len(), 8);
        assert!((spectrum.magnitude[4] - 8.0).abs() < 1e-9);
        for (idx, value) in spectrum.magnitude.iter().enumerate() {
            if idx != 4 {
                assert!(value.abs() < 1e-9, "bin {idx} = {value}");
            }
        }
        assert_eq!(spectrum.frequency[4], 0.0);
    }

    #[test]
    fn cosine_keeps_real_energy_at_its_bin() {
        let n = 16;
        let values: Vec<f64> = (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * 2.0 * i as f64 / n as f64).cos())
            .collect();
        let spectrum = SpectrumBuilder::new().compute(&sample_of(values));
        // bins +2 and -2 after shifting sit at 8 + 2 and 8 - 2
        assert!((spectrum.magnitude[10] - 8.0).abs() < 1e-9);
        assert!((spectrum.magnitude[6] - 8.0).abs() < 1e-9);
        assert!((spectrum.frequency[10] - 2.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn empty_sample_yields_empty_spectrum() {
        let spectrum = SpectrumBuilder::new().compute(&sample_of(Vec::new()));
        assert!(spectrum.magnitude.is_empty());
        assert!(spectrum.frequency.is_empty());
    }
}
