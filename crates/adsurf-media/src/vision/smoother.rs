//! Savitzky–Golay smoothing of stable-contour corner trajectories.
//!
//! Each of the eight corner coordinates is filtered as an independent 1D
//! signal. Interior samples use the centred window. The first and last
//! `window / 2` samples are evaluated on the polynomial fitted to the first
//! or last full window.

use adsurf_models::{DetectionRecord, Instance, Quad, StableContour, TuningConfig};
use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::error::{MediaError, MediaResult};

/// Least-squares fitting operator for one window.
///
/// Row `j` of `pinv` maps window samples to the coefficient of `t^j`, where
/// `t` is the offset from the window centre.
#[derive(Debug, Clone)]
pub struct SavGolKernel {
    window: usize,
    poly_order: usize,
    pinv: DMatrix<f64>,
}

impl SavGolKernel {
    pub fn new(window: usize, poly_order: usize) -> MediaResult<Self> {
        if window == 0 || window % 2 == 0 {
            return Err(MediaError::invalid_config(format!(
                "window must be a positive odd number, got {}",
                window
            )));
        }
        if poly_order >= window {
            return Err(MediaError::invalid_config(format!(
                "poly_order ({}) must be less than window ({})",
                poly_order, window
            )));
        }

        let half = (window / 2) as f64;
        let vandermonde = DMatrix::from_fn(window, poly_order + 1, |i, j| {
            (i as f64 - half).powi(j as i32)
        });
        let vt = vandermonde.transpose();
        let normal = &vt * &vandermonde;
        let inverse = normal
            .try_inverse()
            .ok_or_else(|| MediaError::degenerate("Savitzky-Golay normal matrix is singular"))?;

        Ok(Self {
            window,
            poly_order,
            pinv: inverse * vt,
        })
    }

    /// Value at window position `pos` of the polynomial fitted to `samples`.
    fn evaluate(&self, samples: &[f64], pos: usize) -> f64 {
        let t = pos as f64 - (self.window / 2) as f64;
        let mut value = 0.0;
        let mut t_pow = 1.0;
        for j in 0..=self.poly_order {
            let coeff: f64 = self
                .pinv
                .row(j)
                .iter()
                .zip(samples)
                .map(|(w, y)| w * y)
                .sum();
            value += coeff * t_pow;
            t_pow *= t;
        }
        value
    }

    /// Filter one signal. Requires `signal.len() >= window`.
    pub fn filter(&self, signal: &[f64]) -> MediaResult<Vec<f64>> {
        let n = signal.len();
        let w = self.window;
        if n < w {
            return Err(MediaError::invalid_config(format!(
                "window ({}) exceeds the number of samples ({})",
                w, n
            )));
        }
        let half = w / 2;

        let out = (0..n)
            .map(|i| {
                let start = if i < half {
                    0
                } else if i + half >= n {
                    n - w
                } else {
                    i - half
                };
                self.evaluate(&signal[start..start + w], i - start)
            })
            .collect();
        Ok(out)
    }
}

#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    kernel: SavGolKernel,
}

impl TemporalSmoother {
    pub fn new(window: usize, poly_order: usize) -> MediaResult<Self> {
        Ok(Self {
            kernel: SavGolKernel::new(window, poly_order)?,
        })
    }

    pub fn from_tuning(cfg: &TuningConfig) -> MediaResult<Self> {
        Self::new(cfg.window, cfg.poly_order)
    }

    /// Smooth one contour, preserving record count and frame indices.
    pub fn smooth_contour(&self, contour: &StableContour) -> MediaResult<StableContour> {
        let n = contour.len();
        let mut channels = vec![Vec::with_capacity(n); 8];
        for rec in &contour.records {
            for (channel, v) in channels.iter_mut().zip(rec.quad.to_flat()) {
                channel.push(v);
            }
        }

        let smoothed = channels
            .iter()
            .map(|c| self.kernel.filter(c))
            .collect::<MediaResult<Vec<_>>>()?;

        let records = contour
            .records
            .iter()
            .enumerate()
            .map(|(i, rec)| {
                let mut flat = [0.0; 8];
                for (k, slot) in flat.iter_mut().enumerate() {
                    *slot = smoothed[k][i];
                }
                DetectionRecord::new(rec.frame_index, Quad::from_flat(flat))
            })
            .collect();

        Ok(StableContour::new(contour.field, records))
    }

    /// Smooth every contour; all are validated against the window first.
    pub fn smooth(&self, contours: &[StableContour]) -> MediaResult<Vec<StableContour>> {
        if let Some(short) = contours.iter().find(|c| c.len() < self.kernel.window) {
            return Err(MediaError::invalid_config(format!(
                "window ({}) exceeds the {} samples of the contour starting at frame {}",
                self.kernel.window,
                short.len(),
                short.field.start_frame
            )));
        }
        contours.par_iter().map(|c| self.smooth_contour(c)).collect()
    }
}

/// The first record of each contour, indexed in discovery order.
pub fn instances(contours: &[StableContour]) -> Vec<Instance> {
    contours
        .iter()
        .enumerate()
        .filter_map(|(index, c)| c.records.first().map(|&record| Instance { index, record }))
        .collect()
}
