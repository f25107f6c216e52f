//! Surface detection, tracking, smoothing and compositing.
//!
//! Data flows leaf-first: [`SurfaceDetector`] per frame, then
//! [`StabilityTracker`] over the detection log, then
//! [`orientation::normalize_contours`], [`TemporalSmoother`] and finally
//! [`Compositor`] while re-rendering.

pub mod compositor;
pub mod detector;
pub mod geometry;
pub mod orientation;
pub mod smoother;
pub mod tracker;

pub use compositor::Compositor;
pub use detector::{DetectorParams, SurfaceDetector};
pub use orientation::{canonicalize, normalize_contours};
pub use smoother::{instances, SavGolKernel, TemporalSmoother};
pub use tracker::{segment_fields, StabilityTracker, TrackerParams};
