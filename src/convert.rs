// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Depth image to organized point cloud conversion.
//!
//! The input grid is sampled every `decimation` pixels in both directions and
//! each sample becomes one point of the output grid:
//!
//! ```text
//!   depth (w x h)                       cloud (w/d x h/d)
//!   ┌──┬──┬──┬──┐                       ┌──┬──┐
//!   │▪ │  │▪ │  │   (u, v) = (c·d, r·d) │▪ │▪ │
//!   ├──┼──┼──┼──┤  ──────────────────►  ├──┼──┤
//!   │  │  │  │  │                       │▪ │▪ │
//!   ├──┼──┼──┼──┤                       └──┴──┘
//!   │▪ │  │▪ │  │
//!   └──┴──┴──┴──┘
//! ```
//!
//! The conversion is a pure function of its inputs: it performs no logging
//! and no I/O, and allocates only the output cloud.

use crate::{
    cloud::{Point, PointCloud},
    color::{ColorImage, sample_color},
    depth::{DepthImage, SamplePolicy},
    error::Error,
    intrinsics::{Intrinsics, Unprojector},
};

/// Default grid stride, a quarter of the input resolution.
pub const DEFAULT_DECIMATION: usize = 2;

/// Conversion parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvertConfig {
    /// Maximum range in meters, `0.0` for no limit.
    pub range_max: f64,
    /// Emit NaN for missing and out-of-range samples instead of substituting
    /// `range_max`.
    pub use_quiet_nan: bool,
    /// Sampling stride in pixels.
    pub decimation: usize,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            range_max: 0.0,
            use_quiet_nan: false,
            decimation: DEFAULT_DECIMATION,
        }
    }
}

impl ConvertConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.decimation == 0 {
            return Err(Error::Config("decimation must be at least 1".into()));
        }
        if !self.range_max.is_finite() || self.range_max < 0.0 {
            return Err(Error::Config(format!(
                "range_max must be a non-negative distance, got {}",
                self.range_max
            )));
        }
        Ok(())
    }

    /// Output grid (width, height) for an input of `width` x `height`.
    pub fn output_size(&self, width: usize, height: usize) -> (usize, usize) {
        (width / self.decimation, height / self.decimation)
    }
}

/// Convert a depth image into an organized point cloud.
///
/// # Arguments
///
/// * `depth` - Validated depth image view
/// * `intrinsics` - Current camera intrinsics, `None` if not yet received
/// * `color` - Optional color image sampled at the full-resolution pixel
/// * `config` - Range and decimation parameters
///
/// # Returns
/// - `Ok(cloud)` with `height / decimation` rows of `width / decimation` points
/// - `Err(Error::NotReady)` if no intrinsics are available
/// - `Err(Error::Config)` for invalid parameters
pub fn depth_to_cloud(
    depth: &DepthImage,
    intrinsics: Option<&Intrinsics>,
    color: Option<&ColorImage>,
    config: &ConvertConfig,
) -> Result<PointCloud, Error> {
    let intrinsics = intrinsics.ok_or(Error::NotReady)?;
    config.validate()?;

    let (width, height) = config.output_size(depth.width(), depth.height());
    let mut cloud = PointCloud::new(width, height);
    // chunks_exact_mut panics on a zero chunk size
    if width == 0 {
        return Ok(cloud);
    }

    let policy = SamplePolicy::new(depth.encoding(), config.range_max, config.use_quiet_nan);
    let unprojector = Unprojector::new(intrinsics, policy.encoding());
    let step = config.decimation;

    for (row, out) in cloud.points_mut().chunks_exact_mut(width).enumerate() {
        let v = row * step;
        for (col, point) in out.iter_mut().enumerate() {
            let u = col * step;
            *point = match policy.apply(depth.sample(u, v)) {
                Some(native) => Point::new(
                    unprojector.unproject(u, v, native),
                    sample_color(color, u, v),
                ),
                None => Point::INVALID,
            };
        }
    }

    Ok(cloud)
}
