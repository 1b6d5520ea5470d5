// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Pinhole camera intrinsics and unprojection.
//!
//! The camera model assumes rectified input; no distortion correction is
//! applied.
//!
//! ```text
//! x = (u - cx) * z / fx
//! y = (v - cy) * z / fy
//! ```

use crate::{depth::DepthEncoding, error::Error};
use edgefirst_schemas::sensor_msgs::CameraInfo;
use std::sync::{PoisonError, RwLock};

/// Pinhole calibration parameters in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl Intrinsics {
    /// Create intrinsics, rejecting focal lengths that cannot be inverted.
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Result<Self, Error> {
        let usable = |f: f64| f.is_finite() && f != 0.0;
        if !usable(fx) || !usable(fy) {
            return Err(Error::MalformedInput(format!(
                "invalid focal length fx={} fy={}",
                fx, fy
            )));
        }
        Ok(Self { fx, fy, cx, cy })
    }

    /// Extract intrinsics from a row-major 3x4 projection matrix.
    ///
    /// ```text
    /// P = [fx  0 cx Tx]
    ///     [ 0 fy cy Ty]
    ///     [ 0  0  1  0]
    /// ```
    pub fn from_projection(p: &[f64]) -> Result<Self, Error> {
        if p.len() < 12 {
            return Err(Error::MalformedInput(format!(
                "projection matrix has {} elements, expected 12",
                p.len()
            )));
        }
        Self::new(p[0], p[5], p[2], p[6])
    }

    /// Extract intrinsics from the rectified projection of a `CameraInfo`.
    pub fn from_camera_info(info: &CameraInfo) -> Result<Self, Error> {
        Self::from_projection(&info.p)
    }
}

/// Single-slot holder for the most recent intrinsics.
///
/// One writer (the camera info subscriber) replaces the value, any number of
/// readers take a copy. There is no versioning: the last write wins and a
/// reader may see intrinsics older than the frame it is converting.
#[derive(Debug, Default)]
pub struct IntrinsicsCell {
    slot: RwLock<Option<Intrinsics>>,
}

impl IntrinsicsCell {
    /// Create an unset cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored intrinsics.
    pub fn store(&self, intrinsics: Intrinsics) {
        // Intrinsics is Copy, a poisoned slot still holds a whole value.
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(intrinsics);
    }

    /// Snapshot the stored intrinsics, `None` until the first store.
    pub fn load(&self) -> Option<Intrinsics> {
        *self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_set(&self) -> bool {
        self.load().is_some()
    }
}

/// Per-conversion unprojection constants.
///
/// The encoding's unit scale is folded into the focal scaling so the native
/// sample is multiplied once per axis.
#[derive(Debug, Clone, Copy)]
pub struct Unprojector {
    encoding: DepthEncoding,
    center_x: f32,
    center_y: f32,
    constant_x: f32,
    constant_y: f32,
}

impl Unprojector {
    pub fn new(intrinsics: &Intrinsics, encoding: DepthEncoding) -> Self {
        let unit_scaling = encoding.to_meters(1.0) as f64;
        Self {
            encoding,
            center_x: intrinsics.cx as f32,
            center_y: intrinsics.cy as f32,
            constant_x: (unit_scaling / intrinsics.fx) as f32,
            constant_y: (unit_scaling / intrinsics.fy) as f32,
        }
    }

    /// Unproject pixel (`u`, `v`) with a validated native depth sample.
    #[inline]
    pub fn unproject(&self, u: usize, v: usize, depth: f32) -> [f32; 3] {
        [
            (u as f32 - self.center_x) * depth * self.constant_x,
            (v as f32 - self.center_y) * depth * self.constant_y,
            self.encoding.to_meters(depth),
        ]
    }
}
