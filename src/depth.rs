// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Depth image access and per-sample validity policy.
//!
//! Depth cameras publish either fixed-point millimeters (`16UC1`, `mono16`) or
//! floating-point meters (`32FC1`). The encoding is resolved per frame into a
//! [`DepthEncoding`], which carries the unit conversion for that format. Raw
//! samples are handled as `f32` in the sensor's native unit: every `u16` value
//! is exactly representable, so comparisons against the range threshold are
//! identical to comparing the integers.
//!
//! ```text
//! raw sample ──► valid? ──► range check ──► native value ──► to_meters()
//!                  │             │
//!                  └─► range_max substitution / NaN rejection
//! ```

use crate::error::Error;
use edgefirst_schemas::sensor_msgs::Image;

/// Fixed-point depth resolution.
const MILLIMETERS_PER_METER: f32 = 1000.0;

/// Meters per fixed-point unit, derived from the same constant used by
/// [`DepthEncoding::from_meters`].
const METERS_PER_UNIT: f32 = 1.0 / MILLIMETERS_PER_METER;

/// Numeric representation of a depth image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthEncoding {
    /// Unsigned 16-bit millimeters, zero means no measurement.
    FixedPoint,
    /// 32-bit float meters, non-finite means no measurement.
    FloatingPoint,
}

impl DepthEncoding {
    /// Resolve a ROS image encoding string.
    pub fn from_name(encoding: &str) -> Result<Self, Error> {
        match encoding {
            "16UC1" | "mono16" => Ok(DepthEncoding::FixedPoint),
            "32FC1" => Ok(DepthEncoding::FloatingPoint),
            other => Err(Error::UnsupportedEncoding(other.to_string())),
        }
    }

    /// Size of one sample in bytes.
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            DepthEncoding::FixedPoint => 2,
            DepthEncoding::FloatingPoint => 4,
        }
    }

    /// Returns true if the raw sample is a measurement rather than the
    /// encoding's "no return" sentinel.
    #[inline]
    pub fn valid(self, raw: f32) -> bool {
        match self {
            DepthEncoding::FixedPoint => raw != 0.0,
            DepthEncoding::FloatingPoint => raw.is_finite(),
        }
    }

    /// Convert a native sample to meters.
    #[inline]
    pub fn to_meters(self, raw: f32) -> f32 {
        match self {
            DepthEncoding::FixedPoint => raw * METERS_PER_UNIT,
            DepthEncoding::FloatingPoint => raw,
        }
    }

    /// Convert meters to a native sample.
    ///
    /// Fixed-point values are rounded to the nearest millimeter and saturate
    /// at the `u16` limits.
    #[inline]
    pub fn from_meters(self, meters: f64) -> f32 {
        match self {
            DepthEncoding::FixedPoint => {
                ((meters as f32) * MILLIMETERS_PER_METER + 0.5) as u16 as f32
            }
            DepthEncoding::FloatingPoint => meters as f32,
        }
    }
}

/// Validity and range rules for one conversion.
///
/// The native-unit threshold for `range_max` is computed once at
/// construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePolicy {
    encoding: DepthEncoding,
    max: Option<f32>,
    use_quiet_nan: bool,
}

impl SamplePolicy {
    /// Create a policy for `encoding`.
    ///
    /// # Arguments
    ///
    /// * `range_max` - Maximum range in meters, `0.0` disables the limit
    /// * `use_quiet_nan` - Reject out-of-range and missing samples instead of
    ///   substituting `range_max`
    pub fn new(encoding: DepthEncoding, range_max: f64, use_quiet_nan: bool) -> Self {
        let max = (range_max != 0.0).then(|| encoding.from_meters(range_max));
        Self {
            encoding,
            max,
            use_quiet_nan,
        }
    }

    pub fn encoding(&self) -> DepthEncoding {
        self.encoding
    }

    /// Apply the policy to a raw sample.
    ///
    /// # Returns
    /// - `Some(native)` with the (possibly substituted or clamped) native value
    /// - `None` if the point must be emitted as NaN
    #[inline]
    pub fn apply(&self, raw: f32) -> Option<f32> {
        match self.max {
            None if self.encoding.valid(raw) => Some(raw),
            None => None,
            Some(max) if !self.encoding.valid(raw) => (!self.use_quiet_nan).then_some(max),
            Some(max) if raw > max => (!self.use_quiet_nan).then_some(max),
            Some(_) => Some(raw),
        }
    }
}

/// Borrowed view of a depth image with validated extents.
///
/// Construction checks that every sample addressed by `width`, `height` and
/// `step` lies inside `data`, so [`DepthImage::sample`] never goes out of
/// bounds.
#[derive(Debug, Clone, Copy)]
pub struct DepthImage<'a> {
    width: usize,
    height: usize,
    step: usize,
    encoding: DepthEncoding,
    big_endian: bool,
    data: &'a [u8],
}

impl<'a> DepthImage<'a> {
    /// Create a view over raw depth samples.
    ///
    /// # Arguments
    ///
    /// * `width`, `height` - Image dimensions in pixels
    /// * `step` - Row stride in bytes
    /// * `encoding` - Sample representation
    /// * `big_endian` - Byte order of the samples
    /// * `data` - Raw sample storage
    pub fn new(
        width: usize,
        height: usize,
        step: usize,
        encoding: DepthEncoding,
        big_endian: bool,
        data: &'a [u8],
    ) -> Result<Self, Error> {
        let row_bytes = width
            .checked_mul(encoding.bytes_per_sample())
            .ok_or_else(|| Error::MalformedInput(format!("width {} overflows", width)))?;
        if height > 0 && step < row_bytes {
            return Err(Error::MalformedInput(format!(
                "step {} shorter than row of {} bytes",
                step, row_bytes
            )));
        }
        let required = step
            .checked_mul(height)
            .ok_or_else(|| Error::MalformedInput(format!("height {} overflows", height)))?;
        if data.len() < required {
            return Err(Error::MalformedInput(format!(
                "depth buffer has {} bytes, expected {}",
                data.len(),
                required
            )));
        }

        Ok(Self {
            width,
            height,
            step,
            encoding,
            big_endian,
            data,
        })
    }

    /// Create a view over a `sensor_msgs/Image` depth message.
    pub fn from_msg(msg: &'a Image) -> Result<Self, Error> {
        let encoding = DepthEncoding::from_name(&msg.encoding)?;
        Self::new(
            msg.width as usize,
            msg.height as usize,
            msg.step as usize,
            encoding,
            msg.is_bigendian != 0,
            &msg.data,
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn encoding(&self) -> DepthEncoding {
        self.encoding
    }

    /// Read the raw sample at column `u`, row `v` in native units.
    ///
    /// # Panics
    ///
    /// Panics if `u >= width` or `v >= height`.
    #[inline]
    pub fn sample(&self, u: usize, v: usize) -> f32 {
        assert!(u < self.width && v < self.height);
        let offset = v * self.step + u * self.encoding.bytes_per_sample();
        let d = &self.data[offset..];
        match (self.encoding, self.big_endian) {
            (DepthEncoding::FixedPoint, false) => u16::from_le_bytes([d[0], d[1]]) as f32,
            (DepthEncoding::FixedPoint, true) => u16::from_be_bytes([d[0], d[1]]) as f32,
            (DepthEncoding::FloatingPoint, false) => f32::from_le_bytes([d[0], d[1], d[2], d[3]]),
            (DepthEncoding::FloatingPoint, true) => f32::from_be_bytes([d[0], d[1], d[2], d[3]]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_names() {
        assert_eq!(
            DepthEncoding::from_name("16UC1").unwrap(),
            DepthEncoding::FixedPoint
        );
        assert_eq!(
            DepthEncoding::from_name("mono16").unwrap(),
            DepthEncoding::FixedPoint
        );
        assert_eq!(
            DepthEncoding::from_name("32FC1").unwrap(),
            DepthEncoding::FloatingPoint
        );
        assert!(matches!(
            DepthEncoding::from_name("rgb8"),
            Err(Error::UnsupportedEncoding(e)) if e == "rgb8"
        ));
    }

    #[test]
    fn test_fixed_point_units() {
        let enc = DepthEncoding::FixedPoint;
        assert!(!enc.valid(0.0));
        assert!(enc.valid(1.0));
        assert_eq!(enc.to_meters(1000.0), 1.0);
        assert_eq!(enc.from_meters(1.0), 1000.0);
        // Rounds to the nearest millimeter
        assert_eq!(enc.from_meters(1.2344), 1234.0);
        assert_eq!(enc.from_meters(1.2346), 1235.0);
        // Saturates instead of wrapping
        assert_eq!(enc.from_meters(100.0), u16::MAX as f32);
    }

    #[test]
    fn test_floating_point_units() {
        let enc = DepthEncoding::FloatingPoint;
        assert!(!enc.valid(f32::NAN));
        assert!(!enc.valid(f32::INFINITY));
        assert!(!enc.valid(f32::NEG_INFINITY));
        assert!(enc.valid(0.0));
        assert!(enc.valid(2.5));
        assert_eq!(enc.to_meters(2.5), 2.5);
        assert_eq!(enc.from_meters(2.5), 2.5);
    }

    #[test]
    fn test_policy_unlimited() {
        let policy = SamplePolicy::new(DepthEncoding::FixedPoint, 0.0, false);
        assert_eq!(policy.apply(0.0), None);
        assert_eq!(policy.apply(65535.0), Some(65535.0));

        let policy = SamplePolicy::new(DepthEncoding::FloatingPoint, 0.0, true);
        assert_eq!(policy.apply(f32::NAN), None);
        assert_eq!(policy.apply(42.0), Some(42.0));
    }

    #[test]
    fn test_policy_clamp() {
        let policy = SamplePolicy::new(DepthEncoding::FloatingPoint, 5.0, false);
        assert_eq!(policy.apply(10.0), Some(5.0));
        assert_eq!(policy.apply(5.0), Some(5.0));
        assert_eq!(policy.apply(4.0), Some(4.0));
        // Missing samples are pushed out to range_max
        assert_eq!(policy.apply(f32::NAN), Some(5.0));

        let policy = SamplePolicy::new(DepthEncoding::FixedPoint, 2.0, false);
        assert_eq!(policy.apply(2500.0), Some(2000.0));
        assert_eq!(policy.apply(0.0), Some(2000.0));
    }

    #[test]
    fn test_policy_reject() {
        let policy = SamplePolicy::new(DepthEncoding::FloatingPoint, 5.0, true);
        assert_eq!(policy.apply(10.0), None);
        assert_eq!(policy.apply(f32::NAN), None);
        assert_eq!(policy.apply(4.0), Some(4.0));

        let policy = SamplePolicy::new(DepthEncoding::FixedPoint, 2.0, true);
        assert_eq!(policy.apply(2001.0), None);
        assert_eq!(policy.apply(2000.0), Some(2000.0));
        assert_eq!(policy.apply(0.0), None);
    }

    #[test]
    fn test_sample_byte_order_and_stride() {
        // 2x2 image with 2 bytes of row padding
        let mut data = vec![0u8; 12];
        data[0..2].copy_from_slice(&1000u16.to_le_bytes());
        data[8..10].copy_from_slice(&2000u16.to_le_bytes());
        let img = DepthImage::new(2, 2, 6, DepthEncoding::FixedPoint, false, &data).unwrap();
        assert_eq!(img.sample(0, 0), 1000.0);
        assert_eq!(img.sample(1, 1), 2000.0);
        assert_eq!(img.sample(1, 0), 0.0);

        let data = 1.5f32.to_be_bytes();
        let img = DepthImage::new(1, 1, 4, DepthEncoding::FloatingPoint, true, &data).unwrap();
        assert_eq!(img.sample(0, 0), 1.5);
    }

    #[test]
    fn test_malformed_extents() {
        let data = vec![0u8; 7];
        assert!(matches!(
            DepthImage::new(2, 2, 4, DepthEncoding::FixedPoint, false, &data),
            Err(Error::MalformedInput(_))
        ));
        assert!(matches!(
            DepthImage::new(4, 1, 4, DepthEncoding::FixedPoint, false, &data),
            Err(Error::MalformedInput(_))
        ));
        assert!(DepthImage::new(2, 0, 0, DepthEncoding::FloatingPoint, false, &[]).is_ok());
    }
}
