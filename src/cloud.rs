// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Organized point cloud output.

/// A single point of the organized cloud.
///
/// `rgb` holds the packed `0x00RRGGBB` color bit-for-bit in an `f32`, the
/// representation PCL uses for the `rgb` field.
#[derive(Debug, Clone, Copy)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rgb: f32,
}

impl Point {
    /// Placeholder for a pixel without a usable depth. All four fields carry
    /// the same quiet NaN bit pattern.
    pub const INVALID: Point = Point {
        x: f32::NAN,
        y: f32::NAN,
        z: f32::NAN,
        rgb: f32::NAN,
    };

    #[inline]
    pub fn new(xyz: [f32; 3], rgb: u32) -> Self {
        Self {
            x: xyz[0],
            y: xyz[1],
            z: xyz[2],
            rgb: f32::from_bits(rgb),
        }
    }

    /// Packed color as stored in the `rgb` field.
    #[inline]
    pub fn rgb_bits(&self) -> u32 {
        self.rgb.to_bits()
    }

    pub fn is_valid(&self) -> bool {
        !self.z.is_nan()
    }
}

/// Row-major grid of points, one per sampled pixel.
///
/// Invalid pixels are kept as [`Point::INVALID`], so the cloud is never dense.
#[derive(Debug, Clone)]
pub struct PointCloud {
    width: usize,
    height: usize,
    points: Vec<Point>,
}

impl PointCloud {
    /// Allocate a `width` x `height` grid filled with invalid points.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            points: vec![Point::INVALID; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_dense(&self) -> bool {
        false
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub(crate) fn points_mut(&mut self) -> &mut [Point] {
        &mut self.points
    }

    /// Point at grid `row`, `col`.
    pub fn get(&self, row: usize, col: usize) -> Option<&Point> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.points.get(row * self.width + col)
    }

    /// Number of points carrying a measurement.
    pub fn count_valid(&self) -> usize {
        self.points.iter().filter(|p| p.is_valid()).count()
    }

    /// Compare two clouds by bit pattern, treating NaN fields as equal when
    /// their bits match.
    pub fn bit_eq(&self, other: &PointCloud) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.points.iter().zip(&other.points).all(|(a, b)| {
                a.x.to_bits() == b.x.to_bits()
                    && a.y.to_bits() == b.y.to_bits()
                    && a.z.to_bits() == b.z.to_bits()
                    && a.rgb.to_bits() == b.rgb.to_bits()
            })
    }
}
