// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Point cloud formatting into ROS PointCloud2 messages.
//!
//! Points are written with the padded XYZRGB layout that PCL's
//! `PointXYZRGB` and ROS's `PointCloud2Modifier` produce for the "xyz" +
//! "rgb" field sets:
//!
//! ```text
//! ┌───────┬───────┬───────┬─────────┬─────────┬──────────────┐
//! │ x:f32 │ y:f32 │ z:f32 │ padding │ rgb:f32 │ padding      │
//! │ 4B    │ 4B    │ 4B    │ 4B      │ 4B      │ 12B          │
//! └───────┴───────┴───────┴─────────┴─────────┴──────────────┘
//! ```
//!
//! All values are little-endian and padding bytes are zero.

use crate::cloud::{Point, PointCloud};
use edgefirst_schemas::{
    sensor_msgs::{PointCloud2, PointField},
    std_msgs::Header,
};

/// Point field data types for PointCloud2 messages.
///
/// These values correspond to the ROS sensor_msgs/PointField datatype field.
/// All variants are defined for completeness, even if not all are currently
/// used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[allow(dead_code)]
pub enum PointFieldType {
    INT8 = 1,
    UINT8 = 2,
    INT16 = 3,
    UINT16 = 4,
    INT32 = 5,
    UINT32 = 6,
    FLOAT32 = 7,
    FLOAT64 = 8,
}

/// Size of one point record in bytes.
pub const POINT_STEP: usize = 32;

const X_OFFSET: usize = 0;
const Y_OFFSET: usize = 4;
const Z_OFFSET: usize = 8;
const RGB_OFFSET: usize = 16;

/// Build the XYZ + packed RGB point fields (32-byte stride).
///
/// Returns a vector of PointField definitions for:
/// - x: FLOAT32 at offset 0
/// - y: FLOAT32 at offset 4
/// - z: FLOAT32 at offset 8
/// - rgb: FLOAT32 at offset 16
pub fn xyz_rgb_fields() -> Vec<PointField> {
    [
        ("x", X_OFFSET),
        ("y", Y_OFFSET),
        ("z", Z_OFFSET),
        ("rgb", RGB_OFFSET),
    ]
    .into_iter()
    .map(|(name, offset)| PointField {
        name: String::from(name),
        offset: offset as u32,
        datatype: PointFieldType::FLOAT32 as u8,
        count: 1,
    })
    .collect()
}

/// Format points into the 32-byte XYZRGB layout.
#[inline(never)]
pub fn format_points_xyzrgb(points: &[Point]) -> Vec<u8> {
    let mut data = vec![0u8; POINT_STEP * points.len()];
    format_points_xyzrgb_into(points, &mut data);
    data
}

/// Format points into a pre-allocated buffer (32-byte format).
///
/// Padding bytes of `out` are left untouched, callers reusing a buffer are
/// expected to have zeroed it once.
///
/// # Panics
///
/// Panics if `out` is smaller than `POINT_STEP * points.len()`.
#[inline(never)]
pub fn format_points_xyzrgb_into(points: &[Point], out: &mut [u8]) {
    assert!(out.len() >= POINT_STEP * points.len());

    for (pt, rec) in points.iter().zip(out.chunks_exact_mut(POINT_STEP)) {
        rec[X_OFFSET..X_OFFSET + 4].copy_from_slice(&pt.x.to_le_bytes());
        rec[Y_OFFSET..Y_OFFSET + 4].copy_from_slice(&pt.y.to_le_bytes());
        rec[Z_OFFSET..Z_OFFSET + 4].copy_from_slice(&pt.z.to_le_bytes());
        rec[RGB_OFFSET..RGB_OFFSET + 4].copy_from_slice(&pt.rgb.to_le_bytes());
    }
}

/// Wrap an organized cloud into a PointCloud2 message.
///
/// The header is taken as-is, normally the depth image's header so stamp and
/// frame follow the source frame.
pub fn to_pointcloud2(cloud: &PointCloud, header: Header) -> PointCloud2 {
    let width = cloud.width() as u32;
    PointCloud2 {
        header,
        height: cloud.height() as u32,
        width,
        fields: xyz_rgb_fields(),
        is_bigendian: false,
        point_step: POINT_STEP as u32,
        row_step: POINT_STEP as u32 * width,
        data: format_points_xyzrgb(cloud.points()),
        is_dense: cloud.is_dense(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgefirst_schemas::builtin_interfaces::Time;

    fn read_f32(data: &[u8], offset: usize) -> f32 {
        f32::from_le_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ])
    }

    #[test]
    fn test_point_field_builder() {
        let fields = xyz_rgb_fields();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].name, "x");
        assert_eq!(fields[0].offset, 0);
        assert_eq!(fields[2].name, "z");
        assert_eq!(fields[2].offset, 8);
        assert_eq!(fields[3].name, "rgb");
        assert_eq!(fields[3].offset, 16);
        assert!(
            fields
                .iter()
                .all(|f| f.datatype == PointFieldType::FLOAT32 as u8 && f.count == 1)
        );
    }

    #[test]
    fn test_format_points_xyzrgb() {
        let points = [
            Point::new([1.0, 2.0, 3.0], 0x00112233),
            Point::INVALID,
            Point::new([-0.5, 0.25, 7.0], 0),
        ];

        let data = format_points_xyzrgb(&points);
        assert_eq!(data.len(), 3 * POINT_STEP);

        assert_eq!(read_f32(&data, 0), 1.0);
        assert_eq!(read_f32(&data, 4), 2.0);
        assert_eq!(read_f32(&data, 8), 3.0);
        assert_eq!(read_f32(&data, 16).to_bits(), 0x00112233);
        assert!(data[12..16].iter().all(|&b| b == 0));
        assert!(data[20..32].iter().all(|&b| b == 0));

        let offset = POINT_STEP;
        assert!(read_f32(&data, offset).is_nan());
        assert!(read_f32(&data, offset + 16).is_nan());

        let offset = 2 * POINT_STEP;
        assert_eq!(read_f32(&data, offset), -0.5);
        assert_eq!(read_f32(&data, offset + 8), 7.0);
    }

    #[test]
    #[should_panic]
    fn test_format_into_short_buffer() {
        let points = [Point::INVALID; 2];
        let mut out = vec![0u8; POINT_STEP];
        format_points_xyzrgb_into(&points, &mut out);
    }

    #[test]
    fn test_to_pointcloud2() {
        let cloud = PointCloud::new(3, 2);
        let header = Header {
            stamp: Time {
                sec: 12,
                nanosec: 34,
            },
            frame_id: String::from("camera_depth_optical_frame"),
        };

        let msg = to_pointcloud2(&cloud, header);
        assert_eq!(msg.height, 2);
        assert_eq!(msg.width, 3);
        assert_eq!(msg.point_step, 32);
        assert_eq!(msg.row_step, 96);
        assert_eq!(msg.data.len(), 6 * 32);
        assert!(!msg.is_dense);
        assert!(!msg.is_bigendian);
        assert_eq!(msg.header.stamp.sec, 12);
        assert_eq!(msg.header.stamp.nanosec, 34);
        assert_eq!(msg.header.frame_id, "camera_depth_optical_frame");
    }
}
