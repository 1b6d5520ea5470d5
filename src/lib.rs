// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! EdgeFirst Depth Cloud Library
//!
//! This library converts depth images and pinhole camera intrinsics into
//! organized point clouds, optionally colored from a separate color image.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌───────────────┐     ┌─────────────────┐
//! │  DepthImage     │ ──► │  SamplePolicy │ ──► │  Unprojector    │
//! │  (16UC1/32FC1)  │     │  (range/NaN)  │     │  (pinhole)      │
//! └─────────────────┘     └───────────────┘     └─────────────────┘
//!                                                       │
//!          ┌─────────────────┐                          ▼
//!          │  ColorImage     │ ──────────────►  ┌─────────────────┐
//!          │  (optional)     │                  │  PointCloud     │
//!          └─────────────────┘                  │  (organized)    │
//!                                               └─────────────────┘
//!                                                       │
//!                                                       ▼
//!                               ┌─────────────────────────────────────┐
//!                               │  formats::to_pointcloud2            │
//!                               │  (xyz + rgb, 32-byte records)       │
//!                               └─────────────────────────────────────┘
//! ```
//!
//! The caller owns the input buffers and receives an owned cloud. Camera
//! intrinsics arrive independently of depth frames and are kept in an
//! [`IntrinsicsCell`], which the caller snapshots before each conversion.
//!
//! # Modules
//!
//! - [`depth`]: Depth image access and per-sample validity policy
//! - [`intrinsics`]: Camera intrinsics, shared intrinsics cell, unprojection
//! - [`color`]: Color image sampling
//! - [`cloud`]: Organized point cloud types
//! - [`convert`]: Cloud assembly over the decimated pixel grid
//! - [`formats`]: PointCloud2 message formatting
//! - [`error`]: Error handling
//!
//! # Example
//!
//! ```
//! use edgefirst_depthcloud::{
//!     ConvertConfig, DepthEncoding, DepthImage, Intrinsics, depth_to_cloud,
//! };
//!
//! let data: Vec<u8> = [1000u16; 16].iter().flat_map(|d| d.to_le_bytes()).collect();
//! let depth = DepthImage::new(4, 4, 8, DepthEncoding::FixedPoint, false, &data).unwrap();
//! let intrinsics = Intrinsics::new(100.0, 100.0, 2.0, 2.0).unwrap();
//!
//! let cloud = depth_to_cloud(&depth, Some(&intrinsics), None, &ConvertConfig::default()).unwrap();
//! assert_eq!((cloud.width(), cloud.height()), (2, 2));
//! assert_eq!(cloud.get(0, 0).unwrap().z, 1.0);
//! ```

pub mod cloud;
pub mod color;
pub mod convert;
pub mod depth;
pub mod error;
pub mod formats;
pub mod intrinsics;

// Re-exports for convenience
pub use cloud::{Point, PointCloud};
pub use color::{ColorImage, ColorLayout};
pub use convert::{ConvertConfig, DEFAULT_DECIMATION, depth_to_cloud};
pub use depth::{DepthEncoding, DepthImage, SamplePolicy};
pub use error::Error;
pub use formats::{PointFieldType, to_pointcloud2};
pub use intrinsics::{Intrinsics, IntrinsicsCell, Unprojector};
