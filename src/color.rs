// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Color sampling for point cloud fusion.
//!
//! Colors are packed as `0x00RRGGBB`, the layout PCL and RViz expect in the
//! `rgb` field. The color image does not need to match the depth image's
//! resolution: any coordinate outside of it produces black.

use crate::error::Error;
use edgefirst_schemas::sensor_msgs::Image;

/// Pixel layout of a color image.
///
/// Multi-channel images are always read as BGR(A), whichever channel order the
/// encoding name advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorLayout {
    /// One 8-bit channel (`mono8`, `8UC1`).
    Mono,
    /// Three 8-bit channels (`bgr8`, `rgb8`, `8UC3`).
    ThreeChannel,
    /// Four 8-bit channels with alpha (`bgra8`, `rgba8`, `8UC4`).
    FourChannel,
}

impl ColorLayout {
    /// Resolve a ROS image encoding string.
    pub fn from_name(encoding: &str) -> Result<Self, Error> {
        match encoding {
            "mono8" | "8UC1" => Ok(ColorLayout::Mono),
            "bgr8" | "rgb8" | "8UC3" => Ok(ColorLayout::ThreeChannel),
            "bgra8" | "rgba8" | "8UC4" => Ok(ColorLayout::FourChannel),
            other => Err(Error::UnsupportedEncoding(other.to_string())),
        }
    }

    pub const fn channels(self) -> usize {
        match self {
            ColorLayout::Mono => 1,
            ColorLayout::ThreeChannel => 3,
            ColorLayout::FourChannel => 4,
        }
    }
}

/// Borrowed view of a color image.
#[derive(Debug, Clone, Copy)]
pub struct ColorImage<'a> {
    width: usize,
    height: usize,
    step: usize,
    layout: ColorLayout,
    data: &'a [u8],
}

impl<'a> ColorImage<'a> {
    /// Create a view over raw pixels.
    ///
    /// No extent validation happens here; [`ColorImage::sample`] checks every
    /// access instead, so a truncated buffer only loses color.
    pub fn new(
        width: usize,
        height: usize,
        step: usize,
        layout: ColorLayout,
        data: &'a [u8],
    ) -> Self {
        Self {
            width,
            height,
            step,
            layout,
            data,
        }
    }

    /// Create a view over a `sensor_msgs/Image` color message.
    pub fn from_msg(msg: &'a Image) -> Result<Self, Error> {
        let layout = ColorLayout::from_name(&msg.encoding)?;
        Ok(Self::new(
            msg.width as usize,
            msg.height as usize,
            msg.step as usize,
            layout,
            &msg.data,
        ))
    }

    pub fn layout(&self) -> ColorLayout {
        self.layout
    }

    /// Returns the pixel bytes at (`u`, `v`) if they lie inside the image.
    fn pixel(&self, u: usize, v: usize) -> Option<&'a [u8]> {
        if v >= self.height || u >= self.width {
            return None;
        }
        let channels = self.layout.channels();
        let offset = v.checked_mul(self.step)?.checked_add(u.checked_mul(channels)?)?;
        self.data.get(offset..offset.checked_add(channels)?)
    }

    /// Packed color at column `u`, row `v`, or 0 when out of range.
    #[inline]
    pub fn sample(&self, u: usize, v: usize) -> u32 {
        let mut rgb = 0u32;
        let Some(px) = self.pixel(u, v) else {
            return rgb;
        };
        match self.layout {
            // Masks the empty accumulator, grayscale images contribute no color.
            ColorLayout::Mono => rgb &= px[0] as u32,
            ColorLayout::ThreeChannel | ColorLayout::FourChannel => {
                rgb |= (px[2] as u32) << 16;
                rgb |= (px[1] as u32) << 8;
                rgb |= px[0] as u32;
            }
        }
        rgb
    }
}

/// Sample an optional color image, 0 when none is attached.
#[inline]
pub fn sample_color(color: Option<&ColorImage>, u: usize, v: usize) -> u32 {
    color.map_or(0, |img| img.sample(u, v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bgr_2x2() -> Vec<u8> {
        vec![
            0x01, 0x02, 0x03, 0x11, 0x12, 0x13, //
            0x21, 0x22, 0x23, 0x31, 0x32, 0x33,
        ]
    }

    #[test]
    fn test_layout_names() {
        assert_eq!(ColorLayout::from_name("bgr8").unwrap(), ColorLayout::ThreeChannel);
        assert_eq!(ColorLayout::from_name("rgba8").unwrap(), ColorLayout::FourChannel);
        assert_eq!(ColorLayout::from_name("mono8").unwrap(), ColorLayout::Mono);
        assert!(matches!(
            ColorLayout::from_name("yuyv"),
            Err(Error::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn test_three_channel_reads_sampled_pixel() {
        // Known divergence point: three channel images were once sampled from
        // the first pixel's first channel for every point.
        let data = bgr_2x2();
        let img = ColorImage::new(2, 2, 6, ColorLayout::ThreeChannel, &data);
        assert_eq!(img.sample(0, 0), 0x030201);
        assert_eq!(img.sample(1, 0), 0x131211);
        // Must not fall back to the first pixel
        assert_eq!(img.sample(1, 1), 0x333231);
    }

    #[test]
    fn test_rgb8_is_read_as_bgr() {
        let data = vec![0xAA, 0xBB, 0xCC];
        let img = ColorImage::new(1, 1, 3, ColorLayout::from_name("rgb8").unwrap(), &data);
        assert_eq!(img.sample(0, 0), 0xCCBBAA);
    }

    #[test]
    fn test_four_channel_ignores_alpha() {
        let data = vec![0x10, 0x20, 0x30, 0xFF, 0x40, 0x50, 0x60, 0x80];
        let img = ColorImage::new(2, 1, 8, ColorLayout::FourChannel, &data);
        assert_eq!(img.layout().channels(), 4);
        assert_eq!(img.sample(0, 0), 0x302010);
        assert_eq!(img.sample(1, 0), 0x605040);
    }

    #[test]
    fn test_mono_masks_to_zero() {
        // Grayscale intentionally yields no color rather than a broadcast
        // gray; downstream consumers may rely on it.
        let data = vec![0xFF, 0x80];
        let img = ColorImage::new(2, 1, 2, ColorLayout::Mono, &data);
        assert_eq!(img.sample(0, 0), 0);
        assert_eq!(img.sample(1, 0), 0);
    }

    #[test]
    fn test_out_of_range_is_black() {
        let data = bgr_2x2();
        let img = ColorImage::new(2, 2, 6, ColorLayout::ThreeChannel, &data);
        assert_eq!(img.sample(2, 0), 0);
        assert_eq!(img.sample(0, 2), 0);
        assert_eq!(img.sample(usize::MAX, usize::MAX), 0);
        assert_eq!(sample_color(None, 0, 0), 0);
        assert_eq!(sample_color(Some(&img), 1, 1), 0x333231);
    }

    #[test]
    fn test_truncated_buffer_is_black() {
        // Declares 2x2 but only holds the first row
        let data = bgr_2x2();
        let img = ColorImage::new(2, 2, 6, ColorLayout::ThreeChannel, &data[..6]);
        assert_eq!(img.sample(1, 0), 0x131211);
        assert_eq!(img.sample(0, 1), 0);
    }
}
