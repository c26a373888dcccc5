use image::imageops::FilterType;
use ndarray::Array3;

use crate::error::Result;
use crate::layout::{self, Channels};

/// 对单张图片的变换，输入输出均为 (h, w, c) 排列
pub trait Transform {
    fn apply(&self, hwc: Array3<u8>, channels: Channels) -> Result<(Array3<u8>, Channels)>;
}

impl<F> Transform for F
where
    F: Fn(Array3<u8>, Channels) -> Result<(Array3<u8>, Channels)>,
{
    fn apply(&self, hwc: Array3<u8>, channels: Channels) -> Result<(Array3<u8>, Channels)> {
        self(hwc, channels)
    }
}

/// 原样返回
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Transform for Identity {
    fn apply(&self, hwc: Array3<u8>, channels: Channels) -> Result<(Array3<u8>, Channels)> {
        Ok((hwc, channels))
    }
}

/// 缩放到固定尺寸，不保持长宽比，通道数不变
#[derive(Debug, Clone, Copy)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
    pub filter: FilterType,
}

impl Resize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, filter: FilterType::Nearest }
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }
}

impl Transform for Resize {
    fn apply(&self, hwc: Array3<u8>, channels: Channels) -> Result<(Array3<u8>, Channels)> {
        let image = layout::to_image(hwc.view(), channels);
        let resized = image.resize_exact(self.width, self.height, self.filter);
        let (pixels, resized_channels) = layout::from_image(&resized);
        debug_assert_eq!(channels, resized_channels);
        Ok((pixels, resized_channels))
    }
}
