//! 像素数组的排列转换
//!
//! 数据库中的像素按 (c, h, w) 存放，图片文件和 `image` crate 使用 (h, w, c)。

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use ndarray::{Array3, ArrayView3};

/// 支持的通道类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    Gray,
    Rgb,
}

impl Channels {
    pub fn count(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
        }
    }
}

impl TryFrom<usize> for Channels {
    type Error = usize;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Self::Gray),
            3 => Ok(Self::Rgb),
            n => Err(n),
        }
    }
}

/// (c, h, w) -> (h, w, c)
pub fn to_channels_last(chw: ArrayView3<u8>) -> Array3<u8> {
    chw.permuted_axes([1, 2, 0]).as_standard_layout().into_owned()
}

/// (h, w, c) -> (c, h, w)
pub fn to_channels_first(hwc: ArrayView3<u8>) -> Array3<u8> {
    hwc.permuted_axes([2, 0, 1]).as_standard_layout().into_owned()
}

/// 将 (h, w, c) 数组转换为图片，灰度图会去掉通道维度
pub fn to_image(hwc: ArrayView3<u8>, channels: Channels) -> DynamicImage {
    let (h, w, _) = hwc.dim();
    match channels {
        Channels::Gray => DynamicImage::ImageLuma8(GrayImage::from_fn(w as u32, h as u32, |x, y| {
            Luma([hwc[[y as usize, x as usize, 0]]])
        })),
        Channels::Rgb => DynamicImage::ImageRgb8(RgbImage::from_fn(w as u32, h as u32, |x, y| {
            let (x, y) = (x as usize, y as usize);
            Rgb([hwc[[y, x, 0]], hwc[[y, x, 1]], hwc[[y, x, 2]]])
        })),
    }
}

/// 将图片转换为 (h, w, c) 数组，灰度图补回单通道维度
///
/// 带透明度的灰度图按灰度处理，其它颜色类型统一转换为 RGB
pub fn from_image(image: &DynamicImage) -> (Array3<u8>, Channels) {
    let is_gray = matches!(
        image,
        DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
    );
    if is_gray {
        let gray = image.to_luma8();
        let (w, h) = gray.dimensions();
        let pixels = Array3::from_shape_fn((h as usize, w as usize, 1), |(y, x, _)| {
            gray.get_pixel(x as u32, y as u32)[0]
        });
        (pixels, Channels::Gray)
    } else {
        let rgb = image.to_rgb8();
        let (w, h) = rgb.dimensions();
        let pixels = Array3::from_shape_fn((h as usize, w as usize, 3), |(y, x, c)| {
            rgb.get_pixel(x as u32, y as u32)[c]
        });
        (pixels, Channels::Rgb)
    }
}
