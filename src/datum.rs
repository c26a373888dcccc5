//! 记录的序列化格式，兼容 Caffe 的 `Datum` protobuf 消息

use ndarray::{Array3, ArrayView3};
use prost::Message;

use crate::error::DecodeError;

/// Caffe 的 `Datum` 消息，字段编号与 caffe.proto 保持一致
#[derive(Clone, PartialEq, Message)]
pub struct Datum {
    #[prost(int32, optional, tag = "1")]
    pub channels: Option<i32>,
    #[prost(int32, optional, tag = "2")]
    pub height: Option<i32>,
    #[prost(int32, optional, tag = "3")]
    pub width: Option<i32>,
    /// 按 (c, h, w) 顺序排列的像素
    #[prost(bytes = "vec", optional, tag = "4")]
    pub data: Option<Vec<u8>>,
    #[prost(int32, optional, tag = "5")]
    pub label: Option<i32>,
    #[prost(float, repeated, packed = "false", tag = "6")]
    pub float_data: Vec<f32>,
    /// 为 true 时 data 中存放的是压缩后的图片
    #[prost(bool, optional, tag = "7")]
    pub encoded: Option<bool>,
}

/// 带标签的图片，像素按 (channels, height, width) 排列
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledImage {
    pub pixels: Array3<u8>,
    pub label: i32,
}

impl LabeledImage {
    pub fn new(pixels: Array3<u8>, label: i32) -> Self {
        Self { pixels, label }
    }

    pub fn channels(&self) -> usize {
        self.pixels.dim().0
    }

    /// 返回 (channels, height, width)
    pub fn shape(&self) -> (usize, usize, usize) {
        self.pixels.dim()
    }

    /// 从序列化后的 Datum 中解码
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let datum = Datum::decode(payload)?;
        if datum.encoded.unwrap_or(false) {
            return Err(DecodeError::Encoded);
        }

        let dim = |v: Option<i32>| v.and_then(|v| usize::try_from(v).ok()).unwrap_or(0);
        let (channels, height, width) = (dim(datum.channels), dim(datum.height), dim(datum.width));

        // 优先使用 data 字段，为空时退回到 float_data，浮点数直接截断为 u8
        let data = match datum.data {
            Some(data) if !data.is_empty() => data,
            _ => datum.float_data.iter().map(|&v| v as u8).collect(),
        };
        // 形状来自 payload，乘积可能溢出
        let expected = channels.checked_mul(height).and_then(|n| n.checked_mul(width));
        if expected != Some(data.len()) {
            return Err(DecodeError::Length { len: data.len(), channels, height, width });
        }

        let pixels = Array3::from_shape_vec((channels, height, width), data)?;
        Ok(Self { pixels, label: datum.label.unwrap_or(0) })
    }

    /// 序列化为 Datum
    pub fn encode(&self) -> Vec<u8> {
        encode_view(self.pixels.view(), self.label)
    }
}

/// 将 (c, h, w) 排列的像素和标签序列化为 Datum
pub fn encode_view(pixels: ArrayView3<u8>, label: i32) -> Vec<u8> {
    let (c, h, w) = pixels.dim();
    let datum = Datum {
        channels: Some(c as i32),
        height: Some(h as i32),
        width: Some(w as i32),
        // iter() 按逻辑顺序遍历，转置过的视图也能得到正确的字节序
        data: Some(pixels.iter().copied().collect()),
        label: Some(label),
        float_data: vec![],
        encoded: None,
    };
    datum.encode_to_vec()
}

#[cfg(test)]
mod tests {
    use ndarray::Array;

    use super::*;

    #[test]
    fn test_decode_encoded_datum() {
        let datum = Datum {
            channels: Some(3),
            height: Some(2),
            width: Some(2),
            data: Some(vec![0xff, 0xd8]),
            label: Some(1),
            float_data: vec![],
            encoded: Some(true),
        };
        let err = LabeledImage::decode(&datum.encode_to_vec()).unwrap_err();
        assert!(matches!(err, DecodeError::Encoded));
    }

    #[test]
    fn test_decode_length_mismatch() {
        let datum = Datum {
            channels: Some(1),
            height: Some(4),
            width: Some(4),
            data: Some(vec![0; 15]),
            label: Some(0),
            ..Default::default()
        };
        let err = LabeledImage::decode(&datum.encode_to_vec()).unwrap_err();
        assert!(matches!(err, DecodeError::Length { len: 15, .. }));
    }

    #[test]
    fn test_decode_oversized_shape() {
        let datum = Datum {
            channels: Some(i32::MAX),
            height: Some(i32::MAX),
            width: Some(i32::MAX),
            data: Some(vec![0; 4]),
            label: Some(0),
            ..Default::default()
        };
        let err = LabeledImage::decode(&datum.encode_to_vec()).unwrap_err();
        assert!(matches!(err, DecodeError::Length { len: 4, .. }));
    }

    #[test]
    fn test_decode_float_data() {
        let datum = Datum {
            channels: Some(1),
            height: Some(1),
            width: Some(3),
            data: None,
            label: Some(7),
            float_data: vec![0.0, 12.7, 300.0],
            encoded: None,
        };
        let image = LabeledImage::decode(&datum.encode_to_vec()).unwrap();
        assert_eq!(image.label, 7);
        assert_eq!(image.pixels.iter().copied().collect::<Vec<_>>(), vec![0, 12, 255]);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            LabeledImage::decode(&[0xff, 0xff, 0xff]),
            Err(DecodeError::Protobuf(_))
        ));
    }

    #[test]
    fn test_encode_keeps_logical_order() {
        // 转置视图编码后应与连续数组编码结果一致
        let hwc = Array::from_shape_fn((2, 3, 3), |(y, x, c)| (y * 9 + x * 3 + c) as u8);
        let chw = hwc.view().permuted_axes([2, 0, 1]);
        let expected = chw.as_standard_layout().into_owned();

        let decoded = LabeledImage::decode(&encode_view(chw, 5)).unwrap();
        assert_eq!(decoded.pixels, expected);
        assert_eq!(decoded.label, 5);
        assert_eq!(decoded.shape(), (3, 2, 3));
    }

    #[test]
    fn test_label_defaults_to_zero() {
        let datum = Datum {
            channels: Some(1),
            height: Some(1),
            width: Some(1),
            data: Some(vec![9]),
            ..Default::default()
        };
        let image = LabeledImage::decode(&datum.encode_to_vec()).unwrap();
        assert_eq!(image.label, 0);
    }
}
