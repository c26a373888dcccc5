use std::path::PathBuf;

use heed::MdbError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// 数据库转换过程中的错误，任何一种都会终止本次操作
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 通道数既不是 1 也不是 3
    #[error("unsupported channel count {channels} at key {key}")]
    UnsupportedChannelCount { key: String, channels: usize },
    #[error("failed to open store {}: {source}", path.display())]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: heed::Error,
    },
    #[error("store {} already exists", path.display())]
    StoreExists { path: PathBuf },
    /// 源和目标是同一个数据库
    #[error("source and destination are the same store {}", path.display())]
    SameStore { path: PathBuf },
    /// 预留的 map size 不够用
    #[error("store is full after {written} records, increase --bytes-per-item")]
    StoreFull {
        written: usize,
        #[source]
        source: heed::Error,
    },
    #[error("failed to decode record {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: DecodeError,
    },
    #[error("label directory is not an integer: {}", path.display())]
    Label { path: PathBuf },
    #[error(transparent)]
    Store(#[from] heed::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// 单条记录的解码错误
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Protobuf(#[from] prost::DecodeError),
    #[error("encoded datum is not supported")]
    Encoded,
    #[error("data length {len} does not match shape ({channels}, {height}, {width})")]
    Length { len: usize, channels: usize, height: usize, width: usize },
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

impl Error {
    /// 写入时的 heed 错误，如果是 MDB_MAP_FULL 则转换为 StoreFull
    pub(crate) fn on_write(err: heed::Error, written: usize) -> Self {
        match err {
            heed::Error::Mdb(MdbError::MapFull) => Self::StoreFull { written, source: err },
            err => Self::Store(err),
        }
    }
}

/// 将 key 转换为便于阅读的字符串
pub(crate) fn display_key(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}
