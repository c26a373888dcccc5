use std::collections::BTreeMap;
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::datum::LabeledImage;
use crate::error::{Error, Result, display_key};
use crate::store::StoreReader;
use crate::utils::format_shape;

/// 数据库的统计信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    /// 记录总数
    pub count: usize,
    /// 第一条记录的 key
    pub first_key: Option<String>,
    /// 第一条记录的形状 (c, h, w)
    pub shape: Option<(usize, usize, usize)>,
    /// 每个标签的记录数
    pub labels: BTreeMap<i32, usize>,
}

/// 遍历并解码所有记录，统计数量、第一条记录的形状以及标签分布
pub fn inspect(path: impl AsRef<Path>) -> Result<StoreSummary> {
    let reader = StoreReader::open(path)?;
    let txn = reader.read_txn()?;
    info!("读取数据库: {}", reader.path().display());

    let mut summary =
        StoreSummary { count: 0, first_key: None, shape: None, labels: BTreeMap::new() };
    for item in reader.iter(&txn)? {
        let (key, payload) = item?;
        let image = LabeledImage::decode(payload)
            .map_err(|source| Error::Decode { key: display_key(key), source })?;
        if summary.count == 0 {
            summary.first_key = Some(display_key(key));
            summary.shape = Some(image.shape());
        }
        summary.count += 1;
        *summary.labels.entry(image.label).or_default() += 1;
    }

    info!("共 {} 条记录，形状 {}", summary.count, format_shape(summary.shape));
    Ok(summary)
}
