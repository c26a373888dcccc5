//! 从已有数据库生成新数据库，可选对每张图片做变换（例如缩放）

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use heed::{RoTxn, WithTls};
use log::info;
use serde::Serialize;

use crate::datum::{LabeledImage, encode_view};
use crate::error::{Error, Result, display_key};
use crate::layout::{self, Channels};
use crate::store::{StoreReader, StoreWriter, WriteOptions};
use crate::transform::Transform;
use crate::utils::{format_shape, progress_bar};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    /// 写入的记录数
    pub written: usize,
    /// 第一条记录变换前的形状
    pub shape_before: Option<(usize, usize, usize)>,
    /// 第一条记录变换后的形状
    pub shape_after: Option<(usize, usize, usize)>,
}

/// 读取 `source` 中的记录，变换后写入新建的 `dest`
///
/// 按 key 顺序处理，最多处理 `item_limit` 条，key 和标签保持不变。
/// 任何错误都会终止整个过程，此时 `dest` 会被删除，`source` 始终不会被修改。
pub fn rebuild<T>(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    item_limit: NonZeroUsize,
    transform: &T,
    options: &WriteOptions,
) -> Result<RebuildReport>
where
    T: Transform + ?Sized,
{
    let (source, dest) = (source.as_ref(), dest.as_ref());
    info!("开始重建数据库: {} -> {}", source.display(), dest.display());

    let reader = StoreReader::open(source)?;
    let txn = reader.read_txn()?;
    let total = usize::try_from(reader.len(&txn)?).unwrap_or(usize::MAX);
    let items = total.min(item_limit.get());

    ensure_distinct(source, dest)?;
    let writer = StoreWriter::create_for(dest, items, options)?;

    match copy_records(&reader, &txn, &writer, items, transform, options.commit_every) {
        Ok(report) => {
            info!(
                "重建完成，共 {} 条记录，形状 {} -> {}",
                report.written,
                format_shape(report.shape_before),
                format_shape(report.shape_after)
            );
            Ok(report)
        }
        Err(e) => {
            writer.discard();
            Err(e)
        }
    }
}

/// 目标指向源数据库时拒绝执行，否则 overwrite 会先删掉源数据库
fn ensure_distinct(source: &Path, dest: &Path) -> Result<()> {
    if !dest.exists() {
        return Ok(());
    }
    let source = fs::canonicalize(source)?;
    if source == fs::canonicalize(dest)? {
        return Err(Error::SameStore { path: source });
    }
    Ok(())
}

fn copy_records<T>(
    reader: &StoreReader,
    txn: &RoTxn<'_, WithTls>,
    writer: &StoreWriter,
    items: usize,
    transform: &T,
    commit_every: Option<NonZeroUsize>,
) -> Result<RebuildReport>
where
    T: Transform + ?Sized,
{
    let pb = progress_bar(items);
    let mut batch = writer.batch(commit_every)?;
    let mut report = RebuildReport { written: 0, shape_before: None, shape_after: None };

    for item in reader.iter(txn)?.take(items) {
        let (key, payload) = item?;
        let (before, after, payload) = rebuild_one(key, payload, transform)?;
        batch.put(key, &payload)?;

        if report.shape_before.is_none() {
            report.shape_before = Some(before);
            report.shape_after = Some(after);
        }
        pb.inc(1);
    }

    report.written = batch.commit()?;
    pb.finish_and_clear();
    Ok(report)
}

/// 解码、变换并重新编码一条记录，返回变换前后的形状和新的 payload
fn rebuild_one<T>(
    key: &[u8],
    payload: &[u8],
    transform: &T,
) -> Result<((usize, usize, usize), (usize, usize, usize), Vec<u8>)>
where
    T: Transform + ?Sized,
{
    let image = LabeledImage::decode(payload)
        .map_err(|source| Error::Decode { key: display_key(key), source })?;
    let channels = Channels::try_from(image.channels())
        .map_err(|channels| Error::UnsupportedChannelCount { key: display_key(key), channels })?;

    let hwc = layout::to_channels_last(image.pixels.view());
    let (hwc, _) = transform.apply(hwc, channels)?;
    let chw = hwc.view().permuted_axes([2, 0, 1]);

    Ok((image.shape(), chw.dim(), encode_view(chw, image.label)))
}
