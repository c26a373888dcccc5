use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::datum::LabeledImage;
use crate::error::{Error, Result, display_key};
use crate::layout::{self, Channels};
use crate::store::StoreReader;
use crate::utils::progress_bar;

/// 将数据库中的记录导出为 `<dest>/<label>/<key>.jpg`，最多导出 `limit` 张
///
/// 遇到不支持的通道数时停止导出，已经写出的文件会保留
pub fn export_images(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    limit: usize,
) -> Result<usize> {
    let dest = dest.as_ref();
    let reader = StoreReader::open(source)?;
    let txn = reader.read_txn()?;
    let total = usize::try_from(reader.len(&txn)?).unwrap_or(usize::MAX).min(limit);

    if !dest.is_dir() {
        fs::create_dir_all(dest)?;
        info!("创建目录 {}", dest.display());
    }

    let pb = progress_bar(total);
    let mut count = 0;
    for item in reader.iter(&txn)?.take(limit) {
        let (key, payload) = item?;
        let key = display_key(key);
        let image = LabeledImage::decode(payload)
            .map_err(|source| Error::Decode { key: key.clone(), source })?;
        let channels = Channels::try_from(image.channels())
            .map_err(|channels| Error::UnsupportedChannelCount { key: key.clone(), channels })?;

        let path = image_path(dest, image.label, &key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let hwc = layout::to_channels_last(image.pixels.view());
        layout::to_image(hwc.view(), channels).save(&path)?;
        debug!("写出 {}", path.display());

        count += 1;
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!("共导出 {} 张图片到 {}", count, dest.display());
    Ok(count)
}

/// key 中的路径分隔符会被替换，保证文件落在标签目录下
fn image_path(dest: &Path, label: i32, key: &str) -> PathBuf {
    let name = key.replace(['/', '\\'], "_");
    dest.join(label.to_string()).join(format!("{}.jpg", name))
}
