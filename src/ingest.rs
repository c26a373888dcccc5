//! 从图片文件生成数据库
//!
//! 目录结构为 `<src>/<label>/xxx.jpg`，标签必须是整数，key 为 8 位补零的序号。

use std::path::{Path, PathBuf};

use log::{debug, info};
use regex::Regex;
use walkdir::WalkDir;

use crate::datum::LabeledImage;
use crate::error::{Error, Result};
use crate::layout;
use crate::store::{StoreWriter, WriteOptions};
use crate::utils::progress_bar;

/// 第 `index` 条记录的 key
pub fn record_key(index: usize) -> String {
    format!("{:08}", index)
}

/// 读取图片文件，灰度图得到 (1, h, w)，其它图片统一转换为 (3, h, w)
pub fn load_image(path: impl AsRef<Path>, label: i32) -> Result<LabeledImage> {
    let image = image::open(path)?;
    let (hwc, _) = layout::from_image(&image);
    Ok(LabeledImage::new(layout::to_channels_first(hwc.view()), label))
}

/// 扫描 `src` 下的标签目录，返回按路径排序的 (文件, 标签)
///
/// 直接位于 `src` 下的文件会被忽略，文件的标签取自其所在目录名
pub fn scan_label_dir(src: impl AsRef<Path>, suffix: &Regex) -> Result<Vec<(PathBuf, i32)>> {
    let src = src.as_ref();
    info!("开始扫描目录: {}", src.display());

    let mut entries = vec![];
    for entry in WalkDir::new(src).min_depth(2).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        match path.extension() {
            Some(ext) if suffix.is_match(&ext.to_string_lossy()) => {}
            _ => continue,
        }

        let dir = path.parent().unwrap_or(src);
        let label = dir
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.parse::<i32>().ok())
            .ok_or_else(|| Error::Label { path: dir.to_path_buf() })?;
        entries.push((path.to_path_buf(), label));
    }

    info!("扫描完成，共 {} 张图片", entries.len());
    Ok(entries)
}

/// 将图片依次写入新建的数据库，key 为 `00000000` 起的序号
///
/// 出错时删除目标数据库
pub fn write_store<I>(dest: impl AsRef<Path>, images: I, options: &WriteOptions) -> Result<usize>
where
    I: IntoIterator<Item = Result<LabeledImage>>,
    I::IntoIter: ExactSizeIterator,
{
    let images = images.into_iter();
    let writer = StoreWriter::create_for(dest, images.len(), options)?;

    match write_records(&writer, images, options) {
        Ok(count) => {
            info!("{} 条记录已写入 {}", count, writer.path().display());
            Ok(count)
        }
        Err(e) => {
            writer.discard();
            Err(e)
        }
    }
}

fn write_records<I>(writer: &StoreWriter, images: I, options: &WriteOptions) -> Result<usize>
where
    I: ExactSizeIterator<Item = Result<LabeledImage>>,
{
    let pb = progress_bar(images.len());
    let mut batch = writer.batch(options.commit_every)?;
    for (index, image) in images.enumerate() {
        let image = image?;
        batch.put(record_key(index).as_bytes(), &image.encode())?;
        pb.inc(1);
    }
    pb.finish_and_clear();
    batch.commit()
}

/// 从文件列表生成数据库，`files` 中每一项为 (路径, 标签)
pub fn ingest_files(
    dest: impl AsRef<Path>,
    files: &[(PathBuf, i32)],
    options: &WriteOptions,
) -> Result<usize> {
    let images = files.iter().map(|(path, label)| {
        debug!("读取 {}", path.display());
        load_image(path, *label)
    });
    write_store(dest, images, options)
}

/// 从 `<src>/<label>/xxx` 目录结构生成数据库
pub fn ingest_dir(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    suffix: &Regex,
    options: &WriteOptions,
) -> Result<usize> {
    let files = scan_label_dir(src, suffix)?;
    ingest_files(dest, &files, options)
}
