use indicatif::{ProgressBar, ProgressStyle};

pub fn pb_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-")
}

pub fn progress_bar(len: usize) -> ProgressBar {
    ProgressBar::new(len as u64).with_style(pb_style())
}

/// 格式化 (c, h, w)，没有记录时显示为 `-`
pub fn format_shape(shape: Option<(usize, usize, usize)>) -> String {
    match shape {
        Some((c, h, w)) => format!("({}, {}, {})", c, h, w),
        None => "-".to_string(),
    }
}
