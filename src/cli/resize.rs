use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use image::imageops::FilterType;

use crate::cli::{SubCommandExtend, print_report};
use crate::config::{Opts, StoreOptions, item_limit, parse_filter};
use crate::rebuild::rebuild;
use crate::store::WriteOptions;
use crate::transform::Resize;

#[derive(Parser, Debug, Clone)]
pub struct ResizeCommand {
    #[command(flatten)]
    pub store: StoreOptions,
    /// 源数据库路径
    pub src: PathBuf,
    /// 新数据库路径
    pub dest: PathBuf,
    /// 新的图片宽度
    #[arg(short = 'W', long, value_name = "WIDTH", value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,
    /// 新的图片高度
    #[arg(short = 'H', long, value_name = "HEIGHT", value_parser = clap::value_parser!(u32).range(1..))]
    pub height: u32,
    /// 最多处理的记录数量，默认全部处理
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub limit: Option<NonZeroUsize>,
    /// 缩放插值方式：nearest, triangle, catmull-rom, gaussian, lanczos3
    #[arg(long, value_name = "FILTER", default_value = "nearest", value_parser = parse_filter)]
    pub filter: FilterType,
}

impl SubCommandExtend for ResizeCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        let resize = Resize::new(self.width, self.height).with_filter(self.filter);
        let options = WriteOptions::from(&self.store);
        let report = rebuild(&self.src, &self.dest, item_limit(self.limit), &resize, &options)?;
        print_report(&report)
    }
}
