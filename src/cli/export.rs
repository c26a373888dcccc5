use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::cli::SubCommandExtend;
use crate::config::{Opts, item_limit};
use crate::export::export_images;

#[derive(Parser, Debug, Clone)]
pub struct ExportCommand {
    /// 数据库路径
    pub store: PathBuf,
    /// 输出目录，不存在时自动创建
    pub dest: PathBuf,
    /// 最多导出的图片数量，默认全部导出
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub limit: Option<NonZeroUsize>,
}

impl SubCommandExtend for ExportCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        let count = export_images(&self.store, &self.dest, item_limit(self.limit).get())?;
        println!("{}", count);
        Ok(())
    }
}
