use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use regex::Regex;

use crate::cli::SubCommandExtend;
use crate::config::{Opts, StoreOptions};
use crate::ingest::ingest_dir;
use crate::store::WriteOptions;

#[derive(Parser, Debug, Clone)]
pub struct IngestCommand {
    #[command(flatten)]
    pub store: StoreOptions,
    /// 图片目录，结构为 <SRC>/<label>/xxx.jpg，label 必须是整数
    pub src: PathBuf,
    /// 新数据库路径
    pub dest: PathBuf,
    /// 扫描的文件后缀名，多个后缀用逗号分隔
    #[arg(short, long, default_value = "jpg,jpeg,png")]
    pub suffix: String,
}

impl SubCommandExtend for IngestCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        let re_suf = format!("(?i)^({})$", self.suffix.replace(',', "|"));
        let re_suf = Regex::new(&re_suf).context("invalid suffix")?;
        let options = WriteOptions::from(&self.store);
        let count = ingest_dir(&self.src, &self.dest, &re_suf, &options)?;
        println!("{}", count);
        Ok(())
    }
}
