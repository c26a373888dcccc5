use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::cli::SubCommandExtend;
use crate::config::{Opts, StoreOptions, item_limit};
use crate::rebuild::{RebuildReport, rebuild};
use crate::store::WriteOptions;
use crate::transform::Identity;

#[derive(Parser, Debug, Clone)]
pub struct CopyCommand {
    #[command(flatten)]
    pub store: StoreOptions,
    /// 源数据库路径
    pub src: PathBuf,
    /// 新数据库路径
    pub dest: PathBuf,
    /// 最多复制的记录数量，默认全部复制
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub limit: Option<NonZeroUsize>,
}

impl SubCommandExtend for CopyCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        let options = WriteOptions::from(&self.store);
        let report = rebuild(&self.src, &self.dest, item_limit(self.limit), &Identity, &options)?;
        print_report(&report)
    }
}

pub(crate) fn print_report(report: &RebuildReport) -> Result<()> {
    println!("{}", serde_json::to_string(report)?);
    Ok(())
}
