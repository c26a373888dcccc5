use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::inspect::{StoreSummary, inspect};
use crate::utils::format_shape;

#[derive(Parser, Debug, Clone)]
pub struct InfoCommand {
    /// 数据库路径
    pub store: PathBuf,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for InfoCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        let summary = inspect(&self.store)?;
        print_summary(&summary, self.output_format)
    }
}

fn print_summary(summary: &StoreSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?)
        }
        OutputFormat::Table => {
            println!("count\t{}", summary.count);
            println!("shape\t{}", format_shape(summary.shape));
            for (label, count) in &summary.labels {
                println!("label {}\t{}", label, count);
            }
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Table,
}
