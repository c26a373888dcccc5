use std::num::NonZeroUsize;

use clap::{Parser, Subcommand};
use image::imageops::FilterType;

use crate::cli::*;
use crate::store::{Capacity, DEFAULT_BYTES_PER_ITEM, WriteOptions};

#[derive(Parser, Debug, Clone)]
#[command(name = "lmdbimg", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 显示数据库的记录数、形状和标签分布
    Info(InfoCommand),
    /// 将数据库导出为 <DEST>/<label>/<key>.jpg
    Export(ExportCommand),
    /// 缩放数据库中的所有图片，生成新的数据库
    Resize(ResizeCommand),
    /// 复制数据库中的记录到新的数据库
    Copy(CopyCommand),
    /// 从 <SRC>/<label>/ 目录结构中的图片生成数据库
    Ingest(IngestCommand),
}

/// 新建数据库时的选项
#[derive(Parser, Debug, Clone)]
pub struct StoreOptions {
    /// 为每条记录预留的字节数，预留不足会导致写入失败
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_BYTES_PER_ITEM)]
    pub bytes_per_item: u64,
    /// 每写入多少条记录提交一次，默认全部写完后提交
    #[arg(long, value_name = "N")]
    pub commit_every: Option<NonZeroUsize>,
    /// 目标数据库已存在时删除后重建
    #[arg(long)]
    pub overwrite: bool,
}

impl From<&StoreOptions> for WriteOptions {
    fn from(opts: &StoreOptions) -> Self {
        Self {
            capacity: Capacity::new(opts.bytes_per_item),
            commit_every: opts.commit_every,
            overwrite: opts.overwrite,
        }
    }
}

/// 数量上限，未指定时处理全部记录
pub fn item_limit(limit: Option<NonZeroUsize>) -> NonZeroUsize {
    limit.unwrap_or(NonZeroUsize::MAX)
}

pub fn parse_filter(s: &str) -> Result<FilterType, String> {
    match s {
        "nearest" => Ok(FilterType::Nearest),
        "triangle" | "bilinear" => Ok(FilterType::Triangle),
        "catmull-rom" | "bicubic" => Ok(FilterType::CatmullRom),
        "gaussian" => Ok(FilterType::Gaussian),
        "lanczos3" => Ok(FilterType::Lanczos3),
        _ => Err(format!("无效的插值方式: {}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(parse_filter("nearest"), Ok(FilterType::Nearest));
        assert_eq!(parse_filter("bilinear"), Ok(FilterType::Triangle));
        assert!(parse_filter("area").is_err());
    }

    #[test]
    fn test_parse_resize() {
        let opts = Opts::parse_from([
            "lmdbimg", "resize", "src", "dst", "-W", "64", "-H", "48", "-n", "500",
            "--filter", "triangle", "--bytes-per-item", "4096",
        ]);
        let SubCommand::Resize(cmd) = opts.subcmd else { panic!("expected resize") };
        assert_eq!((cmd.width, cmd.height), (64, 48));
        assert_eq!(cmd.limit, NonZeroUsize::new(500));
        assert_eq!(cmd.filter, FilterType::Triangle);
        let options = WriteOptions::from(&cmd.store);
        assert_eq!(options.capacity, Capacity::new(4096));
        assert!(!options.overwrite);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let result = Opts::try_parse_from(["lmdbimg", "copy", "src", "dst", "-n", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_size_rejected() {
        for size in [["-W", "0", "-H", "8"], ["-W", "8", "-H", "0"]] {
            let args = ["lmdbimg", "resize", "src", "dst"].into_iter().chain(size);
            assert!(Opts::try_parse_from(args).is_err());
        }
    }

    #[test]
    fn test_item_limit() {
        assert_eq!(item_limit(None), NonZeroUsize::MAX);
        assert_eq!(item_limit(NonZeroUsize::new(3)).get(), 3);
    }
}
