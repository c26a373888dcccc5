mod copy;
mod export;
mod info;
mod ingest;
mod resize;

pub use copy::*;
pub use export::*;
pub use info::*;
pub use ingest::*;
pub use resize::*;

use crate::config::Opts;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> anyhow::Result<()>;
}
