pub mod cli;
pub mod config;
pub mod datum;
pub mod error;
pub mod export;
pub mod ingest;
pub mod inspect;
pub mod layout;
pub mod rebuild;
pub mod store;
pub mod transform;
mod utils;

pub use config::Opts;
pub use datum::LabeledImage;
pub use error::{Error, Result};
pub use rebuild::{RebuildReport, rebuild};
pub use store::{Capacity, WriteOptions};
pub use transform::{Identity, Resize, Transform};
