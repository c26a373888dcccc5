use clap::Parser;
use log::error;

use lmdbimg::Opts;
use lmdbimg::cli::SubCommandExtend;
use lmdbimg::config::SubCommand;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();
    let result = match &opts.subcmd {
        SubCommand::Info(cmd) => cmd.run(&opts),
        SubCommand::Export(cmd) => cmd.run(&opts),
        SubCommand::Resize(cmd) => cmd.run(&opts),
        SubCommand::Copy(cmd) => cmd.run(&opts),
        SubCommand::Ingest(cmd) => cmd.run(&opts),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
