mod args;
mod atlas;

use clap::Parser;
use log::{debug, error, LevelFilter};
use snafu::ErrorCompat;

use crate::args::{Args, Command};
use crate::atlas::*;

fn run(args: &Args) -> AtlasResult<()> {
    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => AtlasConfig::default(),
    };
    debug!("run: config: {:?}", config);

    match &args.command {
        Command::Load {
            boundary,
            csv,
            year,
            store,
        } => run_load(&config, boundary, csv, *year, store.as_deref()),
        Command::Export { year, out, store } => run_export(&config, *year, out, store.as_deref()),
        Command::Script { year, out, store } => run_script(&config, *year, out, store.as_deref()),
        Command::Summary {
            year,
            store,
            reference,
        } => run_summary(&config, *year, store.as_deref(), reference.as_deref()),
        Command::Info { store } => run_info(&config, store.as_deref()),
    }
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();

    if let Err(e) = run(&args) {
        error!("{:?}", e);
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
