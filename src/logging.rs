//! Logger initialization.

use crate::error::InitializationError;
use log::LevelFilter;
use std::fs::File;
use std::path::Path;

/// Initializes `env_logger`.
///
/// `RUST_LOG` is read first and `level` overrides it. With `log_file` set,
/// records go to that file instead of stderr, which the terminal UI owns.
pub fn init_logger(level: LevelFilter, log_file: Option<&Path>) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    builder.filter_module("reqwest", LevelFilter::Info.min(level));
    builder.filter_module("hyper", LevelFilter::Info.min(level));
    builder.filter_module("hyper_util", LevelFilter::Info.min(level));

    if let Some(path) = log_file {
        let file = File::create(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
        builder.write_style(env_logger::WriteStyle::Never);
    }

    builder.try_init()?;
    Ok(())
}
