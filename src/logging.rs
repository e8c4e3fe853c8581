//! Logging setup.
//!
//! Uses `log4rs.yml` from the working directory when present, otherwise a
//! stderr appender whose level follows `-v` / `-q`.

use crate::error::{Error, Result};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

pub const LOG_CONFIG_FILE: &str = "log4rs.yml";
const PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%S%.3f)} {h({l:<5})} {t} - {m}{n}";

pub fn level_for(verbose: bool, quiet: bool) -> LevelFilter {
    match (verbose, quiet) {
        (true, _) => LevelFilter::Debug,
        (false, true) => LevelFilter::Error,
        (false, false) => LevelFilter::Warn,
    }
}

pub fn build_config(level: LevelFilter) -> Result<Config> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();

    Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|e| Error::config(format!("Error building log config: {e}")))
}

pub fn init_logger(verbose: bool, quiet: bool) -> Result<()> {
    if Path::new(LOG_CONFIG_FILE).exists() {
        return log4rs::init_file(LOG_CONFIG_FILE, Default::default())
            .map_err(|e| Error::config(format!("Error initializing log4rs: {e}")));
    }
    let config = build_config(level_for(verbose, quiet))?;
    log4rs::init_config(config)
        .map(|_| ())
        .map_err(|e| Error::config(format!("Error initializing log4rs: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(false, false), LevelFilter::Warn);
        assert_eq!(level_for(true, false), LevelFilter::Debug);
        assert_eq!(level_for(false, true), LevelFilter::Error);
        assert_eq!(level_for(true, true), LevelFilter::Debug);
    }

    #[test]
    fn test_build_config() {
        let config = build_config(LevelFilter::Info).unwrap();
        assert_eq!(config.root().level(), LevelFilter::Info);
        assert_eq!(config.appenders().len(), 1);
    }
}
