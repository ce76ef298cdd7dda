use crate::settings::CalcSettings;
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;

/// Sets up terminal logging and, when `log_file` is configured, a copy of the log in that file.
/// Returns false if a logger was already installed
pub fn init_logger(settings: &CalcSettings) -> bool {
    let level = settings.level_filter();
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = &settings.log_file {
        match File::create(path) {
            Ok(file) => loggers.push(WriteLogger::new(level, Config::default(), file)),
            Err(e) => eprintln!("cannot create log file '{}': {}", path, e),
        }
    }
    CombinedLogger::init(loggers).is_ok()
}
