//! Logger setup shared by the binaries
//!
//! Console output is colored unless disabled, file output is optional and
//! may use its own level. Per-module levels override both.

use std::{fs, io, path::PathBuf, str::FromStr};

use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

pub fn default_logs_datetime_format() -> String {
    String::from("[%Y-%m-%d] (%H:%M:%S%.3f)")
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Level override for one module, written `module=level`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub module: String,
    pub level: LogLevel,
}

impl FromStr for ModuleConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (module, level) = s
            .split_once('=')
            .ok_or_else(|| format!("expected module=level, got '{}'", s))?;
        if module.is_empty() {
            return Err(format!("missing module name in '{}'", s));
        }
        let level = LogLevel::from_str(level).map_err(|_| format!("invalid log level '{}'", level))?;
        Ok(Self {
            module: module.to_owned(),
            level,
        })
    }
}

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Error while creating the log file: {0}")]
    Io(#[from] io::Error),

    #[error("A logger is already installed: {0}")]
    AlreadySet(#[from] log::SetLoggerError),
}

/// Everything needed to install the logger
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub level: LogLevel,
    pub file_level: LogLevel,
    /// Log file, `None` disables file logging
    pub file: Option<PathBuf>,
    pub color: bool,
    pub modules: Vec<ModuleConfig>,
    pub datetime_format: String,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file_level: LogLevel::Info,
            file: None,
            color: true,
            modules: Vec::new(),
            datetime_format: default_logs_datetime_format(),
        }
    }
}

/// Install the global logger
pub fn setup_logger(options: &LoggerOptions) -> Result<(), LoggerError> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Cyan)
        .trace(Color::Magenta);

    let console_format = options.datetime_format.clone();
    let color = options.color;
    let console = fern::Dispatch::new()
        .level(options.level.into())
        .format(move |out, message, record| {
            let level = if color {
                colors.color(record.level()).to_string()
            } else {
                record.level().to_string()
            };
            out.finish(format_args!(
                "{} {:<5} {} > {}",
                chrono::Local::now().format(&console_format),
                level,
                record.target(),
                message
            ))
        })
        .chain(io::stdout());

    let mut dispatch = fern::Dispatch::new().chain(console);

    if let Some(path) = options.file.as_ref() {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file_format = options.datetime_format.clone();
        let file = fern::Dispatch::new()
            .level(options.file_level.into())
            .format(move |out, message, record| {
                out.finish(format_args!(
                    "{} {:<5} {} > {}",
                    chrono::Local::now().format(&file_format),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .chain(fern::log_file(path)?);
        dispatch = dispatch.chain(file);
    }

    for module in &options.modules {
        dispatch = dispatch.level_for(module.module.clone(), module.level.into());
    }

    dispatch.apply()?;
    Ok(())
}
