use std::path::PathBuf;

use clap::{Parser, Subcommand};
use greeter_common::{
    config::{
        DEFAULT_GREETING_NAME, DEFAULT_LEDGER_DIR, DEFAULT_LOGS_PATH, DEFAULT_LOG_FILENAME,
        DEFAULT_MIN_FUNDING, HELLO_WORLD_APP_NAME, VERSION,
    },
    greeting::GreetingMode,
    logger::{default_logs_datetime_format, LogLevel, LoggerOptions, ModuleConfig},
    network::Network,
};
use serde::{Deserialize, Serialize};

// Functions Helpers
fn default_log_filename() -> String {
    String::from(DEFAULT_LOG_FILENAME)
}

fn default_logs_path() -> String {
    String::from(DEFAULT_LOGS_PATH)
}

fn default_ledger_dir() -> String {
    String::from(DEFAULT_LEDGER_DIR)
}

fn default_app_name() -> String {
    String::from(HELLO_WORLD_APP_NAME)
}

fn default_min_funding() -> u64 {
    DEFAULT_MIN_FUNDING
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct LogConfig {
    /// Set log level
    #[clap(long, value_enum, default_value_t)]
    #[serde(default)]
    pub log_level: LogLevel,
    /// Set file log level
    /// By default, it will be the same as log level
    #[clap(long, value_enum)]
    pub file_log_level: Option<LogLevel>,
    /// Enable the log file
    #[clap(long)]
    #[serde(default)]
    pub enable_file_logging: bool,
    /// Disable the usage of colors in log
    #[clap(long)]
    #[serde(default)]
    pub disable_log_color: bool,
    /// Log filename
    ///
    /// File will be stored in logs directory, this is only the filename, not the full path.
    #[clap(long, default_value_t = default_log_filename())]
    #[serde(default = "default_log_filename")]
    pub filename_log: String,
    /// Logs directory
    #[clap(long, default_value_t = default_logs_path())]
    #[serde(default = "default_logs_path")]
    pub logs_path: String,
    /// Module configuration for logs, as module=level
    #[clap(long)]
    #[serde(default)]
    pub logs_modules: Vec<ModuleConfig>,
    /// Change the datetime format used by the logger
    #[clap(long, default_value_t = default_logs_datetime_format())]
    #[serde(default = "default_logs_datetime_format")]
    pub datetime_format: String,
}

impl LogConfig {
    pub fn logger_options(&self) -> LoggerOptions {
        LoggerOptions {
            level: self.log_level,
            file_level: self.file_log_level.unwrap_or(self.log_level),
            file: self
                .enable_file_logging
                .then(|| PathBuf::from(&self.logs_path).join(&self.filename_log)),
            color: !self.disable_log_color,
            modules: self.logs_modules.clone(),
            datetime_format: self.datetime_format.clone(),
        }
    }
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Network selected for the ledger
    #[clap(long, value_enum, default_value_t = Network::Localnet)]
    #[serde(default)]
    pub network: Network,
    /// Directory holding one ledger file per network
    #[clap(long, default_value_t = default_ledger_dir())]
    #[serde(default = "default_ledger_dir")]
    pub ledger_dir: String,
}

impl LedgerConfig {
    /// Ledger file of the selected network
    pub fn ledger_path(&self) -> PathBuf {
        PathBuf::from(&self.ledger_dir).join(self.network.ledger_file_name())
    }
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name used to find an existing deployment
    #[clap(long, default_value_t = default_app_name())]
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Greeting storage scheme of the application
    #[clap(long, value_enum, default_value_t)]
    #[serde(default)]
    pub greeting_mode: GreetingMode,
    /// Balance kept on the application account to pay for its boxes
    #[clap(long, default_value_t = default_min_funding())]
    #[serde(default = "default_min_funding")]
    pub min_funding: u64,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Deploy (or reuse) the application, top up its funding and send two greetings
    Deploy,
    /// Call hello on the application
    Call {
        /// Name to greet
        #[clap(default_value = DEFAULT_GREETING_NAME)]
        name: String,
    },
    /// List the greetings stored in the application boxes
    Boxes,
    /// Show the application greeting counter
    Counter,
}

impl Default for Command {
    fn default() -> Self {
        Command::Call {
            name: DEFAULT_GREETING_NAME.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[clap(version = VERSION, about = "Greeter: deploy and call the HelloWorld greeting application")]
#[command(styles = greeter_common::get_cli_styles())]
pub struct Config {
    /// Ledger configuration
    #[structopt(flatten)]
    pub ledger: LedgerConfig,
    /// Application configuration
    #[structopt(flatten)]
    pub app: AppConfig,
    /// Log configuration
    #[structopt(flatten)]
    pub log: LogConfig,
    /// JSON File to load the configuration from
    #[clap(long)]
    #[serde(skip)]
    #[serde(default)]
    pub config_file: Option<String>,
    /// Generate the template at the `config_file` path
    #[clap(long)]
    #[serde(skip)]
    #[serde(default)]
    pub generate_config_template: bool,
    /// Action to run, calls hello with the default name when omitted
    #[command(subcommand)]
    #[serde(skip)]
    #[serde(default)]
    pub command: Option<Command>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["greeter"]);
        assert_eq!(config.ledger.network, Network::Localnet);
        assert_eq!(config.ledger.ledger_path(), PathBuf::from("ledger/localnet.json"));
        assert_eq!(config.app.app_name, HELLO_WORLD_APP_NAME);
        assert_eq!(config.app.greeting_mode, GreetingMode::CounterKeyed);
        assert_eq!(config.app.min_funding, DEFAULT_MIN_FUNDING);
        assert!(config.command.is_none());
        assert!(config.log.logger_options().file.is_none());
    }

    #[test]
    fn test_call_with_network() {
        let config = Config::parse_from(["greeter", "--network", "testnet", "call", "Bob"]);
        assert_eq!(config.ledger.ledger_path(), PathBuf::from("ledger/testnet.json"));
        match config.command {
            Some(Command::Call { name }) => assert_eq!(name, "Bob"),
            other => panic!("unexpected command: {:?}", other),
        }

        let config = Config::parse_from(["greeter", "call"]);
        match config.command {
            Some(Command::Call { name }) => assert_eq!(name, DEFAULT_GREETING_NAME),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_config_file_roundtrip() {
        let config = Config::parse_from([
            "greeter",
            "--greeting-mode",
            "fixed-key",
            "--logs-modules",
            "greeter_common=debug",
            "deploy",
        ]);
        let json = serde_json::to_string(&config).unwrap();
        let loaded: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded.app.greeting_mode, GreetingMode::FixedKey);
        assert_eq!(loaded.log.logs_modules[0].level, LogLevel::Debug);
        // The command only ever comes from the command line
        assert!(loaded.command.is_none());
    }

    #[test]
    fn test_partial_config_file() {
        let loaded: Config =
            serde_json::from_str(r#"{"ledger": {"network": "testnet"}, "app": {}, "log": {}}"#)
                .unwrap();
        assert_eq!(loaded.ledger.network, Network::Testnet);
        assert_eq!(loaded.ledger.ledger_dir, DEFAULT_LEDGER_DIR);
        assert_eq!(loaded.app.min_funding, DEFAULT_MIN_FUNDING);
        assert_eq!(loaded.log.filename_log, DEFAULT_LOG_FILENAME);
    }
}
