use std::{fs::File, io::Write, path::Path};

use anyhow::{Context, Result};
use clap::Parser;
use greeter_client::{
    caller::{call_hello, list_greetings},
    config::{Command, Config},
    deploy::{deploy, ensure_app, top_up},
};
use greeter_common::{
    config::VERSION,
    ledger::{read_counter, LocalLedger},
    logger::setup_logger,
};
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    let mut config: Config = Config::parse();
    if let Some(path) = config.config_file.as_ref() {
        if config.generate_config_template {
            if Path::new(path).exists() {
                eprintln!("Config file already exists at {}", path);
                return Ok(());
            }

            let mut file = File::create(path).context("Error while creating config file")?;
            let json = serde_json::to_string_pretty(&config)
                .context("Error while serializing config file")?;
            file.write_all(json.as_bytes())
                .context("Error while writing config file")?;
            println!("Config file template generated at {}", path);
            return Ok(());
        }

        // The command always comes from the command line
        let command = config.command.take();
        let file = File::open(path).context("Error while opening config file")?;
        config = serde_json::from_reader(file).context("Error while reading config file")?;
        config.command = command;
    } else if config.generate_config_template {
        eprintln!(
            "Provided config file path is required to generate the template with --config-file"
        );
        return Ok(());
    }

    setup_logger(&config.log.logger_options()).context("Error while setting up the logger")?;
    info!("Greeter v{}", VERSION);

    let ledger_path = config.ledger.ledger_path();
    info!("Using {} ledger at {}", config.ledger.network, ledger_path.display());
    let ledger = LocalLedger::open(&ledger_path).context("Error while opening the ledger")?;

    match config.command.take().unwrap_or_default() {
        Command::Deploy => {
            let report = deploy(&ledger, &config.app).await?;
            info!(
                "Deployment of app {} done ({}), {} greetings sent",
                report.app_id,
                report.operation,
                report.greetings.len()
            );
        }
        Command::Call { name } => {
            let (app_id, _) = ensure_app(&ledger, &config.app).await?;
            top_up(&ledger, app_id, config.app.min_funding).await?;
            let report = call_hello(&ledger, app_id, config.app.greeting_mode, &name).await?;
            info!("{}", report.greeting);
        }
        Command::Boxes => {
            let (app_id, _) = ensure_app(&ledger, &config.app).await?;
            let greetings = list_greetings(&ledger, app_id).await?;
            info!("App {} holds {} boxes", app_id, greetings.len());
            for greeting in greetings {
                match (greeting.name, greeting.counter) {
                    (Some(name), Some(counter)) => {
                        info!("{} [{} #{}] {}", greeting.key, name, counter, greeting.value)
                    }
                    _ => info!("{} {}", greeting.key, greeting.value),
                }
            }
        }
        Command::Counter => {
            let (app_id, _) = ensure_app(&ledger, &config.app).await?;
            let counter = read_counter(&ledger, app_id).await?;
            info!("App {} greeting counter: {}", app_id, counter);
        }
    }

    Ok(())
}
