//! Хост-мост postbox
//!
//! Читает JSON-lines команды (attach, detach, call, describe) из stdin или
//! файла и пишет события доставки и результаты вызовов в stdout. Логи
//! уходят в stderr и, по настройке, в файл.

use std::{
    fs::File,
    io::{self, BufReader},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use postbox::{
    bridge::Bridge,
    config::Settings,
    logging::init_logging,
    pubsub::{DispatchMode, SubscriptionRegistry},
};

#[derive(Parser)]
#[command(name = "postbox")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Origin-filtered publish/subscribe relay between execution contexts", long_about = None)]
struct Cli {
    /// Путь к TOML-файлу конфигурации
    #[arg(short, long, env = "POSTBOX_CONFIG", help = "Файл конфигурации (TOML)")]
    config: Option<PathBuf>,
    /// Файл с командами вместо stdin
    #[arg(short, long, help = "Читать команды из файла вместо stdin")]
    input: Option<PathBuf>,
    #[arg(long, value_enum, help = "Режим fan-out, переопределяет конфигурацию")]
    dispatch: Option<DispatchArg>,
    #[arg(short, long, help = "Уровень или директива логирования (например, 'debug')")]
    log_level: Option<String>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum DispatchArg {
    /// Блокировка реестра на всё время рассылки
    Locked,
    /// Рассылка по копии списка hub-ов
    Snapshot,
}

impl From<DispatchArg> for DispatchMode {
    fn from(arg: DispatchArg) -> Self {
        match arg {
            DispatchArg::Locked => DispatchMode::Locked,
            DispatchArg::Snapshot => DispatchMode::Snapshot,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings =
        Settings::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(dispatch) = cli.dispatch {
        settings.pubsub.dispatch = dispatch.into();
    }
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }

    let logging = init_logging(settings.logging.clone()).context("failed to initialize logging")?;
    tracing::info!(dispatch = ?settings.pubsub.dispatch, "Starting postbox bridge");

    let registry = SubscriptionRegistry::new(settings.pubsub.clone());
    let mut bridge = Bridge::new(registry.clone(), io::stdout());

    let stats = match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open input {}", path.display()))?;
            bridge.run(BufReader::new(file))?
        }
        None => bridge.run(io::stdin().lock())?,
    };

    drop(bridge);
    let detached = registry.shutdown();
    tracing::info!(
        commands = stats.commands,
        errors = stats.errors,
        detached,
        "Bridge stopped"
    );
    logging.shutdown();
    Ok(())
}
