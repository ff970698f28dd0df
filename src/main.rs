pub mod chord;
pub mod config;
pub mod device;
pub mod engine;
pub mod mode;

use crate::chord::{AxisNormalizer, MappingTable};
use crate::config::Config;
use crate::device::{EvdevSource, UinputEmitter};
use crate::engine::ChordEngine;
use crate::mode::ModeController;
use color_eyre::Result;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = Config::load()?;

    info!("Building chord mapping table");
    let table = MappingTable::default_table();

    let emitter = UinputEmitter::create(&config.device.output_name, &table.registered_codes())?;
    let source = EvdevSource::open(config.device.input_path.as_deref())?;

    let engine = ChordEngine::create(
        source,
        Box::new(emitter),
        table,
        AxisNormalizer::new(config.axis),
        ModeController::new(config.toggle_key()),
    )
    .initialize();

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                signal_cancel.cancel();
                return;
            }
        };
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => info!("Received Ctrl-C, shutting down"),
                Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
            },
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
        }
        signal_cancel.cancel();
    });

    engine.run(cancel).await?;

    info!("Shutdown complete");
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
