//! Container self-play host.
//!
//! Seats bots at a table, plays seeded games to the end and reports the
//! results.

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod report;
mod table;

use config::{ReportFormat, SimConfig};
use report::GameReport;
use table::Table;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SimConfig::from_env()?;
    info!(?config, "Starting Container self-play...");

    let mut reports = Vec::with_capacity(config.games);
    for index in 0..config.games {
        let seed = config.game_seed(index);
        let mut table = Table::with_bots(config.players, seed)?;
        let moves = table.play_to_end(config.max_moves)?;

        for message in table.messages() {
            info!(game = index, %message);
        }
        if !table.ended() {
            warn!(game = index, moves, "move limit reached before the game ended");
        }

        // Every finished game must survive a rebuild from its seed and log
        table.replay()?;

        reports.push(GameReport::from_table(&table, moves));
    }

    match config.report {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        ReportFormat::Summary => {
            for report in &reports {
                println!("{}", report.summary());
            }
        }
    }

    Ok(())
}
