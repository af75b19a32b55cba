//! Year-end carry-over batch entry point. Every other engine
//! operation is invoked by the surrounding backend through the
//! library API; this binary is the one job the engine runs on its
//! own schedule.

use chrono::{Datelike, Utc};
use dotenvy::dotenv;
use tracing::info;
use tracing_appender::rolling;

use hrm_leave::LeaveEngine;
use hrm_leave::config::Config;
use hrm_leave::db::init_db;
use hrm_leave::store::mysql::MySqlLeaveStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "year-end-carryover.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    // Default to closing out the previous calendar year.
    let target_year = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<i32>()
            .map_err(|_| anyhow::anyhow!("target year must be a number, got '{arg}'"))?,
        None => Utc::now().year() - 1,
    };

    info!(target_year, "Year-end carry-over starting...");

    let pool = init_db(&config.database_url).await;
    let engine = LeaveEngine::new(MySqlLeaveStore::new(pool));

    let result = engine.process_year(target_year, config.system_actor_id).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
