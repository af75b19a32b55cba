use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,

    /// Recorded as `created_by` on ledger entries written by the
    /// year-end batch.
    pub system_actor_id: u64,

    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            system_actor_id: env::var("SYSTEM_ACTOR_ID")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .unwrap(),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        }
    }
}
