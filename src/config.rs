use std::{env, path::PathBuf, time::Duration};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/local_store.json";
const DEFAULT_USER_ID: &str = "demo-user";
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub remote_store_url: Option<String>,
    pub user_id: String,
    pub remote_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            port: non_empty("PORT")
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT),
            data_path: non_empty("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            remote_store_url: non_empty("REMOTE_STORE_URL"),
            user_id: non_empty("STREAK_USER_ID").unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            remote_timeout: Duration::from_secs(
                non_empty("REMOTE_TIMEOUT_SECS")
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_REMOTE_TIMEOUT_SECS),
            ),
        }
    }
}
