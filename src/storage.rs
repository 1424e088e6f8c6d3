use crate::config::Config;
use crate::models::{StreakDocument, StreakState};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::StatusCode;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::{fs, sync::Mutex};
use tracing::{error, info, warn};

pub const STREAK_KEY: &str = "streak";
pub const LAST_DATE_KEY: &str = "lastDate";
pub const CHECKED_IN_DATES_KEY: &str = "checkedInDates";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("local store io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed store data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("remote store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote store answered {0}")]
    Status(StatusCode),
}

/// On-device string key-value store.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Per-user document store. `fetch` yields `None` when the user has no
/// document yet; `store` replaces the whole document.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch(&self, user_id: &str) -> Result<Option<StreakDocument>, StoreError>;
    async fn store(&self, user_id: &str, document: &StreakDocument) -> Result<(), StoreError>;
}

pub trait UserIdProvider: Send + Sync {
    fn user_id(&self) -> String;
}

pub struct StaticUserId(String);

impl StaticUserId {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self(user_id.into())
    }
}

impl UserIdProvider for StaticUserId {
    fn user_id(&self) -> String {
        self.0.clone()
    }
}

/// Local store backed by a single JSON object file.
pub struct FileLocalStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileLocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl LocalStore for FileLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_entries().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = match self.read_entries().await {
            Ok(entries) => entries,
            Err(StoreError::Json(err)) => {
                warn!("discarding unreadable local store {}: {err}", self.path.display());
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        entries.insert(key.to_string(), value.to_string());
        let payload = serde_json::to_vec_pretty(&entries)?;
        fs::write(&self.path, payload).await?;
        Ok(())
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryLocalStore {
    entries: Mutex<BTreeMap<String, String>>,
}

#[cfg(test)]
impl MemoryLocalStore {
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Document store reached over HTTP at `{base_url}/streaks/{user_id}`.
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn document_url(&self, user_id: &str) -> String {
        format!("{}/streaks/{user_id}", self.base_url)
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch(&self, user_id: &str) -> Result<Option<StreakDocument>, StoreError> {
        let response = self.client.get(self.document_url(user_id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StoreError::Status(response.status()));
        }
        Ok(Some(response.json().await?))
    }

    async fn store(&self, user_id: &str, document: &StreakDocument) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.document_url(user_id))
            .json(document)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StoreError::Status(response.status()));
        }
        Ok(())
    }
}

/// Reads and writes the streak fields. The remote document wins on read
/// when it exists; the local store is always written so it can serve as
/// the fallback. Neither operation fails outward.
pub struct StreakStore {
    local: Arc<dyn LocalStore>,
    remote: Option<Arc<dyn RemoteStore>>,
    user: Arc<dyn UserIdProvider>,
}

impl StreakStore {
    pub fn new(
        local: Arc<dyn LocalStore>,
        remote: Option<Arc<dyn RemoteStore>>,
        user: Arc<dyn UserIdProvider>,
    ) -> Self {
        Self { local, remote, user }
    }

    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let remote: Option<Arc<dyn RemoteStore>> = match &config.remote_store_url {
            Some(url) => {
                info!("mirroring streak to remote store at {url}");
                Some(Arc::new(HttpRemoteStore::new(url, config.remote_timeout)?))
            }
            None => None,
        };

        Ok(Self::new(
            Arc::new(FileLocalStore::new(config.data_path.clone())),
            remote,
            Arc::new(StaticUserId::new(config.user_id.clone())),
        ))
    }

    pub async fn load(&self) -> StreakState {
        if let Some(remote) = &self.remote {
            let user_id = self.user.user_id();
            match remote.fetch(&user_id).await {
                Ok(Some(document)) => {
                    self.write_local(&document).await;
                    return state_from_document(&document);
                }
                Ok(None) => info!("no remote streak for {user_id}, using local store"),
                Err(err) => warn!("failed to load streak from remote store: {err}"),
            }
        }

        self.load_local().await
    }

    pub async fn save(&self, count: u32, checked_in_dates: &[String], last_date_iso: &str) {
        let document = StreakDocument {
            streak: count,
            last_date: Some(last_date_iso.to_string()),
            checked_in_dates: checked_in_dates.to_vec(),
        };

        if let Some(remote) = &self.remote {
            if let Err(err) = remote.store(&self.user.user_id(), &document).await {
                error!("failed to save streak to remote store: {err}");
            }
        }

        self.write_local(&document).await;
    }

    async fn load_local(&self) -> StreakState {
        let count = self
            .local_value(STREAK_KEY)
            .await
            .and_then(|value| value.trim().parse::<u32>().ok())
            .unwrap_or_default();
        let last_check_in = self
            .local_value(LAST_DATE_KEY)
            .await
            .and_then(|value| parse_instant(&value));
        let checked_in_dates = self
            .local_value(CHECKED_IN_DATES_KEY)
            .await
            .and_then(|value| serde_json::from_str::<Vec<String>>(&value).ok())
            .unwrap_or_default();

        StreakState {
            count,
            last_check_in,
            checked_in_dates,
        }
    }

    async fn local_value(&self, key: &str) -> Option<String> {
        match self.local.get(key).await {
            Ok(value) => value,
            Err(err) => {
                error!("failed to read {key} from local store: {err}");
                None
            }
        }
    }

    async fn write_local(&self, document: &StreakDocument) {
        let dates = match serde_json::to_string(&document.checked_in_dates) {
            Ok(dates) => dates,
            Err(err) => {
                error!("failed to encode checked-in dates: {err}");
                return;
            }
        };

        let entries = [
            (STREAK_KEY, Some(document.streak.to_string())),
            (LAST_DATE_KEY, document.last_date.clone()),
            (CHECKED_IN_DATES_KEY, Some(dates)),
        ];
        for (key, value) in entries {
            let Some(value) = value else {
                continue;
            };
            if let Err(err) = self.local.set(key, &value).await {
                error!("failed to write {key} to local store: {err}");
            }
        }
    }
}

fn state_from_document(document: &StreakDocument) -> StreakState {
    StreakState {
        count: document.streak,
        last_check_in: document.last_date.as_deref().and_then(parse_instant),
        checked_in_dates: document.checked_in_dates.clone(),
    }
}

/// Accepts an RFC 3339 instant or a bare `YYYY-MM-DD` (read as UTC midnight).
fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeRemote {
        document: Mutex<Option<StreakDocument>>,
        unreachable: bool,
        stores: AtomicUsize,
    }

    impl FakeRemote {
        fn unreachable() -> Self {
            Self {
                unreachable: true,
                ..Self::default()
            }
        }

        fn with_document(document: StreakDocument) -> Self {
            Self {
                document: Mutex::new(Some(document)),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl RemoteStore for FakeRemote {
        async fn fetch(&self, _user_id: &str) -> Result<Option<StreakDocument>, StoreError> {
            if self.unreachable {
                return Err(StoreError::Status(StatusCode::SERVICE_UNAVAILABLE));
            }
            Ok(self.document.lock().await.clone())
        }

        async fn store(&self, _user_id: &str, document: &StreakDocument) -> Result<(), StoreError> {
            self.stores.fetch_add(1, Ordering::SeqCst);
            if self.unreachable {
                return Err(StoreError::Status(StatusCode::SERVICE_UNAVAILABLE));
            }
            *self.document.lock().await = Some(document.clone());
            Ok(())
        }
    }

    fn store_with(local: Arc<MemoryLocalStore>, remote: Option<Arc<FakeRemote>>) -> StreakStore {
        StreakStore::new(
            local,
            remote.map(|remote| remote as Arc<dyn RemoteStore>),
            Arc::new(StaticUserId::new("demo-user")),
        )
    }

    #[tokio::test]
    async fn load_falls_back_to_local_when_remote_unreachable() {
        let local = Arc::new(MemoryLocalStore::with_entries([
            ("streak", "5"),
            ("checkedInDates", "[\"2024-02-01\"]"),
        ]));
        let remote = Arc::new(FakeRemote::unreachable());
        let store = store_with(local, Some(remote.clone()));

        let state = store.load().await;
        assert_eq!(state.count, 5);
        assert_eq!(state.checked_in_dates, vec!["2024-02-01"]);
        assert!(state.last_check_in.is_none());
        assert_eq!(remote.stores.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn load_prefers_remote_and_mirrors_it_locally() {
        let local = Arc::new(MemoryLocalStore::with_entries([("streak", "2")]));
        let remote = Arc::new(FakeRemote::with_document(StreakDocument {
            streak: 7,
            last_date: Some("2024-02-07T00:00:00.000Z".into()),
            checked_in_dates: vec!["2024-02-06".into(), "2024-02-07".into()],
        }));
        let store = store_with(local.clone(), Some(remote));

        let state = store.load().await;
        assert_eq!(state.count, 7);
        assert_eq!(state.checked_in_dates.len(), 2);
        assert_eq!(
            state.last_check_in.map(|last| last.date_naive().to_string()),
            Some("2024-02-07".to_string())
        );
        assert_eq!(local.get("streak").await.unwrap().as_deref(), Some("7"));
        assert_eq!(
            local.get("checkedInDates").await.unwrap().as_deref(),
            Some("[\"2024-02-06\",\"2024-02-07\"]")
        );
    }

    #[tokio::test]
    async fn partial_remote_document_is_adopted_field_by_field() {
        let document: StreakDocument =
            serde_json::from_str(r#"{"streak":3,"checkedInDates":["2024-01-01"]}"#).unwrap();
        assert_eq!(document.last_date, None);

        let local = Arc::new(MemoryLocalStore::with_entries([
            ("streak", "8"),
            ("lastDate", "2023-06-01T00:00:00.000Z"),
        ]));
        let store = store_with(local.clone(), Some(Arc::new(FakeRemote::with_document(document))));

        let state = store.load().await;
        assert_eq!(state.count, 3);
        assert_eq!(state.checked_in_dates, vec!["2024-01-01"]);
        assert!(state.last_check_in.is_none());
        assert_eq!(local.get("streak").await.unwrap().as_deref(), Some("3"));

        let empty: StreakDocument = serde_json::from_str(r#"{"lastDate":null}"#).unwrap();
        assert_eq!(empty.streak, 0);
        assert!(empty.checked_in_dates.is_empty());
    }

    #[tokio::test]
    async fn load_uses_local_when_remote_has_no_document() {
        let local = Arc::new(MemoryLocalStore::with_entries([
            ("streak", "3"),
            ("lastDate", "2024-03-03T00:00:00.000Z"),
        ]));
        let store = store_with(local, Some(Arc::new(FakeRemote::default())));

        let state = store.load().await;
        assert_eq!(state.count, 3);
        assert!(state.last_check_in.is_some());
    }

    #[tokio::test]
    async fn malformed_local_fields_default_to_zero_values() {
        let local = Arc::new(MemoryLocalStore::with_entries([
            ("streak", "many"),
            ("lastDate", "yesterday-ish"),
            ("checkedInDates", "{not json"),
        ]));
        let state = store_with(local, None).load().await;
        assert_eq!(state, StreakState::default());
    }

    #[tokio::test]
    async fn save_writes_local_even_when_remote_fails() {
        let local = Arc::new(MemoryLocalStore::default());
        let remote = Arc::new(FakeRemote::unreachable());
        let store = store_with(local.clone(), Some(remote.clone()));

        store
            .save(2, &["2024-01-10".into(), "2024-01-11".into()], "2024-01-11T00:00:00.000Z")
            .await;

        assert_eq!(remote.stores.load(Ordering::SeqCst), 1);
        assert_eq!(local.get("streak").await.unwrap().as_deref(), Some("2"));
        assert_eq!(
            local.get("lastDate").await.unwrap().as_deref(),
            Some("2024-01-11T00:00:00.000Z")
        );
    }

    #[tokio::test]
    async fn save_overwrites_the_remote_document() {
        let local = Arc::new(MemoryLocalStore::default());
        let remote = Arc::new(FakeRemote::with_document(StreakDocument {
            streak: 9,
            last_date: Some("2023-12-31T00:00:00.000Z".into()),
            checked_in_dates: vec!["2023-12-31".into()],
        }));
        let store = store_with(local, Some(remote.clone()));

        store.save(1, &["2024-01-13".into()], "2024-01-13T00:00:00.000Z").await;

        let stored = remote.document.lock().await.clone().unwrap();
        assert_eq!(stored.streak, 1);
        assert_eq!(stored.checked_in_dates, vec!["2024-01-13"]);
    }

    #[tokio::test]
    async fn file_store_round_trips_and_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::new(dir.path().join("local_store.json"));

        assert_eq!(store.get("streak").await.unwrap(), None);
        store.set("streak", "4").await.unwrap();
        store.set("lastDate", "2024-04-04T00:00:00.000Z").await.unwrap();

        let reopened = FileLocalStore::new(store.path());
        assert_eq!(reopened.get("streak").await.unwrap().as_deref(), Some("4"));
        assert!(reopened.get("lastDate").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn file_store_recovers_from_corrupt_file_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_store.json");
        fs::write(&path, b"not json").await.unwrap();
        let store = FileLocalStore::new(&path);

        assert!(store.get("streak").await.is_err());
        store.set("streak", "1").await.unwrap();
        assert_eq!(store.get("streak").await.unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn parse_instant_accepts_dates_and_instants() {
        assert!(parse_instant("2024-01-10T00:00:00.000Z").is_some());
        assert!(parse_instant("2024-01-10T05:00:00+05:00").is_some());
        assert_eq!(
            parse_instant("2024-01-10").map(|instant| instant.to_rfc3339()),
            Some("2024-01-10T00:00:00+00:00".to_string())
        );
        assert!(parse_instant("").is_none());
    }
}
