use std::time::Duration;

use chrono::Local;
use log::{debug, info};
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

use crate::active_days_scraper::{self, ActiveDaysData};
use crate::config::{AppConfig, AppConfigStore};
use crate::page_loader::PageSource;
use crate::usage_scraper::{self, UsageData};

// Two refresh-now requests closer than this serve the cache instead.
const REFRESH_MIN_GAP: Duration = Duration::from_secs(5);
const ACTIVE_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
const LOGIN_WAIT_TIMEOUT: Duration = Duration::from_secs(120);
const LOGIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct ServiceState {
    current_usage: Option<UsageData>,
    last_update: Option<Instant>,
    is_refreshing: bool,
    is_resizing: bool,
    current_active: Option<ActiveDaysData>,
    last_active_update: Option<Instant>,
}

/// The cache/refresh controller. Owns every piece of mutable state behind
/// one mutex and answers the boundary requests of the presentation layer.
/// The lock is never held across a page fetch.
pub struct UsageService<S: PageSource> {
    source: S,
    config_store: AppConfigStore,
    state: Mutex<ServiceState>,
}

impl<S: PageSource> UsageService<S> {
    pub fn new(source: S, config_store: AppConfigStore) -> Self {
        Self {
            source,
            config_store,
            state: Mutex::new(ServiceState::default()),
        }
    }

    /// Cached usage if any, else one fetch attempt. The cache has no TTL:
    /// stale data beats no data until an explicit refresh replaces it.
    pub async fn get_usage_data(&self) -> Option<UsageData> {
        if let Some(usage) = self.state.lock().await.current_usage.clone() {
            return Some(usage);
        }
        let fetched = self.fetch_usage().await;
        let mut state = self.state.lock().await;
        if let Some(usage) = fetched {
            state.current_usage = Some(usage);
            state.last_update = Some(Instant::now());
        }
        state.current_usage.clone()
    }

    /// On-demand refresh, guarded: skipped while another refresh or a window
    /// resize is in flight, and throttled to once per 5 seconds.
    pub async fn refresh_now(&self) -> Option<UsageData> {
        {
            let mut state = self.state.lock().await;
            if state.is_refreshing || state.is_resizing {
                return state.current_usage.clone();
            }
            if state.current_usage.is_some()
                && state.last_update.is_some_and(|at| at.elapsed() < REFRESH_MIN_GAP)
            {
                return state.current_usage.clone();
            }
            state.is_refreshing = true;
        }

        let fetched = self.fetch_usage().await;
        let mut state = self.state.lock().await;
        if let Some(usage) = fetched {
            state.current_usage = Some(usage);
            state.last_update = Some(Instant::now());
        }
        state.is_refreshing = false;
        state.current_usage.clone()
    }

    /// Cached activity data while younger than an hour, else a fresh fetch.
    pub async fn get_active_days(&self) -> Option<ActiveDaysData> {
        {
            let state = self.state.lock().await;
            if state.current_active.is_some()
                && state
                    .last_active_update
                    .is_some_and(|at| at.elapsed() < ACTIVE_CACHE_TTL)
            {
                return state.current_active.clone();
            }
        }
        let fetched = self.fetch_active_days().await;
        let mut state = self.state.lock().await;
        if let Some(active) = fetched {
            state.current_active = Some(active);
            state.last_active_update = Some(Instant::now());
        }
        state.current_active.clone()
    }

    /// Unconditional activity refresh. A failed fetch leaves the previous
    /// cache and its age untouched.
    pub async fn refresh_active_days(&self) -> Option<ActiveDaysData> {
        let fetched = self.fetch_active_days().await;
        let mut state = self.state.lock().await;
        if let Some(active) = fetched {
            state.current_active = Some(active);
            state.last_active_update = Some(Instant::now());
        }
        state.current_active.clone()
    }

    /// Login wait: polls the usage page once a second for up to two minutes,
    /// succeeding as soon as extraction yields a non-empty item list. The
    /// activity board is captured opportunistically on the way out; it never
    /// gates success.
    pub async fn reset_login(&self) -> bool {
        let started = Instant::now();
        while started.elapsed() < LOGIN_WAIT_TIMEOUT {
            if let Some(usage) = self.fetch_usage().await {
                if !usage.items.is_empty() {
                    info!("login wait: usage extracted, session is live");
                    {
                        let mut state = self.state.lock().await;
                        state.current_usage = Some(usage);
                        state.last_update = Some(Instant::now());
                    }
                    if let Some(active) = self.fetch_active_days().await {
                        if !active.cells.is_empty() {
                            let mut state = self.state.lock().await;
                            state.current_active = Some(active);
                            state.last_active_update = Some(Instant::now());
                        }
                    }
                    return true;
                }
            }
            sleep(LOGIN_POLL_INTERVAL).await;
        }
        debug!("login wait: timed out without extractable usage");
        false
    }

    /// There is no auth-challenge channel; a populated cache is the only
    /// evidence of a live session.
    pub async fn get_login_status(&self) -> bool {
        let state = self.state.lock().await;
        state.current_usage.is_some() || state.current_active.is_some()
    }

    pub async fn set_resizing(&self, flag: bool) {
        self.state.lock().await.is_resizing = flag;
    }

    pub fn get_config(&self) -> AppConfig {
        self.config_store.load()
    }

    pub fn update_refresh_interval(&self, seconds: u64) -> AppConfig {
        self.config_store.update_refresh_interval(seconds)
    }

    async fn fetch_usage(&self) -> Option<UsageData> {
        let snapshot = self.source.load_usage_page().await?;
        usage_scraper::extract_usage(&snapshot)
    }

    async fn fetch_active_days(&self) -> Option<ActiveDaysData> {
        let snapshot = self.source.load_activity_page().await?;
        active_days_scraper::extract_active_days(&snapshot, Local::now().date_naive())
    }
}
