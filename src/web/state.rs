//! Application state shared across handlers

use axum::extract::FromRef;
use cookie::Key;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::storage::Database;

/// Request-independent settings taken from [`Config`]
#[derive(Debug, Clone)]
pub struct Settings {
    pub session_ttl_hours: u32,
    pub high_risk_threshold: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_ttl_hours: 8,
            high_risk_threshold: 7.0,
        }
    }
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            session_ttl_hours: config.session_ttl_hours,
            high_risk_threshold: config.high_risk_threshold,
        }
    }
}

/// Process information for the status endpoint
pub struct RuntimeInfo {
    pub hostname: String,
    started: Instant,
}

impl RuntimeInfo {
    pub fn new() -> Self {
        Self {
            hostname: hostname::get()
                .map(|h| h.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "unknown".to_string()),
            started: Instant::now(),
        }
    }

    /// Uptime as e.g. "2h 30m 15s"
    pub fn uptime_string(&self) -> String {
        format_uptime(self.started.elapsed().as_secs())
    }
}

impl Default for RuntimeInfo {
    fn default() -> Self {
        Self::new()
    }
}

fn format_uptime(secs: u64) -> String {
    let (days, rest) = (secs / 86_400, secs % 86_400);
    let (hours, rest) = (rest / 3600, rest % 3600);
    let (minutes, seconds) = (rest / 60, rest % 60);
    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub cookie_key: Key,
    pub settings: Arc<Settings>,
    pub runtime: Arc<RuntimeInfo>,
}

impl AppState {
    pub fn new(db: Arc<Database>, cookie_key: Key, settings: Settings) -> Self {
        Self {
            db,
            cookie_key,
            settings: Arc::new(settings),
            runtime: Arc::new(RuntimeInfo::new()),
        }
    }
}

// Lets PrivateCookieJar find its key in the state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
