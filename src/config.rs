//! Session configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cursor::InsertFrontPolicy;
use crate::error::{Result, SessionError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Cyclic next/prev. When false the cursor sticks at either end.
    #[serde(default = "default_true")]
    pub wrap_around: bool,

    /// Start auto-advance at construction with this interval.
    #[serde(default)]
    pub auto_advance_interval_ms: Option<u64>,

    /// Counters every item gets, base 0 unless the item supplies one.
    #[serde(default = "default_counter_names")]
    pub counter_names: Vec<String>,

    #[serde(default)]
    pub insert_front_policy: InsertFrontPolicy,

    /// Manual navigation restarts the auto-advance countdown.
    #[serde(default = "default_true")]
    pub restart_auto_advance_on_navigate: bool,

    /// Settled tasks are swept this long after settling. `None` keeps them.
    #[serde(default = "default_task_retention_ms")]
    pub task_retention_ms: Option<u64>,

    /// Seed for candidate selection.
    #[serde(default)]
    pub seed: u64,
}

fn default_true() -> bool {
    true
}

fn default_counter_names() -> Vec<String> {
    vec!["likes".to_string(), "bookmarks".to_string()]
}

fn default_task_retention_ms() -> Option<u64> {
    Some(60_000)
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            wrap_around: true,
            auto_advance_interval_ms: None,
            counter_names: default_counter_names(),
            insert_front_policy: InsertFrontPolicy::default(),
            restart_auto_advance_on_navigate: true,
            task_retention_ms: default_task_retention_ms(),
            seed: 0,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|err| SessionError::Config(format!("{}: {err}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auto_advance_interval_ms == Some(0) {
            return Err(SessionError::InvalidInterval);
        }
        Ok(())
    }

    pub fn with_wrap_around(mut self, wrap_around: bool) -> Self {
        self.wrap_around = wrap_around;
        self
    }

    pub fn with_auto_advance(mut self, interval_ms: u64) -> Self {
        self.auto_advance_interval_ms = Some(interval_ms);
        self
    }

    pub fn with_counter_names<S>(mut self, names: impl IntoIterator<Item = S>) -> Self
    where
        S: Into<String>,
    {
        self.counter_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_insert_front_policy(mut self, policy: InsertFrontPolicy) -> Self {
        self.insert_front_policy = policy;
        self
    }

    /// Whether manual navigation starts a fresh auto-advance interval.
    pub fn with_restart_on_navigate(mut self, restart: bool) -> Self {
        self.restart_auto_advance_on_navigate = restart;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
