// Fedideck - A multi-column Mastodon desktop client
// Copyright (C) 2025 Fedideck Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Configuration
//!
//! Process settings come from the environment; user preferences live in the
//! settings store under `prefs.<name>` keys.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::error::{CoreError, CoreResult};
use crate::store::SettingsStore;

#[cfg(windows)]
const DEFAULT_SOCKET: &str = r"\\.\pipe\fedideck_ipc";

#[cfg(not(windows))]
const DEFAULT_SOCKET: &str = "/tmp/fedideck_ipc.sock";

const DEFAULT_TICK_MS: u64 = 5000;

/// Key prefix of preference settings
pub const PREFS_PREFIX: &str = "prefs.";

/// Key prefix of opaque UI state (window geometry and such)
pub const UI_PREFIX: &str = "ui.";

/// Process configuration
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Unix socket path or Windows pipe name
    pub socket_path: String,
    pub data_dir: PathBuf,
    /// How often queued content is drained into the columns
    pub tick: Duration,
}

impl CoreConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let get_var = |key: &str| vars.get(key).map(String::as_str).filter(|v| !v.is_empty());

        let data_dir = match get_var("FEDIDECK_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir(),
        };

        let tick_ms: u64 = get_var("FEDIDECK_TICK_MS")
            .map(|s| s.parse().context("Invalid FEDIDECK_TICK_MS value"))
            .transpose()?
            .unwrap_or(DEFAULT_TICK_MS);

        Ok(Self {
            socket_path: get_var("FEDIDECK_SOCKET").unwrap_or(DEFAULT_SOCKET).to_string(),
            data_dir,
            tick: Duration::from_millis(tick_ms.max(100)),
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("settings.db")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// `<data_local_dir>/Fedideck`
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Fedideck")
}

/// API flavour of an instance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSet {
    #[default]
    Mainline,
    Fedibird,
    Pleroma,
}

impl FeatureSet {
    pub fn name(&self) -> &'static str {
        match self {
            FeatureSet::Mainline => "mainline",
            FeatureSet::Fedibird => "fedibird",
            FeatureSet::Pleroma => "pleroma",
        }
    }

    /// Unknown names fall back to mainline
    pub fn from_name(name: &str) -> Self {
        match name {
            "fedibird" => FeatureSet::Fedibird,
            "pleroma" => FeatureSet::Pleroma,
            _ => FeatureSet::Mainline,
        }
    }
}

/// User preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    /// Default for new accounts
    pub feature_set: FeatureSet,
    pub max_timeline_length: usize,
    pub expand_spoilers: bool,
    pub show_media_policy: String,
    pub theme: String,
    pub layout: String,
    pub minimize_to_tray: bool,
    pub preferred_post_language: String,
    pub preferred_post_visibility: String,
    pub refresh_interval_secs: u64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            feature_set: FeatureSet::Mainline,
            max_timeline_length: 50,
            expand_spoilers: true,
            show_media_policy: "show".to_string(),
            theme: "light".to_string(),
            layout: "default".to_string(),
            minimize_to_tray: true,
            preferred_post_language: "en".to_string(),
            preferred_post_visibility: "public".to_string(),
            refresh_interval_secs: 60,
        }
    }
}

impl Preferences {
    /// Load from the store. Missing or unusable values keep their defaults.
    pub async fn load(store: &SettingsStore) -> CoreResult<Self> {
        let stored = store.get_settings_with_prefix(PREFS_PREFIX).await?;
        let mut prefs = Self::default();

        for (key, raw) in stored {
            let name = &key[PREFS_PREFIX.len()..];
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw.clone()));
            if let Err(e) = prefs.apply(name, value) {
                warn!("Ignoring stored preference {}: {}", key, e);
            }
        }

        Ok(prefs)
    }

    pub async fn save(&self, store: &SettingsStore) -> CoreResult<()> {
        for (name, value) in self.to_map()? {
            store
                .set_setting(&format!("{}{}", PREFS_PREFIX, name), &value.to_string())
                .await?;
        }
        Ok(())
    }

    /// Change one preference, validating the value's type
    pub fn apply(&mut self, name: &str, value: Value) -> CoreResult<()> {
        let mut map = self.to_map()?;
        if !map.contains_key(name) {
            return Err(CoreError::InvalidParams(format!("Unknown preference: {}", name)));
        }
        map.insert(name.to_string(), value);

        *self = serde_json::from_value(Value::Object(map))
            .map_err(|e| CoreError::InvalidParams(format!("Invalid value for {}: {}", name, e)))?;

        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(5))
    }

    fn to_map(&self) -> CoreResult<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(CoreError::Internal("Preferences are not an object".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::assert_ok;

    #[test]
    fn env_defaults_apply() {
        let config = CoreConfig::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config.socket_path, DEFAULT_SOCKET);
        assert_eq!(config.tick, Duration::from_millis(DEFAULT_TICK_MS));
        assert!(config.data_dir.ends_with("Fedideck"));
    }

    #[test]
    fn env_overrides_are_read() {
        let vars: HashMap<String, String> = [
            ("FEDIDECK_SOCKET", "/run/user/1000/fd.sock"),
            ("FEDIDECK_DATA_DIR", "/tmp/fd"),
            ("FEDIDECK_TICK_MS", "250"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = CoreConfig::from_vars(&vars).unwrap();
        assert_eq!(config.socket_path, "/run/user/1000/fd.sock");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/fd/settings.db"));
        assert_eq!(config.tick, Duration::from_millis(250));
    }

    #[test]
    fn invalid_tick_is_an_error() {
        let vars = HashMap::from([("FEDIDECK_TICK_MS".to_string(), "soon".to_string())]);
        assert!(CoreConfig::from_vars(&vars).is_err());
    }

    #[test]
    fn apply_checks_names_and_types() {
        let mut prefs = Preferences::default();
        assert_ok!(prefs.apply("max_timeline_length", json!(200)));
        assert_eq!(prefs.max_timeline_length, 200);

        assert!(prefs.apply("max_timeline_length", json!("lots")).is_err());
        assert!(prefs.apply("font_size", json!(12)).is_err());
        assert!(prefs.apply("feature_set", json!("mastodon")).is_err());
        assert_eq!(prefs.max_timeline_length, 200);
    }

    #[tokio::test]
    async fn preferences_survive_a_save_and_load() {
        let store = assert_ok!(SettingsStore::in_memory().await);
        let mut prefs = Preferences::default();
        assert_ok!(prefs.apply("theme", json!("dark")));
        assert_ok!(prefs.apply("feature_set", json!("pleroma")));
        assert_ok!(prefs.save(&store).await);

        let loaded = assert_ok!(Preferences::load(&store).await);
        assert_eq!(loaded, prefs);
    }

    #[tokio::test]
    async fn broken_stored_values_fall_back_to_defaults() {
        let store = assert_ok!(SettingsStore::in_memory().await);
        assert_ok!(store.set_setting("prefs.max_timeline_length", "many").await);
        assert_ok!(store.set_setting("prefs.theme", "dark").await);

        let loaded = assert_ok!(Preferences::load(&store).await);
        assert_eq!(loaded.max_timeline_length, 50);
        assert_eq!(loaded.theme, "dark");
    }
}
