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

//! Settings store
//!
//! SQLite holds saved logins and key/value settings (preferences and UI
//! state). Nothing fetched from the network is stored here.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::CoreResult;
use crate::models::StoredAccount;

type AccountRow = (String, String, Option<String>);

/// Saved accounts and settings
#[derive(Clone)]
pub struct SettingsStore {
    pool: SqlitePool,
}

impl SettingsStore {
    /// Open (or create) the database file at `path`
    pub async fn open(path: &Path) -> CoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", path.display());

        info!("Opening settings database at {}", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;

        Ok(store)
    }

    /// A throwaway store, used by tests
    #[cfg(test)]
    pub async fn in_memory() -> CoreResult<Self> {
        // Every connection to sqlite::memory: is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.init_schema().await?;

        Ok(store)
    }

    async fn init_schema(&self) -> CoreResult<()> {
        debug!("Initializing settings schema");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                instance_url TEXT NOT NULL,
                username TEXT NOT NULL,
                access_token TEXT NOT NULL,
                client_secret TEXT,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                last_used_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                is_default INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ===== ACCOUNTS =====

    /// Save or update an account
    pub async fn save_account(&self, account: &StoredAccount) -> CoreResult<()> {
        let data = serde_json::to_string(account)?;

        sqlx::query(
            r#"
            INSERT INTO accounts (id, instance_url, username, access_token, client_secret, data, created_at, last_used_at, is_default)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                access_token = excluded.access_token,
                client_secret = excluded.client_secret,
                data = excluded.data,
                last_used_at = excluded.last_used_at,
                is_default = excluded.is_default
            "#,
        )
        .bind(&account.id)
        .bind(&account.instance_url)
        .bind(&account.username)
        .bind(&account.access_token)
        .bind(&account.client_secret)
        .bind(&data)
        .bind(account.added_at.to_rfc3339())
        .bind(account.last_used_at.to_rfc3339())
        .bind(account.is_default)
        .execute(&self.pool)
        .await?;

        info!("Saved account {} ({})", account.acct, account.id);
        Ok(())
    }

    /// All saved accounts, most recently used first
    pub async fn get_accounts(&self) -> CoreResult<Vec<StoredAccount>> {
        let rows: Vec<AccountRow> = sqlx::query_as(
            "SELECT data, access_token, client_secret FROM accounts ORDER BY last_used_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(|row| restore(row).ok()).collect())
    }

    /// The account marked default, else the most recently used one
    pub async fn get_default_account(&self) -> CoreResult<Option<StoredAccount>> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT data, access_token, client_secret FROM accounts WHERE is_default = 1 LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(r) => Some(r),
            None => {
                sqlx::query_as(
                    "SELECT data, access_token, client_secret FROM accounts ORDER BY last_used_at DESC LIMIT 1",
                )
                .fetch_optional(&self.pool)
                .await?
            }
        };

        row.map(restore).transpose()
    }

    pub async fn get_account(&self, account_id: &str) -> CoreResult<Option<StoredAccount>> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT data, access_token, client_secret FROM accounts WHERE id = ?",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(restore).transpose()
    }

    /// Look up a login by instance and username, for re-login
    pub async fn find_account(
        &self,
        instance_url: &str,
        username: &str,
    ) -> CoreResult<Option<StoredAccount>> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT data, access_token, client_secret FROM accounts WHERE instance_url = ? AND username = ?",
        )
        .bind(instance_url)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(restore).transpose()
    }

    /// Returns false if no such account existed
    pub async fn delete_account(&self, account_id: &str) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        info!("Deleted account {}", account_id);
        Ok(result.rows_affected() > 0)
    }

    /// Mark an account as the default and bump its last use
    pub async fn set_default_account(&self, account_id: &str) -> CoreResult<()> {
        sqlx::query("UPDATE accounts SET is_default = 0")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "UPDATE accounts SET is_default = 1, last_used_at = ? WHERE id = ?",
        )
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        debug!("Set default account to {}", account_id);
        Ok(())
    }

    // ===== SETTINGS =====

    pub async fn get_setting(&self, key: &str) -> CoreResult<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM settings WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(v,)| v))
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        debug!("Set setting {} = {}", key, value);
        Ok(())
    }

    pub async fn delete_setting(&self, key: &str) -> CoreResult<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Settings whose key starts with `prefix`
    pub async fn get_settings_with_prefix(&self, prefix: &str) -> CoreResult<HashMap<String, String>> {
        let all = self.get_all_settings().await?;
        Ok(all.into_iter().filter(|(k, _)| k.starts_with(prefix)).collect())
    }

    pub async fn get_all_settings(&self) -> CoreResult<HashMap<String, String>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM settings")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().collect())
    }
}

/// Put the credentials kept out of the JSON column back in place
fn restore((data, access_token, client_secret): AccountRow) -> CoreResult<StoredAccount> {
    let mut account: StoredAccount = serde_json::from_str(&data)?;
    account.access_token = access_token;
    account.client_secret = client_secret;
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tokio_test::assert_ok;

    fn account(id: &str, minutes_ago: i64) -> StoredAccount {
        let when = Utc::now() - Duration::minutes(minutes_ago);
        StoredAccount {
            id: id.to_string(),
            instance_url: "https://example.social".to_string(),
            username: format!("user{}", id),
            acct: format!("user{}@example.social", id),
            display_name: String::new(),
            access_token: format!("token-{}", id),
            client_id: Some("client".to_string()),
            client_secret: Some("secret".to_string()),
            feature_set: "mainline".to_string(),
            autologin: true,
            added_at: when,
            last_used_at: when,
            is_default: false,
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn accounts_round_trip_with_credentials() {
        let store = assert_ok!(SettingsStore::in_memory().await);
        assert_ok!(store.save_account(&account("1", 0)).await);

        let loaded = assert_ok!(store.get_account("1").await).unwrap();
        assert_eq!(loaded.access_token, "token-1");
        assert_eq!(loaded.client_secret.as_deref(), Some("secret"));

        let found = assert_ok!(store.find_account("https://example.social", "user1").await);
        assert_eq!(found.map(|a| a.id).as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn default_account_falls_back_to_most_recent() {
        let store = assert_ok!(SettingsStore::in_memory().await);
        assert!(assert_ok!(store.get_default_account().await).is_none());

        assert_ok!(store.save_account(&account("old", 60)).await);
        assert_ok!(store.save_account(&account("new", 1)).await);

        let default = assert_ok!(store.get_default_account().await).unwrap();
        assert_eq!(default.id, "new");

        assert_ok!(store.set_default_account("old").await);
        let default = assert_ok!(store.get_default_account().await).unwrap();
        assert_eq!(default.id, "old");

        let ids: Vec<_> = assert_ok!(store.get_accounts().await)
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["old", "new"]);
    }

    #[tokio::test]
    async fn deleting_reports_whether_anything_was_removed() {
        let store = assert_ok!(SettingsStore::in_memory().await);
        assert_ok!(store.save_account(&account("1", 0)).await);

        assert!(assert_ok!(store.delete_account("1").await));
        assert!(!assert_ok!(store.delete_account("1").await));
    }

    #[tokio::test]
    async fn settings_overwrite_and_filter_by_prefix() {
        let store = assert_ok!(SettingsStore::in_memory().await);
        assert_ok!(store.set_setting("prefs.theme", "light").await);
        assert_ok!(store.set_setting("prefs.theme", "dark").await);
        assert_ok!(store.set_setting("ui.history_window.size", "362x560").await);

        assert_eq!(
            assert_ok!(store.get_setting("prefs.theme").await).as_deref(),
            Some("dark")
        );
        let prefs = assert_ok!(store.get_settings_with_prefix("prefs.").await);
        assert_eq!(prefs.len(), 1);

        assert_ok!(store.delete_setting("prefs.theme").await);
        assert!(assert_ok!(store.get_setting("prefs.theme").await).is_none());
    }
}
