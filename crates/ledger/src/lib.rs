//! Switch Ledger
//!
//! Client for the remote persona API: ordered batches of switch events
//! plus the system/member/group snapshot documents. Fetching and ordering
//! only; interpretation of the events belongs to `frontdesk_presence`.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use frontdesk_core::models::{Group, Member, SwitchEvent, SystemProfile};
use frontdesk_presence::{SourceError, SwitchSource};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

/// Largest switch batch the remote API returns per request.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("request error: {0}")]
    Request(String),
    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },
}

/// Authenticated client scoped to one upstream system.
pub struct LedgerClient {
    client: Client,
    base_url: String,
    system_id: String,
    token: String,
}

impl LedgerClient {
    pub fn new(base_url: &str, system_id: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            system_id: system_id.to_string(),
            token: token.to_string(),
        }
    }

    /// The most recent switches, newest first. `limit` is clamped to the
    /// remote page cap.
    pub async fn fetch_recent(&self, limit: usize) -> Result<Vec<SwitchEvent>, LedgerError> {
        let limit = limit.min(MAX_PAGE_SIZE);
        self.get_json("/switches", &[("limit", limit.to_string())])
            .await
    }

    /// Switches strictly before `cursor`, newest first. Used by the
    /// cold-start rebuild to paginate backward through history.
    pub async fn fetch_before(
        &self,
        cursor: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<SwitchEvent>, LedgerError> {
        let limit = limit.min(MAX_PAGE_SIZE);
        self.get_json(
            "/switches",
            &[
                ("limit", limit.to_string()),
                (
                    "before",
                    cursor.to_rfc3339_opts(SecondsFormat::Secs, true),
                ),
            ],
        )
        .await
    }

    pub async fn fetch_system(&self) -> Result<SystemProfile, LedgerError> {
        self.get_json("", &[]).await
    }

    pub async fn fetch_members(&self) -> Result<Vec<Member>, LedgerError> {
        self.get_json("/members", &[]).await
    }

    pub async fn fetch_groups(&self) -> Result<Vec<Group>, LedgerError> {
        self.get_json("/groups", &[("with_members", "true".to_string())])
            .await
    }

    /// Log a switch-out upstream: a new switch with an empty member set.
    pub async fn log_switch_out(&self) -> Result<(), LedgerError> {
        let url = self.system_url("/switches");
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.token)
            .json(&json!({ "members": [] }))
            .send()
            .await
            .map_err(|e| LedgerError::Request(format!("switch-out failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Api { status, body });
        }
        Ok(())
    }

    fn system_url(&self, path: &str) -> String {
        format!("{}/systems/{}{}", self.base_url, self.system_id, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, LedgerError> {
        let url = self.system_url(path);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| LedgerError::Request(format!("GET {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Api { status, body });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LedgerError::Request(format!("GET {} json parse failed: {}", path, e)))
    }
}

#[async_trait]
impl SwitchSource for LedgerClient {
    async fn fetch_before(
        &self,
        cursor: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<SwitchEvent>, SourceError> {
        LedgerClient::fetch_before(self, cursor, limit)
            .await
            .map_err(|e| SourceError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_url_joins_without_double_slash() {
        let client = LedgerClient::new("https://api.example.test/v2/", "abcde", "token");
        assert_eq!(
            client.system_url("/switches"),
            "https://api.example.test/v2/systems/abcde/switches"
        );
        assert_eq!(
            client.system_url(""),
            "https://api.example.test/v2/systems/abcde"
        );
    }

    #[test]
    fn test_switch_batch_parses_from_wire_shape() {
        let body = r#"[
            {"id": "sw-2", "timestamp": "2024-05-01T12:00:00Z", "members": ["bbbbb"]},
            {"id": "sw-1", "timestamp": "2024-05-01T10:00:00Z", "members": ["aaaaa", "bbbbb"]}
        ]"#;
        let switches: Vec<SwitchEvent> = serde_json::from_str(body).unwrap();
        assert_eq!(switches.len(), 2);
        assert_eq!(switches[0].id, "sw-2");
        assert_eq!(switches[1].members, vec!["aaaaa", "bbbbb"]);
    }
}
