//! Shared data models
//!
//! Wire shapes for the remote persona API plus the derived presence
//! records that frontdesk persists locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One switch event from the remote ledger: the set of member identifiers
/// fronting as of `timestamp`. An empty member list is a valid event and
/// means the system switched out entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Most recent instants a member started (`lastIn`) and stopped
/// (`lastOut`) fronting.
///
/// Both fields only ever move forward in time; see
/// `frontdesk_presence::reconcile` for the update rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecord {
    pub last_in: DateTime<Utc>,
    pub last_out: DateTime<Utc>,
}

impl PresenceRecord {
    /// A record for a member with no recorded history yet. The zero point
    /// sits before all real history, so "never seen" needs no nullable
    /// field.
    pub fn at_zero_point(zero_point: DateTime<Utc>) -> Self {
        Self {
            last_in: zero_point,
            last_out: zero_point,
        }
    }
}

/// Presence history keyed by trimmed member identifier. Entries are added
/// lazily as members are first encountered and never removed.
pub type PresenceMap = BTreeMap<String, PresenceRecord>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberPrivacy {
    #[serde(default)]
    pub visibility: Option<String>,
}

/// A persona in the upstream system. Identity is owned upstream; frontdesk
/// only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub uuid: Option<String>,
    pub name: String,
    #[serde(default)]
    pub pronouns: Option<String>,
    #[serde(default)]
    pub privacy: Option<MemberPrivacy>,
}

impl Member {
    /// Whether the member is publicly visible per upstream privacy
    /// settings. Absent privacy data is treated as visible.
    pub fn is_visible(&self) -> bool {
        self.privacy
            .as_ref()
            .and_then(|p| p.visibility.as_deref())
            .map(|v| v == "public")
            .unwrap_or(true)
    }
}

/// Top-level profile of the upstream system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemProfile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pronouns: Option<String>,
}

/// A member grouping in the upstream system. `members` holds member uuids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_record_serializes_camel_case() {
        let zero = "2020-01-01T00:00:00Z".parse().unwrap();
        let record = PresenceRecord::at_zero_point(zero);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("lastIn"));
        assert!(json.contains("lastOut"));
    }

    #[test]
    fn test_switch_event_members_default_empty() {
        let event: SwitchEvent = serde_json::from_str(
            r#"{"id": "sw-1", "timestamp": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert!(event.members.is_empty());
    }

    #[test]
    fn test_member_visibility() {
        let member: Member = serde_json::from_str(
            r#"{"id": "aaaaa", "name": "Ash", "privacy": {"visibility": "private"}}"#,
        )
        .unwrap();
        assert!(!member.is_visible());

        let member: Member =
            serde_json::from_str(r#"{"id": "bbbbb", "name": "Blake"}"#).unwrap();
        assert!(member.is_visible());
    }
}
