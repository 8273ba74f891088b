//! Current-fronters feed document
//!
//! The static JSON snapshot other front-ends read: the last switch, the
//! system profile, and one entry per fronter with their presence history.

use chrono::{DateTime, Utc};
use frontdesk_core::models::{
    Member, PresenceMap, PresenceRecord, SwitchEvent, SystemProfile,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CurrentFronters {
    pub switch: SwitchRef,
    pub system: SystemRef,
    pub members: Vec<FronterEntry>,
}

#[derive(Debug, Serialize)]
pub struct SwitchRef {
    pub id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SystemRef {
    pub name: Option<String>,
    pub pronouns: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FronterEntry {
    pub name: String,
    pub id: String,
    pub pronouns: Option<String>,
    pub last_in: DateTime<Utc>,
    pub last_out: DateTime<Utc>,
    pub visible: bool,
}

/// Assemble the feed for the current switch. Fronters that cannot be
/// resolved against the roster are kept by identifier alone and treated as
/// not visible.
pub fn build_current_fronters(
    last_switch: &SwitchEvent,
    system: &SystemProfile,
    roster: &[Member],
    seen: &PresenceMap,
    zero_point: DateTime<Utc>,
) -> CurrentFronters {
    let members = last_switch
        .members
        .iter()
        .map(|raw_id| {
            let id = raw_id.trim();
            let record = seen
                .get(id)
                .copied()
                .unwrap_or_else(|| PresenceRecord::at_zero_point(zero_point));
            match roster.iter().find(|m| m.id.trim() == id) {
                Some(member) => FronterEntry {
                    name: member.name.clone(),
                    id: id.to_string(),
                    pronouns: member.pronouns.clone(),
                    last_in: record.last_in,
                    last_out: record.last_out,
                    visible: member.is_visible(),
                },
                None => FronterEntry {
                    name: id.to_string(),
                    id: id.to_string(),
                    pronouns: None,
                    last_in: record.last_in,
                    last_out: record.last_out,
                    visible: false,
                },
            }
        })
        .collect();

    CurrentFronters {
        switch: SwitchRef {
            id: last_switch.id.clone(),
            timestamp: last_switch.timestamp,
        },
        system: SystemRef {
            name: system.name.clone(),
            pronouns: system.pronouns.clone(),
        },
        members,
    }
}
