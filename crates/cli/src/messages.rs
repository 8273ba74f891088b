//! Notification text formatting
//!
//! Two renderings of the same feed: the full greeting with last-fronted
//! details, and a short one with private members masked by the system
//! profile.

use crate::feed::CurrentFronters;

/// Long-form greeting for the full webhook.
pub fn full_message(fronters: &CurrentFronters) -> String {
    let mut message = String::from("Hi, ");
    for (i, member) in fronters.members.iter().enumerate() {
        if i > 0 {
            message.push_str("\n---\n");
        }
        message.push_str(&member.name);
        if let Some(pronouns) = &member.pronouns {
            message.push_str(&format!(" ( {} )", pronouns));
        }
        message.push_str(&format!(
            "\nYou last fronted at {}",
            member.last_out.format("%H:%M on %A ( %Y-%m-%d )")
        ));
    }
    message
}

/// Name-only greeting for the filtered webhook. Members that are not
/// publicly visible appear as the system instead.
pub fn filtered_message(fronters: &CurrentFronters) -> String {
    let mut message = String::from("Hi, ");
    let last = fronters.members.len().saturating_sub(1);
    for (i, member) in fronters.members.iter().enumerate() {
        if i > 0 {
            message.push_str(if i == last { ", and " } else { ", " });
        }
        if member.visible {
            message.push_str(&member.name);
            if let Some(pronouns) = &member.pronouns {
                message.push_str(&format!(" ( {} )", pronouns));
            }
        } else {
            message.push_str(
                fronters.system.name.as_deref().unwrap_or("the system"),
            );
            if let Some(pronouns) = &fronters.system.pronouns {
                message.push_str(&format!(" ( {} )", pronouns));
            }
        }
    }
    message
}
