pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{ApiConfig, Config, WebhookConfig, WebhooksConfig};
pub use error::CoreError;
pub use models::{
    Group, Member, PresenceMap, PresenceRecord, SwitchEvent, SystemProfile,
};
