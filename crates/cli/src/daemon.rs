//! Polling daemon
//!
//! Single loop, minute-granularity scheduling, one synchronous
//! reconciliation pass per cadence boundary. Transport failures degrade a
//! pass to a no-op; only missing state at startup is fatal.

use anyhow::Context;
use chrono::{Local, Timelike, Utc};
use frontdesk_core::models::{Member, PresenceMap, SwitchEvent, SystemProfile};
use frontdesk_core::Config;
use frontdesk_ledger::{LedgerClient, MAX_PAGE_SIZE};
use frontdesk_notify::WebhookSink;
use frontdesk_presence::{rebuild_history, reconcile, seed_roster};
use frontdesk_store::DataStore;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::feed::build_current_fronters;
use crate::messages::{filtered_message, full_message};

pub const DOC_SYSTEM: &str = "pk_system";
pub const DOC_MEMBERS: &str = "pk_members";
pub const DOC_GROUPS: &str = "pk_groups";
pub const DOC_LAST_SWITCH: &str = "last_switch";
pub const DOC_MEMBER_SEEN: &str = "member_seen";
pub const DOC_CURRENT_FRONTERS: &str = "current_fronters";

/// Hour of the daily snapshot refresh.
const SNAPSHOT_REFRESH_HOUR: u32 = 4;
/// Spacing between history pages during a rebuild, to stay under the
/// upstream rate limit.
const REBUILD_PAGE_DELAY: Duration = Duration::from_secs(1);
const LOOP_TICK: Duration = Duration::from_secs(10);

pub struct App {
    pub config: Config,
    pub store: DataStore,
    pub ledger: LedgerClient,
    sink: WebhookSink,
}

/// In-memory copy of the persisted documents, mutated only inside a
/// single pass.
pub struct State {
    pub system: SystemProfile,
    pub members: Vec<Member>,
    pub last_switch: SwitchEvent,
    pub seen: PresenceMap,
}

impl App {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store = DataStore::new(config.data_dir())
            .context("unable to open data store")?;
        let ledger = LedgerClient::new(
            &config.api.base_url,
            &config.api.system_id,
            &config.api.token,
        );
        Ok(Self {
            config,
            store,
            ledger,
            sink: WebhookSink::new(),
        })
    }

    /// Load every persisted document, building any that are missing from
    /// the API. A document that can neither be loaded nor built is fatal.
    pub async fn bootstrap(&self) -> anyhow::Result<State> {
        let system = if self.store.exists(DOC_SYSTEM) {
            self.store.load(DOC_SYSTEM)?
        } else {
            let system = self.ledger.fetch_system().await?;
            self.store.save(DOC_SYSTEM, &system)?;
            system
        };

        let members: Vec<Member> = if self.store.exists(DOC_MEMBERS) {
            self.store.load(DOC_MEMBERS)?
        } else {
            let members = self.ledger.fetch_members().await?;
            self.store.save(DOC_MEMBERS, &members)?;
            members
        };

        // Groups are persisted for the feed consumers but not held in
        // memory; nothing in the daemon reads them back.
        if !self.store.exists(DOC_GROUPS) {
            let groups = self.ledger.fetch_groups().await?;
            self.store.save(DOC_GROUPS, &groups)?;
        }

        let last_switch: SwitchEvent = if self.store.exists(DOC_LAST_SWITCH) {
            self.store.load(DOC_LAST_SWITCH)?
        } else {
            let recent = self.ledger.fetch_recent(1).await?;
            let latest = recent
                .into_iter()
                .next()
                .context("upstream system has no switch history")?;
            self.store.save(DOC_LAST_SWITCH, &latest)?;
            latest
        };

        let seen: PresenceMap = if self.store.exists(DOC_MEMBER_SEEN) {
            self.store.load(DOC_MEMBER_SEEN)?
        } else {
            self.rebuild_presence().await?
        };

        Ok(State {
            system,
            members,
            last_switch,
            seen,
        })
    }

    /// Full historical rebuild of the presence map, persisted on
    /// completion.
    pub async fn rebuild_presence(&self) -> anyhow::Result<PresenceMap> {
        let mut seen = PresenceMap::new();
        rebuild_history(
            &self.ledger,
            &mut seen,
            self.config.api.zero_point,
            Utc::now(),
            REBUILD_PAGE_DELAY,
        )
        .await;
        self.store.save(DOC_MEMBER_SEEN, &seen)?;
        Ok(seen)
    }

    /// Refresh the system, member, and group snapshot documents from the
    /// API.
    pub async fn refresh_snapshots(
        &self,
    ) -> anyhow::Result<(SystemProfile, Vec<Member>)> {
        info!("refreshing system, member, and group snapshots");
        let system = self.ledger.fetch_system().await?;
        self.store.save(DOC_SYSTEM, &system)?;
        let members = self.ledger.fetch_members().await?;
        self.store.save(DOC_MEMBERS, &members)?;
        let groups = self.ledger.fetch_groups().await?;
        self.store.save(DOC_GROUPS, &groups)?;
        Ok((system, members))
    }

    /// The polling loop. Wakes on a coarse tick, acts once per wall-clock
    /// minute, reconciles on the configured cadence, and refreshes the
    /// snapshots daily.
    pub async fn run(&self, mut state: State) -> anyhow::Result<()> {
        let interval = self.config.update_interval.max(1);
        info!("frontdesk daemon started, polling every {} minutes", interval);

        let mut last_minute: Option<u32> = None;
        loop {
            tokio::time::sleep(LOOP_TICK).await;
            let now = Local::now();
            if last_minute == Some(now.minute()) {
                continue;
            }
            last_minute = Some(now.minute());

            if now.hour() == SNAPSHOT_REFRESH_HOUR && now.minute() == 0 {
                match self.refresh_snapshots().await {
                    Ok((system, members)) => {
                        state.system = system;
                        state.members = members;
                    }
                    Err(e) => warn!("snapshot refresh failed: {}", e),
                }
            }

            if now.minute() % interval != 0 {
                continue;
            }

            match self.poll_once(&mut state).await {
                Ok(true) => {
                    if let Err(e) = self.publish(&state).await {
                        warn!("publish failed: {}", e);
                    }
                }
                Ok(false) => {}
                Err(e) => warn!("poll pass failed: {}", e),
            }
        }
    }

    /// One steady-state reconciliation pass. Returns whether a switch has
    /// happened since the last pass. Transport failures degrade to "no
    /// change".
    async fn poll_once(&self, state: &mut State) -> anyhow::Result<bool> {
        debug!("fetching recent switches");
        let switches = match self.ledger.fetch_recent(MAX_PAGE_SIZE).await {
            Ok(switches) => switches,
            Err(e) => {
                warn!("unable to fetch recent switches: {}", e);
                return Ok(false);
            }
        };

        if !switch_occurred(&switches, &state.last_switch) {
            return Ok(false);
        }

        state.last_switch = switches[0].clone();
        self.store.save(DOC_LAST_SWITCH, &state.last_switch)?;

        // A member we have never tracked means the roster is stale
        if self.has_unknown_member(state, &switches) {
            info!("unknown member in switch batch, refreshing member roster");
            match self.ledger.fetch_members().await {
                Ok(members) => {
                    state.members = members;
                    self.store.save(DOC_MEMBERS, &state.members)?;
                }
                Err(e) => warn!("unable to refresh member roster: {}", e),
            }
        }

        seed_roster(
            &mut state.seen,
            state.members.iter().map(|m| m.id.as_str()),
            self.config.api.zero_point,
        );
        reconcile(&switches, &mut state.seen, self.config.api.zero_point);
        self.store.save(DOC_MEMBER_SEEN, &state.seen)?;

        Ok(true)
    }

    fn has_unknown_member(&self, state: &State, switches: &[SwitchEvent]) -> bool {
        switches
            .iter()
            .flat_map(|s| s.members.iter())
            .any(|id| !state.seen.contains_key(id.trim()))
    }

    /// Regenerate the current-fronters feed and deliver webhook
    /// notifications. Delivery failures are logged, never fatal.
    async fn publish(&self, state: &State) -> anyhow::Result<()> {
        let fronters = build_current_fronters(
            &state.last_switch,
            &state.system,
            &state.members,
            &state.seen,
            self.config.api.zero_point,
        );
        self.store.save(DOC_CURRENT_FRONTERS, &fronters)?;

        // Nothing to announce when fully switched out
        if fronters.members.is_empty() {
            return Ok(());
        }

        if let Some(hook) = self.config.webhooks.full.as_ref().filter(|h| h.enabled) {
            if let Err(e) = self.sink.send(&hook.url, &full_message(&fronters)).await {
                warn!("full webhook delivery failed: {}", e);
            }
        }
        if let Some(hook) = self
            .config
            .webhooks
            .filtered
            .as_ref()
            .filter(|h| h.enabled)
        {
            if let Err(e) = self
                .sink
                .send(&hook.url, &filtered_message(&fronters))
                .await
            {
                warn!("filtered webhook delivery failed: {}", e);
            }
        }
        Ok(())
    }
}

/// Whether a fetched batch represents a switch since the cached cursor.
/// Fewer than two events means no transition can be computed, and an
/// unchanged newest id means nothing happened; both are "no change".
fn switch_occurred(switches: &[SwitchEvent], last_switch: &SwitchEvent) -> bool {
    let Some(newest) = switches.first() else {
        return false;
    };
    switches.len() >= 2 && newest.id.trim() != last_switch.id.trim()
}
