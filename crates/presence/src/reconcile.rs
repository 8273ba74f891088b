use chrono::{DateTime, Utc};
use frontdesk_core::models::{PresenceMap, PresenceRecord, SwitchEvent};

/// Seed a zero-point presence entry for every roster member that has no
/// history yet.
///
/// Steady-state polling calls this with the cached member roster before
/// reconciling; the cold-start rebuild skips it and lets [`reconcile`]
/// create entries lazily at first sight. Both strategies converge on the
/// same map for every member that appears in the event history.
pub fn seed_roster<'a, I>(seen: &mut PresenceMap, roster: I, zero_point: DateTime<Utc>)
where
    I: IntoIterator<Item = &'a str>,
{
    for id in roster {
        let id = id.trim();
        if id.is_empty() {
            continue;
        }
        seen.entry(id.to_string())
            .or_insert_with(|| PresenceRecord::at_zero_point(zero_point));
    }
}

/// Apply one newest-first batch of switch events to the presence map.
///
/// The walk runs oldest to newest over consecutive event pairs, starting at
/// the second chronological event: a member present in the previous event
/// but not the current one switched out as of the current timestamp, and a
/// member present in the current event but not the previous one switched
/// in. Identifiers are trimmed before comparison; the upstream source
/// sometimes pads them with whitespace.
///
/// Updates are monotonic. A field is only overwritten by a strictly later
/// timestamp, so re-applying an already-processed batch is a no-op and
/// replayed or overlapping batches cannot move history backward.
///
/// Returns the timestamp of the second-oldest event in the batch: the
/// watermark up to which presence data is now known-correct. A caller
/// paginating backward through history must request events strictly before
/// the watermark so that consecutive batches overlap by exactly one event.
/// The overlap is what makes the transition at the batch boundary
/// computable; the first event of a batch has no predecessor within the
/// batch and yields no transition on its own.
///
/// Batches with fewer than two events carry no transition and return
/// `None`; the map is left untouched.
pub fn reconcile(
    switches: &[SwitchEvent],
    seen: &mut PresenceMap,
    zero_point: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if switches.len() < 2 {
        return None;
    }

    // The remote ledger always returns newest first; the walk is defined
    // over chronological order.
    let chronological: Vec<&SwitchEvent> = switches.iter().rev().collect();

    let mut previous = chronological[0];
    for &current in chronological.iter().skip(1) {
        let previous_members: Vec<&str> =
            previous.members.iter().map(|m| m.trim()).collect();
        let current_members: Vec<&str> =
            current.members.iter().map(|m| m.trim()).collect();

        // Members present before but not now have switched out
        for id in previous_members.iter().copied() {
            if !current_members.contains(&id) {
                let record = seen
                    .entry(id.to_string())
                    .or_insert_with(|| PresenceRecord::at_zero_point(zero_point));
                if record.last_out < current.timestamp {
                    record.last_out = current.timestamp;
                }
            }
        }

        // Members present now but not before have switched in
        for id in current_members.iter().copied() {
            if !previous_members.contains(&id) {
                let record = seen
                    .entry(id.to_string())
                    .or_insert_with(|| PresenceRecord::at_zero_point(zero_point));
                if record.last_in < current.timestamp {
                    record.last_in = current.timestamp;
                }
            }
        }

        previous = current;
    }

    Some(chronological[1].timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().expect("timestamp")
    }

    fn zero() -> DateTime<Utc> {
        ts("2020-01-01T00:00:00Z")
    }

    /// Build a newest-first batch from chronological (timestamp, members)
    /// pairs, the way a caller receives it from the ledger.
    fn batch(events: &[(&str, &[&str])]) -> Vec<SwitchEvent> {
        events
            .iter()
            .enumerate()
            .map(|(i, (timestamp, members))| SwitchEvent {
                id: format!("sw-{}", i),
                timestamp: ts(timestamp),
                members: members.iter().map(|m| m.to_string()).collect(),
            })
            .rev()
            .collect()
    }

    #[test]
    fn test_boundary_correctness() {
        let switches = batch(&[
            ("2024-05-01T10:00:00Z", &["aaaaa"]),
            ("2024-05-01T11:00:00Z", &["aaaaa", "bbbbb"]),
            ("2024-05-01T12:00:00Z", &["bbbbb"]),
        ]);
        let mut seen = PresenceMap::new();

        reconcile(&switches, &mut seen, zero());

        assert_eq!(seen["bbbbb"].last_in, ts("2024-05-01T11:00:00Z"));
        assert_eq!(seen["aaaaa"].last_out, ts("2024-05-01T12:00:00Z"));
        // Neither transition happened inside the batch, so both stay at
        // the zero point
        assert_eq!(seen["aaaaa"].last_in, zero());
        assert_eq!(seen["bbbbb"].last_out, zero());
    }

    #[test]
    fn test_empty_switch_out() {
        let switches = batch(&[
            ("2024-05-01T10:00:00Z", &["aaaaa", "bbbbb"]),
            ("2024-05-01T11:00:00Z", &[]),
        ]);
        let mut seen = PresenceMap::new();

        reconcile(&switches, &mut seen, zero());

        assert_eq!(seen["aaaaa"].last_out, ts("2024-05-01T11:00:00Z"));
        assert_eq!(seen["bbbbb"].last_out, ts("2024-05-01T11:00:00Z"));
        assert_eq!(seen["aaaaa"].last_in, zero());
        assert_eq!(seen["bbbbb"].last_in, zero());
    }

    #[test]
    fn test_watermark_is_second_oldest_timestamp() {
        let switches = batch(&[
            ("2024-05-01T10:00:00Z", &["aaaaa"]),
            ("2024-05-01T11:00:00Z", &["bbbbb"]),
            ("2024-05-01T12:00:00Z", &["aaaaa"]),
            ("2024-05-01T13:00:00Z", &["bbbbb"]),
            ("2024-05-01T14:00:00Z", &["aaaaa"]),
        ]);
        let mut seen = PresenceMap::new();

        let watermark = reconcile(&switches, &mut seen, zero());

        assert_eq!(watermark, Some(ts("2024-05-01T11:00:00Z")));
    }

    #[test]
    fn test_short_batch_is_a_no_op() {
        let mut seen = PresenceMap::new();

        assert_eq!(reconcile(&[], &mut seen, zero()), None);
        assert!(seen.is_empty());

        let one = batch(&[("2024-05-01T10:00:00Z", &["aaaaa"])]);
        assert_eq!(reconcile(&one, &mut seen, zero()), None);
        assert!(seen.is_empty());
    }

    #[test]
    fn test_idempotence() {
        let switches = batch(&[
            ("2024-05-01T10:00:00Z", &["aaaaa"]),
            ("2024-05-01T11:00:00Z", &["bbbbb"]),
            ("2024-05-01T12:00:00Z", &["aaaaa", "bbbbb"]),
        ]);
        let mut seen = PresenceMap::new();

        reconcile(&switches, &mut seen, zero());
        let once = seen.clone();
        reconcile(&switches, &mut seen, zero());

        assert_eq!(seen, once);
    }

    #[test]
    fn test_monotonicity_across_replayed_older_batch() {
        let newer = batch(&[
            ("2024-05-02T10:00:00Z", &["aaaaa"]),
            ("2024-05-02T11:00:00Z", &["bbbbb"]),
        ]);
        let older = batch(&[
            ("2024-05-01T10:00:00Z", &["aaaaa"]),
            ("2024-05-01T11:00:00Z", &["bbbbb"]),
        ]);
        let mut seen = PresenceMap::new();

        reconcile(&newer, &mut seen, zero());
        let after_newer = seen.clone();
        // An out-of-order replay of older data must not move anything
        // backward
        reconcile(&older, &mut seen, zero());

        assert_eq!(seen, after_newer);
    }

    #[test]
    fn test_identifier_whitespace_is_normalized() {
        let padded = batch(&[
            ("2024-05-01T10:00:00Z", &["aaaaa "]),
            ("2024-05-01T11:00:00Z", &[" aaaaa", "bbbbb"]),
            ("2024-05-01T12:00:00Z", &["bbbbb "]),
        ]);
        let clean = batch(&[
            ("2024-05-01T10:00:00Z", &["aaaaa"]),
            ("2024-05-01T11:00:00Z", &["aaaaa", "bbbbb"]),
            ("2024-05-01T12:00:00Z", &["bbbbb"]),
        ]);

        let mut from_padded = PresenceMap::new();
        let mut from_clean = PresenceMap::new();
        reconcile(&padded, &mut from_padded, zero());
        reconcile(&clean, &mut from_clean, zero());

        assert_eq!(from_padded, from_clean);
        assert!(from_padded.contains_key("aaaaa"));
    }

    #[test]
    fn test_seed_roster_initializes_only_missing_entries() {
        let mut seen = PresenceMap::new();
        seen.insert(
            "aaaaa".to_string(),
            PresenceRecord {
                last_in: ts("2024-05-01T10:00:00Z"),
                last_out: ts("2024-05-01T11:00:00Z"),
            },
        );

        seed_roster(&mut seen, ["aaaaa", " bbbbb ", ""], zero());

        assert_eq!(seen["aaaaa"].last_in, ts("2024-05-01T10:00:00Z"));
        assert_eq!(seen["bbbbb"], PresenceRecord::at_zero_point(zero()));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_roster_and_lazy_seeding_agree() {
        let switches = batch(&[
            ("2024-05-01T10:00:00Z", &["aaaaa"]),
            ("2024-05-01T11:00:00Z", &["bbbbb"]),
            ("2024-05-01T12:00:00Z", &["aaaaa"]),
        ]);

        let mut lazy = PresenceMap::new();
        reconcile(&switches, &mut lazy, zero());

        let mut seeded = PresenceMap::new();
        seed_roster(&mut seeded, ["aaaaa", "bbbbb"], zero());
        reconcile(&switches, &mut seeded, zero());

        assert_eq!(lazy, seeded);
    }
}
