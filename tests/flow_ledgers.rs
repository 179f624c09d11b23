use chrono::{Duration, TimeZone, Utc};
use hashi::dispatch::CommandKey;
use hashi::services::cool_down::CoolDownLedger;
use hashi::services::interfering::{InterferingLedger, InvocationHandle};
use hashi::services::{Blocked, FlowControl, GateRequest, ManualClock};
use std::sync::Arc;

fn handle(id: &str) -> InvocationHandle {
    InvocationHandle {
        interaction_id: id.to_string(),
        command_id: None,
    }
}

#[test]
fn cool_down_lives_until_duration_elapses() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let key = CommandKey::parse("ping");
    let mut ledger = CoolDownLedger::new();
    ledger.register("U", key.clone(), 5, start);

    for offset_ms in [0, 1_000, 4_999] {
        let now = start + Duration::milliseconds(offset_ms);
        assert_eq!(ledger.values("U", Some(&key), now).len(), 1, "at +{offset_ms}ms");
    }
    assert!(ledger.values("U", Some(&key), start + Duration::seconds(5)).is_empty());
    assert_eq!(ledger.tracked_users(), 0, "expired users are compacted away");
}

#[test]
fn cool_down_prefix_matches_whole_segments() {
    let now = Utc::now();
    let mut ledger = CoolDownLedger::new();
    ledger.register("U", CommandKey::parse("stats show"), 30, now);
    ledger.register("U", CommandKey::parse("statsx"), 30, now);

    let stats = ledger.values("U", Some(&CommandKey::parse("stats")), now);
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].key, CommandKey::parse("stats show"));
    assert_eq!(ledger.values("U", None, now).len(), 2);
    assert!(ledger.values("someone else", None, now).is_empty());
}

#[test]
fn interfering_remove_is_idempotent() {
    let key = CommandKey::parse("slow");
    let mut ledger = InterferingLedger::new();
    ledger.register("U", key.clone(), handle("i1"));
    assert_eq!(ledger.values("U", std::slice::from_ref(&key)).len(), 1);

    ledger.remove("U", &key);
    assert!(ledger.values("U", std::slice::from_ref(&key)).is_empty());
    ledger.remove("U", &key);
    assert!(ledger.values("U", &[]).is_empty());
}

#[test]
fn interfering_query_without_prefixes_lists_everything() {
    let mut ledger = InterferingLedger::new();
    ledger.register("U", CommandKey::parse("stats show"), handle("i1"));
    ledger.register("U", CommandKey::parse("ping"), handle("i2"));
    assert_eq!(ledger.values("U", &[]).len(), 2);
    assert_eq!(ledger.values("U", &[CommandKey::parse("stats")]).len(), 1);
}

#[test]
fn gate_blocks_second_acquire_until_slot_released() {
    let clock = Arc::new(ManualClock::default());
    let flow = Arc::new(FlowControl::new(clock.clone()));
    let key = CommandKey::parse("slow");
    let request = |id: &str| GateRequest {
        user_id: "A",
        key: &key,
        interfering: &[],
        cool_down: 0,
        handle: handle(id),
    };

    let slot = flow.acquire(request("i1")).expect("first acquire passes");
    match flow.acquire(request("i2")) {
        Err(Blocked::Interfering { colliding }) => {
            assert_eq!(colliding.len(), 1);
            assert_eq!(colliding[0].handle.interaction_id, "i1");
        }
        other => panic!("expected interference, got {other:?}"),
    }

    drop(slot);
    assert!(flow.interfering("A", &[]).is_empty());
    assert!(flow.acquire(request("i3")).is_ok());
}

#[test]
fn gate_reports_earliest_cool_down_expiry() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let flow = Arc::new(FlowControl::new(clock.clone()));
    let key = CommandKey::parse("ping");
    let request = GateRequest {
        user_id: "A",
        key: &key,
        interfering: &[],
        cool_down: 5,
        handle: handle("i1"),
    };
    flow.acquire(request.clone()).unwrap().release();

    clock.advance(Duration::seconds(2));
    assert_eq!(
        flow.acquire(request.clone()).unwrap_err(),
        Blocked::CoolingDown {
            expires_at: start + Duration::seconds(5)
        }
    );

    clock.advance(Duration::seconds(3));
    assert!(flow.acquire(request).is_ok());
}
