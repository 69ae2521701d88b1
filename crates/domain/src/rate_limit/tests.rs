use chrono::{DateTime, Utc};
use proptest::prelude::*;

use super::{CheckOutcome, LimiterTable, RateLimitEntry, RateLimitKey, RateLimitPolicy};

const EPOCH_MS: i64 = 1_760_000_000_000;

fn at(offset_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(EPOCH_MS + offset_ms).unwrap_or_else(|| unreachable!())
}

fn key(subject: &str, operation: &str) -> RateLimitKey {
    RateLimitKey::new(subject, operation).unwrap_or_else(|_| unreachable!())
}

fn policy(max_requests: u32, window_ms: u64) -> RateLimitPolicy {
    RateLimitPolicy::new("test", max_requests, window_ms).unwrap_or_else(|_| unreachable!())
}

#[test]
fn policy_rejects_zero_budget_and_zero_window() {
    assert!(RateLimitPolicy::new("goals", 0, 60_000).is_err());
    assert!(RateLimitPolicy::new("goals", 5, 0).is_err());
    assert!(RateLimitPolicy::new("goals", 5, u64::MAX).is_err());
    assert!(RateLimitPolicy::new(" ", 5, 1_000).is_err());
}

#[test]
fn policy_defaults_to_ten_requests_per_minute() {
    let policy = RateLimitPolicy::with_defaults("transactions").unwrap_or_else(|_| unreachable!());
    assert_eq!(policy.max_requests(), 10);
    assert_eq!(policy.window_ms(), 60_000);
    assert_eq!(policy.window().num_milliseconds(), 60_000);
}

#[test]
fn saturated_window_rejects_and_reports_zero_remaining() {
    let policy = policy(2, 60_000);
    let key = key("user-1", "create_goal");
    let mut table = LimiterTable::new();

    assert!(!table.check(&key, &policy, at(0)).is_rejected());
    assert!(!table.check(&key, &policy, at(10)).is_rejected());
    assert!(table.check(&key, &policy, at(20)).is_rejected());
    assert_eq!(table.remaining(&key, &policy, at(20)), 0);
}

#[test]
fn rejected_check_leaves_entry_untouched() {
    let policy = policy(1, 60_000);
    let key = key("user-1", "create_goal");
    let mut table = LimiterTable::new();

    table.check(&key, &policy, at(0));
    let before = table.entry(&key).copied();
    let outcome = table.check(&key, &policy, at(5));

    assert!(!outcome.mutated());
    assert_eq!(table.entry(&key).copied(), before);
}

#[test]
fn check_after_window_opens_fresh_entry() {
    let policy = policy(2, 60_000);
    let key = key("user-1", "create_goal");
    let mut table = LimiterTable::new();

    table.check(&key, &policy, at(0));
    let outcome = table.check(&key, &policy, at(60_001));

    assert_eq!(
        outcome,
        CheckOutcome::Accepted {
            entry: RateLimitEntry::from_parts(1, at(120_001)),
            opened_window: true,
        }
    );
    assert_eq!(table.entry(&key).map(RateLimitEntry::count), Some(1));
}

#[test]
fn window_closes_exactly_at_reset_instant() {
    let policy = policy(1, 1_000);
    let key = key("user-1", "list_transactions");
    let mut table = LimiterTable::new();

    table.check(&key, &policy, at(0));
    assert!(table.check(&key, &policy, at(999)).is_rejected());
    assert_eq!(table.reset_at(&key, at(999)), Some(at(1_000)));
    assert_eq!(table.reset_at(&key, at(1_000)), None);
    assert!(!table.check(&key, &policy, at(1_000)).is_rejected());
}

#[test]
fn unknown_key_reports_full_budget_and_no_reset() {
    let policy = policy(3, 1_000);
    let table = LimiterTable::new();
    let key = key("user-1", "list_transactions");

    assert_eq!(table.remaining(&key, &policy, at(0)), 3);
    assert_eq!(table.reset_at(&key, at(0)), None);
}

#[test]
fn keys_with_separator_characters_do_not_collide() {
    let policy = policy(1, 60_000);
    let mut table = LimiterTable::new();
    let first = key("user-a", "b");
    let second = key("user", "a-b");

    assert_eq!(first.to_string(), second.to_string());
    assert!(!table.check(&first, &policy, at(0)).is_rejected());
    assert!(!table.check(&second, &policy, at(0)).is_rejected());
    assert_eq!(table.len(), 2);
}

#[test]
fn sweep_removes_only_closed_windows() {
    let short = policy(5, 1_000);
    let long = policy(5, 60_000);
    let mut table = LimiterTable::new();
    let stale = key("user-1", "a");
    let live = key("user-1", "b");

    table.check(&stale, &short, at(0));
    table.check(&live, &long, at(0));

    assert_eq!(table.sweep_expired(at(1_000)), 1);
    assert!(table.entry(&stale).is_none());
    assert!(table.entry(&live).is_some());
    assert_eq!(table.remaining(&stale, &short, at(1_000)), 5);
}

#[test]
fn table_serializes_as_key_entry_pairs() {
    let policy = policy(5, 60_000);
    let mut table = LimiterTable::new();
    table.check(&key("user-1", "create_goal"), &policy, at(0));

    let json = table.to_json().unwrap_or_else(|_| unreachable!());
    let expected = format!(
        r#"[[["user-1","create_goal"],{{"count":1,"windowResetAt":{}}}]]"#,
        EPOCH_MS + 60_000
    );
    assert_eq!(json, expected);

    let decoded = LimiterTable::from_json(json.as_str()).unwrap_or_else(|_| unreachable!());
    assert_eq!(decoded, table);
}

#[test]
fn malformed_payloads_fail_to_decode() {
    assert!(LimiterTable::from_json("not json").is_err());
    assert!(LimiterTable::from_json(r#"{"count":1}"#).is_err());
    assert!(LimiterTable::from_json(r#"[[["","op"],{"count":1,"windowResetAt":0}]]"#).is_err());
    assert!(LimiterTable::from_json(r#"[[["u","op"],{"count":-1,"windowResetAt":0}]]"#).is_err());
}

proptest! {
    #[test]
    fn first_n_checks_pass_and_next_is_rejected(max_requests in 1_u32..50, step_ms in 0_i64..100) {
        let policy = policy(max_requests, 60_000);
        let key = key("user-1", "op");
        let mut table = LimiterTable::new();

        for index in 0..max_requests {
            let now = at(i64::from(index) * step_ms);
            prop_assert!(!table.check(&key, &policy, now).is_rejected());
        }
        prop_assert!(table.check(&key, &policy, at(59_999)).is_rejected());
    }

    #[test]
    fn check_after_reset_is_always_accepted(
        max_requests in 1_u32..20,
        extra in 0_u32..20,
        late_ms in 0_i64..1_000_000,
    ) {
        let policy = policy(max_requests, 60_000);
        let key = key("user-1", "op");
        let mut table = LimiterTable::new();

        for _ in 0..(max_requests + extra) {
            table.check(&key, &policy, at(0));
        }
        let after_reset = at(60_000 + late_ms);
        prop_assert!(!table.check(&key, &policy, after_reset).is_rejected());
        prop_assert_eq!(table.entry(&key).map(RateLimitEntry::count), Some(1));
    }

    #[test]
    fn remaining_drops_by_one_per_accepted_check(max_requests in 1_u32..30) {
        let policy = policy(max_requests, 60_000);
        let key = key("user-1", "op");
        let mut table = LimiterTable::new();

        let mut previous = table.remaining(&key, &policy, at(0));
        prop_assert_eq!(previous, max_requests);
        for _ in 0..max_requests {
            prop_assert!(!table.check(&key, &policy, at(1)).is_rejected());
            let current = table.remaining(&key, &policy, at(1));
            prop_assert_eq!(current + 1, previous);
            previous = current;
        }

        prop_assert_eq!(table.remaining(&key, &policy, at(60_001)), max_requests);
    }
}
