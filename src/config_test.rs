use std::collections::HashMap;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_when_unset() {
    let config = EditorConfig::from_lookup(lookup(&[]));
    assert_eq!(config, EditorConfig::default());
    assert_eq!(config.history_limit, Some(DEFAULT_HISTORY_LIMIT));
}

#[test]
fn values_are_parsed() {
    let config = EditorConfig::from_lookup(lookup(&[
        ("FIELDPLAN_HISTORY_LIMIT", "25"),
        ("FIELDPLAN_HYDRATE_MAX_PAGES", " 8 "),
        ("FIELDPLAN_NOTICE_CAPACITY", "4"),
    ]));
    assert_eq!(config.history_limit, Some(25));
    assert_eq!(config.hydrate_max_pages, 8);
    assert_eq!(config.notice_capacity, 4);
}

#[test]
fn zero_history_limit_means_unbounded() {
    let config = EditorConfig::from_lookup(lookup(&[("FIELDPLAN_HISTORY_LIMIT", "0")]));
    assert_eq!(config.history_limit, None);
}

#[test]
fn garbage_falls_back_to_default() {
    let config = EditorConfig::from_lookup(lookup(&[
        ("FIELDPLAN_HISTORY_LIMIT", "lots"),
        ("FIELDPLAN_NOTICE_CAPACITY", "-3"),
    ]));
    assert_eq!(config.history_limit, Some(DEFAULT_HISTORY_LIMIT));
    assert_eq!(config.notice_capacity, DEFAULT_NOTICE_CAPACITY);
}

#[test]
fn max_pages_is_at_least_one() {
    let config = EditorConfig::from_lookup(lookup(&[("FIELDPLAN_HYDRATE_MAX_PAGES", "0")]));
    assert_eq!(config.hydrate_max_pages, 1);
}
