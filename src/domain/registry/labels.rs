//! Label matching for group members

use std::collections::BTreeMap;

/// Opaque key/value tags attached to a group member
pub type Labels = BTreeMap<String, String>;

/// Returns true when every query label is present on the member with an equal value
///
/// An empty query matches every member. The relation is not symmetric: `query` is
/// always the filter and `member` the subject.
pub fn matches(member: &Labels, query: &Labels) -> bool {
    query
        .iter()
        .all(|(key, value)| member.get(key) == Some(value))
}

/// Parses a `key:value,key:value` selector as used in label routes
///
/// Each entry is split at its first `:`. Entries without a separator are skipped and a
/// repeated key keeps its last value.
pub fn parse_selector(selector: &str) -> Labels {
    selector
        .split(',')
        .filter_map(|entry| entry.split_once(':'))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Renders labels back into selector form
pub fn format_selector(labels: &Labels) -> String {
    labels
        .iter()
        .map(|(key, value)| format!("{}:{}", key, value))
        .collect::<Vec<_>>()
        .join(",")
}
