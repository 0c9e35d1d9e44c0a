//! Flat `key=value&key=value` query strings.

use super::percent::{decode_component, encode_component};
use crate::error::Result;
use crate::types::{ExclusionList, State};
use indexmap::IndexMap;

/// Decoded query parameters, in order of first appearance.
pub type QueryMap = IndexMap<String, String>;

/// Parse a query string into a fresh [`QueryMap`].
///
/// Returns `Ok(None)` for absent or empty input. One leading `?` is
/// stripped. Each `&`-separated segment is split on its first `=`; a
/// segment without `=` has an empty value and empty segments are skipped.
/// When a key repeats, the last value wins.
pub fn parse(query: Option<&str>) -> Result<Option<QueryMap>> {
    let query = match query {
        Some(q) if !q.is_empty() => q,
        _ => return Ok(None),
    };
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut map = QueryMap::new();
    for segment in query.split('&') {
        if segment.is_empty() {
            continue;
        }
        let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
        map.insert(decode_component(key)?, decode_component(value)?);
    }
    Ok(Some(map))
}

/// Encode string pairs as `key=value` joined by `&`. No leading `?`.
pub fn serialize_pairs<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Encode a state as a query string, skipping keys in `exclude`.
///
/// Returns `None` when there is no state. Values are stringified with
/// [`StateValue`](crate::types::StateValue)'s `Display`.
pub fn serialize(state: Option<&State>, exclude: Option<&ExclusionList>) -> Option<String> {
    let state = state?;
    let stringified: Vec<(&str, String)> = state
        .iter()
        .filter(|(key, _)| !exclude.is_some_and(|ex| ex.contains(key)))
        .map(|(key, value)| (key.as_str(), value.to_string()))
        .collect();

    Some(serialize_pairs(
        stringified.iter().map(|(key, value)| (*key, value.as_str())),
    ))
}
