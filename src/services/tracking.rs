//! Tracking list enrichment
//!
//! Joins document group metadata onto tracking list items: one lookup per
//! distinct group id, all in flight at once, merged back by id. A failed
//! lookup leaves `null` metadata on that group's items only, except an expired
//! session, which fails the whole list.

use futures_util::future::join_all;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::future::Future;

use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::GroupMeta;

/// Field holding the group id on each list item
pub const GROUP_ID_FIELD: &str = "docGId";

/// Older spellings of the group id seen on list items
pub const GROUP_ID_ALIASES: &[&str] = &["groupId", "docGroupId", "documentGroupId"];

/// Group id of a list item as a lookup key
pub fn group_id(item: &Value) -> Option<String> {
    std::iter::once(GROUP_ID_FIELD)
        .chain(GROUP_ID_ALIASES.iter().copied())
        .find_map(|key| match item.get(key)? {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        })
}

/// Distinct group ids in first-seen order
pub fn distinct_group_ids(items: &[Value]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(group_id)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Write `groupName`/`groupDescription` onto every item
pub fn merge(items: &mut [Value], groups: &HashMap<String, Option<GroupMeta>>) {
    for item in items.iter_mut() {
        let meta = group_id(item).and_then(|id| groups.get(&id).cloned().flatten());
        if let Some(obj) = item.as_object_mut() {
            let (name, description) = match meta {
                Some(meta) => (meta.name, meta.description),
                None => (Value::Null, Value::Null),
            };
            obj.insert("groupName".to_string(), name);
            obj.insert("groupDescription".to_string(), description);
        }
    }
}

/// Fetch metadata for every distinct group concurrently and merge it in
pub async fn enrich<F, Fut>(mut items: Vec<Value>, lookup: F) -> AppResult<Vec<Value>>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = AppResult<GroupMeta>>,
{
    let ids = distinct_group_ids(&items);

    let results = join_all(ids.iter().map(|id| lookup(id.clone()))).await;

    if results.iter().any(|r| matches!(r, Err(AppError::SessionExpired))) {
        return Err(AppError::SessionExpired);
    }

    let groups: HashMap<String, Option<GroupMeta>> = ids
        .into_iter()
        .zip(results)
        .map(|(id, result)| match result {
            Ok(meta) => (id, Some(meta)),
            Err(e) => {
                tracing::warn!(group_id = %id, "Group lookup failed: {}", e);
                metrics::record_group_lookup_failure();
                (id, None)
            }
        })
        .collect();

    merge(&mut items, &groups);
    Ok(items)
}
