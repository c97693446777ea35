//! Per-part visibility flags
//!
//! The map is independent of GPU state: clearing GPU resources never touches it.
//! On disk it is a JSON object keyed by the stringified part id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::PartId;

/// Show/hide flag per part. Ids that are not present are visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, bool>", into = "BTreeMap<String, bool>")]
pub struct VisibilityMap {
    flags: BTreeMap<PartId, bool>,
}

impl VisibilityMap {
    /// Create an empty map (everything visible)
    pub fn new() -> Self {
        Self::default()
    }

    /// Map with every given part visible
    pub fn all_visible(parts: impl IntoIterator<Item = PartId>) -> Self {
        Self {
            flags: parts.into_iter().map(|id| (id, true)).collect(),
        }
    }

    /// Whether a part should be drawn. Defaults to `true` for unknown ids.
    pub fn is_visible(&self, id: PartId) -> bool {
        self.flags.get(&id).copied().unwrap_or(true)
    }

    /// Explicit flag for a part, if one was recorded
    pub fn get(&self, id: PartId) -> Option<bool> {
        self.flags.get(&id).copied()
    }

    /// Record a flag for a part
    pub fn set(&mut self, id: PartId, visible: bool) {
        self.flags.insert(id, visible);
    }

    /// Invert the flag for a part and return the new value
    pub fn toggle(&mut self, id: PartId) -> bool {
        let visible = !self.is_visible(id);
        self.flags.insert(id, visible);
        visible
    }

    pub fn contains(&self, id: PartId) -> bool {
        self.flags.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Iterate `(id, visible)` pairs in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (PartId, bool)> + '_ {
        self.flags.iter().map(|(&id, &visible)| (id, visible))
    }

    /// Build the map for a freshly loaded part set.
    ///
    /// Every id in `parts` takes its value from `previous` when present and
    /// defaults to visible otherwise. Ids of `previous` that are not in
    /// `parts` are dropped.
    pub fn reconcile(parts: impl IntoIterator<Item = PartId>, previous: &VisibilityMap) -> Self {
        Self {
            flags: parts
                .into_iter()
                .map(|id| (id, previous.get(id).unwrap_or(true)))
                .collect(),
        }
    }
}

impl FromIterator<(PartId, bool)> for VisibilityMap {
    fn from_iter<I: IntoIterator<Item = (PartId, bool)>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<String, bool>> for VisibilityMap {
    fn from(raw: BTreeMap<String, bool>) -> Self {
        let mut flags = BTreeMap::new();
        for (key, visible) in raw {
            match key.trim().parse::<PartId>() {
                Ok(id) => {
                    flags.insert(id, visible);
                }
                Err(_) => warn!("Ignoring visibility entry with non-numeric part id '{}'", key),
            }
        }
        Self { flags }
    }
}

impl From<VisibilityMap> for BTreeMap<String, bool> {
    fn from(map: VisibilityMap) -> Self {
        map.flags
            .into_iter()
            .map(|(id, visible)| (id.to_string(), visible))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_ids_are_visible() {
        let mut map = VisibilityMap::new();
        assert!(map.is_visible(7));
        map.set(7, false);
        assert!(!map.is_visible(7));
        assert!(map.is_visible(8));
    }

    #[test]
    fn test_toggle() {
        let mut map = VisibilityMap::new();
        assert!(!map.toggle(2));
        assert!(map.toggle(2));
        assert_eq!(map.get(2), Some(true));
    }

    #[test]
    fn test_reconcile_carries_known_ids_and_drops_stale() {
        let previous: VisibilityMap = [(0, false), (1, true), (5, false)].into_iter().collect();
        let map = VisibilityMap::reconcile(0..3, &previous);

        assert_eq!(map.get(0), Some(false));
        assert_eq!(map.get(1), Some(true));
        assert_eq!(map.get(2), Some(true));
        assert_eq!(map.get(5), None);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_reconcile_against_empty_is_all_visible() {
        let map = VisibilityMap::reconcile(0..4, &VisibilityMap::new());
        assert_eq!(map, VisibilityMap::all_visible(0..4));
    }

    #[test]
    fn test_json_uses_string_keys() {
        let map: VisibilityMap = [(0, true), (3, false)].into_iter().collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"0":true,"3":false}"#);

        let parsed: VisibilityMap = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, map);
    }

    #[test]
    fn test_json_skips_bad_keys() {
        let parsed: VisibilityMap = serde_json::from_str(r#"{"1":false,"head":true}"#).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(!parsed.is_visible(1));
    }
}
