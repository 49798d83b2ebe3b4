//! Reverse group-identity lookup.
//!
//! Hydration regenerates every group id on install, so a live group is
//! matched back to its snapshot group by the `(name, color)` pair.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::SchemaGroup;

/// Result of matching one live group against the snapshot's groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "ids", rename_all = "camelCase")]
pub enum GroupMatch {
    /// Exactly one snapshot group has the same name and color
    Matched(String),
    /// Several snapshot groups share the name and color (in snapshot order)
    Ambiguous(Vec<String>),
    /// No snapshot group has the same name and color
    Unmatched,
}

impl GroupMatch {
    /// Snapshot id to rewrite to. Ambiguous matches resolve to the first
    /// candidate.
    pub fn resolved_id(&self) -> Option<&str> {
        match self {
            GroupMatch::Matched(id) => Some(id),
            GroupMatch::Ambiguous(candidates) => candidates.first().map(|s| s.as_str()),
            GroupMatch::Unmatched => None,
        }
    }
}

/// Match a live group to the snapshot groups sharing its `(name, color)`
///
/// ```
/// use schemapack_core::drift::{match_group, GroupMatch};
/// use schemapack_core::model::SchemaGroup;
///
/// let snapshot = vec![SchemaGroup::new("g1", "Compute").with_color("red")];
/// let live = SchemaGroup::new("5f0c", "Compute").with_color("red");
/// assert_eq!(match_group(&live, &snapshot), GroupMatch::Matched("g1".to_string()));
/// ```
pub fn match_group(live: &SchemaGroup, snapshot_groups: &[SchemaGroup]) -> GroupMatch {
    let mut candidates: Vec<String> = snapshot_groups
        .iter()
        .filter(|g| g.name == live.name && g.color == live.color)
        .map(|g| g.id.clone())
        .collect();

    match candidates.len() {
        0 => GroupMatch::Unmatched,
        1 => GroupMatch::Matched(candidates.remove(0)),
        _ => GroupMatch::Ambiguous(candidates),
    }
}

/// Live-id → match table for all groups of one package
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReverseGroupMap {
    matches: BTreeMap<String, GroupMatch>,
}

impl ReverseGroupMap {
    pub fn build<'a>(
        live_groups: impl IntoIterator<Item = &'a SchemaGroup>,
        snapshot_groups: &[SchemaGroup],
    ) -> Self {
        let matches = live_groups
            .into_iter()
            .map(|g| (g.id.clone(), match_group(g, snapshot_groups)))
            .collect();
        Self { matches }
    }

    pub fn get(&self, live_id: &str) -> Option<&GroupMatch> {
        self.matches.get(live_id)
    }

    /// Rewrite a live group reference into the snapshot id space. References
    /// that are unmapped (or not live groups of this package) stay as they are.
    pub fn rewrite(&self, live_id: &str) -> String {
        self.matches
            .get(live_id)
            .and_then(GroupMatch::resolved_id)
            .unwrap_or(live_id)
            .to_string()
    }

    pub fn rewrite_opt(&self, live_id: &Option<String>) -> Option<String> {
        live_id.as_deref().map(|id| self.rewrite(id))
    }

    pub fn unmatched(&self) -> Vec<&str> {
        self.matches
            .iter()
            .filter(|(_, m)| **m == GroupMatch::Unmatched)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn ambiguous(&self) -> Vec<(&str, &[String])> {
        self.matches
            .iter()
            .filter_map(|(id, m)| match m {
                GroupMatch::Ambiguous(candidates) => Some((id.as_str(), candidates.as_slice())),
                _ => None,
            })
            .collect()
    }

    pub fn into_matches(self) -> BTreeMap<String, GroupMatch> {
        self.matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Vec<SchemaGroup> {
        vec![
            SchemaGroup::new("g1", "Compute").with_color("red"),
            SchemaGroup::new("g2", "Storage").with_color("blue"),
            SchemaGroup::new("g3", "Storage").with_color("blue"),
        ]
    }

    #[test]
    fn test_match_requires_name_and_color() {
        let live = SchemaGroup::new("live", "Compute").with_color("green");
        assert_eq!(match_group(&live, &snapshot()), GroupMatch::Unmatched);
    }

    #[test]
    fn test_duplicate_name_color_is_ambiguous() {
        let live = SchemaGroup::new("live", "Storage").with_color("blue");
        let result = match_group(&live, &snapshot());

        assert_eq!(
            result,
            GroupMatch::Ambiguous(vec!["g2".to_string(), "g3".to_string()])
        );
        assert_eq!(result.resolved_id(), Some("g2"));
    }

    #[test]
    fn test_map_rewrites_and_reports() {
        let live = vec![
            SchemaGroup::new("l1", "Compute").with_color("red"),
            SchemaGroup::new("l2", "Renamed").with_color("red"),
        ];
        let map = ReverseGroupMap::build(&live, &snapshot());

        assert_eq!(map.rewrite("l1"), "g1");
        assert_eq!(map.rewrite("l2"), "l2");
        assert_eq!(map.rewrite("foreign"), "foreign");
        assert_eq!(map.unmatched(), vec!["l2"]);
        assert!(map.ambiguous().is_empty());
    }

    #[test]
    fn test_group_match_serializes_tagged() {
        let json = serde_json::to_value(GroupMatch::Matched("g1".to_string())).unwrap();
        assert_eq!(json["match"], "matched");
        assert_eq!(json["ids"], "g1");
    }
}
