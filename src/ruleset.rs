use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::tags::TagGroup;

/// Decides which tags make a closed way an area and which relation types are
/// kept in the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ruleset {
    /// Keys that make a closed way an area whatever their value.
    pub area_keys: BTreeSet<String>,
    /// Individual `key=value` pairs that make a closed way an area.
    pub area_tags: BTreeMap<String, BTreeSet<String>>,
    /// Relation `type` values that are retained as relations.
    pub relation_types: BTreeSet<String>,
}

impl Default for Ruleset {
    fn default() -> Self {
        let area_keys = [
            "area:highway", "amenity", "building", "building:part", "golf", "landcover",
            "landuse", "leisure", "natural", "place", "waterway:riverbank",
        ];

        let area_tags: [(&str, &[&str]); 6] = [
            ("area", &["yes"]),
            ("highway", &["pedestrian", "platform", "services", "rest_area"]),
            ("man_made", &["bridge", "pier", "wastewater_plant", "water_works"]),
            ("power", &["plant", "substation", "generator"]),
            ("railway", &["platform", "station"]),
            ("waterway", &["dock", "boatyard"]),
        ];

        let relation_types = ["bridge", "building", "route", "site", "tunnel"];

        Self {
            area_keys: area_keys.iter().map(|k| k.to_string()).collect(),
            area_tags: area_tags.iter()
                .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
                .collect(),
            relation_types: relation_types.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Ruleset {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse ruleset JSON")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read ruleset {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Returns `true` if the single tag `key=value` marks an area.
    pub fn is_area_tag(&self, key: &str, value: &str) -> bool {
        self.area_keys.contains(key)
            || self.area_tags.get(key).is_some_and(|values| values.contains(value))
    }

    /// Returns `true` if at least one tag of `tags` marks an area.
    pub fn has_area_tag(&self, tags: &TagGroup) -> bool {
        tags.iter().any(|(k, v)| self.is_area_tag(k, v))
    }

    pub fn is_relation_type_allowed(&self, relation_type: Option<&str>) -> bool {
        relation_type.is_some_and(|t| self.relation_types.contains(t))
    }
}
