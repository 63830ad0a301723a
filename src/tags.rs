use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Free-form key/value tags of a map entity, iterated in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagGroup {
    tags: BTreeMap<String, String>,
}

impl TagGroup {
    pub fn new() -> Self { Self::default() }

    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self { tags: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }

    /// Insert a tag, returning the previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.tags.insert(key.into(), value.into())
    }

    #[inline] pub fn get(&self, key: &str) -> Option<&str> { self.tags.get(key).map(String::as_str) }

    #[inline] pub fn contains_key(&self, key: &str) -> bool { self.tags.contains_key(key) }

    /// Returns `true` if `key` is present with exactly `value`.
    #[inline]
    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.get(key) == Some(value)
    }

    pub fn contains_any_key<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> bool {
        keys.into_iter().any(|k| self.contains_key(k))
    }

    /// Returns `true` if any tag, whatever its key, has one of `values`.
    pub fn contains_any_value<'a>(&self, values: impl IntoIterator<Item = &'a str>) -> bool {
        let values: Vec<&str> = values.into_iter().collect();
        self.tags.values().any(|v| values.contains(&v.as_str()))
    }

    /// Returns `true` if `key` is present with one of `values`.
    pub fn contains_any<'a>(&self, key: &str, values: impl IntoIterator<Item = &'a str>) -> bool {
        match self.get(key) {
            Some(v) => values.into_iter().any(|candidate| candidate == v),
            None => false,
        }
    }

    #[inline] pub fn len(&self) -> usize { self.tags.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.tags.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> IntoIterator for &'a TagGroup {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter { self.tags.iter() }
}

impl fmt::Display for TagGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{k}={v}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> TagGroup {
        TagGroup::from_pairs([("highway", "residential"), ("name", "Main Street"), ("lanes", "2")])
    }

    #[test]
    fn lookups() {
        let t = tags();
        assert_eq!(t.get("highway"), Some("residential"));
        assert!(t.contains("lanes", "2"));
        assert!(!t.contains("lanes", "3"));
        assert!(t.contains_any_key(["building", "name"]));
        assert!(!t.contains_any_key(["building"]));
        assert!(t.contains_any("highway", ["primary", "residential"]));
        assert!(!t.contains_any("surface", ["asphalt"]));
        assert!(t.contains_any_value(["2"]));
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn iterates_in_key_order() {
        let group = tags();
        let keys: Vec<&str> = group.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["highway", "lanes", "name"]);
        assert_eq!(TagGroup::from_pairs([("b", "2"), ("a", "1")]).to_string(), "{a=1, b=2}");
    }

    #[test]
    fn deserializes_from_json_object() {
        let t: TagGroup = serde_json::from_str(r#"{"building":"yes"}"#).unwrap();
        assert!(t.contains("building", "yes"));
    }
}
