//! Raw input entities, already projected into the local metric plane.
//!
//! Parsing of concrete source formats happens elsewhere; a [`Dataset`] is the
//! snapshot the converter consumes.  It can be assembled in code or read from
//! JSON.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};

use crate::tags::TagGroup;

/// Identifier of an entity in the source data.
pub type SourceId = i64;

/// A source entity, used to name the origin of derived elements in
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum SourceRef {
    Node(SourceId),
    Way(SourceId),
    Relation(SourceId),
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRef::Node(id) => write!(f, "n{id}"),
            SourceRef::Way(id) => write!(f, "w{id}"),
            SourceRef::Relation(id) => write!(f, "r{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub id: SourceId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub tags: TagGroup,
}

impl RawNode {
    #[inline] pub fn pos(&self) -> Coord<f64> { Coord { x: self.x, y: self.y } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWay {
    pub id: SourceId,
    pub nodes: Vec<SourceId>,
    #[serde(default)]
    pub tags: TagGroup,
}

impl RawWay {
    /// First and last node reference are the same.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.nodes.len() > 1 && self.nodes.first() == self.nodes.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Node,
    Way,
    Relation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMember {
    pub kind: MemberKind,
    pub id: SourceId,
    #[serde(default)]
    pub role: String,
}

impl RawMember {
    #[inline] pub fn source_ref(&self) -> SourceRef {
        match self.kind {
            MemberKind::Node => SourceRef::Node(self.id),
            MemberKind::Way => SourceRef::Way(self.id),
            MemberKind::Relation => SourceRef::Relation(self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRelation {
    pub id: SourceId,
    pub members: Vec<RawMember>,
    #[serde(default)]
    pub tags: TagGroup,
}

/// Declared extent of the dataset in plane coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(Coord { x: self.min_x, y: self.min_y }, Coord { x: self.max_x, y: self.max_y })
    }
}

/// An immutable snapshot of raw map data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub nodes: Vec<RawNode>,
    pub ways: Vec<RawWay>,
    pub relations: Vec<RawRelation>,
    pub bounds: Option<Bounds>,
}

impl Dataset {
    pub fn new() -> Self { Self::default() }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse dataset JSON")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset {}", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn with_bounds(mut self, min: (f64, f64), max: (f64, f64)) -> Self {
        self.bounds = Some(Bounds { min_x: min.0, min_y: min.1, max_x: max.0, max_y: max.1 });
        self
    }

    pub fn add_node(&mut self, id: SourceId, x: f64, y: f64, tags: TagGroup) -> &mut Self {
        self.nodes.push(RawNode { id, x, y, tags });
        self
    }

    pub fn add_way(&mut self, id: SourceId, nodes: Vec<SourceId>, tags: TagGroup) -> &mut Self {
        self.ways.push(RawWay { id, nodes, tags });
        self
    }

    /// Add a relation from `(kind, id, role)` members.
    pub fn add_relation<R: Into<String>>(
        &mut self,
        id: SourceId,
        members: impl IntoIterator<Item = (MemberKind, SourceId, R)>,
        tags: TagGroup,
    ) -> &mut Self {
        let members = members.into_iter()
            .map(|(kind, id, role)| RawMember { kind, id, role: role.into() })
            .collect();
        self.relations.push(RawRelation { id, members, tags });
        self
    }
}
