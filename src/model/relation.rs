use crate::input::SourceId;
use crate::tags::TagGroup;

use super::ids::{AreaId, NodeId, WayId};

/// An element a relation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberRef {
    Node(NodeId),
    Way(WayId),
    Area(AreaId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub role: String,
    pub element: MemberRef,
}

/// A tagged, ordered collection of memberships.
#[derive(Debug, Clone)]
pub struct Relation {
    pub(crate) source: SourceId,
    pub(crate) tags: TagGroup,
    pub(crate) memberships: Vec<Membership>,
}

impl Relation {
    #[inline] pub fn source(&self) -> SourceId { self.source }

    #[inline] pub fn tags(&self) -> &TagGroup { &self.tags }

    #[inline] pub fn memberships(&self) -> &[Membership] { &self.memberships }

    /// Members with the given role, in relation order.
    pub fn members_with_role<'a>(&'a self, role: &'a str) -> impl Iterator<Item = MemberRef> + 'a {
        self.memberships.iter().filter(move |m| m.role == role).map(|m| m.element)
    }
}
