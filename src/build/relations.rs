use ahash::{AHashMap, AHashSet};

use crate::input::{MemberKind, RawRelation, SourceId};
use crate::model::{AreaId, MapModel, MemberRef, Membership, NodeId, Relation, RelationId, WayId};
use crate::ruleset::Ruleset;

/// Lookup tables from source ids to model elements.
pub(crate) struct MemberLookup<'a> {
    pub nodes: &'a AHashMap<SourceId, NodeId>,
    pub ways: &'a AHashMap<SourceId, WayId>,
    pub way_areas: &'a AHashMap<SourceId, AreaId>,
    pub relation_areas: &'a AHashMap<SourceId, Vec<AreaId>>,
}

impl MemberLookup<'_> {
    /// Elements a member resolves to: empty if it is missing from the model.
    fn resolve(&self, kind: MemberKind, id: SourceId) -> Vec<MemberRef> {
        match kind {
            MemberKind::Node => self.nodes.get(&id).map(|&n| MemberRef::Node(n)).into_iter().collect(),
            MemberKind::Way => match self.ways.get(&id) {
                Some(&w) => vec![MemberRef::Way(w)],
                None => self.way_areas.get(&id).map(|&a| MemberRef::Area(a)).into_iter().collect(),
            },
            MemberKind::Relation => self.relation_areas.get(&id)
                .map(|areas| areas.iter().map(|&a| MemberRef::Area(a)).collect())
                .unwrap_or_default(),
        }
    }
}

/// Add every tagged relation that did not become areas and whose type the
/// ruleset allows.  Members that cannot be resolved are reported; a relation
/// left without any member is dropped.
pub(crate) fn build_relations(
    model: &mut MapModel,
    relations: &[RawRelation],
    ruleset: &Ruleset,
    lookup: &MemberLookup<'_>,
) -> Vec<RelationId> {
    let relation_ids: AHashSet<SourceId> = relations.iter().map(|r| r.id).collect();
    let mut created = Vec::new();

    for raw in relations {
        if raw.tags.is_empty() || lookup.relation_areas.contains_key(&raw.id) { continue }
        if !ruleset.is_relation_type_allowed(raw.tags.get("type")) { continue }

        let mut memberships = Vec::with_capacity(raw.members.len());
        let mut missing = Vec::new();

        for member in &raw.members {
            let resolved = lookup.resolve(member.kind, member.id);
            if resolved.is_empty() {
                // Member relations that exist but are not areas are not supported yet.
                if member.kind == MemberKind::Relation && relation_ids.contains(&member.id) { continue }
                missing.push(format!("'{}': {}", member.role, member.source_ref()));
                continue;
            }
            memberships.extend(resolved.into_iter().map(|element| Membership { role: member.role.clone(), element }));
        }

        if !missing.is_empty() {
            tracing::warn!(relation = raw.id, missing = %missing.join(", "), "relation is incomplete");
            if memberships.is_empty() { continue }
        }

        created.push(model.add_relation(Relation { source: raw.id, tags: raw.tags.clone(), memberships }));
    }

    created
}
