//! Conversion from a raw [`Dataset`] into a finished [`MapModel`].
//!
//! Phases, in order:
//!
//! 1. a node per source node
//! 2. areas from multipolygon relations, then from closed ways with an area tag
//! 3. background terrain (optional, needs declared bounds)
//! 4. ways from the remaining tagged ways
//! 5. relations that did not become areas
//! 6. node finalization (data boundary, sorted adjacency)
//! 7. overlap detection
//!
//! Entities with broken geometry are logged and skipped; nothing short of an
//! unusable configuration aborts the run.

mod multipolygon;
mod relations;
mod terrain;

use ahash::AHashMap;
use anyhow::Result;

use crate::config::ConversionConfig;
use crate::index::detect_overlaps;
use crate::input::{Dataset, RawWay, SourceId};
use crate::model::{AreaId, AreaSource, MapModel, NodeId, WayId};
use crate::ruleset::Ruleset;

use relations::MemberLookup;

/// Turns raw datasets into map models using an injected ruleset and settings.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    ruleset: Ruleset,
    config: ConversionConfig,
}

impl Converter {
    pub fn new(ruleset: Ruleset, config: ConversionConfig) -> Self {
        Self { ruleset, config }
    }

    #[inline] pub fn ruleset(&self) -> &Ruleset { &self.ruleset }

    #[inline] pub fn config(&self) -> &ConversionConfig { &self.config }

    pub fn convert(&self, data: &Dataset) -> Result<MapModel> {
        self.config.validate()?;

        let mut model = MapModel::new(data.bounds.map(|b| b.to_rect()));

        // 1. nodes
        let mut node_ids: AHashMap<SourceId, NodeId> = AHashMap::with_capacity(data.nodes.len());
        for raw in &data.nodes {
            if node_ids.contains_key(&raw.id) {
                tracing::warn!(node = raw.id, "duplicate node id, keeping the first");
                continue;
            }
            let id = model.add_node(raw.pos(), Some(raw.id), raw.tags.clone());
            node_ids.insert(raw.id, id);
        }

        // 2a. multipolygon areas
        let ways_by_id: AHashMap<SourceId, &RawWay> = data.ways.iter().map(|w| (w.id, w)).collect();
        let mut relation_areas: AHashMap<SourceId, Vec<AreaId>> = AHashMap::new();

        for relation in &data.relations {
            if !relation.tags.contains("type", "multipolygon") { continue }
            let areas = multipolygon::build_areas(&mut model, relation, &ways_by_id, &node_ids);
            if !areas.is_empty() {
                relation_areas.insert(relation.id, areas);
            }
        }

        // 2b. closed-way areas
        let mut way_areas: AHashMap<SourceId, AreaId> = AHashMap::new();
        for way in &data.ways {
            if !way.is_closed() || !self.ruleset.has_area_tag(&way.tags) { continue }

            let Some(nodes) = resolve_all(way, &node_ids) else {
                tracing::warn!(way = way.id, "area way references missing nodes");
                continue;
            };

            match model.add_area(AreaSource::Way(way.id), way.tags.clone(), nodes, Vec::new()) {
                Ok(id) => { way_areas.insert(way.id, id); }
                Err(error) => tracing::warn!(entity = %error.entity(), %error, "skipping area"),
            }
        }

        // 3. terrain
        match (self.config.create_terrain, model.file_boundary()) {
            (true, Some(boundary)) => {
                terrain::build_terrain(&mut model, boundary, self.config.terrain_cells_per_axis);
            }
            (true, None) => tracing::debug!("no declared bounds, skipping terrain"),
            (false, _) => {}
        }

        // 4. ways
        let mut way_ids: AHashMap<SourceId, WayId> = AHashMap::new();
        for way in &data.ways {
            if way.tags.is_empty() || way_areas.contains_key(&way.id) { continue }

            let nodes: Vec<NodeId> = way.nodes.iter().filter_map(|id| node_ids.get(id).copied()).collect();
            if nodes.len() < way.nodes.len() {
                tracing::warn!(way = way.id, missing = way.nodes.len() - nodes.len(), "way references missing nodes");
            }
            if nodes.len() < 2 {
                tracing::warn!(way = way.id, "skipping way with fewer than two resolved nodes");
                continue;
            }

            way_ids.insert(way.id, model.add_way(way.id, way.tags.clone(), nodes));
        }

        // 5. relations
        let lookup = MemberLookup {
            nodes: &node_ids,
            ways: &way_ids,
            way_areas: &way_areas,
            relation_areas: &relation_areas,
        };
        relations::build_relations(&mut model, &data.relations, &self.ruleset, &lookup);

        // 6. adjacency
        model.finalize();

        // 7. overlaps
        detect_overlaps(&mut model, &self.config);

        tracing::info!(
            nodes = model.num_nodes(),
            ways = model.num_ways(),
            areas = model.num_areas(),
            relations = model.num_relations(),
            overlaps = model.num_overlaps(),
            "map model built"
        );

        Ok(model)
    }
}

/// All nodes of a way, or `None` if any is missing.
fn resolve_all(way: &RawWay, node_ids: &AHashMap<SourceId, NodeId>) -> Option<Vec<NodeId>> {
    way.nodes.iter().map(|id| node_ids.get(id).copied()).collect()
}
