//! Node catalog: resolves node ids to names and provinces

use crate::data::{GeoNode, NodeId};
use crate::error::{AnalysisError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Lookup interface for geographic reference data
pub trait NodeCatalog {
    /// Resolve a node by id
    fn resolve_node(&self, id: NodeId) -> Option<&GeoNode>;

    /// Ids of every node mapped to `province`
    fn nodes_in_province(&self, province: &str) -> BTreeSet<NodeId>;

    /// All node ids in ascending order
    fn node_ids(&self) -> Vec<NodeId>;

    /// Province of a node, if the node exists and has one
    fn province_of(&self, id: NodeId) -> Option<&str> {
        self.resolve_node(id).and_then(|n| n.province.as_deref())
    }
}

/// Outcome of a name lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameLookup {
    /// Best match, if any
    pub node: Option<GeoNode>,
    /// Other nodes whose name contains the query
    pub candidates: Vec<GeoNode>,
}

/// Catalog backed by an in-memory id index
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    nodes: BTreeMap<NodeId, GeoNode>,
}

impl InMemoryCatalog {
    pub const MAX_CANDIDATES: usize = 10;

    /// Create a catalog; a later node with a duplicate id replaces an earlier one
    pub fn new(nodes: impl IntoIterator<Item = GeoNode>) -> Self {
        let mut index = BTreeMap::new();
        for node in nodes {
            if let Some(previous) = index.insert(node.id, node) {
                log::warn!("duplicate node id {} ({}) replaced", previous.id, previous.name);
            }
        }
        Self { nodes: index }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GeoNode> {
        self.nodes.values()
    }

    /// Find a node by name: exact match first, then substring match.
    ///
    /// At most [`Self::MAX_CANDIDATES`] candidates are returned, in id order.
    pub fn find_by_name(&self, name: &str) -> Result<NameLookup> {
        let query = name.trim();
        if query.is_empty() {
            return Err(AnalysisError::InvalidParameter(
                "missing node name".to_string(),
            ));
        }

        let exact = self.nodes.values().find(|n| n.name == query).cloned();
        let candidates: Vec<GeoNode> = self
            .nodes
            .values()
            .filter(|n| n.name.contains(query))
            .filter(|n| exact.as_ref().map_or(true, |e| e.id != n.id))
            .take(Self::MAX_CANDIDATES)
            .cloned()
            .collect();

        let node = exact.or_else(|| candidates.first().cloned());
        Ok(NameLookup { node, candidates })
    }
}

impl NodeCatalog for InMemoryCatalog {
    fn resolve_node(&self, id: NodeId) -> Option<&GeoNode> {
        self.nodes.get(&id)
    }

    fn nodes_in_province(&self, province: &str) -> BTreeSet<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.province.as_deref() == Some(province))
            .map(|n| n.id)
            .collect()
    }

    fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }
}
