//! In-memory knowledge graph.
//!
//! Undirected, at most one relation per entity pair. Entities and neighbours
//! keep insertion order, so queries and path searches are deterministic.
//! Relating unknown entities creates them with no properties.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Longest path (in relations) `find_paths` will follow.
pub const PATH_CUTOFF: usize = 3;
pub const DEFAULT_MAX_PATHS: usize = 3;

pub type Properties = Map<String, Value>;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Entity not found: {0}")]
    EntityNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relation {
    pub target: String,
    pub relation: String,
    pub properties: Properties,
}

#[derive(Debug, Clone)]
struct Node {
    id: String,
    properties: Properties,
    /// (neighbour node index, edge index)
    neighbours: Vec<(usize, usize)>,
}

#[derive(Debug, Clone)]
struct Edge {
    relation: String,
    properties: Properties,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relation_count(&self) -> usize {
        self.edges.len()
    }

    pub fn entity(&self, id: &str) -> Option<&Properties> {
        self.index.get(id).map(|&i| &self.nodes[i].properties)
    }

    /// Adds an entity, or merges `properties` into an existing one.
    pub fn add_entity(&mut self, id: &str, properties: Properties) {
        let i = self.node_index(id);
        self.nodes[i].properties.extend(properties);
    }

    /// Relates two entities. Re-relating a pair replaces the relation type and
    /// merges the properties.
    pub fn add_relation(
        &mut self,
        source: &str,
        target: &str,
        relation: &str,
        properties: Properties,
    ) {
        let s = self.node_index(source);
        let t = self.node_index(target);

        if let Some(&(_, e)) = self.nodes[s].neighbours.iter().find(|(n, _)| *n == t) {
            let edge = &mut self.edges[e];
            edge.relation = relation.to_string();
            edge.properties.extend(properties);
            return;
        }

        let e = self.edges.len();
        self.edges.push(Edge {
            relation: relation.to_string(),
            properties,
        });
        self.nodes[s].neighbours.push((t, e));
        if s != t {
            self.nodes[t].neighbours.push((s, e));
        }
    }

    /// Entity ids whose properties contain every key/value in `filter`.
    /// An empty filter matches every entity.
    pub fn query_entities(&self, filter: &Properties) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|node| {
                filter
                    .iter()
                    .all(|(key, value)| node.properties.get(key) == Some(value))
            })
            .map(|node| node.id.clone())
            .collect()
    }

    pub fn get_relations(&self, id: &str) -> Result<Vec<Relation>, GraphError> {
        let &i = self
            .index
            .get(id)
            .ok_or_else(|| GraphError::EntityNotFound(id.to_string()))?;

        Ok(self.nodes[i]
            .neighbours
            .iter()
            .map(|&(n, e)| Relation {
                target: self.nodes[n].id.clone(),
                relation: self.edges[e].relation.clone(),
                properties: self.edges[e].properties.clone(),
            })
            .collect())
    }

    /// Simple paths from `source` to `target` of at most `PATH_CUTOFF`
    /// relations, in depth-first order, truncated to `max_paths`. Unknown
    /// entities or `source == target` yield no paths.
    pub fn find_paths(&self, source: &str, target: &str, max_paths: usize) -> Vec<Vec<String>> {
        let (Some(&s), Some(&t)) = (self.index.get(source), self.index.get(target)) else {
            return Vec::new();
        };
        if s == t || max_paths == 0 {
            return Vec::new();
        }

        let mut paths = Vec::new();
        let mut current = vec![s];
        self.walk(t, &mut current, &mut paths, max_paths);
        paths
            .into_iter()
            .map(|path| path.into_iter().map(|i| self.nodes[i].id.clone()).collect())
            .collect()
    }

    fn walk(
        &self,
        target: usize,
        current: &mut Vec<usize>,
        paths: &mut Vec<Vec<usize>>,
        max_paths: usize,
    ) {
        let Some(&last) = current.last() else {
            return;
        };
        for &(next, _) in &self.nodes[last].neighbours {
            if paths.len() >= max_paths {
                return;
            }
            if current.contains(&next) {
                continue;
            }
            if next == target {
                let mut path = current.clone();
                path.push(next);
                paths.push(path);
            } else if current.len() < PATH_CUTOFF {
                current.push(next);
                self.walk(target, current, paths, max_paths);
                current.pop();
            }
        }
    }

    fn node_index(&mut self, id: &str) -> usize {
        if let Some(&i) = self.index.get(id) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(Node {
            id: id.to_string(),
            properties: Properties::new(),
            neighbours: Vec::new(),
        });
        self.index.insert(id.to_string(), i);
        i
    }
}
