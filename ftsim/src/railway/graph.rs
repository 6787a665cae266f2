//! Topology graph uniting all journey paths.
//!
//! Paths are authored independently and may overlap. The graph stores each
//! distinct parent/child adjacency once, so layout computations (signals,
//! balise positions) run once per topological root instead of once per path.

use failure::Fail;
use smallvec::SmallVec;
use std::collections::{BTreeSet, HashMap, HashSet};

use super::connectable::Connectable;

#[derive(Debug, Fail, PartialEq)]
pub enum GraphError {
    #[fail(display = "the graph has not been built")]
    NotBuilt,
    #[fail(display = "branching at {:?} is not supported", node)]
    Branching { node: Connectable },
    #[fail(display = "the network loops back onto {:?}", node)]
    Cycle { node: Connectable },
    #[fail(display = "{:?} is not part of the graph", node)]
    UnknownNode { node: Connectable },
}

type Adjacent = SmallVec<[Connectable; 2]>;

#[derive(Debug, Default)]
pub struct MapGraph {
    nodes: BTreeSet<Connectable>,
    edges: Vec<(Connectable, Connectable)>,
    children: HashMap<Connectable, Adjacent>,
    parents: HashMap<Connectable, Adjacent>,
    built: bool,
}

fn push_unique(adj: &mut Adjacent, c: Connectable) {
    if !adj.contains(&c) {
        adj.push(c);
    }
}

impl MapGraph {
    pub fn new() -> MapGraph {
        Default::default()
    }

    /// Registers a directed adjacency. Without a parent the child is only
    /// registered as a node.
    pub fn add_edge(&mut self, parent: Option<Connectable>, child: Connectable) {
        self.nodes.insert(child);
        if let Some(parent) = parent {
            self.nodes.insert(parent);
            self.edges.push((parent, child));
        }
        self.built = false;
    }

    pub fn build_graph(&mut self) {
        self.children.clear();
        self.parents.clear();
        for node in &self.nodes {
            self.children.insert(*node, Adjacent::new());
            self.parents.insert(*node, Adjacent::new());
        }
        for &(parent, child) in &self.edges {
            if let Some(adj) = self.children.get_mut(&parent) {
                push_unique(adj, child);
            }
            if let Some(adj) = self.parents.get_mut(&child) {
                push_unique(adj, parent);
            }
        }
        self.built = true;
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    fn check_built(&self) -> Result<(), GraphError> {
        if self.built { Ok(()) } else { Err(GraphError::NotBuilt) }
    }

    /// Nodes without a parent, in handle order.
    pub fn root_connectables(&self) -> Result<Vec<Connectable>, GraphError> {
        self.check_built()?;
        Ok(self.nodes.iter().cloned().filter(|n| self.parents[n].is_empty()).collect())
    }

    pub fn children(&self, node: Connectable) -> Result<&[Connectable], GraphError> {
        self.check_built()?;
        self.children.get(&node).map(|a| a.as_slice())
            .ok_or(GraphError::UnknownNode { node: node })
    }

    pub fn parents(&self, node: Connectable) -> Result<&[Connectable], GraphError> {
        self.check_built()?;
        self.parents.get(&node).map(|a| a.as_slice())
            .ok_or(GraphError::UnknownNode { node: node })
    }

    pub fn first_child(&self, node: Connectable) -> Result<Option<Connectable>, GraphError> {
        Ok(self.children(node)?.first().cloned())
    }

    /// Walks a linear run starting at `root`.
    pub fn iter(&self, root: Connectable) -> Result<GraphIter, GraphError> {
        self.check_built()?;
        if !self.nodes.contains(&root) {
            return Err(GraphError::UnknownNode { node: root });
        }
        Ok(GraphIter {
            graph: self,
            next: Some(root),
            visited: HashSet::new(),
        })
    }

    /// The node itself if it is a track, otherwise the first track reached
    /// by following first children.
    pub fn first_track(&self, node: Connectable) -> Result<Option<Connectable>, GraphError> {
        self.check_built()?;
        let mut visited = HashSet::new();
        let mut current = Some(node);
        while let Some(c) = current {
            if c.is_track() {
                return Ok(Some(c));
            }
            if !visited.insert(c) {
                return Ok(None);
            }
            current = self.first_child(c)?;
        }
        Ok(None)
    }
}

/// Forward-only iterator over a non-branching run of the graph.
///
/// Yields `Err` once and then stops when a node has more than one child
/// or the run returns to a node it already visited.
pub struct GraphIter<'a> {
    graph: &'a MapGraph,
    next: Option<Connectable>,
    visited: HashSet<Connectable>,
}

impl<'a> Iterator for GraphIter<'a> {
    type Item = Result<Connectable, GraphError>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next.take()?;
        if !self.visited.insert(node) {
            return Some(Err(GraphError::Cycle { node: node }));
        }
        let children = &self.graph.children[&node];
        match children.len() {
            0 => {}
            1 => self.next = Some(children[0]),
            _ => return Some(Err(GraphError::Branching { node: node })),
        }
        Some(Ok(node))
    }
}
