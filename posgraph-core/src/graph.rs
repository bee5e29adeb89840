//! Directed graph with positioned nodes and labelled edges.
//!
//! Nodes are identified by the dense range `[0, N)` and stored by index, so a
//! node's identifier is its offset in the position table. Cloning a [`Graph`]
//! copies every position and edge.

use std::collections::HashSet;

use crate::{
    error::MalformedGraph,
    geometry::{Direction, Position},
};

/// Identifier of a node within a [`Graph`].
///
/// # Examples
/// ```
/// use posgraph_core::NodeId;
///
/// let id = NodeId::new(3);
/// assert_eq!(id.get(), 3);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(u32);

impl NodeId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

/// A directed, labelled edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    /// Tail of the edge.
    pub source: NodeId,
    /// Head of the edge.
    pub target: NodeId,
    /// Label assigned when the edge was built.
    pub direction: Direction,
}

/// Counts describing how much information a graph still carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Number of nodes.
    pub nodes: usize,
    /// Number of edges.
    pub edges: usize,
    /// Edges whose label was erased.
    pub unlabeled_edges: usize,
    /// Nodes whose position was erased.
    pub absent_positions: usize,
}

/// Directed graph over nodes `0..N`.
///
/// # Examples
/// ```
/// use posgraph_core::{Direction, Edge, Graph, NodeId, Position};
///
/// let graph = Graph::from_parts(
///     vec![Position::Present(0.0, 0.0), Position::Absent],
///     vec![Edge {
///         source: NodeId::new(0),
///         target: NodeId::new(1),
///         direction: Direction::South,
///     }],
/// )?;
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.direction(NodeId::new(0), NodeId::new(1)), Some(Direction::South));
/// assert_eq!(graph.known_mask(), vec![true, false]);
/// # Ok::<(), posgraph_core::MalformedGraph>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    positions: Vec<Position>,
    edges: Vec<Edge>,
}

impl Graph {
    /// Builds a graph from a dense position table and an edge list.
    ///
    /// # Errors
    /// Returns [`MalformedGraph::UnknownEndpoint`] when an edge references a
    /// node outside `[0, positions.len())`, [`MalformedGraph::SelfLoop`] for
    /// loops, and [`MalformedGraph::DuplicateEdge`] when an ordered pair
    /// repeats.
    pub fn from_parts(positions: Vec<Position>, edges: Vec<Edge>) -> Result<Self, MalformedGraph> {
        let count = positions.len();
        let mut seen = HashSet::with_capacity(edges.len());
        for edge in &edges {
            let (from, to) = (edge.source.get(), edge.target.get());
            if edge.source.index() >= count || edge.target.index() >= count {
                return Err(MalformedGraph::UnknownEndpoint { from, to, count });
            }
            if from == to {
                return Err(MalformedGraph::SelfLoop { node: from });
            }
            if !seen.insert((from, to)) {
                return Err(MalformedGraph::DuplicateEdge { from, to });
            }
        }
        Ok(Self { positions, edges })
    }

    /// Assembles a graph the builder already knows to be well formed.
    pub(crate) const fn from_trusted_parts(positions: Vec<Position>, edges: Vec<Edge>) -> Self {
        Self { positions, edges }
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the position of `node`, or `None` when the node does not exist.
    #[must_use]
    pub fn position(&self, node: NodeId) -> Option<Position> {
        self.positions.get(node.index()).copied()
    }

    /// Iterates over `(id, position)` pairs in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, Position)> + '_ {
        (0_u32..)
            .zip(&self.positions)
            .map(|(id, position)| (NodeId::new(id), *position))
    }

    /// Returns the edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns the label of the edge `source -> target` if the edge exists.
    #[must_use]
    pub fn direction(&self, source: NodeId, target: NodeId) -> Option<Direction> {
        self.edges
            .iter()
            .find(|edge| edge.source == source && edge.target == target)
            .map(|edge| edge.direction)
    }

    /// Returns `true` for every node whose position is still known.
    ///
    /// Training code uses the mask to split nodes with ground-truth positions
    /// from the ones the model must recover.
    #[must_use]
    pub fn known_mask(&self) -> Vec<bool> {
        self.positions.iter().map(|p| p.is_present()).collect()
    }

    /// Summarises node, edge, and erasure counts.
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.node_count(),
            edges: self.edge_count(),
            unlabeled_edges: self
                .edges
                .iter()
                .filter(|edge| !edge.direction.is_labeled())
                .count(),
            absent_positions: self.positions.iter().filter(|p| !p.is_present()).count(),
        }
    }

    pub(crate) fn positions_mut(&mut self) -> &mut [Position] {
        &mut self.positions
    }

    pub(crate) fn edges_mut(&mut self) -> &mut Vec<Edge> {
        &mut self.edges
    }
}
