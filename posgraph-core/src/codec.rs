//! Node-link JSON persistence for graphs.
//!
//! Files hold one graph each:
//!
//! ```json
//! {
//!   "directed": true,
//!   "nodes": [{ "id": 0, "pos": [0.25, 0.5] }, { "id": 1, "pos": [] }],
//!   "links": [{ "source": 0, "target": 1, "dir": "West" }]
//! }
//! ```
//!
//! An empty `pos` marks an erased position and `"N/A"` an erased label.
//! Unknown keys are ignored on read, so files written by networkx load as
//! well.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    error::{CodecError, MalformedGraph},
    geometry::{Direction, Position},
    graph::{Edge, Graph, NodeId},
};

#[derive(Debug, Serialize, Deserialize)]
struct WireGraph {
    directed: bool,
    nodes: Vec<WireNode>,
    links: Vec<WireLink>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireNode {
    id: u32,
    pos: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireLink {
    source: u32,
    target: u32,
    dir: Direction,
}

impl From<&Graph> for WireGraph {
    fn from(graph: &Graph) -> Self {
        let nodes = graph
            .nodes()
            .map(|(id, position)| WireNode {
                id: id.get(),
                pos: position.coords().map_or_else(Vec::new, |(x, y)| vec![x, y]),
            })
            .collect();
        let links = graph
            .edges()
            .iter()
            .map(|edge| WireLink {
                source: edge.source.get(),
                target: edge.target.get(),
                dir: edge.direction,
            })
            .collect();
        Self {
            directed: true,
            nodes,
            links,
        }
    }
}

impl TryFrom<WireGraph> for Graph {
    type Error = MalformedGraph;

    fn try_from(wire: WireGraph) -> Result<Self, Self::Error> {
        if !wire.directed {
            return Err(MalformedGraph::Undirected);
        }

        let count = wire.nodes.len();
        let mut slots: Vec<Option<Position>> = vec![None; count];
        for node in wire.nodes {
            let slot = usize::try_from(node.id)
                .ok()
                .and_then(|index| slots.get_mut(index))
                .ok_or(MalformedGraph::NonContiguousNodes {
                    node: node.id,
                    count,
                })?;
            if slot.is_some() {
                return Err(MalformedGraph::DuplicateNode { node: node.id });
            }
            *slot = Some(decode_position(node.id, &node.pos)?);
        }
        // `count` distinct ids inside `[0, count)` fill every slot.
        let positions = slots.into_iter().flatten().collect();

        let edges = wire
            .links
            .into_iter()
            .map(|link| Edge {
                source: NodeId::new(link.source),
                target: NodeId::new(link.target),
                direction: link.dir,
            })
            .collect();
        Self::from_parts(positions, edges)
    }
}

fn decode_position(node: u32, raw: &[f64]) -> Result<Position, MalformedGraph> {
    match raw {
        [] => Ok(Position::Absent),
        [x, y] => Ok(Position::Present(*x, *y)),
        other => Err(MalformedGraph::InvalidPosition {
            node,
            len: other.len(),
        }),
    }
}

/// Writes `graph` to `path` as node-link JSON.
///
/// The parent directory must already exist.
///
/// # Errors
/// Returns [`CodecError::Io`] when the file cannot be created or written.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use posgraph_core::{GraphBuilder, load_graph, save};
/// # use rand::{SeedableRng, rngs::SmallRng};
/// # use tempfile::TempDir;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let dir = TempDir::new()?;
/// let path = dir.path().join("graph.json");
/// let graph = GraphBuilder::new(3).build(&mut SmallRng::seed_from_u64(1))?;
/// save(&graph, &path)?;
/// assert_eq!(load_graph(&path)?, graph);
/// # Ok(())
/// # }
/// ```
#[instrument(name = "codec.save", skip(graph, path), fields(path = %path.display()))]
pub fn save(graph: &Graph, path: &Path) -> Result<(), CodecError> {
    let file = File::create(path).map_err(|source| io_failure(path, source))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &WireGraph::from(graph))
        .map_err(|source| json_failure(path, source))?;
    writer.flush().map_err(|source| io_failure(path, source))?;
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "saved graph"
    );
    Ok(())
}

/// Reads a single graph file.
///
/// # Errors
/// Returns [`CodecError::Io`] when the file cannot be read,
/// [`CodecError::Syntax`] when it is not valid JSON or lacks a required
/// field, and [`CodecError::Malformed`] when it describes an invalid graph.
pub fn load_graph(path: &Path) -> Result<Graph, CodecError> {
    let file = File::open(path).map_err(|source| io_failure(path, source))?;
    let wire: WireGraph = serde_json::from_reader(BufReader::new(file))
        .map_err(|source| json_failure(path, source))?;
    Graph::try_from(wire).map_err(|detail| CodecError::Malformed {
        path: path.to_path_buf(),
        detail,
    })
}

/// Loads every graph in `directory` whose file name starts with `batch_id`.
///
/// Files are read in ascending lexicographic order of their names. Loading
/// stops at the first file that fails. A prefix that matches nothing yields an
/// empty list.
///
/// # Errors
/// Returns [`CodecError::Io`] when the directory cannot be listed or a file
/// cannot be read, and the errors of [`load_graph`] for malformed files.
#[instrument(name = "codec.load", skip(directory), fields(directory = %directory.display()))]
pub fn load(batch_id: &str, directory: &Path) -> Result<Vec<Graph>, CodecError> {
    let paths = matching_files(batch_id, directory)?;
    debug!(files = paths.len(), "loading batch");
    paths.iter().map(|path| load_graph(path)).collect()
}

fn matching_files(prefix: &str, directory: &Path) -> Result<Vec<PathBuf>, CodecError> {
    let entries = fs::read_dir(directory).map_err(|source| io_failure(directory, source))?;
    let mut matches = Vec::new();
    for entry in entries {
        let item = entry.map_err(|source| io_failure(directory, source))?;
        let path = item.path();
        if !path.is_file() {
            continue;
        }
        let Ok(name) = item.file_name().into_string() else {
            continue;
        };
        if name.starts_with(prefix) {
            matches.push((name, path));
        }
    }
    matches.sort_by(|left, right| left.0.cmp(&right.0));
    Ok(matches.into_iter().map(|(_, path)| path).collect())
}

fn io_failure(path: &Path, source: io::Error) -> CodecError {
    CodecError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn json_failure(path: &Path, source: serde_json::Error) -> CodecError {
    if source.is_io() {
        io_failure(path, io::Error::from(source))
    } else {
        CodecError::Syntax {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests;
