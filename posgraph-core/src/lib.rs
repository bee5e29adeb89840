//! Posgraph core library.
//!
//! Synthesises complete directed graphs whose nodes carry 2D positions and
//! whose edges carry compass labels, degrades copies of them by removing
//! edges, labels, and positions, and persists the results as node-link JSON
//! for position-recovery training.
//!
//! # Randomness
//!
//! Every sampling operation takes an explicit [`rand::Rng`]. A batch draws its
//! base graph from the caller's generator and gives each degraded variant an
//! independent `SmallRng` derived from it, so a seeded generator reproduces
//! the same batch whether or not the `parallel` feature is enabled.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod batch;
mod builder;
mod codec;
mod degrade;
mod error;
mod geometry;
mod graph;

pub use crate::{
    batch::{Batch, BatchConfig, BatchConfigBuilder, BatchGenerator, BatchId, DatasetLayout, generate_batch},
    builder::{GraphBuilder, PositionRange},
    codec::{load, load_graph, save},
    degrade::{DegradeParams, DegradePlan, Degrader},
    error::{
        BatchError, CodecError, CodecErrorCode, MalformedGraph, MalformedGraphCode,
        ValidationError, ValidationErrorCode,
    },
    geometry::{Direction, Position, classify},
    graph::{Edge, Graph, GraphStats, NodeId},
};
