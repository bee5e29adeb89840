//! Error types for the posgraph core library.
//!
//! Parameter validation, graph-shape validation, and persistence failures are
//! kept in separate enums so callers can tell a rejected request apart from a
//! broken file. Each enum exposes a stable machine-readable code.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// A generation or degradation parameter was rejected before any work began.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A ratio was non-finite or outside `[0, 1]`.
    #[error("`{parameter}` must be a finite value in [0, 1] (got {value})")]
    InvalidRatio {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Value supplied by the caller.
        value: f64,
    },
    /// The position range was non-finite, inverted, or too wide to sample.
    #[error("position range must be finite, ordered, and narrow enough to sample (got [{min}, {max}])")]
    InvalidPositionRange {
        /// Lower bound supplied by the caller.
        min: f64,
        /// Upper bound supplied by the caller.
        max: f64,
    },
    /// `node_count * (node_count - 1)` does not fit in `usize`.
    #[error("a complete digraph over {node_count} nodes has too many edges to represent")]
    EdgeCountOverflow {
        /// Requested node count.
        node_count: u32,
    },
    /// A sample was larger than the pool it is drawn from.
    #[error("cannot sample {requested} {pool} from a pool of {available}")]
    SampleExceedsPool {
        /// Name of the candidate pool.
        pool: &'static str,
        /// Number of items requested.
        requested: usize,
        /// Number of items available.
        available: usize,
    },
    /// A caller-supplied batch identifier cannot serve as a file-name prefix.
    #[error("batch identifier `{provided}` must be non-empty ASCII alphanumerics or `-`")]
    InvalidBatchId {
        /// Raw identifier supplied by the caller.
        provided: String,
    },
}

define_error_codes! {
    /// Stable codes describing [`ValidationError`] variants.
    enum ValidationErrorCode for ValidationError {
        /// A ratio was non-finite or outside `[0, 1]`.
        InvalidRatio => InvalidRatio { .. } => "POSGRAPH_INVALID_RATIO",
        /// The position range was non-finite or inverted.
        InvalidPositionRange => InvalidPositionRange { .. } => "POSGRAPH_INVALID_POSITION_RANGE",
        /// The complete digraph would overflow `usize`.
        EdgeCountOverflow => EdgeCountOverflow { .. } => "POSGRAPH_EDGE_COUNT_OVERFLOW",
        /// A sample was larger than its pool.
        SampleExceedsPool => SampleExceedsPool { .. } => "POSGRAPH_SAMPLE_EXCEEDS_POOL",
        /// A batch identifier was unusable as a prefix.
        InvalidBatchId => InvalidBatchId { .. } => "POSGRAPH_INVALID_BATCH_ID",
    }
}

/// A graph violated a structural invariant.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum MalformedGraph {
    /// The file declared an undirected graph.
    #[error("graph must be directed")]
    Undirected,
    /// A node position was neither `[]` nor a coordinate pair.
    #[error("node {node} has a position with {len} components (expected 0 or 2)")]
    InvalidPosition {
        /// Node carrying the malformed position.
        node: u32,
        /// Number of components found.
        len: usize,
    },
    /// Two node entries shared the same identifier.
    #[error("node {node} appears more than once")]
    DuplicateNode {
        /// Repeated identifier.
        node: u32,
    },
    /// Node identifiers did not form `[0, N)`.
    #[error("node identifiers must be contiguous from 0; {node} is out of range for {count} nodes")]
    NonContiguousNodes {
        /// Identifier outside the expected range.
        node: u32,
        /// Number of node entries present.
        count: usize,
    },
    /// An edge referenced a node that does not exist.
    #[error("edge {from} -> {to} references a node outside [0, {count})")]
    UnknownEndpoint {
        /// Edge source.
        from: u32,
        /// Edge target.
        to: u32,
        /// Number of nodes in the graph.
        count: usize,
    },
    /// An edge connected a node to itself.
    #[error("edge {node} -> {node} is a self-loop")]
    SelfLoop {
        /// Node carrying the loop.
        node: u32,
    },
    /// The same ordered pair appeared twice.
    #[error("edge {from} -> {to} appears more than once")]
    DuplicateEdge {
        /// Edge source.
        from: u32,
        /// Edge target.
        to: u32,
    },
}

define_error_codes! {
    /// Stable codes describing [`MalformedGraph`] variants.
    enum MalformedGraphCode for MalformedGraph {
        /// The file declared an undirected graph.
        Undirected => Undirected => "GRAPH_UNDIRECTED",
        /// A node position had the wrong arity.
        InvalidPosition => InvalidPosition { .. } => "GRAPH_INVALID_POSITION",
        /// Two node entries shared the same identifier.
        DuplicateNode => DuplicateNode { .. } => "GRAPH_DUPLICATE_NODE",
        /// Node identifiers did not form `[0, N)`.
        NonContiguousNodes => NonContiguousNodes { .. } => "GRAPH_NON_CONTIGUOUS_NODES",
        /// An edge referenced a missing node.
        UnknownEndpoint => UnknownEndpoint { .. } => "GRAPH_UNKNOWN_ENDPOINT",
        /// An edge connected a node to itself.
        SelfLoop => SelfLoop { .. } => "GRAPH_SELF_LOOP",
        /// The same ordered pair appeared twice.
        DuplicateEdge => DuplicateEdge { .. } => "GRAPH_DUPLICATE_EDGE",
    }
}

/// Errors raised while saving or loading graph files.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CodecError {
    /// Reading, writing, or listing a path failed.
    #[error("I/O failure on `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The file was not valid JSON or lacked a required field.
    #[error("failed to parse `{path}`: {source}")]
    Syntax {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// The file parsed but described an invalid graph.
    #[error("malformed graph in `{path}`: {detail}")]
    Malformed {
        /// File that described the graph.
        path: PathBuf,
        /// Violated invariant.
        #[source]
        detail: MalformedGraph,
    },
}

define_error_codes! {
    /// Stable codes describing [`CodecError`] variants.
    enum CodecErrorCode for CodecError {
        /// Reading, writing, or listing a path failed.
        Io => Io { .. } => "CODEC_IO",
        /// The file was not valid JSON or lacked a required field.
        Syntax => Syntax { .. } => "CODEC_SYNTAX",
        /// The file described an invalid graph.
        Malformed => Malformed { .. } => "CODEC_MALFORMED",
    }
}

impl CodecError {
    /// Retrieve the inner [`MalformedGraphCode`] when the file described an invalid graph.
    #[must_use]
    pub const fn malformed_code(&self) -> Option<MalformedGraphCode> {
        match self {
            Self::Malformed { detail, .. } => Some(detail.code()),
            _ => None,
        }
    }
}

/// Errors raised while generating and persisting a batch.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BatchError {
    /// Generation parameters were rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Persisting a graph failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl BatchError {
    /// Return the stable code of the underlying failure.
    #[must_use]
    pub const fn code_str(&self) -> &'static str {
        match self {
            Self::Validation(error) => error.code().as_str(),
            Self::Codec(error) => error.code().as_str(),
        }
    }
}
