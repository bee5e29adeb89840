//! Node positions and the compass labels derived from them.
//!
//! A [`Direction`] is computed once, when an edge is created, from the two
//! endpoint positions. It is stored on the edge and never recomputed, so erasing
//! an endpoint's position later leaves the edge label intact.

use serde::{Deserialize, Serialize};

/// Compass label carried by an edge.
///
/// The labels follow screen orientation: a target further along the x axis is
/// `West` of its source, a target further along the y axis is `South`.
///
/// # Examples
/// ```
/// use posgraph_core::{Direction, classify};
///
/// assert_eq!(classify((0.0, 0.0), (1.0, 0.0)), Direction::West);
/// assert_eq!(Direction::Unlabeled.as_str(), "N/A");
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Direction {
    /// The target lies towards negative y.
    North,
    /// The target lies towards positive y.
    South,
    /// The target lies towards negative x.
    East,
    /// The target lies towards positive x.
    West,
    /// The label was erased during degradation.
    #[serde(rename = "N/A")]
    Unlabeled,
}

impl Direction {
    /// Returns the label as written in graph files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "North",
            Self::South => "South",
            Self::East => "East",
            Self::West => "West",
            Self::Unlabeled => "N/A",
        }
    }

    /// Reports whether the edge still carries a geometric label.
    #[must_use]
    pub const fn is_labeled(self) -> bool {
        !matches!(self, Self::Unlabeled)
    }
}

/// Position attribute of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Position {
    /// Known `(x, y)` coordinates.
    Present(f64, f64),
    /// The position was erased during degradation.
    Absent,
}

impl Position {
    /// Returns the coordinates when present.
    ///
    /// # Examples
    /// ```
    /// use posgraph_core::Position;
    ///
    /// assert_eq!(Position::Present(0.5, 0.25).coords(), Some((0.5, 0.25)));
    /// assert_eq!(Position::Absent.coords(), None);
    /// ```
    #[must_use]
    pub const fn coords(self) -> Option<(f64, f64)> {
        match self {
            Self::Present(x, y) => Some((x, y)),
            Self::Absent => None,
        }
    }

    /// Reports whether the coordinates are known.
    #[must_use]
    pub const fn is_present(self) -> bool {
        matches!(self, Self::Present(..))
    }
}

/// Derives the compass label for an edge from `from` to `to`.
///
/// The dominant axis wins. When both axes move by the same magnitude the
/// vertical axis wins, so coincident points yield [`Direction::North`].
///
/// # Examples
/// ```
/// use posgraph_core::{Direction, classify};
///
/// assert_eq!(classify((0.0, 0.0), (1.0, 1.0)), Direction::South);
/// assert_eq!(classify((0.0, 0.0), (-1.0, 0.0)), Direction::East);
/// assert_eq!(classify((0.0, 0.0), (0.0, -1.0)), Direction::North);
/// assert_eq!(classify((2.0, 2.0), (2.0, 2.0)), Direction::North);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "direction classification compares coordinate deltas"
)]
pub fn classify(from: (f64, f64), to: (f64, f64)) -> Direction {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    if dx.abs() > dy.abs() {
        if dx > 0.0 { Direction::West } else { Direction::East }
    } else if dy > 0.0 {
        Direction::South
    } else {
        Direction::North
    }
}
