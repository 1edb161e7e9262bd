use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Textual form of [`Edge::Open`] in report definitions.
pub const OPEN_MARKER: &str = "n";

/// Far edge of a placement range: a concrete coordinate or "infer from the result".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    At(u32),
    Open,
}

impl Edge {
    pub fn is_open(&self) -> bool {
        matches!(self, Edge::Open)
    }

    pub fn value(&self) -> Option<u32> {
        match self {
            Edge::At(v) => Some(*v),
            Edge::Open => None,
        }
    }
}

impl From<u32> for Edge {
    fn from(value: u32) -> Self {
        Edge::At(value)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::At(v) => write!(f, "{v}"),
            Edge::Open => f.write_str(OPEN_MARKER),
        }
    }
}

#[cfg(feature = "serde")]
impl Serialize for Edge {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Edge::At(v) => serializer.serialize_u32(*v),
            Edge::Open => serializer.serialize_str(OPEN_MARKER),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Edge {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EdgeVisitor;

        impl serde::de::Visitor<'_> for EdgeVisitor {
            type Value = Edge;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a non-negative coordinate or the open marker `{OPEN_MARKER}`")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Edge, E> {
                u32::try_from(v)
                    .map(Edge::At)
                    .map_err(|_| E::custom(format!("coordinate {v} is out of range")))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Edge, E> {
                u32::try_from(v)
                    .map(Edge::At)
                    .map_err(|_| E::custom(format!("coordinate {v} is out of range")))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Edge, E> {
                let trimmed = v.trim();
                if trimmed.eq_ignore_ascii_case(OPEN_MARKER) || trimmed.eq_ignore_ascii_case("open")
                {
                    return Ok(Edge::Open);
                }
                trimmed
                    .parse::<u32>()
                    .map(Edge::At)
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(EdgeVisitor)
    }
}

/// Target rectangle for a query result, as handed over by the report definition.
///
/// Coordinates are zero-based. `x` follows the result's row axis when the
/// result is written without transposition; `y` follows its column axis.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlacementRange {
    pub x1: u32,
    pub y1: u32,
    pub x2: Edge,
    pub y2: Edge,
}

impl PlacementRange {
    pub fn new(x1: u32, y1: u32, x2: impl Into<Edge>, y2: impl Into<Edge>) -> Self {
        Self {
            x1,
            y1,
            x2: x2.into(),
            y2: y2.into(),
        }
    }

    /// Both far edges concrete.
    pub fn fixed(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self::new(x1, y1, x2, y2)
    }

    pub fn open_edges(&self) -> usize {
        usize::from(self.x2.is_open()) + usize::from(self.y2.is_open())
    }
}

impl fmt::Display for PlacementRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]:[{},{}]", self.x1, self.y1, self.x2, self.y2)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Result row `i`, column `j` lands on `(x1 + i, y1 + j)`.
    Direct,
    /// Result row `i`, column `j` lands on `(x1 + j, y1 + i)`.
    Transposed,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Orientation::Direct => "direct",
            Orientation::Transposed => "transposed",
        })
    }
}

/// Concrete rectangle with `x2 > x1`, `y2 > y1` and an orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedRange {
    pub x1: u32,
    pub x2: u32,
    pub y1: u32,
    pub y2: u32,
    pub orientation: Orientation,
}

impl ResolvedRange {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn is_transposed(&self) -> bool {
        self.orientation == Orientation::Transposed
    }

    /// Half-open containment: `x1 <= x < x2` and `y1 <= y < y2`.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }
}

impl fmt::Display for ResolvedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{}]:[{},{}] ({})",
            self.x1, self.y1, self.x2, self.y2, self.orientation
        )
    }
}
