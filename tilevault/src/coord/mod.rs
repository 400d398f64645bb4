//! Tile coordinate addressing.
//!
//! Provides the addressing primitive every other component builds on: a tile
//! pyramid coordinate `(z, x, y)` and its canonical string key encoding.
//!
//! Keys are dash-joined decimal segments, one per coordinate level:
//!
//! - `"9"` addresses zoom level 9 (level 1)
//! - `"9-14"` addresses column 14 at zoom 9 (level 2)
//! - `"9-14-3"` addresses a single tile (level 3)
//!
//! The encoding is injective and total on valid integer triples: no two
//! distinct coordinate prefixes share a key, and every key decodes back to
//! its exact originating prefix.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between coordinate segments in a key.
pub const KEY_SEPARATOR: char = '-';

/// A coordinate key failed structural parsing.
///
/// This is a programmer/internal error: keys produced by [`TilePrefix::encode`]
/// or derived from validated uploads always decode cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed coordinate key '{key}': {reason}")]
pub struct MalformedKey {
    /// The offending key.
    pub key: String,
    /// Why parsing rejected it.
    pub reason: &'static str,
}

impl MalformedKey {
    fn new(key: &str, reason: &'static str) -> Self {
        Self {
            key: key.to_string(),
            reason,
        }
    }
}

/// A full level-3 tile coordinate.
///
/// Ordering is lexicographic on `(z, x, y)`, which is the canonical catalog
/// listing order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TileCoord {
    /// Zoom level.
    pub z: u32,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl TileCoord {
    /// Create a new tile coordinate.
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Derived canonical tile name, `"{z}-{x}-{y}"`.
    ///
    /// Unique per coordinate because the encoding is injective.
    pub fn file_name(&self) -> String {
        format!("{}-{}-{}", self.z, self.x, self.y)
    }

    /// The level-3 key for this coordinate (same text as [`Self::file_name`]).
    pub fn key(&self) -> String {
        self.file_name()
    }

    /// The level-3 prefix addressing exactly this tile.
    pub fn prefix(&self) -> TilePrefix {
        TilePrefix::tile(self.z, self.x, self.y)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.z, self.x, self.y)
    }
}

impl From<TileCoord> for TilePrefix {
    fn from(coord: TileCoord) -> Self {
        coord.prefix()
    }
}

/// A coordinate prefix addressing a subtree of the tile pyramid.
///
/// Level 1 carries only `z`, level 2 carries `(z, x)`, level 3 carries the
/// full `(z, x, y)`. The constructors enforce that `y` is never present
/// without `x`; deserialization goes through [`Self::decode`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TilePrefix {
    z: u32,
    x: Option<u32>,
    y: Option<u32>,
}

impl TilePrefix {
    /// Level-1 prefix: a whole zoom level.
    pub fn zoom(z: u32) -> Self {
        Self { z, x: None, y: None }
    }

    /// Level-2 prefix: one column within a zoom level.
    pub fn column(z: u32, x: u32) -> Self {
        Self {
            z,
            x: Some(x),
            y: None,
        }
    }

    /// Level-3 prefix: a single tile.
    pub fn tile(z: u32, x: u32, y: u32) -> Self {
        Self {
            z,
            x: Some(x),
            y: Some(y),
        }
    }

    /// Zoom segment (always present).
    pub fn z(&self) -> u32 {
        self.z
    }

    /// Column segment, if this prefix is level 2 or 3.
    pub fn x(&self) -> Option<u32> {
        self.x
    }

    /// Row segment, if this prefix is level 3.
    pub fn y(&self) -> Option<u32> {
        self.y
    }

    /// Number of segments present (1, 2, or 3).
    pub fn level(&self) -> u8 {
        1 + self.x.is_some() as u8 + self.y.is_some() as u8
    }

    /// Encode to the canonical key string.
    pub fn encode(&self) -> String {
        match (self.x, self.y) {
            (Some(x), Some(y)) => format!("{}-{}-{}", self.z, x, y),
            (Some(x), None) => format!("{}-{}", self.z, x),
            _ => self.z.to_string(),
        }
    }

    /// Decode a key string back into its originating prefix.
    ///
    /// Rejects keys with a wrong segment count or a non-numeric segment.
    /// Segments must be plain decimal digits; signs, whitespace, and empty
    /// segments are all structural errors.
    pub fn decode(key: &str) -> Result<Self, MalformedKey> {
        let segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
        if segments.len() > 3 {
            return Err(MalformedKey::new(key, "expected 1 to 3 segments"));
        }

        let mut parsed = Vec::with_capacity(segments.len());
        for segment in &segments {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return Err(MalformedKey::new(key, "segment is not a decimal integer"));
            }
            parsed.push(
                segment
                    .parse()
                    .map_err(|_| MalformedKey::new(key, "segment out of range"))?,
            );
        }

        match parsed[..] {
            [z] => Ok(Self::zoom(z)),
            [z, x] => Ok(Self::column(z, x)),
            [z, x, y] => Ok(Self::tile(z, x, y)),
            // split() yields at least one segment, so this is unreachable
            _ => Err(MalformedKey::new(key, "expected 1 to 3 segments")),
        }
    }

    /// True if `self` is a strict ancestor of `other`.
    ///
    /// A prefix is a strict ancestor when its coordinate tuple is a proper
    /// prefix of the other's tuple. Equal prefixes are not ancestors.
    pub fn is_strict_prefix_of(&self, other: &TilePrefix) -> bool {
        if self.z != other.z {
            return false;
        }
        match (self.x, other.x) {
            (None, Some(_)) => true,
            (Some(sx), Some(ox)) if sx == ox => self.y.is_none() && other.y.is_some(),
            _ => false,
        }
    }

    /// True if `coord` lies under this prefix.
    ///
    /// Every specified segment must match exactly; omitted trailing segments
    /// are unconstrained.
    pub fn matches(&self, coord: &TileCoord) -> bool {
        self.z == coord.z
            && self.x.map_or(true, |x| x == coord.x)
            && self.y.map_or(true, |y| y == coord.y)
    }
}

impl fmt::Display for TilePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}
