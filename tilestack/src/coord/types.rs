//! Coordinate type definitions

use std::fmt;
use std::str::FromStr;

/// Source id used by composited (stacked) tile addresses.
pub const STACKED_SOURCE: &str = "";

/// Address of a single tile in the pyramid.
///
/// A raw tile carries the id of the texture layer it belongs to. A stacked
/// tile, the composite of every layer for one cell, uses an empty source id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    /// Texture layer (source directory) this tile belongs to
    pub source: String,
    /// Zoom level, 0 is the coarsest
    pub level: u32,
    /// X coordinate (west to east)
    pub column: u32,
    /// Y coordinate (north to south)
    pub row: u32,
}

impl TileId {
    /// Creates a tile address for the given source layer.
    pub fn new(source: impl Into<String>, level: u32, column: u32, row: u32) -> Self {
        Self {
            source: source.into(),
            level,
            column,
            row,
        }
    }

    /// Creates the address of a composited tile.
    #[inline]
    pub fn stacked(level: u32, column: u32, row: u32) -> Self {
        Self::new(STACKED_SOURCE, level, column, row)
    }

    /// Returns true for composited tile addresses.
    #[inline]
    pub fn is_stacked(&self) -> bool {
        self.source.is_empty()
    }

    /// Returns the composited address covering the same cell.
    pub fn to_stacked(&self) -> Self {
        Self::stacked(self.level, self.column, self.row)
    }

    /// Returns the address of the same cell in another source layer.
    pub fn with_source(&self, source: impl Into<String>) -> Self {
        Self::new(source, self.level, self.column, self.row)
    }

    /// Identifier used on the download completion path (`source:level:column:row`).
    pub fn to_id_string(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.source, self.level, self.column, self.row
        )
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.source, self.level, self.column, self.row
        )
    }
}

impl FromStr for TileId {
    type Err = CoordError;

    /// Parses the `source:level:column:row` download id format.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.rsplitn(4, ':').collect();
        if parts.len() != 4 {
            return Err(CoordError::InvalidTileId(s.to_string()));
        }
        let parse = |v: &str| {
            v.parse::<u32>()
                .map_err(|_| CoordError::InvalidTileId(s.to_string()))
        };
        // rsplitn yields fields back to front
        let row = parse(parts[0])?;
        let column = parse(parts[1])?;
        let level = parse(parts[2])?;
        Ok(Self::new(parts[3], level, column, row))
    }
}

/// Pixel dimensions of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileSize {
    pub width: u32,
    pub height: u32,
}

impl TileSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Square tile of `edge` pixels.
    pub const fn square(edge: u32) -> Self {
        Self::new(edge, edge)
    }
}

impl Default for TileSize {
    fn default() -> Self {
        Self::square(256)
    }
}

impl fmt::Display for TileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Inclusive rectangle of tile coordinates at one level.
///
/// Corners are only set through [`TileRect::new`], so `x1 <= x2` and
/// `y1 <= y2` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileRect {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
}

impl TileRect {
    /// Creates a rectangle from its inclusive corners.
    ///
    /// # Panics
    ///
    /// Panics if `x1 > x2` or `y1 > y2`.
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        assert!(x1 <= x2 && y1 <= y2, "inverted tile rect");
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    pub fn x1(&self) -> u32 {
        self.x1
    }

    #[inline]
    pub fn y1(&self) -> u32 {
        self.y1
    }

    #[inline]
    pub fn x2(&self) -> u32 {
        self.x2
    }

    #[inline]
    pub fn y2(&self) -> u32 {
        self.y2
    }

    /// Number of columns covered.
    #[inline]
    pub fn width(&self) -> u64 {
        u64::from(self.x2 - self.x1) + 1
    }

    /// Number of rows covered.
    #[inline]
    pub fn height(&self) -> u64 {
        u64::from(self.y2 - self.y1) + 1
    }

    #[inline]
    pub fn tile_count(&self) -> u64 {
        self.width() * self.height()
    }

    pub fn contains(&self, column: u32, row: u32) -> bool {
        (self.x1..=self.x2).contains(&column) && (self.y1..=self.y2).contains(&row)
    }

    /// Corners right-shifted by `shift` (the rect one or more levels up).
    pub fn shifted_right(&self, shift: u32) -> Self {
        let s = |v: u32| v.checked_shr(shift).unwrap_or(0);
        Self {
            x1: s(self.x1),
            y1: s(self.y1),
            x2: s(self.x2),
            y2: s(self.y2),
        }
    }

    /// Iterates over every `(column, row)` in row-major order.
    #[inline]
    pub fn tiles(&self) -> TileRectIter {
        TileRectIter {
            rect: *self,
            current: 0,
            total: self.tile_count(),
        }
    }
}

impl fmt::Display for TileRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) - ({}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// Iterator over all cells in a [`TileRect`].
#[derive(Debug, Clone)]
pub struct TileRectIter {
    rect: TileRect,
    current: u64,
    total: u64,
}

impl Iterator for TileRectIter {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.total {
            return None;
        }

        let width = self.rect.width();
        let column = self.rect.x1 + (self.current % width) as u32;
        let row = self.rect.y1 + (self.current / width) as u32;
        self.current += 1;

        Some((column, row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total - self.current) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileRectIter {
    fn len(&self) -> usize {
        (self.total - self.current) as usize
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Level-zero grid has no columns or rows
    EmptyLevelZero,
    /// Column/row count is not reachable from the level-zero grid
    InvalidLevelGeometry { level_zero: u32, count: u32 },
    /// Download id is not `source:level:column:row`
    InvalidTileId(String),
    /// Unknown tile projection name
    InvalidProjection(String),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::EmptyLevelZero => {
                write!(f, "Level-zero grid must have at least one column and row")
            }
            CoordError::InvalidLevelGeometry { level_zero, count } => {
                write!(
                    f,
                    "Invalid level geometry: {} tiles cannot be derived from {} at level zero",
                    count, level_zero
                )
            }
            CoordError::InvalidTileId(id) => {
                write!(
                    f,
                    "Invalid tile id: '{}' (expected source:level:column:row)",
                    id
                )
            }
            CoordError::InvalidProjection(name) => {
                write!(
                    f,
                    "Invalid projection: '{}' (must be equirectangular or mercator)",
                    name
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}
