use serde::{Deserialize, Serialize};

/// A point on the integer board grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn translate(&self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn offset(&self, delta: Point) -> Self {
        self.translate(delta.x, delta.y)
    }

    pub fn is_negative(&self) -> bool {
        self.x < 0 || self.y < 0
    }
}

/// An axis-aligned rectangle spanning `start..=end` on the grid.
///
/// Components interpret the rectangle as the half-open cell range
/// `[start, end)`, wires as the closed segment `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRect {
    pub start: Point,
    pub end: Point,
}

impl GridRect {
    /// Build a rectangle from two arbitrary corners, normalizing their order.
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            start: Point::new(a.x.min(b.x), a.y.min(b.y)),
            end: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn point(p: Point) -> Self {
        Self { start: p, end: p }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut rect = Self::point(*first);
        for p in &points[1..] {
            rect = rect.union(&Self::point(*p));
        }
        Some(rect)
    }

    pub fn width(&self) -> i64 {
        self.end.x - self.start.x
    }

    pub fn height(&self) -> i64 {
        self.end.y - self.start.y
    }

    pub fn translate(&self, delta: Point) -> Self {
        Self {
            start: self.start.offset(delta),
            end: self.end.offset(delta),
        }
    }

    /// Closed containment, edges included.
    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.start.x && p.x <= self.end.x && p.y >= self.start.y && p.y <= self.end.y
    }

    /// Containment in the half-open cell range `[start, end)`.
    ///
    /// Degenerate rectangles (wires) contain nothing under this test.
    pub fn contains_cell(&self, p: &Point) -> bool {
        p.x >= self.start.x && p.x < self.end.x && p.y >= self.start.y && p.y < self.end.y
    }

    pub fn intersects(&self, other: &GridRect) -> bool {
        self.start.x <= other.end.x
            && self.end.x >= other.start.x
            && self.start.y <= other.end.y
            && self.end.y >= other.start.y
    }

    pub fn union(&self, other: &GridRect) -> Self {
        Self {
            start: Point::new(self.start.x.min(other.start.x), self.start.y.min(other.start.y)),
            end: Point::new(self.end.x.max(other.end.x), self.end.y.max(other.end.y)),
        }
    }

    pub fn is_negative(&self) -> bool {
        self.start.is_negative()
    }
}

/// Two component footprints overlap. Shared edges are allowed so parts can sit flush.
pub fn footprints_overlap(a: &GridRect, b: &GridRect) -> bool {
    a.start.x < b.end.x && b.start.x < a.end.x && a.start.y < b.end.y && b.start.y < a.end.y
}

/// A closed wire extent enters a half-open component footprint.
///
/// The near border of the footprint is solid; the far border (where output
/// pins sit) is tolerant, so a wire may end on a pin right next to the part.
pub fn wire_enters_footprint(footprint: &GridRect, wire: &GridRect) -> bool {
    wire.start.x < footprint.end.x
        && wire.end.x >= footprint.start.x
        && wire.start.y < footprint.end.y
        && wire.end.y >= footprint.start.y
}

/// Coordinates of a chunk in the board's chunk map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i64,
    pub y: i64,
}

impl ChunkCoord {
    pub fn of(point: &Point, chunk_size: i64) -> Self {
        Self {
            x: point.x.div_euclid(chunk_size),
            y: point.y.div_euclid(chunk_size),
        }
    }
}

/// All chunks covered by `rect`, plus the chunks of any extra points (pins
/// that stick out of a component's footprint). Sorted, without duplicates.
pub fn chunks_covering(rect: &GridRect, extra: &[Point], chunk_size: i64) -> Vec<ChunkCoord> {
    let from = ChunkCoord::of(&rect.start, chunk_size);
    let to = ChunkCoord::of(&rect.end, chunk_size);
    let mut out = Vec::new();
    for x in from.x..=to.x {
        for y in from.y..=to.y {
            out.push(ChunkCoord { x, y });
        }
    }
    for p in extra {
        let coord = ChunkCoord::of(p, chunk_size);
        if !rect_chunk_contains(from, to, coord) {
            out.push(coord);
        }
    }
    out.sort();
    out.dedup();
    out
}

fn rect_chunk_contains(from: ChunkCoord, to: ChunkCoord, c: ChunkCoord) -> bool {
    c.x >= from.x && c.x <= to.x && c.y >= from.y && c.y <= to.y
}
