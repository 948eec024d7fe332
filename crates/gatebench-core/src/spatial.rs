use std::collections::HashMap;

use crate::element::ElementId;
use crate::geometry::{ChunkCoord, Point};

/// One square region of the board.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    /// Ids of elements whose footprint or pins touch this chunk.
    pub elements: Vec<ElementId>,
    /// Active junctions inside this chunk.
    pub connection_points: Vec<Point>,
}

impl Chunk {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.connection_points.is_empty()
    }
}

/// Sparse chunk storage keyed by chunk coordinates.
#[derive(Debug, Clone)]
pub struct ChunkMap {
    chunk_size: i64,
    chunks: HashMap<ChunkCoord, Chunk>,
}

impl ChunkMap {
    pub fn new(chunk_size: i64) -> Self {
        Self {
            chunk_size,
            chunks: HashMap::new(),
        }
    }

    pub fn chunk_size(&self) -> i64 {
        self.chunk_size
    }

    pub fn coord_of(&self, point: &Point) -> ChunkCoord {
        ChunkCoord::of(point, self.chunk_size)
    }

    pub fn get(&self, coord: &ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(coord)
    }

    /// Register an element id in the given chunks, creating them on demand.
    pub fn insert_element(&mut self, id: ElementId, coords: &[ChunkCoord]) {
        for coord in coords {
            let chunk = self.chunks.entry(*coord).or_default();
            if !chunk.elements.contains(&id) {
                chunk.elements.push(id);
            }
        }
    }

    /// Remove an element id from the given chunks, dropping chunks left empty.
    pub fn remove_element(&mut self, id: ElementId, coords: &[ChunkCoord]) {
        for coord in coords {
            if let Some(chunk) = self.chunks.get_mut(coord) {
                chunk.elements.retain(|e| *e != id);
                if chunk.is_empty() {
                    self.chunks.remove(coord);
                }
            }
        }
    }

    /// Element ids registered in one chunk.
    pub fn elements_in(&self, coord: &ChunkCoord) -> &[ElementId] {
        self.chunks
            .get(coord)
            .map(|c| c.elements.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_connection_point(&self, point: &Point) -> bool {
        self.chunks
            .get(&self.coord_of(point))
            .is_some_and(|c| c.connection_points.contains(point))
    }

    /// Returns `true` if the marker was newly added.
    pub fn insert_connection_point(&mut self, point: Point) -> bool {
        let coord = self.coord_of(&point);
        let chunk = self.chunks.entry(coord).or_default();
        if chunk.connection_points.contains(&point) {
            return false;
        }
        chunk.connection_points.push(point);
        true
    }

    /// Returns `true` if a marker was present and removed.
    pub fn remove_connection_point(&mut self, point: &Point) -> bool {
        let coord = self.coord_of(point);
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return false;
        };
        let before = chunk.connection_points.len();
        chunk.connection_points.retain(|p| p != point);
        let removed = chunk.connection_points.len() != before;
        if chunk.is_empty() {
            self.chunks.remove(&coord);
        }
        removed
    }

    pub fn connection_points(&self) -> impl Iterator<Item = &Point> {
        self.chunks.values().flat_map(|c| c.connection_points.iter())
    }

    /// Number of allocated chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}
