use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::BoardConfig;
use crate::element::{calc_end_pos, wire_ranges_overlap, Element, ElementId, Rotation, UNASSIGNED_ID};
use crate::error::BoardError;
use crate::geometry::{
    chunks_covering, footprints_overlap, wire_enters_footprint, ChunkCoord, GridRect, Point,
};
use crate::spatial::ChunkMap;

/// A junction marker appeared or disappeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JunctionEvent {
    Connected(Point),
    Disconnected(Point),
}

/// Elements consumed and produced by one topology edit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoardChange {
    pub new_elements: Vec<Element>,
    pub old_elements: Vec<Element>,
}

/// Rule applied by [`Board::normalize_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeRule {
    /// Fuse colinear wires that meet end to end outside a junction.
    Merge,
    /// Split wires wherever another wire end or pin lands on their interior.
    Connect,
}

/// Serialized form of a board: chunks and junctions are derived on load.
#[derive(Serialize, Deserialize)]
struct BoardModel {
    highest_id: ElementId,
    elements: Vec<Element>,
}

/// The placed wires and components of one circuit, indexed by chunk.
#[derive(Debug, Clone)]
pub struct Board {
    config: BoardConfig,
    /// All elements in placement order.
    elements: IndexMap<ElementId, Element>,
    chunks: ChunkMap,
    highest_id: ElementId,
    junction_events: Vec<JunctionEvent>,
}

impl Board {
    pub fn new(config: BoardConfig) -> Self {
        Self {
            chunks: ChunkMap::new(config.chunk_size),
            config,
            elements: IndexMap::new(),
            highest_id: 0,
            junction_events: Vec::new(),
        }
    }

    /// Build a board from existing elements, keeping their ids.
    pub fn with_elements(config: BoardConfig, elements: Vec<Element>) -> Self {
        let mut board = Self::new(config);
        board.highest_id = elements.iter().map(|e| e.id).max().unwrap_or(0).max(0);
        let mut points = Vec::new();
        for element in elements {
            points.extend(element.pin_positions());
            board.insert_raw(element);
        }
        board.refresh_junctions(&points);
        board.junction_events.clear();
        board
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn next_id(&mut self) -> ElementId {
        self.highest_id += 1;
        self.highest_id
    }

    pub fn highest_id(&self) -> ElementId {
        self.highest_id
    }

    // ── Element storage ─────────────────────────────────────────────

    fn element_chunks(&self, element: &Element) -> Vec<ChunkCoord> {
        chunks_covering(&element.rect(), &element.pin_positions(), self.config.chunk_size)
    }

    /// Store and register an element without touching junction markers.
    fn insert_raw(&mut self, mut element: Element) -> ElementId {
        if element.id == UNASSIGNED_ID {
            element.id = self.next_id();
        } else if self.elements.contains_key(&element.id) {
            log::warn!("element id {} already on board, assigning a new one", element.id);
            element.id = self.next_id();
        } else {
            self.highest_id = self.highest_id.max(element.id);
        }
        let id = element.id;
        let coords = self.element_chunks(&element);
        self.chunks.insert_element(id, &coords);
        self.elements.insert(id, element);
        id
    }

    fn remove_raw(&mut self, id: ElementId) -> Option<Element> {
        let element = self.elements.shift_remove(&id)?;
        let coords = self.element_chunks(&element);
        self.chunks.remove_element(id, &coords);
        Some(element)
    }

    /// Place an element. Assigns an id if it has none; no collision check.
    pub fn add_element(&mut self, element: Element) -> &Element {
        let pins = element.pin_positions();
        let id = self.insert_raw(element);
        self.refresh_junctions(&pins);
        &self.elements[&id]
    }

    /// Remove an element by id. Unknown ids are ignored.
    pub fn remove_element(&mut self, id: ElementId) -> Option<Element> {
        let element = self.remove_raw(id)?;
        self.refresh_junctions(&element.pin_positions());
        Some(element)
    }

    /// Move an element by `delta`. The caller decides whether the target is legal.
    pub fn move_element(&mut self, id: ElementId, delta: Point) -> bool {
        self.reshape(id, |e| e.translate(delta))
    }

    pub fn rotate_component(&mut self, id: ElementId, rotation: Rotation, width: i64) -> bool {
        self.reshape(id, |e| {
            e.rotation = rotation;
            e.end_pos = calc_end_pos(e.pos, width, e.num_inputs, e.num_outputs, rotation);
        })
    }

    pub fn set_num_inputs(&mut self, id: ElementId, num_inputs: u32, width: i64) -> bool {
        self.reshape(id, |e| {
            e.num_inputs = num_inputs;
            e.end_pos = calc_end_pos(e.pos, width, num_inputs, e.num_outputs, e.rotation);
        })
    }

    fn reshape(&mut self, id: ElementId, edit: impl FnOnce(&mut Element)) -> bool {
        let Some(mut element) = self.remove_raw(id) else {
            return false;
        };
        let mut points = element.pin_positions();
        edit(&mut element);
        points.extend(element.pin_positions());
        self.insert_raw(element);
        self.refresh_junctions(&points);
        true
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get_element_by_id(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn get_elements_by_id(&self, ids: &[ElementId]) -> Vec<&Element> {
        ids.iter().filter_map(|id| self.elements.get(id)).collect()
    }

    pub fn all_elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn elements_in_chunk(&self, coord: &ChunkCoord) -> Vec<&Element> {
        self.chunks
            .elements_in(coord)
            .iter()
            .filter_map(|id| self.elements.get(id))
            .collect()
    }

    /// Every element registered in a chunk overlapping `rect`, each once.
    pub fn elements_in_chunks(&self, rect: &GridRect) -> Vec<&Element> {
        self.elements_near(rect, &[])
    }

    fn elements_near(&self, rect: &GridRect, extra: &[Point]) -> Vec<&Element> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for coord in chunks_covering(rect, extra, self.config.chunk_size) {
            for id in self.chunks.elements_in(&coord) {
                if seen.insert(*id) {
                    if let Some(element) = self.elements.get(id) {
                        out.push(element);
                    }
                }
            }
        }
        out
    }

    /// Whether an element with footprint `rect` (and pins `pins`) could be
    /// placed without colliding. Elements in `except` are ignored.
    pub fn is_free_space(
        &self,
        rect: &GridRect,
        is_wire: bool,
        pins: Option<&[Point]>,
        except: &[ElementId],
    ) -> bool {
        if rect.is_negative() {
            return false;
        }
        for other in self.elements_near(rect, pins.unwrap_or(&[])) {
            if except.contains(&other.id) {
                continue;
            }
            let other_rect = other.rect();
            if is_wire && other.is_wire() {
                if wire_ranges_overlap(rect, &other_rect) {
                    return false;
                }
                continue;
            }
            if is_wire && wire_enters_footprint(&other_rect, rect) {
                return false;
            }
            if !is_wire && other.is_wire() && wire_enters_footprint(rect, &other_rect) {
                return false;
            }
            if !is_wire && !other.is_wire() && footprints_overlap(rect, &other_rect) {
                return false;
            }
            if let Some(pins) = pins {
                if pins.iter().any(|p| other_rect.contains_cell(p)) {
                    return false;
                }
            }
            if !is_wire
                && !other.is_wire()
                && other.pin_positions().iter().any(|p| rect.contains_cell(p))
            {
                return false;
            }
        }
        true
    }

    /// Whether every listed element could be moved by `delta`.
    pub fn all_spaces_free(&self, ids: &[ElementId], delta: Point, except: &[ElementId]) -> bool {
        self.get_elements_by_id(ids).into_iter().all(|element| {
            let mut moved = element.clone();
            moved.translate(delta);
            let pins = moved.pin_positions();
            self.is_free_space(&moved.rect(), moved.is_wire(), Some(&pins), except)
        })
    }

    /// Wires passing through `point`, endpoints included.
    pub fn wires_on_point(&self, point: &Point) -> Vec<&Element> {
        self.elements_in_chunk(&self.chunks.coord_of(point))
            .into_iter()
            .filter(|e| e.wire_contains(point))
            .collect()
    }

    /// Elements with a wire end or pin exactly at `point`, with the pin index.
    pub fn wire_ends_on_point(&self, point: &Point) -> Vec<(&Element, usize)> {
        self.elements_in_chunk(&self.chunks.coord_of(point))
            .into_iter()
            .filter_map(|e| e.pin_index_at(point).map(|index| (e, index)))
            .collect()
    }

    fn wire_end_count(&self, point: &Point) -> usize {
        self.wire_ends_on_point(point).len()
    }

    /// The given elements plus every wire touching one of their pins.
    pub fn with_wires_on_edges(&self, ids: &[ElementId]) -> Vec<ElementId> {
        let mut out: Vec<ElementId> = ids.to_vec();
        for element in self.get_elements_by_id(ids) {
            for pos in element.pin_positions() {
                for wire in self.wires_on_point(&pos) {
                    if !out.contains(&wire.id) {
                        out.push(wire.id);
                    }
                }
            }
        }
        out
    }

    // ── Junctions ────────────────────────────────────────────────────

    pub fn is_junction(&self, point: &Point) -> bool {
        self.chunks.has_connection_point(point)
    }

    pub fn connection_points(&self) -> impl Iterator<Item = &Point> {
        self.chunks.connection_points()
    }

    /// Junction changes since the last drain, oldest first.
    pub fn drain_junction_events(&mut self) -> Vec<JunctionEvent> {
        std::mem::take(&mut self.junction_events)
    }

    /// Re-derive the junction marker at each point from the live wire-end count.
    fn refresh_junctions(&mut self, points: &[Point]) {
        let mut done = HashSet::new();
        for point in points {
            if !done.insert(*point) {
                continue;
            }
            let active = self.wire_end_count(point) >= 3;
            if active && self.chunks.insert_connection_point(*point) {
                self.junction_events.push(JunctionEvent::Connected(*point));
            } else if !active && self.chunks.remove_connection_point(point) {
                self.junction_events.push(JunctionEvent::Disconnected(*point));
            }
        }
    }

    // ── Wire topology ────────────────────────────────────────────────

    /// Split a wire at an interior point. The first half keeps the wire's id.
    ///
    /// Returns the unchanged wire if `point` is not strictly inside it, and
    /// nothing if `id` is not on the board.
    pub fn split_wire(&mut self, id: ElementId, point: Point) -> Vec<Element> {
        let Some(wire) = self.elements.get(&id).cloned() else {
            return Vec::new();
        };
        if !wire.wire_contains_inner(&point) {
            return vec![wire];
        }
        let (Ok(mut first), Ok(second)) = (
            Element::wire(wire.pos, point),
            Element::wire(point, wire.end_pos),
        ) else {
            return vec![wire];
        };
        first.id = wire.id;
        self.remove_raw(id);
        let first_id = self.insert_raw(first);
        let second_id = self.insert_raw(second);
        self.refresh_junctions(&[wire.pos, point, wire.end_pos]);
        vec![
            self.elements[&first_id].clone(),
            self.elements[&second_id].clone(),
        ]
    }

    /// Fuse two colinear wires meeting end to end. The result reuses the lower id.
    ///
    /// Refuses when the shared point is a junction, unless `allow_disconnect`.
    pub fn merge_wires(&mut self, a: ElementId, b: ElementId, allow_disconnect: bool) -> Option<BoardChange> {
        if a == b {
            return None;
        }
        let wire_a = self.elements.get(&a)?.clone();
        let wire_b = self.elements.get(&b)?.clone();
        if !wire_a.is_wire() || !wire_b.is_wire() {
            return None;
        }
        let shared = if wire_a.end_pos == wire_b.pos {
            wire_a.end_pos
        } else if wire_b.end_pos == wire_a.pos {
            wire_b.end_pos
        } else {
            return None;
        };
        let colinear = (wire_a.is_horizontal() && wire_b.is_horizontal())
            || (wire_a.is_vertical() && wire_b.is_vertical());
        if !colinear {
            return None;
        }
        if !allow_disconnect && self.wire_end_count(&shared) > 2 {
            return None;
        }
        let span = wire_a.rect().union(&wire_b.rect());
        let mut merged = Element::wire(span.start, span.end).ok()?;
        merged.id = a.min(b);
        self.remove_raw(a);
        self.remove_raw(b);
        let id = self.insert_raw(merged);
        self.refresh_junctions(&[wire_a.pos, wire_a.end_pos, wire_b.pos, wire_b.end_pos]);
        Some(BoardChange {
            new_elements: vec![self.elements[&id].clone()],
            old_elements: vec![wire_a, wire_b],
        })
    }

    /// Make `intersection` a shared endpoint of `a` and `b`, splitting
    /// whichever wire passes through it.
    pub fn connect_wires(&mut self, a: ElementId, b: ElementId, intersection: Point) -> Vec<Element> {
        let mut out = Vec::new();
        for id in [a, b] {
            if self.elements.get(&id).is_some_and(Element::is_wire) {
                out.extend(self.split_wire(id, intersection));
            }
        }
        out
    }

    /// Merge wires across former junctions, ignoring the junction guard.
    pub fn disconnect_wires(&mut self, ids: &[ElementId]) -> Vec<Element> {
        let mut out = Vec::new();
        let mut done = HashSet::new();
        for &a in ids {
            for &b in ids {
                if a == b || done.contains(&a) || done.contains(&b) {
                    continue;
                }
                if let Some(change) = self.merge_wires(a, b, true) {
                    done.insert(a);
                    done.insert(b);
                    out.extend(change.new_elements);
                }
            }
        }
        out
    }

    fn connect_with_edge(&mut self, element: &Element, other: &Element) -> Option<BoardChange> {
        let old_elements: Vec<Element> = [element, other]
            .into_iter()
            .filter(|e| e.is_wire())
            .cloned()
            .collect();
        if other.is_wire() {
            if let Some(point) = element.pin_positions().into_iter().find(|p| other.wire_contains_inner(p)) {
                let new_elements = self.connect_wires(element.id, other.id, point);
                return Some(BoardChange { new_elements, old_elements });
            }
        }
        if element.is_wire() {
            if let Some(point) = other.pin_positions().into_iter().find(|p| element.wire_contains_inner(p)) {
                let new_elements = self.connect_wires(other.id, element.id, point);
                return Some(BoardChange { new_elements, old_elements });
            }
        }
        None
    }

    /// Apply `rule` until no pending element triggers it any more.
    ///
    /// Each pending element is tested against the elements sharing its chunks;
    /// when the rule fires, the consumed neighbour leaves the pending set and
    /// the produced elements join it.
    pub fn normalize_batch(&mut self, initial: &[ElementId], rule: NormalizeRule) -> Vec<BoardChange> {
        let mut pending: VecDeque<ElementId> = initial.iter().copied().collect();
        let mut changes = Vec::new();
        while let Some(id) = pending.pop_front() {
            let Some(element) = self.elements.get(&id).cloned() else {
                continue;
            };
            let neighbours: Vec<Element> = self
                .elements_near(&element.rect(), &element.pin_positions())
                .into_iter()
                .filter(|other| other.id != id)
                .cloned()
                .collect();
            for other in neighbours {
                let change = match rule {
                    NormalizeRule::Merge => self.merge_wires(element.id, other.id, false),
                    NormalizeRule::Connect => self.connect_with_edge(&element, &other),
                };
                if let Some(change) = change {
                    pending.retain(|p| *p != other.id);
                    pending.extend(change.new_elements.iter().map(|e| e.id));
                    // A component connected on one pin may still sit on other wires.
                    if self.elements.contains_key(&id) && !pending.contains(&id) {
                        pending.push_back(id);
                    }
                    changes.push(change);
                    break;
                }
            }
        }
        log::debug!("normalized batch with {:?}: {} changes", rule, changes.len());
        changes
    }

    // ── Serialization ────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String, BoardError> {
        let model = BoardModel {
            highest_id: self.highest_id,
            elements: self.elements.values().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&model)?)
    }

    pub fn from_json(json: &str, config: BoardConfig) -> Result<Self, BoardError> {
        config.validate()?;
        let model: BoardModel = serde_json::from_str(json)?;
        let mut board = Self::with_elements(config, model.elements);
        board.highest_id = board.highest_id.max(model.highest_id);
        Ok(board)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BoardConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element_type::{type_ids, TypeRegistry};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn wire(board: &mut Board, x0: i64, y0: i64, x1: i64, y1: i64) -> ElementId {
        let w = Element::wire(Point::new(x0, y0), Point::new(x1, y1)).unwrap();
        board.add_element(w).id
    }

    fn component(board: &mut Board, type_id: i32, x: i64, y: i64) -> ElementId {
        let registry = TypeRegistry::with_builtins();
        let c = Element::component(registry.get(type_id).unwrap(), Point::new(x, y), Rotation::Deg0);
        board.add_element(c).id
    }

    fn geometry(board: &Board, id: ElementId) -> (Point, Point) {
        let e = board.get_element_by_id(id).unwrap();
        (e.pos, e.end_pos)
    }

    #[test]
    fn test_add_assigns_increasing_ids() {
        let mut board = Board::default();
        let a = wire(&mut board, 0, 0, 5, 0);
        let b = wire(&mut board, 0, 2, 5, 2);
        assert!(b > a);
        assert_eq!(board.element_count(), 2);

        let mut explicit = Element::wire(Point::new(0, 4), Point::new(5, 4)).unwrap();
        explicit.id = 40;
        board.add_element(explicit);
        assert_eq!(board.next_id(), 41);
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let mut board = Board::default();
        assert!(board.remove_element(99).is_none());
    }

    #[test]
    fn test_elements_in_chunks_dedups_across_chunks() {
        let mut board = Board::default();
        let long = wire(&mut board, 0, 3, 40, 3);
        let found = board.elements_in_chunks(&GridRect::new(Point::new(0, 0), Point::new(47, 15)));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, long);
    }

    #[test]
    fn test_occupied_space_after_add_and_free_after_remove() {
        let mut board = Board::default();
        let id = component(&mut board, type_ids::OR, 5, 5);
        let or = board.get_element_by_id(id).unwrap().clone();
        let pins = or.pin_positions();
        assert!(!board.is_free_space(&or.rect(), false, Some(&pins), &[]));
        assert!(board.is_free_space(&or.rect(), false, Some(&pins), &[id]));
        board.remove_element(id);
        assert!(board.is_free_space(&or.rect(), false, Some(&pins), &[]));

        let w = Element::wire(Point::new(0, 0), Point::new(9, 0)).unwrap();
        assert!(board.is_free_space(&w.rect(), true, None, &[]));
        board.add_element(w.clone());
        assert!(!board.is_free_space(&w.rect(), true, None, &[]));
    }

    #[test]
    fn test_parallel_and_touching_wires_are_free() {
        let mut board = Board::default();
        wire(&mut board, 0, 0, 10, 0);
        let parallel = GridRect::new(Point::new(0, 1), Point::new(10, 1));
        let touching = GridRect::new(Point::new(10, 0), Point::new(15, 0));
        let overlapping = GridRect::new(Point::new(5, 0), Point::new(15, 0));
        let crossing = GridRect::new(Point::new(4, 0), Point::new(4, 6));
        assert!(board.is_free_space(&parallel, true, None, &[]));
        assert!(board.is_free_space(&touching, true, None, &[]));
        assert!(board.is_free_space(&crossing, true, None, &[]));
        assert!(!board.is_free_space(&overlapping, true, None, &[]));
    }

    #[test]
    fn test_negative_space_rejected() {
        let board = Board::default();
        let rect = GridRect::new(Point::new(-1, 0), Point::new(3, 0));
        assert!(!board.is_free_space(&rect, true, None, &[]));
    }

    #[test]
    fn test_pins_may_meet_but_not_enter_footprints() {
        let registry = TypeRegistry::with_builtins();
        let not = registry.get(type_ids::NOT).unwrap();
        let mut board = Board::default();
        component(&mut board, type_ids::OR, 5, 5);

        // Flush against the OR: its input pin would sit inside the OR.
        let flush = Element::component(not, Point::new(7, 5), Rotation::Deg0);
        let pins = flush.pin_positions();
        assert!(!board.is_free_space(&flush.rect(), false, Some(&pins), &[]));

        // One cell further: the pins touch each other, which is how parts connect.
        let spaced = Element::component(not, Point::new(8, 5), Rotation::Deg0);
        let pins = spaced.pin_positions();
        assert!(board.is_free_space(&spaced.rect(), false, Some(&pins), &[]));
    }

    #[test]
    fn test_wire_into_component_rejected() {
        let mut board = Board::default();
        component(&mut board, type_ids::OR, 5, 5);
        let into = GridRect::new(Point::new(0, 5), Point::new(6, 5));
        let to_pin = GridRect::new(Point::new(0, 5), Point::new(4, 5));
        assert!(!board.is_free_space(&into, true, None, &[]));
        assert!(board.is_free_space(&to_pin, true, None, &[]));
    }

    #[test]
    fn test_move_updates_chunks() {
        let mut board = Board::default();
        let id = component(&mut board, type_ids::NOT, 2, 2);
        assert!(board.move_element(id, Point::new(40, 0)));
        let old = GridRect::new(Point::new(0, 0), Point::new(15, 15));
        assert!(board.elements_in_chunks(&old).is_empty());
        let new = GridRect::new(Point::new(32, 0), Point::new(47, 15));
        assert_eq!(board.elements_in_chunks(&new).len(), 1);
        assert!(!board.move_element(1234, Point::new(1, 1)));
    }

    #[test]
    fn test_all_spaces_free_for_group_move() {
        let mut board = Board::default();
        let a = component(&mut board, type_ids::NOT, 2, 2);
        component(&mut board, type_ids::NOT, 10, 2);
        assert!(board.all_spaces_free(&[a], Point::new(0, 4), &[a]));
        assert!(!board.all_spaces_free(&[a], Point::new(8, 0), &[a]));
    }

    #[test]
    fn test_three_wires_form_junction() {
        let mut board = Board::default();
        let p = Point::new(5, 5);
        wire(&mut board, 0, 5, 5, 5);
        wire(&mut board, 5, 5, 10, 5);
        assert!(!board.is_junction(&p));
        let up = wire(&mut board, 5, 0, 5, 5);
        assert!(board.is_junction(&p));
        assert_eq!(board.connection_points().count(), 1);

        board.remove_element(up);
        assert!(!board.is_junction(&p));
        assert_eq!(
            board.drain_junction_events(),
            vec![JunctionEvent::Connected(p), JunctionEvent::Disconnected(p)]
        );
        assert!(board.drain_junction_events().is_empty());
    }

    #[test]
    fn test_split_first_half_keeps_id() {
        let mut board = Board::default();
        let id = wire(&mut board, 0, 0, 10, 0);
        let parts = board.split_wire(id, Point::new(4, 0));
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].id, id);
        assert_ne!(parts[1].id, id);
        assert_eq!(geometry(&board, id), (Point::new(0, 0), Point::new(4, 0)));
        assert_eq!(board.element_count(), 2);
    }

    #[test]
    fn test_split_at_endpoint_is_noop() {
        let mut board = Board::default();
        let id = wire(&mut board, 0, 0, 10, 0);
        let parts = board.split_wire(id, Point::new(10, 0));
        assert_eq!(parts.len(), 1);
        assert_eq!(board.element_count(), 1);
        assert_eq!(board.split_wire(id, Point::new(3, 3)).len(), 1);
    }

    #[test]
    fn test_merge_then_split_restores_geometry() {
        let mut board = Board::default();
        let a = wire(&mut board, 0, 2, 4, 2);
        let b = wire(&mut board, 4, 2, 9, 2);
        let before_a = board.get_element_by_id(a).unwrap().clone();
        let before_b = board.get_element_by_id(b).unwrap().clone();

        let change = board.merge_wires(b, a, false).unwrap();
        assert_eq!(change.new_elements[0].id, a.min(b));
        assert_eq!(board.element_count(), 1);

        let parts = board.split_wire(a.min(b), Point::new(4, 2));
        assert!(parts[0].geometry_eq(&before_a));
        assert!(parts[1].geometry_eq(&before_b));
    }

    #[test]
    fn test_merge_refused_at_junction_unless_overridden() {
        let mut board = Board::default();
        let a = wire(&mut board, 0, 2, 4, 2);
        let b = wire(&mut board, 4, 2, 9, 2);
        wire(&mut board, 4, 0, 4, 2);
        assert!(board.merge_wires(a, b, false).is_none());
        assert!(board.merge_wires(a, b, true).is_some());
    }

    #[test]
    fn test_merge_refuses_non_colinear_and_components() {
        let mut board = Board::default();
        let a = wire(&mut board, 0, 2, 4, 2);
        let corner = wire(&mut board, 4, 2, 4, 8);
        let gate = component(&mut board, type_ids::NOT, 20, 20);
        assert!(board.merge_wires(a, corner, false).is_none());
        assert!(board.merge_wires(a, gate, false).is_none());
        assert!(board.merge_wires(a, a, false).is_none());
        assert_eq!(board.element_count(), 3);
    }

    #[test]
    fn test_connect_wires_splits_through_wire() {
        let mut board = Board::default();
        let v = wire(&mut board, 5, 0, 5, 10);
        let h = wire(&mut board, 0, 5, 5, 5);
        let out = board.connect_wires(h, v, Point::new(5, 5));
        assert_eq!(out.len(), 3);
        assert_eq!(board.element_count(), 3);
        assert!(board.is_junction(&Point::new(5, 5)));
    }

    #[test]
    fn test_disconnect_merges_crossing() {
        let mut board = Board::default();
        let left = wire(&mut board, 0, 5, 5, 5);
        let right = wire(&mut board, 5, 5, 10, 5);
        let top = wire(&mut board, 5, 0, 5, 5);
        let bottom = wire(&mut board, 5, 5, 5, 10);
        assert!(board.is_junction(&Point::new(5, 5)));

        let merged = board.disconnect_wires(&[left, right, top, bottom]);
        assert_eq!(merged.len(), 2);
        assert_eq!(board.element_count(), 2);
        assert!(!board.is_junction(&Point::new(5, 5)));
    }

    #[test]
    fn test_normalize_merge_collapses_chain() {
        init_logger();
        let mut board = Board::default();
        let ids = [
            wire(&mut board, 6, 0, 9, 0),
            wire(&mut board, 0, 0, 3, 0),
            wire(&mut board, 3, 0, 6, 0),
        ];
        let changes = board.normalize_batch(&ids, NormalizeRule::Merge);
        assert_eq!(changes.len(), 2);
        assert_eq!(board.element_count(), 1);
        let only = board.all_elements().next().unwrap();
        assert_eq!((only.pos, only.end_pos), (Point::new(0, 0), Point::new(9, 0)));
    }

    #[test]
    fn test_normalize_connect_t_junction() {
        init_logger();
        let mut board = Board::default();
        wire(&mut board, 5, 0, 5, 10);
        let h = wire(&mut board, 0, 5, 5, 5);
        board.normalize_batch(&[h], NormalizeRule::Connect);
        assert_eq!(board.element_count(), 3);
        assert!(board.is_junction(&Point::new(5, 5)));
        assert_eq!(board.wire_ends_on_point(&Point::new(5, 5)).len(), 3);
    }

    #[test]
    fn test_normalize_connect_pins_on_wire() {
        init_logger();
        let mut board = Board::default();
        let or = component(&mut board, type_ids::OR, 5, 5);
        wire(&mut board, 4, 0, 4, 10);
        board.normalize_batch(&[or], NormalizeRule::Connect);
        let wires = board.all_elements().filter(|e| e.is_wire()).count();
        assert_eq!(wires, 3);
        assert_eq!(board.wire_ends_on_point(&Point::new(4, 5)).len(), 3);
        assert_eq!(board.wire_ends_on_point(&Point::new(4, 6)).len(), 3);
    }

    #[test]
    fn test_normalize_connect_pins_on_two_wires() {
        init_logger();
        let mut board = Board::default();
        let or = component(&mut board, type_ids::OR, 5, 5);
        wire(&mut board, 4, 0, 4, 10);
        wire(&mut board, 7, 0, 7, 10);
        board.normalize_batch(&[or], NormalizeRule::Connect);
        assert_eq!(board.all_elements().filter(|e| e.is_wire()).count(), 5);
        for pin in [Point::new(4, 5), Point::new(4, 6), Point::new(7, 5)] {
            assert_eq!(board.wire_ends_on_point(&pin).len(), 3);
            assert!(board.is_junction(&pin));
        }
    }

    #[test]
    fn test_move_updates_junctions() {
        let mut board = Board::default();
        let p = Point::new(5, 5);
        wire(&mut board, 0, 5, 5, 5);
        wire(&mut board, 5, 5, 10, 5);
        let up = wire(&mut board, 5, 0, 5, 5);
        board.drain_junction_events();

        assert!(board.move_element(up, Point::new(20, 0)));
        assert!(!board.is_junction(&p));
        assert_eq!(board.drain_junction_events(), vec![JunctionEvent::Disconnected(p)]);

        assert!(board.move_element(up, Point::new(-20, 0)));
        assert!(board.is_junction(&p));
        assert_eq!(board.drain_junction_events(), vec![JunctionEvent::Connected(p)]);
    }

    #[test]
    fn test_rotate_updates_junctions() {
        let mut board = Board::default();
        let out = Point::new(7, 5);
        let or = component(&mut board, type_ids::OR, 5, 5);
        wire(&mut board, 7, 5, 10, 5);
        wire(&mut board, 7, 0, 7, 5);
        assert!(board.is_junction(&out));
        board.drain_junction_events();

        assert!(board.rotate_component(or, Rotation::Deg90, 2));
        assert!(!board.is_junction(&out));
        assert_eq!(board.drain_junction_events(), vec![JunctionEvent::Disconnected(out)]);

        assert!(board.rotate_component(or, Rotation::Deg0, 2));
        assert!(board.is_junction(&out));
        assert_eq!(board.drain_junction_events(), vec![JunctionEvent::Connected(out)]);
    }

    #[test]
    fn test_split_and_merge_update_junctions() {
        let mut board = Board::default();
        let p = Point::new(5, 5);
        let long = wire(&mut board, 0, 5, 10, 5);
        wire(&mut board, 5, 0, 5, 5);
        assert!(!board.is_junction(&p));
        board.drain_junction_events();

        let halves = board.split_wire(long, p);
        assert_eq!(halves.len(), 2);
        assert!(board.is_junction(&p));
        assert_eq!(board.drain_junction_events(), vec![JunctionEvent::Connected(p)]);

        assert!(board.merge_wires(halves[0].id, halves[1].id, true).is_some());
        assert!(!board.is_junction(&p));
        assert_eq!(board.drain_junction_events(), vec![JunctionEvent::Disconnected(p)]);
    }

    #[test]
    fn test_with_wires_on_edges() {
        let mut board = Board::default();
        let or = component(&mut board, type_ids::OR, 5, 5);
        let feed = wire(&mut board, 0, 5, 4, 5);
        wire(&mut board, 0, 20, 4, 20);
        assert_eq!(board.with_wires_on_edges(&[or]), vec![or, feed]);
    }

    #[test]
    fn test_json_round_trip_rebuilds_index() {
        let mut board = Board::default();
        wire(&mut board, 0, 5, 5, 5);
        wire(&mut board, 5, 5, 10, 5);
        wire(&mut board, 5, 0, 5, 5);
        component(&mut board, type_ids::AND, 20, 20);
        let json = board.to_json().unwrap();

        let restored = Board::from_json(&json, BoardConfig::default()).unwrap();
        assert_eq!(restored.element_count(), 4);
        assert!(restored.is_junction(&Point::new(5, 5)));
        assert_eq!(restored.highest_id(), board.highest_id());
        assert_eq!(restored.elements_in_chunks(&GridRect::point(Point::new(20, 20))).len(), 1);
    }
}
