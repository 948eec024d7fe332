use serde::{Deserialize, Serialize};

use crate::element_type::{type_ids, ElementType, TypeId};
use crate::error::BoardError;
use crate::geometry::{GridRect, Point};

/// Board-unique element identifier. `-1` marks an element not yet placed.
pub type ElementId = i64;

pub const UNASSIGNED_ID: ElementId = -1;

/// Quarter-turn rotation of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_quarter_turns(turns: u8) -> Self {
        match turns % 4 {
            0 => Rotation::Deg0,
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            _ => Rotation::Deg270,
        }
    }

    pub fn quarter_turns(self) -> u8 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }

    pub fn is_horizontal(self) -> bool {
        self.quarter_turns() % 2 == 0
    }
}

/// A wire segment or a placed component instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub type_id: TypeId,
    pub num_inputs: u32,
    pub num_outputs: u32,
    pub pos: Point,
    pub end_pos: Point,
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plug_index: Option<u32>,
}

impl Element {
    /// A straight wire between two grid points.
    pub fn wire(start: Point, end: Point) -> Result<Self, BoardError> {
        let rect = GridRect::new(start, end);
        let diagonal = rect.width() != 0 && rect.height() != 0;
        let empty = rect.width() == 0 && rect.height() == 0;
        if diagonal || empty {
            return Err(BoardError::InvalidWire { start, end });
        }
        Ok(Self {
            id: UNASSIGNED_ID,
            type_id: type_ids::WIRE,
            num_inputs: 0,
            num_outputs: 0,
            pos: rect.start,
            end_pos: rect.end,
            rotation: Rotation::Deg0,
            options: None,
            plug_index: None,
        })
    }

    /// An unplaced component of the given type with its top-left cell at `pos`.
    pub fn component(ty: &ElementType, pos: Point, rotation: Rotation) -> Self {
        Self {
            id: UNASSIGNED_ID,
            type_id: ty.id,
            num_inputs: ty.num_inputs,
            num_outputs: ty.num_outputs,
            pos,
            end_pos: calc_end_pos(pos, ty.width, ty.num_inputs, ty.num_outputs, rotation),
            rotation,
            options: ty.options.clone(),
            plug_index: ty.is_plug().then_some(0),
        }
    }

    pub fn with_plug_index(mut self, index: u32) -> Self {
        self.plug_index = Some(index);
        self
    }

    pub fn is_wire(&self) -> bool {
        self.type_id == type_ids::WIRE
    }

    pub fn rect(&self) -> GridRect {
        GridRect::new(self.pos, self.end_pos)
    }

    pub fn is_horizontal(&self) -> bool {
        self.pos.y == self.end_pos.y
    }

    pub fn is_vertical(&self) -> bool {
        self.pos.x == self.end_pos.x
    }

    pub fn translate(&mut self, delta: Point) {
        self.pos = self.pos.offset(delta);
        self.end_pos = self.end_pos.offset(delta);
    }

    /// Number of wire ends: two for a wire, one per pin for a component.
    pub fn pin_count(&self) -> usize {
        if self.is_wire() {
            2
        } else {
            (self.num_inputs + self.num_outputs) as usize
        }
    }

    /// Positions where wires attach: both endpoints for a wire, every pin
    /// (inputs first, then outputs) for a component.
    pub fn pin_positions(&self) -> Vec<Point> {
        self.pin_positions_with(self.rotation, self.num_inputs)
    }

    /// Pin positions as they would be for a different rotation or input count.
    pub fn pin_positions_with(&self, rotation: Rotation, num_inputs: u32) -> Vec<Point> {
        if self.is_wire() {
            return vec![self.pos, self.end_pos];
        }
        let (pos, end) = (self.pos, self.end_pos);
        let inputs = (0..num_inputs as i64).map(|i| match rotation {
            Rotation::Deg0 => Point::new(pos.x - 1, pos.y + i),
            Rotation::Deg90 => Point::new(end.x - 1 - i, pos.y - 1),
            Rotation::Deg180 => Point::new(end.x, end.y - 1 - i),
            Rotation::Deg270 => Point::new(pos.x + i, end.y),
        });
        let outputs = (0..self.num_outputs as i64).map(|i| match rotation {
            Rotation::Deg0 => Point::new(end.x, pos.y + i),
            Rotation::Deg90 => Point::new(end.x - 1 - i, end.y),
            Rotation::Deg180 => Point::new(pos.x - 1, end.y - 1 - i),
            Rotation::Deg270 => Point::new(pos.x + i, pos.y - 1),
        });
        inputs.chain(outputs).collect()
    }

    /// Index of the wire end at `point`, if any.
    pub fn pin_index_at(&self, point: &Point) -> Option<usize> {
        self.pin_positions().iter().position(|p| p == point)
    }

    pub fn has_pin_at(&self, point: &Point) -> bool {
        self.pin_index_at(point).is_some()
    }

    /// Whether `point` lies on the input side of a component.
    pub fn is_input_at(&self, point: &Point) -> bool {
        match self.rotation {
            Rotation::Deg0 => point.x < self.pos.x,
            Rotation::Deg90 => point.y < self.pos.y,
            Rotation::Deg180 => point.x >= self.end_pos.x,
            Rotation::Deg270 => point.y >= self.end_pos.y,
        }
    }

    /// The endpoint of a wire opposite to `point`.
    pub fn other_wire_end(&self, point: &Point) -> Point {
        if self.pos == *point {
            self.end_pos
        } else {
            self.pos
        }
    }

    /// Wire passes through `point`, endpoints included.
    pub fn wire_contains(&self, point: &Point) -> bool {
        self.is_wire() && self.rect().contains_point(point)
    }

    /// Wire passes through `point` strictly between its endpoints.
    pub fn wire_contains_inner(&self, point: &Point) -> bool {
        self.wire_contains(point) && *point != self.pos && *point != self.end_pos
    }

    /// Two wires lie on the same line and share more than a single point.
    pub fn overlaps_wire(&self, other: &Element) -> bool {
        wire_ranges_overlap(&self.rect(), &other.rect())
    }

    /// A wire lines up with the pin axis of a component.
    pub fn same_direction(&self, other: &Element) -> bool {
        let (wire, comp) = if self.is_wire() { (self, other) } else { (other, self) };
        if comp.is_wire() {
            return false;
        }
        if comp.rotation.is_horizontal() {
            wire.is_horizontal()
        } else {
            wire.is_vertical()
        }
    }

    /// Structural equality ignoring id and plug ordinal.
    pub fn geometry_eq(&self, other: &Element) -> bool {
        self.type_id == other.type_id
            && self.num_inputs == other.num_inputs
            && self.num_outputs == other.num_outputs
            && self.pos == other.pos
            && self.end_pos == other.end_pos
            && self.rotation == other.rotation
            && self.options == other.options
    }
}

/// Lower-right corner of a component placed at `pos`.
pub fn calc_end_pos(pos: Point, width: i64, num_inputs: u32, num_outputs: u32, rotation: Rotation) -> Point {
    let length = num_inputs.max(num_outputs).max(1) as i64;
    if rotation.is_horizontal() {
        Point::new(pos.x + width, pos.y + length)
    } else {
        Point::new(pos.x + length, pos.y + width)
    }
}

/// Closed wire extents on one line overlapping by more than a point.
pub fn wire_ranges_overlap(a: &GridRect, b: &GridRect) -> bool {
    let a_horizontal = a.start.y == a.end.y;
    let b_horizontal = b.start.y == b.end.y;
    let a_vertical = a.start.x == a.end.x;
    let b_vertical = b.start.x == b.end.x;
    if a_horizontal && b_horizontal && a.start.y == b.start.y {
        a.start.x.max(b.start.x) < a.end.x.min(b.end.x)
    } else if a_vertical && b_vertical && a.start.x == b.start.x {
        a.start.y.max(b.start.y) < a.end.y.min(b.end.y)
    } else {
        false
    }
}
