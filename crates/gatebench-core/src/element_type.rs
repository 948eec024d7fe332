use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identifies an element type. `0` is always the wire.
pub type TypeId = i32;

/// Well-known built-in type ids.
pub mod type_ids {
    use super::TypeId;

    pub const WIRE: TypeId = 0;
    pub const NOT: TypeId = 1;
    pub const AND: TypeId = 2;
    pub const OR: TypeId = 3;
    pub const XOR: TypeId = 4;
    pub const DELAY: TypeId = 5;
    pub const CLOCK: TypeId = 6;
    pub const HALF_ADDER: TypeId = 10;
    pub const FULL_ADDER: TypeId = 11;
    pub const ROM: TypeId = 12;
    pub const D_FF: TypeId = 13;
    pub const JK_FF: TypeId = 14;
    pub const SR_FF: TypeId = 15;
    pub const INPUT: TypeId = 100;
    pub const OUTPUT: TypeId = 101;
    pub const BUTT: TypeId = 102;
    pub const BUTTON: TypeId = 200;
    pub const LEVER: TypeId = 201;
    pub const LED: TypeId = 202;
    pub const SEGMENT_DISPLAY: TypeId = 203;
    pub const LED_MATRIX: TypeId = 204;
    pub const TEXT: TypeId = 300;
    pub const TUNNEL: TypeId = 301;

    /// User-defined circuit types are allocated from here upwards.
    pub const FIRST_USER: TypeId = 1000;
}

/// What role an element type plays for the board and the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Wire,
    /// Placed on the board but never simulated (labels, tunnels, butt joints).
    Marker,
    /// External pin of the circuit that owns it.
    Plug,
    /// A primitive that becomes exactly one simulation unit.
    Gate,
    /// A user-defined circuit, expanded during flattening.
    Circuit,
}

/// Metadata describing one element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementType {
    pub id: TypeId,
    pub name: String,
    pub kind: TypeKind,
    pub num_inputs: u32,
    pub num_outputs: u32,
    pub min_inputs: u32,
    pub max_inputs: u32,
    pub width: i64,
    pub rotation: u8,
    pub options: Option<Vec<i64>>,
}

impl ElementType {
    pub fn new(id: TypeId, name: &str, kind: TypeKind, num_inputs: u32, num_outputs: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            num_inputs,
            num_outputs,
            min_inputs: num_inputs,
            max_inputs: num_inputs,
            width: 2,
            rotation: 0,
            options: None,
        }
    }

    pub fn with_width(mut self, width: i64) -> Self {
        self.width = width;
        self
    }

    pub fn with_input_range(mut self, min: u32, max: u32) -> Self {
        self.min_inputs = min;
        self.max_inputs = max;
        self
    }

    pub fn with_options(mut self, options: Vec<i64>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn is_plug(&self) -> bool {
        self.kind == TypeKind::Plug
    }

    pub fn is_user_circuit(&self) -> bool {
        self.kind == TypeKind::Circuit
    }

    /// Wires and markers carry no simulation behavior of their own.
    pub fn generates_unit(&self) -> bool {
        !matches!(self.kind, TypeKind::Wire | TypeKind::Marker)
    }
}

/// Type metadata lookups the compiler depends on.
pub trait TypeProvider {
    fn element_type(&self, id: TypeId) -> Option<&ElementType>;

    fn is_plug(&self, id: TypeId) -> bool {
        self.element_type(id).is_some_and(ElementType::is_plug)
    }

    fn is_user_circuit(&self, id: TypeId) -> bool {
        self.element_type(id).is_some_and(ElementType::is_user_circuit)
    }

    fn generates_unit(&self, id: TypeId) -> bool {
        self.element_type(id).is_some_and(ElementType::generates_unit)
    }
}

impl<T: TypeProvider + ?Sized> TypeProvider for &T {
    fn element_type(&self, id: TypeId) -> Option<&ElementType> {
        (**self).element_type(id)
    }
}

/// Registry of built-in and user-defined element types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRegistry {
    types: IndexMap<TypeId, ElementType>,
}

impl TypeRegistry {
    /// An empty registry that only knows the wire.
    pub fn new() -> Self {
        let mut registry = Self {
            types: IndexMap::new(),
        };
        registry.add_type(ElementType::new(type_ids::WIRE, "wire", TypeKind::Wire, 0, 0));
        registry
    }

    /// A registry populated with every built-in type.
    pub fn with_builtins() -> Self {
        use type_ids::*;
        use TypeKind::*;

        let mut registry = Self::new();
        for ty in [
            ElementType::new(NOT, "not", Gate, 1, 1),
            ElementType::new(AND, "and", Gate, 2, 1).with_input_range(2, 64),
            ElementType::new(OR, "or", Gate, 2, 1).with_input_range(2, 64),
            ElementType::new(XOR, "xor", Gate, 2, 1).with_input_range(2, 64),
            ElementType::new(DELAY, "delay", Gate, 1, 1),
            ElementType::new(CLOCK, "clock", Gate, 1, 1).with_options(vec![3]),
            ElementType::new(HALF_ADDER, "half_adder", Gate, 2, 2).with_width(3),
            ElementType::new(FULL_ADDER, "full_adder", Gate, 3, 2).with_width(3),
            ElementType::new(ROM, "rom", Gate, 4, 4)
                .with_width(3)
                .with_input_range(1, 16),
            ElementType::new(D_FF, "d_ff", Gate, 2, 2).with_width(3),
            ElementType::new(JK_FF, "jk_ff", Gate, 3, 2).with_width(3),
            ElementType::new(SR_FF, "sr_ff", Gate, 3, 2).with_width(3),
            ElementType::new(INPUT, "input", Plug, 0, 1).with_width(1),
            ElementType::new(OUTPUT, "output", Plug, 1, 0).with_width(1),
            ElementType::new(BUTT, "butt", Marker, 0, 1).with_width(1),
            ElementType::new(BUTTON, "button", Gate, 0, 1),
            ElementType::new(LEVER, "lever", Gate, 0, 1),
            ElementType::new(LED, "led", Gate, 1, 0).with_width(1),
            ElementType::new(SEGMENT_DISPLAY, "segment_display", Gate, 8, 0).with_width(4),
            ElementType::new(LED_MATRIX, "led_matrix", Gate, 8, 0)
                .with_width(8)
                .with_input_range(1, 64),
            ElementType::new(TEXT, "text", Marker, 0, 0).with_width(1),
            ElementType::new(TUNNEL, "tunnel", Marker, 1, 0).with_width(1),
        ] {
            registry.add_type(ty);
        }
        registry
    }

    pub fn add_type(&mut self, ty: ElementType) {
        self.types.insert(ty.id, ty);
    }

    /// Register (or refresh) a user-defined circuit type.
    pub fn register_user_circuit(&mut self, id: TypeId, name: &str, num_inputs: u32, num_outputs: u32) {
        if id < type_ids::FIRST_USER {
            log::warn!("user circuit '{}' registered with reserved type id {}", name, id);
        }
        let ty = ElementType::new(id, name, TypeKind::Circuit, num_inputs, num_outputs).with_width(3);
        self.add_type(ty);
    }

    pub fn remove_type(&mut self, id: TypeId) -> Option<ElementType> {
        self.types.shift_remove(&id)
    }

    pub fn get(&self, id: TypeId) -> Option<&ElementType> {
        self.types.get(&id)
    }

    pub fn get_mut(&mut self, id: TypeId) -> Option<&mut ElementType> {
        self.types.get_mut(&id)
    }

    pub fn has_type(&self, id: TypeId) -> bool {
        self.types.contains_key(&id)
    }

    pub fn user_circuits(&self) -> impl Iterator<Item = &ElementType> {
        self.types.values().filter(|t| t.is_user_circuit())
    }

    pub fn all_types(&self) -> impl Iterator<Item = &ElementType> {
        self.types.values()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Drop every user-defined circuit type.
    pub fn clear_user_circuits(&mut self) {
        self.types.retain(|_, t| !t.is_user_circuit());
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl TypeProvider for TypeRegistry {
    fn element_type(&self, id: TypeId) -> Option<&ElementType> {
        self.get(id)
    }
}
