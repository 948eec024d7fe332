use std::collections::BTreeSet;

use indexmap::IndexMap;

use gatebench_core::{Board, Element, TypeId, TypeProvider};

use crate::error::{CompileError, Result};

/// A named circuit type and the board it is drawn on.
#[derive(Debug, Clone)]
pub struct Circuit {
    pub type_id: TypeId,
    pub name: String,
    board: Board,
    compile_dirty: bool,
}

impl Circuit {
    pub fn new(type_id: TypeId, name: &str, board: Board) -> Self {
        Self {
            type_id,
            name: name.to_string(),
            board,
            compile_dirty: true,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable access to the board. Marks the circuit for recompilation.
    pub fn board_mut(&mut self) -> &mut Board {
        self.compile_dirty = true;
        &mut self.board
    }

    pub fn is_dirty(&self) -> bool {
        self.compile_dirty
    }

    pub fn mark_dirty(&mut self) {
        self.compile_dirty = true;
    }

    pub(crate) fn mark_compiled(&mut self) {
        self.compile_dirty = false;
    }

    /// User circuit types instanced directly on this board.
    pub fn dependencies<P: TypeProvider>(&self, types: &P) -> BTreeSet<TypeId> {
        self.board
            .all_elements()
            .filter(|e| types.is_user_circuit(e.type_id))
            .map(|e| e.type_id)
            .collect()
    }

    /// External pins of this circuit ordered by plug ordinal.
    pub fn plugs<P: TypeProvider>(&self, types: &P) -> Vec<&Element> {
        let mut plugs: Vec<&Element> = self
            .board
            .all_elements()
            .filter(|e| types.is_plug(e.type_id))
            .collect();
        plugs.sort_by_key(|e| e.plug_index.unwrap_or(0));
        plugs
    }
}

/// Every circuit a compilation may reach, keyed by type id.
#[derive(Debug, Clone, Default)]
pub struct CircuitSet {
    circuits: IndexMap<TypeId, Circuit>,
}

impl CircuitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a circuit, returning the one it replaces.
    pub fn insert(&mut self, circuit: Circuit) -> Option<Circuit> {
        self.circuits.insert(circuit.type_id, circuit)
    }

    pub fn remove(&mut self, type_id: TypeId) -> Option<Circuit> {
        self.circuits.shift_remove(&type_id)
    }

    pub fn get(&self, type_id: TypeId) -> Option<&Circuit> {
        self.circuits.get(&type_id)
    }

    pub fn get_mut(&mut self, type_id: TypeId) -> Option<&mut Circuit> {
        self.circuits.get_mut(&type_id)
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.circuits.contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.circuits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circuits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Circuit> {
        self.circuits.values()
    }

    /// Types reachable from `top`, leaves first, ending with `top` itself.
    ///
    /// Fails with [`CompileError::TypeNotFound`] when a referenced circuit is
    /// missing or an element type cannot be resolved, and with
    /// [`CompileError::CyclicDependency`] when a type reaches itself.
    pub fn dependency_order<P: TypeProvider>(&self, top: TypeId, types: &P) -> Result<Vec<TypeId>> {
        let mut order = Vec::new();
        let mut stack = Vec::new();
        self.visit(top, types, &mut stack, &mut order)?;
        Ok(order)
    }

    fn visit<P: TypeProvider>(
        &self,
        type_id: TypeId,
        types: &P,
        stack: &mut Vec<TypeId>,
        order: &mut Vec<TypeId>,
    ) -> Result<()> {
        if order.contains(&type_id) {
            return Ok(());
        }
        if let Some(start) = stack.iter().position(|t| *t == type_id) {
            let mut cycle = stack[start..].to_vec();
            cycle.push(type_id);
            return Err(CompileError::CyclicDependency(cycle));
        }
        let circuit = self.get(type_id).ok_or(CompileError::TypeNotFound(type_id))?;
        if let Some(unknown) = circuit
            .board
            .all_elements()
            .find(|e| types.element_type(e.type_id).is_none())
        {
            return Err(CompileError::TypeNotFound(unknown.type_id));
        }

        stack.push(type_id);
        for dependency in circuit.dependencies(types) {
            self.visit(dependency, types, stack, order)?;
        }
        stack.pop();
        order.push(type_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatebench_core::{type_ids, Point, Rotation, TypeRegistry};

    fn instance(registry: &TypeRegistry, type_id: TypeId, x: i64, y: i64) -> Element {
        Element::component(registry.get(type_id).unwrap(), Point::new(x, y), Rotation::Deg0)
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::with_builtins();
        registry.register_user_circuit(1000, "leaf", 1, 1);
        registry.register_user_circuit(1001, "middle", 1, 1);
        registry
    }

    fn circuit_with(registry: &TypeRegistry, type_id: TypeId, instances: &[TypeId]) -> Circuit {
        let mut board = Board::default();
        for (i, ty) in instances.iter().enumerate() {
            board.add_element(instance(registry, *ty, 2, 4 * i as i64 + 1));
        }
        Circuit::new(type_id, "c", board)
    }

    #[test]
    fn test_board_mut_marks_dirty() {
        let mut circuit = Circuit::new(1000, "leaf", Board::default());
        circuit.mark_compiled();
        assert!(!circuit.is_dirty());
        let _ = circuit.board();
        assert!(!circuit.is_dirty());
        let _ = circuit.board_mut();
        assert!(circuit.is_dirty());
    }

    #[test]
    fn test_dependency_order_is_leaves_first() {
        let registry = registry();
        let mut set = CircuitSet::new();
        set.insert(circuit_with(&registry, 1000, &[type_ids::NOT]));
        set.insert(circuit_with(&registry, 1001, &[1000, 1000]));
        set.insert(circuit_with(&registry, 5000, &[1001, 1000]));

        assert_eq!(set.dependency_order(5000, &registry).unwrap(), vec![1000, 1001, 5000]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let registry = registry();
        let mut set = CircuitSet::new();
        set.insert(circuit_with(&registry, 1000, &[1001]));
        set.insert(circuit_with(&registry, 1001, &[1000]));

        match set.dependency_order(1000, &registry) {
            Err(CompileError::CyclicDependency(cycle)) => assert_eq!(cycle, vec![1000, 1001, 1000]),
            other => panic!("expected a cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_circuit_is_type_not_found() {
        let registry = registry();
        let mut set = CircuitSet::new();
        set.insert(circuit_with(&registry, 5000, &[1000]));
        assert!(matches!(
            set.dependency_order(5000, &registry),
            Err(CompileError::TypeNotFound(1000))
        ));
        assert!(matches!(
            set.dependency_order(42, &registry),
            Err(CompileError::TypeNotFound(42))
        ));
    }

    #[test]
    fn test_plugs_sorted_by_ordinal() {
        let registry = registry();
        let mut board = Board::default();
        board.add_element(instance(&registry, type_ids::INPUT, 0, 4).with_plug_index(1));
        board.add_element(instance(&registry, type_ids::INPUT, 0, 0).with_plug_index(0));
        let circuit = Circuit::new(1000, "leaf", board);
        let ordinals: Vec<_> = circuit.plugs(&registry).iter().map(|p| p.plug_index).collect();
        assert_eq!(ordinals, vec![Some(0), Some(1)]);
    }
}
