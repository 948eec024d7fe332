use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use gatebench_core::{Element, ElementId, Point, TypeId, TypeProvider};

use crate::circuit::Circuit;
use crate::error::{CompileError, Result};
use crate::unit::{LinkId, SimulationUnit, UNLINKED};

/// Link discovery result for one circuit type, before flattening.
#[derive(Debug, Clone, Default)]
pub struct CompiledCircuit {
    pub type_id: TypeId,
    /// Units in board insertion order, each with the element it came from.
    pub units: Vec<(SimulationUnit, Element)>,
    /// Plug ordinals wired together inside this circuit.
    pub connected_plug_groups: Vec<BTreeSet<u32>>,
    pub plug_slot_by_index: BTreeMap<u32, usize>,
    pub wires_on_links: BTreeMap<LinkId, Vec<ElementId>>,
    pub pins_on_links: BTreeMap<LinkId, Vec<(ElementId, usize)>>,
    /// Local link ids are `0..link_count`.
    pub link_count: LinkId,
    /// Stamp of the compile that produced this result.
    pub generation: u64,
    /// Generation of each nested type at the time links were labeled.
    pub dependency_generations: BTreeMap<TypeId, u64>,
}

impl CompiledCircuit {
    /// Ordinals bridged to `ordinal`, excluding itself.
    pub fn plug_siblings(&self, ordinal: u32) -> impl Iterator<Item = u32> + '_ {
        self.connected_plug_groups
            .iter()
            .filter(move |group| group.contains(&ordinal))
            .flat_map(|group| group.iter().copied())
            .filter(move |o| *o != ordinal)
    }

    pub fn plug_link(&self, ordinal: u32) -> Option<LinkId> {
        let slot = *self.plug_slot_by_index.get(&ordinal)?;
        self.units.get(slot).and_then(|(unit, _)| unit.link(0))
    }
}

/// Label every pin of `circuit` with a local link id.
///
/// `nested` must already hold the compiled form of every circuit type
/// instanced on the board.
pub fn compile_circuit<P: TypeProvider>(
    circuit: &Circuit,
    types: &P,
    nested: &HashMap<TypeId, CompiledCircuit>,
) -> Result<CompiledCircuit> {
    let board = circuit.board();
    let mut compiled = CompiledCircuit {
        type_id: circuit.type_id,
        ..CompiledCircuit::default()
    };
    let mut slot_by_element: HashMap<ElementId, usize> = HashMap::new();

    for element in board.all_elements() {
        if types.element_type(element.type_id).is_none() {
            return Err(CompileError::TypeNotFound(element.type_id));
        }
        if !types.generates_unit(element.type_id) {
            continue;
        }
        let slot = compiled.units.len();
        if types.is_plug(element.type_id) {
            let ordinal = element.plug_index.unwrap_or(0);
            if compiled.plug_slot_by_index.insert(ordinal, slot).is_some() {
                log::warn!("circuit {} has two plugs with ordinal {}", circuit.type_id, ordinal);
            }
        }
        if types.is_user_circuit(element.type_id) {
            let inner = nested
                .get(&element.type_id)
                .ok_or(CompileError::TypeNotFound(element.type_id))?;
            compiled
                .dependency_generations
                .insert(element.type_id, inner.generation);
        }
        slot_by_element.insert(element.id, slot);
        compiled.units.push((SimulationUnit::from_element(element), element.clone()));
    }

    let mut discovery = LinkDiscovery {
        circuit,
        types,
        nested,
        slot_by_element: &slot_by_element,
        compiled: &mut compiled,
    };
    discovery.run();

    let mut plugs_by_link: BTreeMap<LinkId, BTreeSet<u32>> = BTreeMap::new();
    for (ordinal, slot) in &compiled.plug_slot_by_index {
        if let Some(link) = compiled.units[*slot].0.link(0) {
            plugs_by_link.entry(link).or_default().insert(*ordinal);
        }
    }
    compiled.connected_plug_groups = plugs_by_link
        .into_values()
        .filter(|group| group.len() >= 2)
        .collect();

    log::debug!(
        "compiled circuit {} '{}': {} units, {} links",
        circuit.type_id,
        circuit.name,
        compiled.units.len(),
        compiled.link_count
    );
    Ok(compiled)
}

struct LinkDiscovery<'a, P> {
    circuit: &'a Circuit,
    types: &'a P,
    nested: &'a HashMap<TypeId, CompiledCircuit>,
    slot_by_element: &'a HashMap<ElementId, usize>,
    compiled: &'a mut CompiledCircuit,
}

impl<P: TypeProvider> LinkDiscovery<'_, P> {
    fn run(&mut self) {
        for slot in 0..self.compiled.units.len() {
            for pin in 0..self.compiled.units[slot].0.pin_count() {
                if self.compiled.units[slot].0.link(pin) != Some(UNLINKED) {
                    continue;
                }
                let Some(start) = self.compiled.units[slot].1.pin_positions().get(pin).copied() else {
                    continue;
                };
                let link = self.compiled.link_count;
                self.traverse(start, link);
                self.compiled.link_count += 1;
            }
        }
    }

    /// Flood one net outward from `start` over wire ends.
    fn traverse(&mut self, start: Point, link: LinkId) {
        let circuit = self.circuit;
        let board = circuit.board();
        let mut covered: HashSet<(ElementId, Point)> = HashSet::new();
        let mut worklist = vec![start];

        while let Some(point) = worklist.pop() {
            for (element, index) in board.wire_ends_on_point(&point) {
                if !covered.insert((element.id, point)) {
                    continue;
                }
                if element.is_wire() {
                    let wires = self.compiled.wires_on_links.entry(link).or_default();
                    if !wires.contains(&element.id) {
                        wires.push(element.id);
                    }
                    worklist.push(element.other_wire_end(&point));
                    continue;
                }
                let Some(&slot) = self.slot_by_element.get(&element.id) else {
                    continue;
                };
                let unit = &mut self.compiled.units[slot].0;
                match unit.link(index) {
                    Some(UNLINKED) => unit.set_link(index, link),
                    Some(existing) if existing != link => {
                        log::debug!(
                            "pin {} of element {} already on link {}, skipping",
                            index,
                            element.id,
                            existing
                        );
                        continue;
                    }
                    _ => {}
                }
                self.compiled
                    .pins_on_links
                    .entry(link)
                    .or_default()
                    .push((element.id, index));

                if self.types.is_user_circuit(element.type_id) {
                    if let Some(inner) = self.nested.get(&element.type_id) {
                        let pins = element.pin_positions();
                        for sibling in inner.plug_siblings(index as u32) {
                            if let Some(pos) = pins.get(sibling as usize) {
                                worklist.push(*pos);
                            }
                        }
                    }
                }
            }
        }
    }
}
