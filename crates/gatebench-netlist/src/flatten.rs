use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use gatebench_core::{ElementId, TypeId, TypeProvider};

use crate::compiled::CompiledCircuit;
use crate::error::{CompileError, Result};
use crate::unit::{encode_units, LinkId, SimulationUnit};

/// Chain of nested instance element ids from the top circuit downwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstancePath(pub Vec<ElementId>);

impl InstancePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, element_id: ElementId) -> Self {
        let mut ids = self.0.clone();
        ids.push(element_id);
        Self(ids)
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for id in &self.0 {
            write!(f, "/{}", id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSource {
    pub path: InstancePath,
    pub element_id: ElementId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinSource {
    pub path: InstancePath,
    pub element_id: ElementId,
    pub pin_index: usize,
}

/// Which wires and pins each global link passes through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSources {
    pub wires: BTreeMap<LinkId, Vec<WireSource>>,
    pub pins: BTreeMap<LinkId, Vec<PinSource>>,
}

impl LinkSources {
    pub fn wires_on(&self, link: LinkId) -> &[WireSource] {
        self.wires.get(&link).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pins_on(&self, link: LinkId) -> &[PinSource] {
        self.pins.get(&link).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Global link carrying the given wire of the given instance.
    pub fn link_of_wire(&self, path: &InstancePath, element_id: ElementId) -> Option<LinkId> {
        self.wires.iter().find_map(|(link, sources)| {
            sources
                .iter()
                .any(|s| s.element_id == element_id && s.path == *path)
                .then_some(*link)
        })
    }
}

/// One top-level circuit expanded down to primitive units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenedNetlist {
    pub top: TypeId,
    pub units: Vec<SimulationUnit>,
    /// Global link ids are all below this value.
    pub link_count: LinkId,
    pub sources: LinkSources,
}

impl FlattenedNetlist {
    /// Flat integer stream handed to the simulation engine.
    pub fn encode(&self) -> Result<Vec<i32>> {
        encode_units(&self.units)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Depth-first expansion of compiled circuits into one global netlist.
pub(crate) struct Flattener<'a, P> {
    types: &'a P,
    compiled: &'a HashMap<TypeId, CompiledCircuit>,
    next_link: LinkId,
    units: Vec<SimulationUnit>,
    sources: LinkSources,
}

impl<'a, P: TypeProvider> Flattener<'a, P> {
    pub(crate) fn new(types: &'a P, compiled: &'a HashMap<TypeId, CompiledCircuit>) -> Self {
        Self {
            types,
            compiled,
            next_link: 0,
            units: Vec::new(),
            sources: LinkSources::default(),
        }
    }

    pub(crate) fn run(mut self, top: TypeId) -> Result<FlattenedNetlist> {
        let compiled = self.compiled;
        let circuit = compiled.get(&top).ok_or(CompileError::TypeNotFound(top))?;
        self.expand(circuit, &InstancePath::root(), None)?;
        Ok(FlattenedNetlist {
            top,
            units: self.units,
            link_count: self.next_link,
            sources: self.sources,
        })
    }

    /// Append the units of `circuit` with links shifted into the global
    /// range. `outer` holds the parent's links on the instance pins.
    fn expand(&mut self, circuit: &CompiledCircuit, path: &InstancePath, outer: Option<&[LinkId]>) -> Result<()> {
        let offset = self.next_link;
        self.next_link += circuit.link_count;

        let mut aliases: HashMap<LinkId, LinkId> = HashMap::new();
        if let Some(outer) = outer {
            for ordinal in circuit.plug_slot_by_index.keys() {
                let Some(&parent) = outer.get(*ordinal as usize) else {
                    log::warn!(
                        "circuit {} at {} has plug {} but the instance has only {} pins",
                        circuit.type_id,
                        path,
                        ordinal,
                        outer.len()
                    );
                    continue;
                };
                if let Some(local) = circuit.plug_link(*ordinal) {
                    aliases.insert(local, parent);
                }
            }
        }
        let global = |local: LinkId| aliases.get(&local).copied().unwrap_or(local + offset);

        for (link, wires) in &circuit.wires_on_links {
            let entry = self.sources.wires.entry(global(*link)).or_default();
            entry.extend(wires.iter().map(|id| WireSource {
                path: path.clone(),
                element_id: *id,
            }));
        }
        for (link, pins) in &circuit.pins_on_links {
            let entry = self.sources.pins.entry(global(*link)).or_default();
            entry.extend(pins.iter().map(|(id, pin_index)| PinSource {
                path: path.clone(),
                element_id: *id,
                pin_index: *pin_index,
            }));
        }

        for (unit, element) in &circuit.units {
            if self.types.is_plug(unit.type_id) {
                continue;
            }
            let mut unit = unit.clone();
            unit.map_links(global);
            if self.types.is_user_circuit(unit.type_id) {
                let compiled = self.compiled;
                let nested = compiled
                    .get(&unit.type_id)
                    .ok_or(CompileError::TypeNotFound(unit.type_id))?;
                let links: Vec<LinkId> = unit.links().collect();
                self.expand(nested, &path.child(element.id), Some(links.as_slice()))?;
            } else {
                self.units.push(unit);
            }
        }
        Ok(())
    }
}
