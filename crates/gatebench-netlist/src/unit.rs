use serde::{Deserialize, Serialize};

use gatebench_core::{Element, TypeId};

use crate::error::{CompileError, Result};

/// Identifies an electrical net within one compilation pass.
pub type LinkId = i64;

/// Placeholder for a pin that has not been labeled yet.
pub const UNLINKED: LinkId = -1;

/// One primitive the simulation engine executes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationUnit {
    pub type_id: TypeId,
    pub inputs: Vec<LinkId>,
    pub outputs: Vec<LinkId>,
}

impl SimulationUnit {
    /// An unlabeled unit with one slot per pin of `element`.
    pub fn from_element(element: &Element) -> Self {
        Self {
            type_id: element.type_id,
            inputs: vec![UNLINKED; element.num_inputs as usize],
            outputs: vec![UNLINKED; element.num_outputs as usize],
        }
    }

    pub fn pin_count(&self) -> usize {
        self.inputs.len() + self.outputs.len()
    }

    /// Link on pin `index`, counting inputs first and then outputs.
    pub fn link(&self, index: usize) -> Option<LinkId> {
        if index < self.inputs.len() {
            Some(self.inputs[index])
        } else {
            self.outputs.get(index - self.inputs.len()).copied()
        }
    }

    pub fn set_link(&mut self, index: usize, link: LinkId) {
        if index < self.inputs.len() {
            self.inputs[index] = link;
        } else if let Some(slot) = self.outputs.get_mut(index - self.inputs.len()) {
            *slot = link;
        }
    }

    /// All links, inputs first.
    pub fn links(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.inputs.iter().chain(self.outputs.iter()).copied()
    }

    pub fn map_links(&mut self, mut f: impl FnMut(LinkId) -> LinkId) {
        for link in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            *link = f(*link);
        }
    }
}

/// Flat integer stream for the simulation engine:
/// `[unit_count, (type_id, 0, 0, input_count, output_count, inputs.., outputs..)*]`.
pub fn encode_units(units: &[SimulationUnit]) -> Result<Vec<i32>> {
    let words: usize = units.iter().map(|u| 5 + u.pin_count()).sum();
    let mut out = Vec::with_capacity(1 + words);
    out.push(units.len() as i32);
    for unit in units {
        out.push(unit.type_id);
        out.push(0);
        out.push(0);
        out.push(unit.inputs.len() as i32);
        out.push(unit.outputs.len() as i32);
        for link in unit.links() {
            out.push(i32::try_from(link).map_err(|_| CompileError::LinkOverflow(link))?);
        }
    }
    Ok(out)
}

/// Inverse of [`encode_units`]. Returns `None` on a truncated or malformed stream.
pub fn decode_units(words: &[i32]) -> Option<Vec<SimulationUnit>> {
    let (&count, mut rest) = words.split_first()?;
    let mut units = Vec::new();
    for _ in 0..count {
        let header = rest.get(..5)?;
        let type_id = header[0];
        let inputs = usize::try_from(header[3]).ok()?;
        let outputs = usize::try_from(header[4]).ok()?;
        let end = inputs.checked_add(outputs)?.checked_add(5)?;
        let pins = rest.get(5..end)?;
        units.push(SimulationUnit {
            type_id,
            inputs: pins[..inputs].iter().map(|l| LinkId::from(*l)).collect(),
            outputs: pins[inputs..].iter().map(|l| LinkId::from(*l)).collect(),
        });
        rest = &rest[end..];
    }
    Some(units)
}
