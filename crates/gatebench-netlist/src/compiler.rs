use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use gatebench_core::{TypeId, TypeProvider};

use crate::circuit::CircuitSet;
use crate::compiled::{compile_circuit, CompiledCircuit};
use crate::error::{CompileError, Result};
use crate::flatten::{FlattenedNetlist, Flattener};

/// Compiler tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Log the duration of every compile pass at `info`.
    pub log_timings: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self { log_timings: true }
    }
}

impl CompilerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Hierarchical netlist compiler with a per-type cache.
///
/// The compiler owns its type metadata. Circuits are passed to each
/// [`compile`](Self::compile) call so the borrow checker rules out board
/// edits while a pass runs.
pub struct NetlistCompiler<P: TypeProvider> {
    types: P,
    config: CompilerConfig,
    cache: HashMap<TypeId, CompiledCircuit>,
    generation: u64,
}

impl<P: TypeProvider> NetlistCompiler<P> {
    pub fn new(types: P) -> Self {
        Self::with_config(types, CompilerConfig::default())
    }

    pub fn with_config(types: P, config: CompilerConfig) -> Self {
        Self {
            types,
            config,
            cache: HashMap::new(),
            generation: 0,
        }
    }

    pub fn types(&self) -> &P {
        &self.types
    }

    /// Mutable type metadata. Drops the cache since pin counts may change.
    pub fn types_mut(&mut self) -> &mut P {
        self.cache.clear();
        &mut self.types
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn compiled(&self, type_id: TypeId) -> Option<&CompiledCircuit> {
        self.cache.get(&type_id)
    }

    pub fn is_cached(&self, type_id: TypeId) -> bool {
        self.cache.contains_key(&type_id)
    }

    /// Forget one type; it is recompiled on the next pass that reaches it.
    pub fn invalidate(&mut self, type_id: TypeId) -> bool {
        self.cache.remove(&type_id).is_some()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Compile `top` and everything it instances into one flat netlist.
    ///
    /// Types are compiled leaves first. A type is recompiled when it is not
    /// cached, when its circuit was edited, or when a type it instances has
    /// been recompiled since its own links were labeled, in this pass or an
    /// earlier one.
    pub fn compile(&mut self, top: TypeId, circuits: &mut CircuitSet) -> Result<FlattenedNetlist> {
        let started = Instant::now();
        let order = circuits.dependency_order(top, &self.types)?;
        let mut rebuilt = 0usize;

        for type_id in order {
            let circuit = circuits.get_mut(type_id).ok_or(CompileError::TypeNotFound(type_id))?;
            let fresh = self.cache.get(&type_id).is_some_and(|cached| {
                circuit.dependencies(&self.types).iter().all(|dep| {
                    cached.dependency_generations.get(dep) == self.cache.get(dep).map(|c| &c.generation)
                })
            });
            if fresh && !circuit.is_dirty() {
                log::debug!("circuit {} '{}' served from cache", type_id, circuit.name);
                continue;
            }
            let mut compiled = compile_circuit(circuit, &self.types, &self.cache)?;
            self.generation += 1;
            compiled.generation = self.generation;
            self.cache.insert(type_id, compiled);
            circuit.mark_compiled();
            rebuilt += 1;
        }

        let netlist = Flattener::new(&self.types, &self.cache).run(top)?;
        if self.config.log_timings {
            log::info!(
                "compiled circuit {}: {} units, {} links, {} types rebuilt in {:?}",
                top,
                netlist.units.len(),
                netlist.link_count,
                rebuilt,
                started.elapsed()
            );
        }
        Ok(netlist)
    }

    /// [`compile`](Self::compile) followed by the flat integer encoding.
    pub fn compile_encoded(&mut self, top: TypeId, circuits: &mut CircuitSet) -> Result<Vec<i32>> {
        self.compile(top, circuits)?.encode()
    }
}
