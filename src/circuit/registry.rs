use super::{Circuit, CircuitBehavior, CircuitLayout};
use crate::core::{ChunkPos, CircuitError, Result};
use crate::world::{World, WorldResolver};
use log::warn;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

pub type CircuitFactory = Arc<dyn Fn() -> Box<dyn CircuitBehavior> + Send + Sync>;

/// Maps persisted class names to constructors.
///
/// Each circuit implementation module registers its factory at startup.
#[derive(Clone, Default)]
pub struct ClassRegistry {
    factories: HashMap<String, CircuitFactory>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, class_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn CircuitBehavior> + Send + Sync + 'static,
    {
        self.factories.insert(class_name.into(), Arc::new(factory));
    }

    pub fn lookup_class(&self, class_name: &str) -> Result<CircuitFactory> {
        self.factories
            .get(class_name)
            .cloned()
            .ok_or_else(|| CircuitError::UnknownCircuitClass(class_name.to_string()))
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.factories.contains_key(class_name)
    }

    pub fn list_classes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Outcome of [`CircuitRegistry::check_integrity`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    /// Circuits dropped because their world is no longer loaded.
    pub orphaned: Vec<u32>,
    /// Circuits dropped because their class is no longer registered.
    pub unknown_class: Vec<u32>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned.is_empty() && self.unknown_class.is_empty()
    }
}

/// The live circuit set, keyed by id.
#[derive(Default)]
pub struct CircuitRegistry {
    classes: ClassRegistry,
    circuits: BTreeMap<u32, Circuit>,
    next_id: u32,
}

impl CircuitRegistry {
    pub fn new(classes: ClassRegistry) -> Self {
        Self {
            classes,
            circuits: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn classes_mut(&mut self) -> &mut ClassRegistry {
        &mut self.classes
    }

    pub fn lookup_class(&self, class_name: &str) -> Result<CircuitFactory> {
        self.classes.lookup_class(class_name)
    }

    /// Adds `circuit` to the live set.
    ///
    /// A requested id is honoured when free and rejected with
    /// [`CircuitError::DuplicateId`] when taken. Without one, the lowest free
    /// id at or above the allocation cursor is used.
    pub fn register(&mut self, mut circuit: Circuit, requested_id: Option<u32>) -> Result<u32> {
        let id = match requested_id {
            Some(id) if self.circuits.contains_key(&id) => {
                return Err(CircuitError::DuplicateId(id));
            }
            Some(id) => id,
            None => self.allocate_id()?,
        };

        if id >= self.next_id {
            self.next_id = id.saturating_add(1);
        }
        circuit.assign_id(id);
        self.circuits.insert(id, circuit);
        Ok(id)
    }

    fn allocate_id(&self) -> Result<u32> {
        let mut candidate = self.next_id;
        while self.circuits.contains_key(&candidate) {
            candidate = candidate.checked_add(1).ok_or_else(|| {
                CircuitError::ActivationRejected("circuit id space exhausted".to_string())
            })?;
        }
        Ok(candidate)
    }

    /// Removes a circuit from the live set. It is simply absent from the next save.
    pub fn deactivate(&mut self, id: u32) -> Option<Circuit> {
        self.circuits.remove(&id)
    }

    pub fn get(&self, id: u32) -> Option<&Circuit> {
        self.circuits.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Circuit> {
        self.circuits.get_mut(&id)
    }

    pub fn contains_id(&self, id: u32) -> bool {
        self.circuits.contains_key(&id)
    }

    pub fn all_live_entities(&self) -> impl Iterator<Item = &Circuit> {
        self.circuits.values()
    }

    pub fn all_live_entities_mut(&mut self) -> impl Iterator<Item = &mut Circuit> {
        self.circuits.values_mut()
    }

    pub fn len(&self) -> usize {
        self.circuits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circuits.is_empty()
    }

    /// Drops live circuits that reference a world that is no longer loaded or
    /// a class that is no longer registered.
    pub fn check_integrity(&mut self, worlds: &dyn WorldResolver) -> IntegrityReport {
        let mut report = IntegrityReport::default();

        for (id, circuit) in &self.circuits {
            if !worlds.is_loaded(circuit.world().name()) {
                report.orphaned.push(*id);
            } else if !self.classes.contains(circuit.class_name()) {
                report.unknown_class.push(*id);
            }
        }

        for id in report.orphaned.iter().chain(report.unknown_class.iter()) {
            if let Some(circuit) = self.circuits.remove(id) {
                warn!("Removing circuit {} during integrity check.", circuit);
            }
        }

        report
    }

    /// Chunks covered by a circuit footprint, sorted and unique.
    pub fn find_circuit_chunks(world: &World, layout: &CircuitLayout) -> Vec<ChunkPos> {
        layout
            .footprint()
            .map(|pos| world.chunk_of(pos))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
