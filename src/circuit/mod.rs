//! Live circuit entities and the hooks the simulation engine provides.

use crate::core::{BlockPos, ChunkPos, InputPin};
use crate::world::WorldHandle;
use std::collections::BTreeMap;
use std::fmt;

pub mod registry;

pub use registry::{CircuitFactory, CircuitRegistry, ClassRegistry, IntegrityReport};

/// Opaque per-class internal state. Keys and values belong to the circuit
/// implementation; persistence passes them through untouched.
pub type InternalState = BTreeMap<String, String>;

/// Simulation-side behaviour of one circuit instance.
///
/// Only the lifecycle hooks persistence needs are part of this trait; the
/// logic evaluation itself lives in the engine.
pub trait CircuitBehavior: Send {
    /// Called once before the circuit is registered. Returning an error
    /// rejects the activation.
    fn init(&mut self, _circuit: &CircuitSetup<'_>) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Flush entity-local state so that [`CircuitBehavior::internal_state`]
    /// reflects it. Invoked right before the circuit is serialized.
    fn save(&mut self) {}

    fn internal_state(&self) -> InternalState {
        InternalState::new()
    }

    /// Apply a previously emitted state mapping. Must accept any subset of
    /// the keys it emitted and ignore keys it does not know.
    fn restore(&mut self, _state: &InternalState) {}
}

/// Read-only view handed to [`CircuitBehavior::init`].
pub struct CircuitSetup<'a> {
    pub class_name: &'a str,
    pub world: &'a WorldHandle,
    pub layout: &'a CircuitLayout,
    pub args: &'a [String],
}

/// Physical footprint of a circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitLayout {
    pub activation_block: BlockPos,
    pub inputs: Vec<InputPin>,
    pub outputs: Vec<BlockPos>,
    pub interfaces: Vec<BlockPos>,
    pub structure: Vec<BlockPos>,
}

impl CircuitLayout {
    pub fn new(activation_block: BlockPos) -> Self {
        Self {
            activation_block,
            inputs: Vec::new(),
            outputs: Vec::new(),
            interfaces: Vec::new(),
            structure: Vec::new(),
        }
    }

    /// Binds input blocks to pins in order; pin index is the position.
    pub fn with_inputs(mut self, blocks: impl IntoIterator<Item = BlockPos>) -> Self {
        self.inputs = blocks
            .into_iter()
            .enumerate()
            .map(|(index, block)| InputPin::new(block, index))
            .collect();
        self
    }

    pub fn with_outputs(mut self, blocks: impl IntoIterator<Item = BlockPos>) -> Self {
        self.outputs = blocks.into_iter().collect();
        self
    }

    pub fn with_interfaces(mut self, blocks: impl IntoIterator<Item = BlockPos>) -> Self {
        self.interfaces = blocks.into_iter().collect();
        self
    }

    pub fn with_structure(mut self, blocks: impl IntoIterator<Item = BlockPos>) -> Self {
        self.structure = blocks.into_iter().collect();
        self
    }

    pub fn input_blocks(&self) -> impl Iterator<Item = BlockPos> + '_ {
        self.inputs.iter().map(|pin| pin.block)
    }

    /// Every coordinate the circuit occupies, activation block first.
    pub fn footprint(&self) -> impl Iterator<Item = BlockPos> + '_ {
        std::iter::once(self.activation_block)
            .chain(self.input_blocks())
            .chain(self.outputs.iter().copied())
            .chain(self.interfaces.iter().copied())
            .chain(self.structure.iter().copied())
    }
}

/// A live circuit. `id` is set once by the registry and never changes.
pub struct Circuit {
    id: Option<u32>,
    class_name: String,
    world: WorldHandle,
    layout: CircuitLayout,
    chunks: Vec<ChunkPos>,
    args: Vec<String>,
    behavior: Box<dyn CircuitBehavior>,
}

impl Circuit {
    pub fn new(
        class_name: impl Into<String>,
        world: WorldHandle,
        layout: CircuitLayout,
        args: Vec<String>,
        behavior: Box<dyn CircuitBehavior>,
    ) -> Self {
        Self {
            id: None,
            class_name: class_name.into(),
            world,
            layout,
            chunks: Vec::new(),
            args,
            behavior,
        }
    }

    pub fn with_chunks(mut self, chunks: Vec<ChunkPos>) -> Self {
        self.chunks = chunks;
        self
    }

    pub fn id(&self) -> Option<u32> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: u32) {
        debug_assert!(self.id.is_none(), "circuit id is immutable once assigned");
        self.id = Some(id);
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn world(&self) -> &WorldHandle {
        &self.world
    }

    pub fn layout(&self) -> &CircuitLayout {
        &self.layout
    }

    pub fn chunks(&self) -> &[ChunkPos] {
        &self.chunks
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn input_count(&self) -> usize {
        self.layout.inputs.len()
    }

    pub fn behavior(&self) -> &dyn CircuitBehavior {
        self.behavior.as_ref()
    }

    pub fn behavior_mut(&mut self) -> &mut dyn CircuitBehavior {
        self.behavior.as_mut()
    }

    pub(crate) fn init_behavior(&mut self) -> std::result::Result<(), String> {
        let setup = CircuitSetup {
            class_name: &self.class_name,
            world: &self.world,
            layout: &self.layout,
            args: &self.args,
        };
        self.behavior.init(&setup)
    }
}

impl fmt::Debug for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Circuit")
            .field("id", &self.id)
            .field("class_name", &self.class_name)
            .field("world", &self.world.name())
            .field("layout", &self.layout)
            .field("chunks", &self.chunks)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{} (#{}) @ {}", self.class_name, id, self.world.name()),
            None => write!(f, "{} @ {}", self.class_name, self.world.name()),
        }
    }
}
