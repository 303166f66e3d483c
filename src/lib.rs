// ============================================================================
// circuitstore
// ============================================================================

pub mod circuit;
pub mod core;
pub mod persist;
pub mod prelude;
pub mod storage;
pub mod world;

// Re-export main types for convenience
pub use crate::circuit::{
    Circuit, CircuitBehavior, CircuitLayout, CircuitRegistry, CircuitSetup, ClassRegistry,
    InternalState,
};
pub use crate::core::{BlockPos, ChunkPos, CircuitError, InputPin, Result};
pub use crate::persist::{
    CircuitRecord, CircuitStore, HostScheduler, LoadReport, ManualScheduler, PersistenceConfig,
    SaveOutcome, SaveReport, TokioScheduler,
};
pub use crate::world::{World, WorldHandle, WorldResolver, Worlds};
