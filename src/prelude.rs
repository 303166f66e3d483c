//! Recommended imports grouped by role.
//!
//! `host` covers what a server embedding the store needs at startup and on
//! every tick. `circuit` is for modules that implement circuit classes.

pub mod host {
    pub use crate::{
        CircuitRegistry, CircuitStore, ClassRegistry, LoadReport, ManualScheduler,
        PersistenceConfig, SaveOutcome, TokioScheduler, World, Worlds,
    };
}

pub mod circuit {
    pub use crate::{BlockPos, CircuitBehavior, CircuitSetup, InternalState};
}
