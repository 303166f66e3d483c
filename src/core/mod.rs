pub mod error;
pub mod types;

pub use error::{CircuitError, Result};
pub use types::{BlockPos, ChunkPos, InputPin};
