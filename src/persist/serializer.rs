//! Circuit Serializer: live circuit <-> [`CircuitRecord`].
//!
//! `to_record` is total and never drops a field. `from_record` rebuilds
//! everything except the registry binding (class instance, world handle and
//! final id), which the activator owns. Coordinate lists keep their order;
//! for inputs the position is the pin index.

use super::record::CircuitRecord;
use crate::circuit::{Circuit, CircuitLayout, InternalState};
use crate::core::{ChunkPos, CircuitError, Result};
use std::collections::HashSet;

/// A record decoded into typed fields but not yet bound to a world, a class
/// instance or a registry id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitDraft {
    pub class_name: String,
    pub world: String,
    pub layout: CircuitLayout,
    /// `None` when the record carried no chunk list; the activator rescans.
    pub chunks: Option<Vec<ChunkPos>>,
    pub args: Vec<String>,
    pub state: Option<InternalState>,
    /// `None` means allocate a fresh id.
    pub requested_id: Option<u32>,
}

/// Id written for a circuit that has not been registered yet.
pub const UNASSIGNED_ID: i64 = -1;

pub fn to_record(circuit: &Circuit) -> CircuitRecord {
    let layout = circuit.layout();
    let state = circuit.behavior().internal_state();

    CircuitRecord {
        class_name: circuit.class_name().to_string(),
        world: circuit.world().name().to_string(),
        activation_block: layout.activation_block,
        chunk: Some(circuit.chunks().to_vec()),
        inputs: layout.input_blocks().collect(),
        outputs: layout.outputs.clone(),
        interfaces: layout.interfaces.clone(),
        structure: layout.structure.clone(),
        sign_args: circuit.args().to_vec(),
        state: (!state.is_empty()).then_some(state),
        id: Some(circuit.id().map_or(UNASSIGNED_ID, i64::from)),
    }
}

pub fn from_record(record: &CircuitRecord) -> Result<CircuitDraft> {
    if record.class_name.trim().is_empty() {
        return Err(CircuitError::MalformedRecord(
            "circuit class must not be empty".to_string(),
        ));
    }
    if record.world.trim().is_empty() {
        return Err(CircuitError::MalformedRecord(format!(
            "circuit '{}' has an empty world name",
            record.class_name
        )));
    }

    let requested_id = match record.id {
        None => None,
        Some(id) if id < 0 => None,
        Some(id) => Some(u32::try_from(id).map_err(|_| {
            CircuitError::MalformedRecord(format!("circuit id {} is out of range", id))
        })?),
    };

    let layout = CircuitLayout::new(record.activation_block)
        .with_inputs(record.inputs.iter().copied())
        .with_outputs(record.outputs.iter().copied())
        .with_interfaces(record.interfaces.iter().copied())
        .with_structure(record.structure.iter().copied());

    Ok(CircuitDraft {
        class_name: record.class_name.clone(),
        world: record.world.clone(),
        layout,
        chunks: record.chunk.as_deref().map(dedup_chunks),
        args: record.sign_args.clone(),
        state: record.state.clone(),
        requested_id,
    })
}

/// Decodes one untyped record value. Shape errors become
/// [`CircuitError::MalformedRecord`].
pub fn from_value(value: serde_json::Value) -> Result<CircuitDraft> {
    let record: CircuitRecord = serde_json::from_value(value)?;
    from_record(&record)
}

fn dedup_chunks(chunks: &[ChunkPos]) -> Vec<ChunkPos> {
    let mut seen = HashSet::with_capacity(chunks.len());
    chunks.iter().copied().filter(|chunk| seen.insert(*chunk)).collect()
}
