//! Circuit Activator: turns a decoded record into a registered live circuit.

use super::record::CircuitRecord;
use super::serializer::{self, CircuitDraft};
use crate::circuit::{Circuit, CircuitRegistry};
use crate::core::{CircuitError, Result};
use crate::world::WorldResolver;
use log::debug;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Activates one circuit and returns its registry id.
///
/// Any error leaves the registry unchanged. Panics raised by the circuit's
/// constructor, init or restore hook are reported as
/// [`CircuitError::ActivationRejected`].
pub fn activate(
    draft: CircuitDraft,
    registry: &mut CircuitRegistry,
    worlds: &dyn WorldResolver,
) -> Result<u32> {
    let factory = registry.lookup_class(&draft.class_name)?;
    let world = worlds.resolve(&draft.world)?;

    if let Some(id) = draft.requested_id {
        if registry.contains_id(id) {
            return Err(CircuitError::DuplicateId(id));
        }
    }

    let CircuitDraft {
        class_name,
        layout,
        chunks,
        args,
        state,
        requested_id,
        ..
    } = draft;

    let behavior = catch_unwind(AssertUnwindSafe(|| factory())).map_err(|_| {
        CircuitError::ActivationRejected(format!("constructor of '{}' panicked", class_name))
    })?;

    let chunks = chunks.unwrap_or_else(|| CircuitRegistry::find_circuit_chunks(&world, &layout));
    let mut circuit = Circuit::new(class_name, world, layout, args, behavior).with_chunks(chunks);

    match catch_unwind(AssertUnwindSafe(|| circuit.init_behavior())) {
        Ok(Ok(())) => {}
        Ok(Err(reason)) => {
            return Err(CircuitError::ActivationRejected(format!(
                "{}: {}",
                circuit.class_name(),
                reason
            )));
        }
        Err(_) => {
            return Err(CircuitError::ActivationRejected(format!(
                "{}: init panicked",
                circuit.class_name()
            )));
        }
    }

    let id = registry.register(circuit, requested_id)?;

    if let Some(state) = state {
        let restored = registry.get_mut(id).map(|circuit| {
            catch_unwind(AssertUnwindSafe(|| circuit.behavior_mut().restore(&state)))
        });
        if let Some(Err(_)) = restored {
            registry.deactivate(id);
            return Err(CircuitError::ActivationRejected(format!(
                "circuit #{} panicked while restoring its state",
                id
            )));
        }
    }

    debug!("Activated circuit #{} from saved record.", id);
    Ok(id)
}

pub fn activate_record(
    record: &CircuitRecord,
    registry: &mut CircuitRegistry,
    worlds: &dyn WorldResolver,
) -> Result<u32> {
    activate(serializer::from_record(record)?, registry, worlds)
}
