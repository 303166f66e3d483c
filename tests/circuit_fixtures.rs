#![allow(dead_code)]

use circuitstore::{
    CircuitBehavior, CircuitRegistry, CircuitSetup, ClassRegistry, InternalState, World, Worlds,
};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts pulses; persists the count as internal state.
pub struct Counter {
    count: u64,
    saves: Arc<AtomicUsize>,
}

impl CircuitBehavior for Counter {
    fn init(&mut self, circuit: &CircuitSetup<'_>) -> Result<(), String> {
        if circuit.layout.inputs.is_empty() {
            return Err("counter needs at least one input".to_string());
        }
        Ok(())
    }

    fn save(&mut self) {
        self.saves.fetch_add(1, Ordering::SeqCst);
    }

    fn internal_state(&self) -> InternalState {
        InternalState::from([("count".to_string(), self.count.to_string())])
    }

    fn restore(&mut self, state: &InternalState) {
        if let Some(count) = state.get("count").and_then(|v| v.parse().ok()) {
            self.count = count;
        }
    }
}

impl Counter {
    pub fn count_of(circuit: &circuitstore::Circuit) -> Option<String> {
        circuit.behavior().internal_state().get("count").cloned()
    }
}

pub struct Inverter;

impl CircuitBehavior for Inverter {}

/// Panics whenever the store asks it to flush state.
pub struct Faulty;

impl CircuitBehavior for Faulty {
    fn save(&mut self) {
        panic!("faulty circuit cannot save");
    }
}

pub struct Fixture {
    pub registry: CircuitRegistry,
    pub worlds: Worlds,
    pub saves: Arc<AtomicUsize>,
}

impl Fixture {
    pub fn new(worlds: &[&str]) -> Self {
        let saves = Arc::new(AtomicUsize::new(0));
        let counter_saves = saves.clone();

        let mut classes = ClassRegistry::new();
        classes.register("counter", move || {
            Box::new(Counter {
                count: 0,
                saves: counter_saves.clone(),
            }) as Box<dyn CircuitBehavior>
        });
        classes.register("inverter", || Box::new(Inverter) as Box<dyn CircuitBehavior>);
        classes.register("faulty", || Box::new(Faulty) as Box<dyn CircuitBehavior>);

        Self {
            registry: CircuitRegistry::new(classes),
            worlds: worlds.iter().map(|name| World::new(*name)).collect(),
            saves,
        }
    }

    pub fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

pub fn counter_record(world: &str, id: i64, x: i32, count: u64) -> Value {
    json!({
        "class": "counter",
        "world": world,
        "activationBlock": [x, 64, 0],
        "chunk": [[x >> 4, 0]],
        "inputs": [[x + 1, 64, 0], [x + 2, 64, 0]],
        "outputs": [[x - 1, 64, 0]],
        "interfaces": [],
        "structure": [[x, 64, 0], [x + 1, 63, 0]],
        "signArgs": ["4"],
        "state": {"count": count.to_string()},
        "id": id
    })
}

pub fn inverter_record(world: &str, x: i32) -> Value {
    stateless_record("inverter", world, x)
}

pub fn faulty_record(world: &str, x: i32) -> Value {
    stateless_record("faulty", world, x)
}

fn stateless_record(class: &str, world: &str, x: i32) -> Value {
    json!({
        "class": class,
        "world": world,
        "activationBlock": [x, 64, 0],
        "inputs": [[x + 1, 64, 0]],
        "outputs": [[x - 1, 64, 0]],
        "interfaces": [],
        "structure": [[x, 64, 0]],
        "signArgs": []
    })
}

pub fn write_file(path: &Path, records: &[Value]) {
    std::fs::write(path, serde_json::to_vec(&Value::Array(records.to_vec())).unwrap()).unwrap();
}

pub fn backups_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.contains(".BACKUP"))
        .collect();
    names.sort();
    names
}
