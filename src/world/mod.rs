//! Live worlds and name resolution.
//!
//! Persisted records refer to their world by name only. Resolution turns
//! that name into a shared handle of a world that is currently loaded and
//! fails with [`CircuitError::MissingEnvironment`] otherwise. Nothing in
//! this module creates worlds on demand.

use crate::core::{BlockPos, ChunkPos, CircuitError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Default chunk width is 16 blocks.
pub const DEFAULT_CHUNK_SHIFT: u32 = 4;

/// Largest shift that keeps `chunk_of` well defined for `i32` coordinates.
pub const MAX_CHUNK_SHIFT: u32 = 31;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    name: String,
    chunk_shift: u32,
}

pub type WorldHandle = Arc<World>;

impl World {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chunk_shift: DEFAULT_CHUNK_SHIFT,
        }
    }

    /// Shifts above [`MAX_CHUNK_SHIFT`] are clamped.
    pub fn with_chunk_shift(mut self, chunk_shift: u32) -> Self {
        self.chunk_shift = chunk_shift.min(MAX_CHUNK_SHIFT);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chunk_shift(&self) -> u32 {
        self.chunk_shift
    }

    /// Chunk containing `pos`. Arithmetic shift floors negative coordinates.
    pub fn chunk_of(&self, pos: BlockPos) -> ChunkPos {
        ChunkPos::new(pos.x >> self.chunk_shift, pos.z >> self.chunk_shift)
    }
}

pub trait WorldResolver {
    fn resolve(&self, name: &str) -> Result<WorldHandle>;

    fn is_loaded(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }
}

/// The set of worlds the host currently has loaded.
#[derive(Debug, Clone, Default)]
pub struct Worlds {
    loaded: HashMap<String, WorldHandle>,
}

impl Worlds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, world: World) -> WorldHandle {
        let handle = Arc::new(world);
        self.loaded.insert(handle.name().to_string(), handle.clone());
        handle
    }

    pub fn unload(&mut self, name: &str) -> Option<WorldHandle> {
        self.loaded.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.loaded.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

impl FromIterator<World> for Worlds {
    fn from_iter<I: IntoIterator<Item = World>>(iter: I) -> Self {
        let mut worlds = Self::new();
        for world in iter {
            worlds.insert(world);
        }
        worlds
    }
}

impl WorldResolver for Worlds {
    fn resolve(&self, name: &str) -> Result<WorldHandle> {
        self.loaded
            .get(name)
            .cloned()
            .ok_or_else(|| CircuitError::MissingEnvironment(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_loaded_worlds_only() {
        let mut worlds = Worlds::new();
        worlds.insert(World::new("overworld"));

        assert_eq!(worlds.resolve("overworld").unwrap().name(), "overworld");
        assert!(matches!(
            worlds.resolve("nether"),
            Err(CircuitError::MissingEnvironment(name)) if name == "nether"
        ));
        assert!(!worlds.is_loaded("nether"));
        assert_eq!(worlds.len(), 1);
    }

    #[test]
    fn unloaded_world_stops_resolving() {
        let mut worlds: Worlds = [World::new("a"), World::new("b")].into_iter().collect();
        worlds.unload("a");
        assert!(!worlds.is_loaded("a"));
        assert!(worlds.is_loaded("b"));
    }

    #[test]
    fn chunk_of_floors_negative_coordinates() {
        let world = World::new("w");
        assert_eq!(world.chunk_of(BlockPos::new(0, 70, 15)), ChunkPos::new(0, 0));
        assert_eq!(world.chunk_of(BlockPos::new(16, 70, -1)), ChunkPos::new(1, -1));
        assert_eq!(world.chunk_of(BlockPos::new(-17, 0, -16)), ChunkPos::new(-2, -1));

        let coarse = World::new("w").with_chunk_shift(5);
        assert_eq!(coarse.chunk_of(BlockPos::new(31, 0, 32)), ChunkPos::new(0, 1));
    }

    #[test]
    fn oversized_chunk_shift_is_clamped() {
        let world = World::new("w").with_chunk_shift(40);
        assert_eq!(world.chunk_shift(), MAX_CHUNK_SHIFT);
        assert_eq!(world.chunk_of(BlockPos::new(i32::MAX, 0, -5)), ChunkPos::new(0, -1));
        assert_eq!(world.chunk_of(BlockPos::new(i32::MIN, 0, 5)), ChunkPos::new(-1, 0));
    }

    #[test]
    fn names_lists_loaded_worlds() {
        let worlds: Worlds = [World::new("nether"), World::new("overworld")].into_iter().collect();
        let mut names: Vec<&str> = worlds.names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["nether", "overworld"]);
        assert!(!worlds.is_empty());
    }
}
