use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer block coordinate inside a world. Persisted as `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl From<[i32; 3]> for BlockPos {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<BlockPos> for [i32; 3] {
    fn from(pos: BlockPos) -> Self {
        [pos.x, pos.y, pos.z]
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Coarse 2D partition key of a world. Persisted as `[x, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl From<[i32; 2]> for ChunkPos {
    fn from([x, z]: [i32; 2]) -> Self {
        Self { x, z }
    }
}

impl From<ChunkPos> for [i32; 2] {
    fn from(pos: ChunkPos) -> Self {
        [pos.x, pos.z]
    }
}

/// Binding of an input block to a pin. `index` always equals the pin's
/// position in the owning circuit's input list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputPin {
    pub block: BlockPos,
    pub index: usize,
}

impl InputPin {
    pub fn new(block: BlockPos, index: usize) -> Self {
        Self { block, index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_pos_serializes_as_triple() {
        let json = serde_json::to_string(&BlockPos::new(1, -64, 300)).unwrap();
        assert_eq!(json, "[1,-64,300]");
        let back: BlockPos = serde_json::from_str("[4,5,6]").unwrap();
        assert_eq!(back, BlockPos::new(4, 5, 6));
    }

    #[test]
    fn chunk_pos_rejects_wrong_arity() {
        assert!(serde_json::from_str::<ChunkPos>("[1,2,3]").is_err());
        assert_eq!(
            serde_json::from_str::<ChunkPos>("[-1,2]").unwrap(),
            ChunkPos::new(-1, 2)
        );
    }
}
