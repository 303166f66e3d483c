use crate::circuit::InternalState;
use crate::core::{BlockPos, ChunkPos};
use serde::{Deserialize, Serialize};

/// Flat, serializable form of one circuit.
///
/// Field names are the on-disk keys. `chunk` is also read under `chunks`,
/// which older data files used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitRecord {
    #[serde(rename = "class")]
    pub class_name: String,
    pub world: String,
    pub activation_block: BlockPos,
    #[serde(default, alias = "chunks", skip_serializing_if = "Option::is_none")]
    pub chunk: Option<Vec<ChunkPos>>,
    pub inputs: Vec<BlockPos>,
    pub outputs: Vec<BlockPos>,
    pub interfaces: Vec<BlockPos>,
    pub structure: Vec<BlockPos>,
    pub sign_args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<InternalState>,
    #[serde(default)]
    pub id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_wire_keys() {
        let record: CircuitRecord = serde_json::from_value(json!({
            "class": "counter",
            "world": "overworld",
            "activationBlock": [1, 2, 3],
            "chunks": [[0, 0], [0, 1]],
            "inputs": [[1, 2, 4]],
            "outputs": [],
            "interfaces": [],
            "structure": [[1, 2, 3]],
            "signArgs": ["8"],
            "state": {"count": "3"},
            "id": 4
        }))
        .unwrap();

        assert_eq!(record.class_name, "counter");
        assert_eq!(record.activation_block, BlockPos::new(1, 2, 3));
        assert_eq!(record.chunk, Some(vec![ChunkPos::new(0, 0), ChunkPos::new(0, 1)]));
        assert_eq!(record.state.unwrap().get("count").map(String::as_str), Some("3"));
        assert_eq!(record.id, Some(4));
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let record: CircuitRecord = serde_json::from_value(json!({
            "class": "and",
            "world": "overworld",
            "activationBlock": [0, 0, 0],
            "inputs": [],
            "outputs": [],
            "interfaces": [],
            "structure": [],
            "signArgs": []
        }))
        .unwrap();

        assert!(record.chunk.is_none());
        assert!(record.state.is_none());
        assert!(record.id.is_none());

        let written = serde_json::to_value(&record).unwrap();
        assert!(written.get("chunk").is_none());
        assert!(written.get("state").is_none());
        assert_eq!(written["activationBlock"], json!([0, 0, 0]));
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let result = serde_json::from_value::<CircuitRecord>(json!({
            "class": "and",
            "activationBlock": [0, 0, 0]
        }));
        assert!(result.is_err());
    }
}
