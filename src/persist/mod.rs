//! Circuit state persistence and recovery.

pub mod activator;
pub mod backup;
pub mod config;
pub mod record;
pub mod report;
pub mod scheduler;
pub mod serializer;
pub mod store;

pub use activator::{activate, activate_record};
pub use backup::BackupManager;
pub use config::PersistenceConfig;
pub use record::CircuitRecord;
pub use report::{
    FileLoadReport, FileSkip, FileWriteFailure, LoadReport, RecordFailure, SaveOutcome, SaveReport,
};
pub use scheduler::{DeferredTask, HostScheduler, ManualScheduler, TokioScheduler};
pub use serializer::{CircuitDraft, from_record, to_record};
pub use store::CircuitStore;
