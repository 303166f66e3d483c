pub mod files;

pub use files::{DataFiles, discover, read_records, write_records};
