//! Schedule ingestion.
//!
//! Stored service documents arrive through a `ScheduleSource` in batches,
//! are decoded into the raw record types and then validated into domain
//! `Service`s. Bad documents are reported per record; only read failures
//! of the source itself are errors.

mod convert;
mod source;
mod types;

pub use convert::{ConversionError, convert_record};
pub use source::{
    InMemorySource, JsonFileSource, RecordError, RecordResult, ScheduleSource, SourceError,
};
pub use types::{ScheduleRecord, StopRecord};
