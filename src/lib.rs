//! Selfie background removal: segment a photo, cut out the person, store
//! the headshot and keep it in a record list.

pub mod capture;
pub mod compositor;
pub mod error;
pub mod pipeline;
pub mod records;
pub mod segmentation;
pub mod storage;

pub use compositor::{composite_foreground, persist, FOREGROUND_THRESHOLD};
pub use error::{HeadshotError, Result};
pub use pipeline::{process_in_background, wait_for, Headshot, HeadshotPipeline};
pub use records::{MemoryRecordStore, NewRecord, Record, RecordStore, SqliteRecordStore};
pub use segmentation::{Mask, SegmentationModel};
pub use storage::{DirectorySink, OutputFormat, StorageReference, StorageSink};
