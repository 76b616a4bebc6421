//! # radar-core
//!
//! Core library for the tew-radar entity radar.
//!
//! This crate provides:
//! - Windows process memory reading
//! - Entity table scanning and entity record decoding
//! - Entity classification
//! - Per-tick snapshots and player-relative radar projection
//!
//! Everything above the `memory` module works against the `ReadMemory`
//! trait, so the scan/decode/project pipeline runs the same against a live
//! process or an in-memory mock.

pub mod config;
pub mod decoder;
pub mod entity;
pub mod error;
pub mod memory;
pub mod radar;
pub mod scanner;
pub mod snapshot;
pub mod transform;

pub use config::{RadarConfig, RadarConfigBuilder, RadarSettings};
pub use decoder::{EntityFieldDecoder, FieldValue, read_field, resolve_field_address};
pub use entity::{EntityCategory, EntityRecord, Position, classify};
pub use error::{Error, Result};
pub use memory::layout::{EntityLayout, FieldKind, FieldSpec, Resolution, TableLayout};
pub use memory::{MemoryReader, ProcessHandle, ReadMemory};
pub use radar::{Blip, RadarFrame, RadarView};
pub use scanner::{EntityTableScanner, ScanResult, ScanStats, StopRule};
pub use snapshot::{Snapshot, SnapshotConsumer, SnapshotProducer};
pub use transform::{Rotation, normalize};
