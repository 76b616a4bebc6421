//! Per-tick snapshot production.
//!
//! Each call to `produce_snapshot` runs a fresh scan, decode and classify
//! pass. Nothing is carried between snapshots: entity addresses are reused
//! by the game's allocator, so they do not identify an entity across ticks.

use serde::Serialize;
use tracing::debug;

use crate::decoder::EntityFieldDecoder;
use crate::entity::{EntityCategory, EntityRecord};
use crate::error::Result;
use crate::memory::ReadMemory;
use crate::memory::layout::{EntityLayout, TableLayout};
use crate::scanner::{EntityTableScanner, ScanStats};

/// Entities seen during one tick, in table order
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub entities: Vec<EntityRecord>,
    pub scan: ScanStats,
    /// Candidates the decoder rejected
    pub rejected: usize,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EntityRecord> {
        self.entities.iter()
    }

    /// The first entity classified as the player
    pub fn player(&self) -> Option<&EntityRecord> {
        self.entities.iter().find(|e| e.is_player())
    }

    /// Live enemies that have noticed the player
    pub fn alerted_count(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| e.category == EntityCategory::Enemy && e.is_alerted())
            .count()
    }

    pub fn count_of(&self, category: EntityCategory) -> usize {
        self.entities.iter().filter(|e| e.category == category).count()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Receives one snapshot per tick. The snapshot is only borrowed for the
/// duration of the call.
pub trait SnapshotConsumer {
    fn consume(&mut self, snapshot: &Snapshot) -> Result<()>;
}

pub struct SnapshotProducer<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
    table: &'a TableLayout,
    layout: &'a EntityLayout,
}

impl<'a, R: ReadMemory + ?Sized> SnapshotProducer<'a, R> {
    pub fn new(reader: &'a R, table: &'a TableLayout, layout: &'a EntityLayout) -> Self {
        Self {
            reader,
            table,
            layout,
        }
    }

    /// Scan, decode and classify. Read failures only shrink the result.
    pub fn produce_snapshot(&self) -> Snapshot {
        let scan = EntityTableScanner::new(self.reader, self.table).scan_with_stats();
        if scan.table_base.is_none() {
            debug!("Entity table unavailable this tick");
        }

        let decoder = EntityFieldDecoder::new(self.reader, self.layout);
        let entities: Vec<EntityRecord> = scan
            .candidates
            .iter()
            .filter_map(|&address| decoder.decode_classified(address))
            .collect();

        let rejected = scan.candidates.len() - entities.len();
        if rejected > 0 {
            debug!("Dropped {} of {} candidates", rejected, scan.candidates.len());
        }

        Snapshot {
            entities,
            scan: scan.stats,
            rejected,
        }
    }

    /// Produce a snapshot and hand it to `consumer`.
    pub fn tick<C: SnapshotConsumer + ?Sized>(&self, consumer: &mut C) -> Result<()> {
        let snapshot = self.produce_snapshot();
        consumer.consume(&snapshot)
    }
}
