//! Entity table scanner.
//!
//! The table is a fixed-stride array of pointers reached through one
//! dereference from a module-relative offset:
//!
//! ```text
//! module_base + base_offset ──► table_base
//!                               ├─ slot 0  ──► entity
//!                               ├─ slot 1  ──► entity
//!                               ├─ slot 2  ──► 0            (gap)
//!                               ├─ ...
//!                               └─ slot n  ──► garbage      (end)
//! ```
//!
//! A few unused slots near the start are normal, so an invalid slot only
//! ends the scan once enough valid slots have been seen.

use tracing::debug;

use crate::memory::ReadMemory;
use crate::memory::layout::{TableLayout, is_plausible_pointer};

/// Decision for the slot just observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStep {
    Continue,
    Stop,
}

/// Two-phase counter deciding whether an invalid slot is a gap or the end.
#[derive(Debug, Clone, Default)]
pub struct StopRule {
    min_valid_before_stop: usize,
    valid_count: usize,
}

impl StopRule {
    pub fn new(min_valid_before_stop: usize) -> Self {
        Self {
            min_valid_before_stop,
            ..Default::default()
        }
    }

    /// Record one slot and decide whether scanning goes on.
    ///
    /// While fewer than `min_valid_before_stop` valid slots have been seen,
    /// invalid slots are gaps. After that, the first invalid slot ends the table.
    pub fn observe(&mut self, valid: bool) -> ScanStep {
        if valid {
            self.valid_count += 1;
            return ScanStep::Continue;
        }

        if self.valid_count < self.min_valid_before_stop {
            ScanStep::Continue
        } else {
            ScanStep::Stop
        }
    }

    pub fn valid_count(&self) -> usize {
        self.valid_count
    }
}

/// Counters from one scan, for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ScanStats {
    /// Slots whose pointer was read (valid or not)
    pub slots_read: usize,
    pub valid: usize,
    /// Invalid slots skipped as gaps
    pub gaps_skipped: usize,
    /// Scan ended on an invalid slot before `max_entries`
    pub terminated_early: bool,
}

/// Candidate entity addresses found in one pass
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Table base this pass walked, `None` when it could not be resolved
    pub table_base: Option<u64>,
    pub candidates: Vec<u64>,
    pub stats: ScanStats,
}

pub struct EntityTableScanner<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
    table: &'a TableLayout,
}

impl<'a, R: ReadMemory + ?Sized> EntityTableScanner<'a, R> {
    pub fn new(reader: &'a R, table: &'a TableLayout) -> Self {
        Self { reader, table }
    }

    /// Resolve `table_base` through the module-relative pointer.
    pub fn table_base(&self) -> Option<u64> {
        let pointer_address = self.reader.base_address().wrapping_add(self.table.base_offset);
        match self.reader.read_pointer(pointer_address) {
            Ok(base) if is_plausible_pointer(base) => Some(base),
            Ok(base) => {
                debug!("Entity table pointer at {:#x} is {:#x}", pointer_address, base);
                None
            }
            Err(e) => {
                debug!("Failed to read entity table pointer: {}", e);
                None
            }
        }
    }

    /// Read the slot's pointer, `None` if the slot is invalid.
    fn read_slot(&self, table_base: u64, index: usize) -> Option<u64> {
        let slot = self.table.slot_address(table_base, index);
        self.reader
            .read_pointer(slot)
            .ok()
            .filter(|&ptr| is_plausible_pointer(ptr))
    }

    /// Walk the table and return valid entity pointers in slot order.
    pub fn scan(&self) -> Vec<u64> {
        self.scan_with_stats().candidates
    }

    pub fn scan_with_stats(&self) -> ScanResult {
        let Some(table_base) = self.table_base() else {
            return ScanResult::default();
        };

        let mut rule = StopRule::new(self.table.min_valid_before_stop);
        let mut result = ScanResult {
            table_base: Some(table_base),
            ..Default::default()
        };

        for index in 0..self.table.max_entries {
            let slot = self.read_slot(table_base, index);
            result.stats.slots_read += 1;

            let step = rule.observe(slot.is_some());
            match slot {
                Some(address) => result.candidates.push(address),
                None if step == ScanStep::Continue => result.stats.gaps_skipped += 1,
                None => {
                    result.stats.terminated_early = true;
                    break;
                }
            }
        }

        result.stats.valid = rule.valid_count();
        debug!(
            "Scanned table at {:#x}: {} valid, {} gaps, {} slots read",
            table_base, result.stats.valid, result.stats.gaps_skipped, result.stats.slots_read
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MockMemoryBuilder, MockMemoryReader};

    const MODULE_BASE: u64 = 0x1_4000_0000;
    const TABLE_BASE: u64 = 0x2_0000_0000;

    fn entity_address(index: usize) -> u64 {
        0x3_0000_0000 + index as u64 * 0x1000
    }

    /// Build a table where `slots[i]` is the pointer stored in slot i
    fn table_with_slots(table: &TableLayout, slots: &[u64]) -> MockMemoryReader {
        let mut builder = MockMemoryBuilder::new()
            .base_address(MODULE_BASE)
            .write_u64(MODULE_BASE + table.base_offset, TABLE_BASE);
        for (i, value) in slots.iter().enumerate() {
            builder = builder.write_u64(table.slot_address(TABLE_BASE, i), *value);
        }
        builder.build()
    }

    #[test]
    fn test_stop_rule_gap_before_minimum() {
        let mut rule = StopRule::new(10);
        for _ in 0..3 {
            assert_eq!(rule.observe(true), ScanStep::Continue);
        }
        assert_eq!(rule.observe(false), ScanStep::Continue);
        assert_eq!(rule.observe(false), ScanStep::Continue);
        assert_eq!(rule.observe(true), ScanStep::Continue);
        assert_eq!(rule.valid_count(), 4);
    }

    #[test]
    fn test_stop_rule_stops_once_minimum_reached() {
        let mut rule = StopRule::new(10);
        for _ in 0..10 {
            rule.observe(true);
        }
        assert_eq!(rule.observe(false), ScanStep::Stop);
    }

    #[test]
    fn test_fifteen_valid_then_invalid_stops() {
        let table = TableLayout::default();
        let mut slots: Vec<u64> = (0..15).map(entity_address).collect();
        slots.push(0);
        // Valid-looking slots after the end must not be picked up
        slots.extend((20..25).map(entity_address));

        let reader = table_with_slots(&table, &slots);
        let result = EntityTableScanner::new(&reader, &table).scan_with_stats();

        assert_eq!(result.candidates.len(), 15);
        assert_eq!(result.candidates, (0..15).map(entity_address).collect::<Vec<_>>());
        assert!(result.stats.terminated_early);
        assert_eq!(result.stats.slots_read, 16);
    }

    #[test]
    fn test_early_gap_is_skipped() {
        let table = TableLayout::default();
        let mut slots: Vec<u64> = (0..12).map(entity_address).collect();
        slots[3] = 0;
        slots.push(0);

        let reader = table_with_slots(&table, &slots);
        let result = EntityTableScanner::new(&reader, &table).scan_with_stats();

        assert_eq!(result.candidates.len(), 11);
        assert!(!result.candidates.contains(&entity_address(3)));
        assert!(result.candidates.contains(&entity_address(4)));
        assert_eq!(result.stats.gaps_skipped, 1);
    }

    #[test]
    fn test_low_and_unreadable_slots_are_invalid() {
        let table = TableLayout::default();
        // slot 0: below guard threshold, slot 1: valid, slot 2 unmapped
        let reader = MockMemoryBuilder::new()
            .base_address(MODULE_BASE)
            .write_u64(MODULE_BASE + table.base_offset, TABLE_BASE)
            .write_u64(table.slot_address(TABLE_BASE, 0), 0xFFFF)
            .write_u64(table.slot_address(TABLE_BASE, 1), entity_address(1))
            .build();

        let result = EntityTableScanner::new(&reader, &table).scan_with_stats();

        assert_eq!(result.candidates, vec![entity_address(1)]);
        // Fewer than the minimum ever became valid, so every slot was visited
        assert_eq!(result.stats.slots_read, table.max_entries);
        assert!(!result.stats.terminated_early);
    }

    #[test]
    fn test_full_table_respects_max_entries() {
        let table = TableLayout {
            max_entries: 20,
            ..Default::default()
        };
        let slots: Vec<u64> = (0..30).map(entity_address).collect();
        let reader = table_with_slots(&table, &slots);

        let candidates = EntityTableScanner::new(&reader, &table).scan();
        assert_eq!(candidates.len(), 20);
    }

    #[test]
    fn test_zero_table_base_yields_nothing() {
        let table = TableLayout::default();
        let reader = MockMemoryBuilder::new()
            .base_address(MODULE_BASE)
            .write_u64(MODULE_BASE + table.base_offset, 0)
            .build();

        let result = EntityTableScanner::new(&reader, &table).scan_with_stats();
        assert!(result.table_base.is_none());
        assert!(result.candidates.is_empty());
    }

    #[test]
    fn test_unreadable_table_base_yields_nothing() {
        let table = TableLayout::default();
        let reader = MockMemoryBuilder::new().base_address(MODULE_BASE).build();

        assert!(EntityTableScanner::new(&reader, &table).scan().is_empty());
    }
}
