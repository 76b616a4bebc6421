//! Dump command implementation.
//!
//! Attaches, takes a single snapshot and prints it, either as a table or
//! as JSON for scripting.

use std::io::{self, Write};

use anyhow::Result;
use owo_colors::OwoColorize;
use radar_core::{
    EntityCategory, EntityRecord, MemoryReader, RadarConfig, Snapshot, SnapshotConsumer,
    SnapshotProducer,
};

use super::attach;

/// One printed table row
#[derive(Debug, Clone, PartialEq)]
pub struct DumpRow {
    pub index: usize,
    pub address: String,
    pub category: EntityCategory,
    pub class_name: String,
    pub instance_name: String,
    pub position: String,
    pub distance: Option<f32>,
    pub heading: Option<f32>,
    pub health: f32,
    pub alerted: bool,
}

impl DumpRow {
    pub fn new(index: usize, record: &EntityRecord, player: Option<&EntityRecord>) -> Self {
        Self {
            index,
            address: format!("0x{:X}", record.address),
            category: record.category,
            class_name: display_name(&record.class_name),
            instance_name: display_name(&record.instance_name),
            position: format!(
                "({:.1}, {:.1}, {:.1})",
                record.position.x, record.position.y, record.position.z
            ),
            distance: player
                .filter(|p| p.address != record.address)
                .map(|p| record.position.distance_2d(&p.position)),
            heading: record.rotation.map(|r| r.angle_degrees()),
            health: record.health,
            alerted: record.is_alerted(),
        }
    }

    fn plain(&self) -> String {
        format!(
            "{:>3}  {:<14} {:<7} {:<24} {:<20} {:<30} {:>8} {:>7} {:>6.1}{}",
            self.index,
            self.address,
            self.category.short_name(),
            self.class_name,
            self.instance_name,
            self.position,
            self.distance
                .map(|d| format!("{:.0}", d))
                .unwrap_or_else(|| "-".into()),
            self.heading
                .map(|h| format!("{:.0}°", h))
                .unwrap_or_else(|| "-".into()),
            self.health,
            if self.alerted { "  ALERTED" } else { "" },
        )
    }
}

fn display_name(name: &str) -> String {
    if name.is_empty() {
        "-".to_string()
    } else {
        name.to_string()
    }
}

fn header() -> String {
    format!(
        "{:>3}  {:<14} {:<7} {:<24} {:<20} {:<30} {:>8} {:>7} {:>6}",
        "#", "ADDRESS", "TYPE", "CLASS", "INSTANCE", "POSITION", "DIST", "HEADING", "HEALTH"
    )
}

/// Prints a snapshot as a colored table
pub struct TablePrinter<W: Write> {
    out: W,
}

impl<W: Write> TablePrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> SnapshotConsumer for TablePrinter<W> {
    fn consume(&mut self, snapshot: &Snapshot) -> radar_core::Result<()> {
        let player = snapshot.player();

        writeln!(self.out, "{}", header().bold())?;
        for (index, record) in snapshot.iter().enumerate() {
            let line = DumpRow::new(index, record, player).plain();
            match record.category {
                EntityCategory::Player => writeln!(self.out, "{}", line.blue())?,
                EntityCategory::Enemy if record.is_alerted() => {
                    writeln!(self.out, "{}", line.red())?
                }
                EntityCategory::Enemy => writeln!(self.out, "{}", line.bright_red())?,
                EntityCategory::Partner => writeln!(self.out, "{}", line.green())?,
                EntityCategory::Npc => writeln!(self.out, "{}", line.yellow())?,
                EntityCategory::Object => writeln!(self.out, "{}", line.bright_black())?,
            }
        }

        writeln!(self.out)?;
        writeln!(
            self.out,
            "{} entities ({} player, {} enemy, {} partner, {} npc, {} object), {} alerted",
            snapshot.len(),
            snapshot.count_of(EntityCategory::Player),
            snapshot.count_of(EntityCategory::Enemy),
            snapshot.count_of(EntityCategory::Partner),
            snapshot.count_of(EntityCategory::Npc),
            snapshot.count_of(EntityCategory::Object),
            snapshot.alerted_count(),
        )?;
        writeln!(
            self.out,
            "scan: {} slots read, {} valid, {} gaps skipped, {} rejected by decoder",
            snapshot.scan.slots_read,
            snapshot.scan.valid,
            snapshot.scan.gaps_skipped,
            snapshot.rejected,
        )?;
        Ok(())
    }
}

/// Prints a snapshot as pretty JSON
pub struct JsonPrinter<W: Write> {
    out: W,
}

impl<W: Write> JsonPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> SnapshotConsumer for JsonPrinter<W> {
    fn consume(&mut self, snapshot: &Snapshot) -> radar_core::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, snapshot)?;
        writeln!(self.out)?;
        Ok(())
    }
}

/// Run the dump command
pub fn run(config: &RadarConfig, pid: Option<u32>, json: bool) -> Result<()> {
    let process = attach(config, pid)?;
    eprintln!(
        "Found process (PID: {}, Base: 0x{:X})",
        process.pid, process.base_address
    );

    let reader = MemoryReader::new(&process);
    let producer = SnapshotProducer::new(&reader, &config.table, &config.layout);

    let stdout = io::stdout().lock();
    if json {
        producer.tick(&mut JsonPrinter::new(stdout))?;
    } else {
        producer.tick(&mut TablePrinter::new(stdout))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_core::{Position, Rotation, ScanStats};

    fn record(address: u64, category: EntityCategory, x: f32, y: f32) -> EntityRecord {
        EntityRecord {
            address,
            position: Position::new(x, y, 0.0),
            rotation: Some(Rotation::new(0.0, 1.0)),
            category,
            health: 40.0,
            class_name: "idNpcEnemy".into(),
            instance_name: String::new(),
            alertness: Some(-1),
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            entities: vec![
                record(0x10_0000, EntityCategory::Player, 0.0, 0.0),
                record(0x20_0000, EntityCategory::Enemy, 30.0, 40.0),
            ],
            scan: ScanStats::default(),
            rejected: 1,
        }
    }

    #[test]
    fn test_row_fields() {
        let snap = snapshot();
        let player = snap.player();

        let row = DumpRow::new(1, &snap.entities[1], player);
        assert_eq!(row.address, "0x200000");
        assert_eq!(row.instance_name, "-");
        assert_eq!(row.position, "(30.0, 40.0, 0.0)");
        assert_eq!(row.distance, Some(50.0));
        assert!((row.heading.unwrap() - 90.0).abs() < 1e-4);
        assert!(!row.alerted);

        // no distance from the player to itself
        let row = DumpRow::new(0, &snap.entities[0], player);
        assert_eq!(row.distance, None);
    }

    #[test]
    fn test_table_printer() {
        let mut out = Vec::new();
        TablePrinter::new(&mut out).consume(&snapshot()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("ADDRESS"));
        assert!(text.contains("0x200000"));
        assert!(text.contains("2 entities (1 player, 1 enemy"));
        assert!(text.contains("1 rejected by decoder"));
    }

    #[test]
    fn test_json_printer() {
        let mut out = Vec::new();
        JsonPrinter::new(&mut out).consume(&snapshot()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["entities"].as_array().unwrap().len(), 2);
        assert_eq!(value["entities"][1]["category"], "enemy");
        assert_eq!(value["rejected"], 1);
    }
}
