//! Live radar mode.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::terminal;
use radar_core::{
    MemoryReader, RadarConfig, RadarSettings, RadarView, ReadMemory, Snapshot, SnapshotConsumer,
    SnapshotProducer,
};
use tracing::{debug, info};

use super::attach;
use crate::input::{self, InputAction};
use crate::render::{FpsCounter, PanelStats, TerminalRenderer};
use crate::shutdown::ShutdownSignal;
use crate::terminal::TerminalGuard;

/// Projects each snapshot and draws it to `out`
pub struct RadarScreen<W: Write> {
    out: W,
    view: RadarView,
    renderer: TerminalRenderer,
    fps: FpsCounter,
}

impl<W: Write> RadarScreen<W> {
    pub fn new(out: W, settings: &RadarSettings, cols: u16, rows: u16) -> Self {
        let (width, height) = TerminalRenderer::display_size(cols, rows);
        Self {
            out,
            view: RadarView::new(settings, width, height),
            renderer: TerminalRenderer::new(
                cols,
                rows,
                settings.range_rings,
                settings.show_info_panel,
            ),
            fps: FpsCounter::new(Instant::now()),
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        let (width, height) = TerminalRenderer::display_size(cols, rows);
        self.view.resize(width, height);
        self.renderer.resize(cols, rows);
    }

    pub fn apply(&mut self, action: InputAction) {
        match action {
            InputAction::ZoomIn => self.view.zoom_in(),
            InputAction::ZoomOut => self.view.zoom_out(),
            InputAction::ToggleInfo => self.renderer.toggle_info(),
            InputAction::Quit => {}
        }
    }

    pub fn view(&self) -> &RadarView {
        &self.view
    }

    #[cfg(test)]
    pub fn renderer(&self) -> &TerminalRenderer {
        &self.renderer
    }
}

impl<W: Write> SnapshotConsumer for RadarScreen<W> {
    fn consume(&mut self, snapshot: &Snapshot) -> radar_core::Result<()> {
        let stats = PanelStats {
            entity_count: snapshot.len(),
            alerted_count: snapshot.alerted_count(),
            player_found: snapshot.player().is_some(),
            fps: self.fps.record(Instant::now()),
        };
        let frame = self.view.project(snapshot);
        if frame.is_none() {
            debug!("No player with a known heading this tick");
        }

        self.renderer.draw(&self.view, frame.as_ref(), &stats);
        self.renderer.flush(&mut self.out)?;
        Ok(())
    }
}

/// Run the live radar until quit, Ctrl+C, or the game exits
pub fn run(config: &RadarConfig, pid: Option<u32>) -> Result<()> {
    let shutdown = Arc::new(ShutdownSignal::new());
    let shutdown_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping...");
        shutdown_ctrlc.trigger();
    })?;

    let process = attach(config, pid)?;
    info!(
        "Attached to {} (PID: {}, base: {:#x})",
        process.name, process.pid, process.base_address
    );

    let reader = MemoryReader::new(&process);
    let producer = SnapshotProducer::new(&reader, &config.table, &config.layout);
    let frame_budget = Duration::from_secs_f64(1.0 / config.radar.fps as f64);

    let (cols, rows) = terminal::size()?;
    let mut screen = RadarScreen::new(io::stdout(), &config.radar, cols, rows);

    let guard = TerminalGuard::enter()?;
    while !shutdown.is_shutdown() {
        let deadline = Instant::now() + frame_budget;

        let polled = input::poll()?;
        if let Some((cols, rows)) = polled.resized {
            screen.resize(cols, rows);
        }
        for action in polled.actions {
            if action == InputAction::Quit {
                shutdown.trigger();
            }
            screen.apply(action);
        }
        if shutdown.is_shutdown() {
            break;
        }

        // The module header stays mapped for the life of the process
        if reader.read_bytes(process.base_address, 4).is_err() {
            info!("Process terminated");
            break;
        }

        producer.tick(&mut screen)?;

        if shutdown.wait_until(deadline) {
            break;
        }
    }
    drop(guard);

    info!("Radar stopped at range {}", screen.view().range());
    Ok(())
}
