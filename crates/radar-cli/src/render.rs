//! Terminal drawing of radar frames.
//!
//! Frames are drawn into an off-screen `Canvas` of character cells and then
//! flushed in one pass with crossterm. Projection works in square display
//! units where one unit is a column wide and half a row tall, so a circle
//! on the radar stays round on a terminal whose cells are twice as tall as
//! they are wide.

use std::f32::consts::{FRAC_PI_4, TAU};
use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use radar_core::EntityCategory;
use radar_core::radar::{Blip, RadarFrame, RadarView};

const GRID: Color = Color::DarkGrey;
const TEXT: Color = Color::White;
const ENEMY_IDLE: Color = Color::Rgb {
    r: 255,
    g: 165,
    b: 0,
};

const HEALTH_BAR_WIDTH: usize = 5;

/// Arrows by octant, counter-clockwise on screen starting at east
const ARROWS: [char; 8] = ['→', '↘', '↓', '↙', '←', '↖', '↑', '↗'];

/// Glyph and color for an entity on the radar
pub fn glyph(category: EntityCategory, alerted: bool) -> (char, Color) {
    match category {
        EntityCategory::Player => ('▲', Color::Blue),
        EntityCategory::Enemy if alerted => ('●', Color::Red),
        EntityCategory::Enemy => ('●', ENEMY_IDLE),
        EntityCategory::Partner => ('◆', Color::Green),
        EntityCategory::Npc => ('●', Color::Yellow),
        EntityCategory::Object => ('·', Color::Grey),
    }
}

/// Arrow for a screen-space direction (y down), snapped to the nearest octant
pub fn facing_arrow(dx: f32, dy: f32) -> char {
    let octant = (dy.atan2(dx) / FRAC_PI_4).round() as i32;
    ARROWS[octant.rem_euclid(8) as usize]
}

/// Fixed-width bar for a 0.0..=1.0 fill
pub fn health_bar(fraction: f32, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    let mut bar = "█".repeat(filled);
    bar.push_str(&"░".repeat(width - filled));
    bar
}

fn health_color(fraction: f32) -> Color {
    if fraction > 0.5 {
        Color::Green
    } else if fraction > 0.25 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Display units to terminal cell
fn to_cell((x, y): (i32, i32)) -> (i32, i32) {
    (x, y.div_euclid(2))
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    ch: char,
    color: Color,
}

impl Cell {
    const BLANK: Cell = Cell {
        ch: ' ',
        color: Color::Reset,
    };
}

/// Grid of character cells
#[derive(Debug, Clone)]
pub struct Canvas {
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
}

impl Canvas {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            cells: vec![Cell::BLANK; cols as usize * rows as usize],
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 || col >= self.cols as i32 || row >= self.rows as i32 {
            return None;
        }
        Some(row as usize * self.cols as usize + col as usize)
    }

    /// Set one cell; out-of-bounds writes are ignored.
    pub fn put(&mut self, col: i32, row: i32, ch: char, color: Color) {
        if let Some(i) = self.index(col, row) {
            self.cells[i] = Cell { ch, color };
        }
    }

    fn put_if_blank(&mut self, col: i32, row: i32, ch: char, color: Color) {
        if self.get(col, row) == Some(' ') {
            self.put(col, row, ch, color);
        }
    }

    pub fn put_str(&mut self, col: i32, row: i32, text: &str, color: Color) {
        for (i, ch) in text.chars().enumerate() {
            self.put(col + i as i32, row, ch, color);
        }
    }

    pub fn get(&self, col: i32, row: i32) -> Option<char> {
        self.index(col, row).map(|i| self.cells[i].ch)
    }

    #[cfg(test)]
    pub fn row_text(&self, row: u16) -> String {
        let start = row as usize * self.cols as usize;
        self.cells[start..start + self.cols as usize]
            .iter()
            .map(|c| c.ch)
            .collect()
    }

    /// Write the whole canvas, batching runs of the same color.
    pub fn flush<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut run = String::new();
        for row in 0..self.rows {
            queue!(out, MoveTo(0, row))?;
            let mut current = None;
            let start = row as usize * self.cols as usize;

            for cell in &self.cells[start..start + self.cols as usize] {
                if current != Some(cell.color) {
                    if !run.is_empty() {
                        queue!(out, Print(&run))?;
                        run.clear();
                    }
                    queue!(out, SetForegroundColor(cell.color))?;
                    current = Some(cell.color);
                }
                run.push(cell.ch);
            }
            queue!(out, Print(&run))?;
            run.clear();
        }
        queue!(out, ResetColor)?;
        out.flush()
    }
}

/// Per-frame numbers shown in the info panel
#[derive(Debug, Clone, Default)]
pub struct PanelStats {
    pub entity_count: usize,
    pub alerted_count: usize,
    pub player_found: bool,
    pub fps: f32,
}

/// Lines of the info panel
pub fn info_lines(range: u32, frame: Option<&RadarFrame>, stats: &PanelStats) -> Vec<String> {
    let mut lines = vec![
        format!("Entities: {} | Range: {}", stats.entity_count, range),
        format!(
            "Player: {}",
            if stats.player_found { "FOUND" } else { "NOT FOUND" }
        ),
        format!("FPS: {}", stats.fps as u32),
        String::new(),
        "Legend:".to_string(),
        "▲ = Player (blue)".to_string(),
        "◆ = Partner (green)".to_string(),
        "● = Enemy (red/orange)".to_string(),
        format!("  └─ {} ALERTED!", stats.alerted_count),
        "● = NPC (yellow)".to_string(),
        "· = Object (grey)".to_string(),
        String::new(),
        "Controls:".to_string(),
        "+/= : Zoom in".to_string(),
        "-/_ : Zoom out".to_string(),
        "i   : Toggle info".to_string(),
        "Esc : Exit".to_string(),
    ];

    if let Some(frame) = frame {
        lines.insert(
            2,
            format!("Facing: {:6.1}°", frame.player_rotation.angle_degrees()),
        );
    }
    lines
}

pub struct TerminalRenderer {
    canvas: Canvas,
    range_rings: u32,
    show_info: bool,
}

impl TerminalRenderer {
    pub fn new(cols: u16, rows: u16, range_rings: u32, show_info: bool) -> Self {
        Self {
            canvas: Canvas::new(cols, rows),
            range_rings,
            show_info,
        }
    }

    /// Display size in radar display units for a terminal of this size
    pub fn display_size(cols: u16, rows: u16) -> (u32, u32) {
        (cols as u32, rows as u32 * 2)
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.canvas = Canvas::new(cols, rows);
    }

    pub fn toggle_info(&mut self) {
        self.show_info = !self.show_info;
    }

    #[cfg(test)]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Redraw the canvas. `frame` is `None` when there is no player to
    /// center on; only the background and info panel are drawn then.
    pub fn draw(&mut self, view: &RadarView, frame: Option<&RadarFrame>, stats: &PanelStats) {
        self.canvas.clear();
        self.draw_background(view);

        if let Some(frame) = frame {
            let (player, others): (Vec<&Blip>, Vec<&Blip>) = frame
                .blips
                .iter()
                .partition(|b| b.category == EntityCategory::Player);
            // player last so it stays on top
            for blip in others.into_iter().chain(player) {
                self.draw_blip(blip);
            }
        }

        if self.show_info {
            for (row, line) in info_lines(view.range(), frame, stats).iter().enumerate() {
                self.canvas.put_str(1, row as i32, line, TEXT);
            }
        }
    }

    pub fn flush<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.canvas.flush(out)
    }

    fn draw_background(&mut self, view: &RadarView) {
        let (width, height) = view.size();
        let (cx, cy) = view.center();
        let (center_col, center_row) = to_cell((cx, cy));

        for col in 0..width as i32 {
            self.canvas.put(col, center_row, '─', GRID);
        }
        for row in 0..(height / 2) as i32 {
            self.canvas.put(center_col, row, '│', GRID);
        }
        self.canvas.put(center_col, center_row, '┼', GRID);

        let radii = view.ring_radii(self.range_rings);
        let outer = radii.len() - 1;
        for (i, radius) in radii.into_iter().enumerate() {
            let ch = if i == outer { '•' } else { '·' };
            let steps = ((TAU * radius).ceil() as usize).max(8);
            for step in 0..steps {
                let theta = step as f32 * TAU / steps as f32;
                let x = cx + (radius * theta.cos()).round() as i32;
                let y = cy + (radius * theta.sin()).round() as i32;
                let (col, row) = to_cell((x, y));
                self.canvas.put_if_blank(col, row, ch, GRID);
            }
        }
    }

    fn draw_blip(&mut self, blip: &Blip) {
        let (col, row) = to_cell(blip.screen);

        // Bar first: an upward facing arrow takes its middle cell
        if let Some(fraction) = blip.health_fraction() {
            let bar = health_bar(fraction, HEALTH_BAR_WIDTH);
            self.canvas.put_str(
                col - (HEALTH_BAR_WIDTH / 2) as i32,
                row - 1,
                &bar,
                health_color(fraction),
            );
        }

        let (ch, color) = glyph(blip.category, blip.alerted);
        self.canvas.put(col, row, ch, color);

        if blip.shows_facing()
            && let Some((dx, dy)) = blip.facing
        {
            self.canvas.put(
                col + dx.round() as i32,
                row + dy.round() as i32,
                facing_arrow(dx, dy),
                color,
            );
        }

        if blip.shows_distance() {
            self.canvas
                .put_str(col + 2, row + 1, &format!("{}", blip.distance as u32), TEXT);
        }
    }
}

/// Frames per second over the last full second
#[derive(Debug)]
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Count a frame drawn at `now` and return the current rate.
    pub fn record(&mut self, now: Instant) -> f32 {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= Duration::from_secs(1) {
            self.fps = self.frames as f32 / elapsed.as_secs_f32();
            self.frames = 0;
            self.window_start = now;
        }
        self.fps
    }
}
