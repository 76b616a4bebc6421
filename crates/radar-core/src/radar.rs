//! Player-relative projection of a snapshot onto a radar display.
//!
//! This is the renderer-independent half of drawing: it picks the player,
//! transforms every entity into radar space with the player's rotation and
//! maps radar space onto a display of a given size. Renderers only draw the
//! resulting `RadarFrame`.

use crate::config::RadarSettings;
use crate::entity::{EntityCategory, EntityRecord, Position};
use crate::snapshot::Snapshot;
use crate::transform::{Rotation, normalize};

/// Distances at or below this are not labeled
pub const DISTANCE_LABEL_MIN: f32 = 10.0;

/// Health treated as full when drawing health bars
pub const FULL_HEALTH: f32 = 100.0;

/// Zoom state and display geometry
#[derive(Debug, Clone)]
pub struct RadarView {
    range: u32,
    min_range: u32,
    max_range: u32,
    range_step: u32,
    width: u32,
    height: u32,
}

impl RadarView {
    pub fn new(settings: &RadarSettings, width: u32, height: u32) -> Self {
        Self {
            range: settings
                .default_range
                .clamp(settings.min_range, settings.max_range),
            min_range: settings.min_range,
            max_range: settings.max_range,
            range_step: settings.range_step,
            width,
            height,
        }
    }

    pub fn range(&self) -> u32 {
        self.range
    }

    /// Shrink the range by one step, not below the minimum
    pub fn zoom_in(&mut self) {
        self.range = self
            .range
            .saturating_sub(self.range_step)
            .max(self.min_range);
    }

    /// Grow the range by one step, not above the maximum
    pub fn zoom_out(&mut self) {
        self.range = self
            .range
            .saturating_add(self.range_step)
            .min(self.max_range);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn center(&self) -> (i32, i32) {
        ((self.width / 2) as i32, (self.height / 2) as i32)
    }

    /// Display units per world unit; the range spans half the width
    pub fn scale(&self) -> f32 {
        self.width as f32 / (2.0 * self.range as f32)
    }

    /// Map a radar-space point onto the display
    ///
    /// Points far outside the display saturate at the `i32` bounds.
    pub fn to_screen(&self, radar_x: f32, radar_y: f32) -> (i32, i32) {
        let (cx, cy) = self.center();
        let scale = self.scale();
        (
            cx.saturating_add((radar_x * scale) as i32),
            cy.saturating_add((radar_y * scale) as i32),
        )
    }

    pub fn is_on_screen(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Radii of the background rings in display units, innermost first.
    ///
    /// `count` evenly spaced inner rings at `i / (count + 1)` of the range,
    /// followed by the range circle itself.
    pub fn ring_radii(&self, count: u32) -> Vec<f32> {
        let outer = self.range as f32 * self.scale();
        (1..=count)
            .map(|i| outer * i as f32 / (count + 1) as f32)
            .chain(std::iter::once(outer))
            .collect()
    }

    /// Project every visible entity relative to the player.
    ///
    /// Returns `None` when there is no player or the player's rotation is
    /// unknown, since radar space is undefined without it.
    pub fn project(&self, snapshot: &Snapshot) -> Option<RadarFrame> {
        let player = snapshot.player()?;
        let player_rotation = player.rotation?;

        let blips = snapshot
            .iter()
            .filter_map(|entity| self.project_entity(entity, &player.position, &player_rotation))
            .collect();

        Some(RadarFrame {
            player_rotation,
            blips,
        })
    }

    fn project_entity(
        &self,
        entity: &EntityRecord,
        origin: &Position,
        player_rotation: &Rotation,
    ) -> Option<Blip> {
        let radar = player_rotation.to_radar_space(
            entity.position.x - origin.x,
            entity.position.y - origin.y,
        );
        if !radar.0.is_finite() || !radar.1.is_finite() {
            return None;
        }
        let screen = self.to_screen(radar.0, radar.1);
        if !self.is_on_screen(screen.0, screen.1) {
            return None;
        }

        let facing = entity.rotation.and_then(|rotation| {
            let (fx, fy) = rotation.forward_vector();
            let (dx, dy) = player_rotation.transform_direction_to_radar(fx, fy);
            normalize(dx, dy)
        });

        Some(Blip {
            category: entity.category,
            radar,
            screen,
            distance: entity.position.distance_2d(origin),
            facing,
            health: entity.health,
            alerted: entity.is_alerted(),
        })
    }
}

/// One entity placed on the radar
#[derive(Debug, Clone, PartialEq)]
pub struct Blip {
    pub category: EntityCategory,
    /// Position in radar space (world units)
    pub radar: (f32, f32),
    /// Position on the display
    pub screen: (i32, i32),
    /// Ground distance to the player
    pub distance: f32,
    /// Unit facing direction in radar space
    pub facing: Option<(f32, f32)>,
    pub health: f32,
    pub alerted: bool,
}

impl Blip {
    pub fn shows_distance(&self) -> bool {
        self.category != EntityCategory::Player && self.distance > DISTANCE_LABEL_MIN
    }

    /// Whether a facing indicator should be drawn
    pub fn shows_facing(&self) -> bool {
        self.category.shows_facing() && self.facing.is_some()
    }

    /// Health bar fill in 0.0..=1.0, for live enemies only
    pub fn health_fraction(&self) -> Option<f32> {
        (self.category == EntityCategory::Enemy && self.health > 0.0)
            .then(|| (self.health / FULL_HEALTH).clamp(0.0, 1.0))
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone)]
pub struct RadarFrame {
    pub player_rotation: Rotation,
    pub blips: Vec<Blip>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::ScanStats;

    const NORTH: Rotation = Rotation { cos: 0.0, sin: -1.0 };
    const SOUTH: Rotation = Rotation { cos: 0.0, sin: 1.0 };

    fn record(category: EntityCategory, x: f32, y: f32, rotation: Option<Rotation>) -> EntityRecord {
        EntityRecord {
            address: 0x10_0000,
            position: Position::new(x, y, 0.0),
            rotation,
            category,
            health: 50.0,
            class_name: String::new(),
            instance_name: String::new(),
            alertness: None,
        }
    }

    fn snapshot(entities: Vec<EntityRecord>) -> Snapshot {
        Snapshot {
            entities,
            scan: ScanStats::default(),
            rejected: 0,
        }
    }

    fn view() -> RadarView {
        RadarView::new(&RadarSettings::default(), 800, 800)
    }

    #[test]
    fn test_zoom_is_clamped() {
        let settings = RadarSettings {
            default_range: 200,
            min_range: 100,
            max_range: 400,
            range_step: 150,
            ..Default::default()
        };
        let mut view = RadarView::new(&settings, 100, 100);

        view.zoom_in();
        assert_eq!(view.range(), 100);
        view.zoom_in();
        assert_eq!(view.range(), 100);

        view.zoom_out();
        view.zoom_out();
        assert_eq!(view.range(), 400);
        view.zoom_out();
        assert_eq!(view.range(), 400);
    }

    #[test]
    fn test_scale_and_screen_mapping() {
        let view = view();
        assert_eq!(view.scale(), 0.4);
        assert_eq!(view.to_screen(0.0, 0.0), (400, 400));
        assert_eq!(view.to_screen(500.0, -250.0), (600, 300));
        assert!(view.is_on_screen(0, 799));
        assert!(!view.is_on_screen(800, 10));
        assert!(!view.is_on_screen(-1, 10));
    }

    #[test]
    fn test_screen_mapping_saturates() {
        let view = view();
        assert_eq!(view.to_screen(1.0e32, 0.0), (i32::MAX, 400));
        assert_eq!(view.to_screen(0.0, -1.0e32), (400, i32::MIN + 400));
        assert!(!view.is_on_screen(i32::MAX, 400));
    }

    #[test]
    fn test_huge_player_rotation_does_not_overflow() {
        let snap = snapshot(vec![
            record(EntityCategory::Player, 0.0, 0.0, Some(Rotation::new(1.0e30, 0.0))),
            record(EntityCategory::Enemy, 0.0, -100.0, None),
            record(EntityCategory::Object, 5.0, 5.0, Some(Rotation::new(f32::MAX, f32::MAX))),
        ]);
        let frame = view().project(&snap).unwrap();

        assert_eq!(frame.blips.len(), 1);
        assert_eq!(frame.blips[0].category, EntityCategory::Player);
        assert_eq!(frame.blips[0].screen, (400, 400));
    }

    #[test]
    fn test_ring_radii() {
        let radii = view().ring_radii(3);
        assert_eq!(radii.len(), 4);
        assert_eq!(radii[0], 100.0);
        assert_eq!(radii[1], 200.0);
        assert_eq!(radii[3], 400.0);
        assert_eq!(view().ring_radii(0), vec![400.0]);
    }

    #[test]
    fn test_no_player_no_frame() {
        let snap = snapshot(vec![record(EntityCategory::Enemy, 0.0, 0.0, Some(NORTH))]);
        assert!(view().project(&snap).is_none());
    }

    #[test]
    fn test_player_without_rotation_no_frame() {
        let snap = snapshot(vec![record(EntityCategory::Player, 0.0, 0.0, None)]);
        assert!(view().project(&snap).is_none());
    }

    #[test]
    fn test_enemy_ahead_faces_player() {
        let snap = snapshot(vec![
            record(EntityCategory::Player, 10.0, 10.0, Some(NORTH)),
            record(EntityCategory::Enemy, 10.0, 110.0, Some(SOUTH)),
        ]);
        let frame = view().project(&snap).unwrap();

        assert_eq!(frame.blips.len(), 2);
        let player = &frame.blips[0];
        assert_eq!(player.screen, (400, 400));
        assert!(!player.shows_distance());

        let enemy = &frame.blips[1];
        assert_eq!(enemy.screen, (400, 360));
        assert_eq!(enemy.distance, 100.0);
        assert!(enemy.shows_distance());

        // Facing back down toward the player
        let (fx, fy) = enemy.facing.unwrap();
        assert!(fx.abs() < 1e-5);
        assert!((fy - 1.0).abs() < 1e-5);
        assert!(enemy.shows_facing());
        assert_eq!(enemy.health_fraction(), Some(0.5));
    }

    #[test]
    fn test_out_of_range_entities_are_culled() {
        let snap = snapshot(vec![
            record(EntityCategory::Player, 0.0, 0.0, Some(NORTH)),
            record(EntityCategory::Object, 0.0, 5000.0, None),
        ]);
        let frame = view().project(&snap).unwrap();
        assert_eq!(frame.blips.len(), 1);
    }

    #[test]
    fn test_degenerate_rotation_has_no_facing() {
        let snap = snapshot(vec![
            record(EntityCategory::Player, 0.0, 0.0, Some(NORTH)),
            record(EntityCategory::Npc, 50.0, 0.0, Some(Rotation::new(0.0, 0.0))),
        ]);
        let frame = view().project(&snap).unwrap();
        assert_eq!(frame.blips[1].facing, None);
        assert!(!frame.blips[1].shows_facing());
    }

    #[test]
    fn test_health_fraction_only_for_live_enemies() {
        let snap = snapshot(vec![
            record(EntityCategory::Player, 0.0, 0.0, Some(NORTH)),
            record(EntityCategory::Npc, 20.0, 0.0, None),
        ]);
        let frame = view().project(&snap).unwrap();
        assert_eq!(frame.blips[0].health_fraction(), None);
        assert_eq!(frame.blips[1].health_fraction(), None);
    }
}
