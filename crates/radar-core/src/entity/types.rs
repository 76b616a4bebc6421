use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::memory::layout::POSITION_BOUND;
use crate::transform::Rotation;

/// Semantic kind of an entity on the radar
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum EntityCategory {
    Player,
    Enemy,
    /// Friendly companion
    Partner,
    /// Neutral creature, corpse or dead hostile
    Npc,
    Object,
}

impl EntityCategory {
    pub fn short_name(&self) -> &'static str {
        self.into()
    }

    /// Whether the radar draws a facing arrow for this kind
    pub fn shows_facing(&self) -> bool {
        matches!(self, Self::Enemy | Self::Partner | Self::Npc)
    }
}

/// World-space position in game units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Every component is finite and below `POSITION_BOUND` in magnitude
    pub fn is_plausible(&self) -> bool {
        [self.x, self.y, self.z]
            .iter()
            .all(|c| c.abs() < POSITION_BOUND)
    }

    /// Distance on the ground plane (z ignored)
    pub fn distance_2d(&self, other: &Position) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One decoded entity. `address` identifies it within a single tick only;
/// the game reuses entity memory between frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub address: u64,
    pub position: Position,
    pub rotation: Option<Rotation>,
    pub category: EntityCategory,
    /// 0 when unreadable
    pub health: f32,
    pub class_name: String,
    pub instance_name: String,
    /// -1 while unaware of the player, 0 once alerted
    pub alertness: Option<i16>,
}

impl EntityRecord {
    pub fn is_alerted(&self) -> bool {
        self.alertness == Some(0)
    }

    pub fn is_player(&self) -> bool {
        self.category == EntityCategory::Player
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_position_plausibility_bound() {
        assert!(Position::new(999_999.0, 0.0, 0.0).is_plausible());
        assert!(Position::new(-999_999.0, 999_999.0, -999_999.0).is_plausible());
        assert!(!Position::new(2_000_000.0, 0.0, 0.0).is_plausible());
        assert!(!Position::new(0.0, -2_000_000.0, 0.0).is_plausible());
        assert!(!Position::new(0.0, 0.0, 1_000_000.0).is_plausible());
        assert!(!Position::new(f32::NAN, 0.0, 0.0).is_plausible());
        assert!(!Position::new(0.0, f32::INFINITY, 0.0).is_plausible());
    }

    #[test]
    fn test_distance_ignores_height() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 4.0, 500.0);
        assert_eq!(a.distance_2d(&b), 5.0);
    }

    #[test]
    fn test_alertness() {
        let mut record = EntityRecord {
            address: 0x10_0000,
            position: Position::default(),
            rotation: None,
            category: EntityCategory::Enemy,
            health: 100.0,
            class_name: "idNpcEnemy".into(),
            instance_name: String::new(),
            alertness: Some(-1),
        };
        assert!(!record.is_alerted());

        record.alertness = Some(0);
        assert!(record.is_alerted());

        record.alertness = None;
        assert!(!record.is_alerted());
    }

    #[test]
    fn test_category_names() {
        assert_eq!(EntityCategory::Npc.short_name(), "npc");
        assert_eq!(EntityCategory::from_str("ENEMY").unwrap(), EntityCategory::Enemy);
        assert!(EntityCategory::Partner.shows_facing());
        assert!(!EntityCategory::Object.shows_facing());
        assert!(!EntityCategory::Player.shows_facing());
    }
}
