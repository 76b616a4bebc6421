use crate::entity::EntityCategory;

/// Class-name markers used by the game's entity classes.
///
/// - `idPlayer`: the player character
/// - `idPartner`: companions
/// - `idNpcEnemy`: hostiles
/// - `idNpcCorpse`, `idNpcAnimal_*`: neutral NPCs
pub mod markers {
    pub const PLAYER_CLASS: &str = "idplayer";
    pub const PLAYER_INSTANCE: &str = "player";
    pub const PARTNER: &str = "idpartner";
    pub const ENEMY: &str = "enemy";
    pub const NEUTRAL: [&str; 2] = ["npc", "civilian"];
}

/// Classify an entity from its names and current health.
///
/// Rules are checked in order and the first match wins. A hostile with no
/// health left is a corpse and is reported as `Npc`.
pub fn classify(class_name: &str, instance_name: &str, health: f32) -> EntityCategory {
    let class = class_name.to_ascii_lowercase();
    let instance = instance_name.to_ascii_lowercase();

    if class.contains(markers::PLAYER_CLASS) || instance.contains(markers::PLAYER_INSTANCE) {
        return EntityCategory::Player;
    }

    if class.contains(markers::PARTNER) {
        return EntityCategory::Partner;
    }

    if class.contains(markers::ENEMY) {
        return if health > 0.0 {
            EntityCategory::Enemy
        } else {
            EntityCategory::Npc
        };
    }

    if markers::NEUTRAL.iter().any(|m| class.contains(m)) {
        return EntityCategory::Npc;
    }

    EntityCategory::Object
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player() {
        assert_eq!(classify("idPlayer", "", 100.0), EntityCategory::Player);
        assert_eq!(classify("idActor", "player_1", 0.0), EntityCategory::Player);
    }

    #[test]
    fn test_enemy_depends_on_health() {
        assert_eq!(classify("idNpcEnemy", "", 50.0), EntityCategory::Enemy);
        assert_eq!(classify("idNpcEnemy", "", 0.0), EntityCategory::Npc);
        assert_eq!(classify("idNpcEnemy", "", -12.5), EntityCategory::Npc);
        assert_eq!(classify("idNpcEnemy", "", f32::NAN), EntityCategory::Npc);
    }

    #[test]
    fn test_partner() {
        assert_eq!(classify("idPartner", "", 100.0), EntityCategory::Partner);
    }

    #[test]
    fn test_neutral() {
        assert_eq!(classify("idNpcCorpse", "", 0.0), EntityCategory::Npc);
        assert_eq!(classify("idNpcAnimal_Dog", "", 30.0), EntityCategory::Npc);
        assert_eq!(classify("idCivilian", "", 30.0), EntityCategory::Npc);
    }

    #[test]
    fn test_object_fallback() {
        assert_eq!(classify("idStaticProp", "", 0.0), EntityCategory::Object);
        assert_eq!(classify("", "", 0.0), EntityCategory::Object);
    }

    #[test]
    fn test_precedence() {
        // Player beats every other marker
        assert_eq!(classify("idPlayerEnemy", "", 0.0), EntityCategory::Player);
        assert_eq!(classify("idNpcEnemy", "player_double", 50.0), EntityCategory::Player);
        // Partner beats the npc marker
        assert_eq!(classify("idPartnerNpc", "", 0.0), EntityCategory::Partner);
        // Instance names only matter for the player rule
        assert_eq!(classify("idStaticProp", "enemy_spawn", 50.0), EntityCategory::Object);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("IDNPCENEMY", "", 1.0), EntityCategory::Enemy);
        assert_eq!(classify("idpartner", "", 1.0), EntityCategory::Partner);
    }
}
