//! Battlefield layout and structure definitions.
//!
//! The battlefield runs along the Y axis: the Player castle sits at `y = 0`,
//! the Enemy castle at `y = field_length`, both on `x = 0`. Lanes are
//! vertical centerlines spaced `lane_spacing` apart.

use serde::{Deserialize, Serialize};

use super::unit_data::UnitCatalog;
use crate::components::{Lane, Team};
use crate::error::{Result, SiegeError};
use crate::math::{Fixed, Vec2Fixed};

/// A tower placed by the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerPlacement {
    /// Owning team.
    pub team: Team,
    /// Lane the tower guards.
    pub lane: Lane,
    /// Distance from the owning castle along the lane, in world units.
    pub distance: u32,
}

impl TowerPlacement {
    /// Create a new placement.
    #[must_use]
    pub const fn new(team: Team, lane: Lane, distance: u32) -> Self {
        Self {
            team,
            lane,
            distance,
        }
    }
}

/// Geometry of the battlefield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutData {
    /// Distance between the two castles.
    pub field_length: u32,
    /// Lateral distance between adjacent lane centerlines.
    pub lane_spacing: u32,
    /// Lanes in play. Single-lane variants use `[Center]`.
    pub lanes: Vec<Lane>,
    /// Fixed tower placements, created once at battle start.
    pub towers: Vec<TowerPlacement>,
    /// Distance in front of the owning castle where mobiles spawn.
    pub spawn_offset: u32,
    /// Lateral offset between formation slots at spawn.
    #[serde(default = "default_formation_spread")]
    pub formation_spread: u32,
}

const fn default_formation_spread() -> u32 {
    8
}

impl LayoutData {
    /// Three lanes with one tower per lane per team.
    #[must_use]
    pub fn three_lane() -> Self {
        let mut towers = Vec::new();
        for team in Team::ALL {
            for lane in Lane::ALL {
                towers.push(TowerPlacement::new(team, lane, 150));
            }
        }
        Self {
            field_length: 600,
            lane_spacing: 120,
            lanes: Lane::ALL.to_vec(),
            towers,
            spawn_offset: 30,
            formation_spread: default_formation_spread(),
        }
    }

    /// A single center lane with one tower per team (arena variant).
    #[must_use]
    pub fn single_lane() -> Self {
        Self {
            field_length: 400,
            lane_spacing: 0,
            lanes: vec![Lane::Center],
            towers: vec![
                TowerPlacement::new(Team::Player, Lane::Center, 100),
                TowerPlacement::new(Team::Enemy, Lane::Center, 100),
            ],
            spawn_offset: 20,
            formation_spread: default_formation_spread(),
        }
    }

    /// Lane spacing as a fixed-point value.
    #[must_use]
    pub fn lane_spacing_fixed(&self) -> Fixed {
        Fixed::from_num(self.lane_spacing)
    }

    /// Y coordinate at `distance` in front of `team`'s castle.
    #[must_use]
    pub fn y_from_castle(&self, team: Team, distance: u32) -> Fixed {
        match team {
            Team::Player => Fixed::from_num(distance),
            Team::Enemy => Fixed::from_num(self.field_length) - Fixed::from_num(distance),
        }
    }

    /// Castle position for a team.
    #[must_use]
    pub fn castle_position(&self, team: Team) -> Vec2Fixed {
        Vec2Fixed::new(Fixed::ZERO, self.y_from_castle(team, 0))
    }

    /// Point on `lane` at `distance` in front of `team`'s castle.
    #[must_use]
    pub fn lane_point(&self, team: Team, lane: Lane, distance: u32) -> Vec2Fixed {
        Vec2Fixed::new(
            lane.centerline_x(self.lane_spacing_fixed()),
            self.y_from_castle(team, distance),
        )
    }

    /// Spawn point for a mobile entity, shifted by formation slot.
    ///
    /// Slots cycle through center, left of center, right of center.
    #[must_use]
    pub fn spawn_point(&self, team: Team, lane: Lane, slot: u64) -> Vec2Fixed {
        let base = self.lane_point(team, lane, self.spawn_offset);
        let spread = Fixed::from_num(self.formation_spread);
        let offset = match slot % 3 {
            0 => Fixed::ZERO,
            1 => -spread,
            _ => spread,
        };
        Vec2Fixed::new(base.x + offset, base.y)
    }

    /// Whether `lane` is in play.
    #[must_use]
    pub fn has_lane(&self, lane: Lane) -> bool {
        self.lanes.contains(&lane)
    }
}

impl Default for LayoutData {
    fn default() -> Self {
        Self::three_lane()
    }
}

/// Tower stats shared by every tower in the battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerData {
    /// Maximum health.
    pub health: u32,
    /// Upper bound on soldiers killed per affected battalion per volley.
    pub max_casualties: u8,
    /// Engagement radius in world units.
    pub range: u32,
    /// Ticks between volleys.
    pub cooldown: u64,
}

impl Default for TowerData {
    fn default() -> Self {
        Self {
            health: 1500,
            max_casualties: 8,
            range: 70,
            cooldown: 20,
        }
    }
}

/// Catapult stats and spawn cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatapultData {
    /// Maximum health.
    pub health: u32,
    /// Flat damage per shot against a structure.
    pub damage: u32,
    /// Area-effect range in world units.
    pub range: u32,
    /// Ticks between shots.
    pub reload: u64,
    /// Movement speed in world units per second.
    pub speed: u32,
    /// Ticks between periodic spawns (0 disables periodic spawning).
    pub spawn_interval: u64,
    /// Catapults spawned per lane per team on each spawn.
    pub per_lane: u32,
}

impl Default for CatapultData {
    fn default() -> Self {
        Self {
            health: 400,
            damage: 120,
            range: 140,
            reload: 60,
            speed: 10,
            spawn_interval: 600,
            per_lane: 1,
        }
    }
}

/// Castle stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastleData {
    /// Maximum health.
    pub health: u32,
}

impl Default for CastleData {
    fn default() -> Self {
        Self { health: 5000 }
    }
}

/// Resource gate settings. The starting balance is supplied at battle start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaData {
    /// Maximum mana.
    pub cap: u32,
    /// Mana restored per regeneration step.
    pub regen_amount: u32,
    /// Ticks between regeneration steps.
    pub regen_interval: u64,
    /// Mana cost of a manual catapult shot.
    pub manual_fire_cost: u32,
}

impl Default for ManaData {
    fn default() -> Self {
        Self {
            cap: 200,
            regen_amount: 5,
            regen_interval: 20,
            manual_fire_cost: 40,
        }
    }
}

/// Scripted deployment cadence for the enemy side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyScript {
    /// Ticks between enemy deployments (0 disables scripted spawns).
    pub spawn_interval: u64,
    /// Tick of the first enemy deployment.
    pub first_spawn: u64,
}

impl Default for EnemyScript {
    fn default() -> Self {
        Self {
            spawn_interval: 200,
            first_spawn: 100,
        }
    }
}

/// Gold credited to the player when the battle ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTable {
    /// Paid on a player victory.
    pub victory: u32,
    /// Paid on a player defeat.
    pub defeat: u32,
    /// Paid per enemy tower destroyed, win or lose.
    pub per_tower: u32,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            victory: 500,
            defeat: 50,
            per_tower: 100,
        }
    }
}

/// Complete rules for one battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BattleConfig {
    /// Battlefield geometry.
    #[serde(default)]
    pub layout: LayoutData,
    /// Battalion stats.
    #[serde(default)]
    pub catalog: UnitCatalog,
    /// Tower stats.
    #[serde(default)]
    pub tower: TowerData,
    /// Catapult stats.
    #[serde(default)]
    pub catapult: CatapultData,
    /// Castle stats.
    #[serde(default)]
    pub castle: CastleData,
    /// Resource gate settings.
    #[serde(default)]
    pub mana: ManaData,
    /// Enemy deployment cadence.
    #[serde(default)]
    pub enemy: EnemyScript,
    /// End-of-battle payouts.
    #[serde(default)]
    pub rewards: RewardTable,
    /// Team that started the siege; the other side is the defender.
    #[serde(default = "default_attacker")]
    pub attacker: Team,
}

const fn default_attacker() -> Team {
    Team::Player
}

/// Longest battlefield accepted by validation.
///
/// Squared distances across the field must fit in [`Fixed`].
pub const MAX_FIELD_LENGTH: u32 = 30_000;

/// Widest lateral extent (lane spacing plus formation spread) accepted by
/// validation.
pub const MAX_LANE_SPACING: u32 = 10_000;

/// Largest range or speed accepted by validation.
pub const MAX_REACH: u32 = MAX_FIELD_LENGTH;

impl BattleConfig {
    /// Default rules on a single lane.
    #[must_use]
    pub fn single_lane() -> Self {
        Self {
            layout: LayoutData::single_lane(),
            ..Self::default()
        }
    }

    /// The team that wins a simultaneous castle destruction.
    #[must_use]
    pub const fn defender(&self) -> Team {
        self.attacker.opponent()
    }

    /// Check the configuration can produce a valid battle.
    ///
    /// # Errors
    ///
    /// Returns [`SiegeError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        if layout.lanes.is_empty() {
            return Err(SiegeError::InvalidConfig("layout has no lanes".into()));
        }
        if layout.field_length > MAX_FIELD_LENGTH {
            return Err(SiegeError::InvalidConfig(format!(
                "field length {} exceeds {MAX_FIELD_LENGTH}",
                layout.field_length
            )));
        }
        if layout.lane_spacing.saturating_add(layout.formation_spread) > MAX_LANE_SPACING {
            return Err(SiegeError::InvalidConfig(format!(
                "lane spacing {} plus formation spread {} exceeds {MAX_LANE_SPACING}",
                layout.lane_spacing, layout.formation_spread
            )));
        }
        let reaches = [
            ("tower range", self.tower.range),
            ("catapult range", self.catapult.range),
            ("catapult speed", self.catapult.speed),
        ];
        let unit_reaches = self.catalog.iter().flat_map(|(unit_type, data)| {
            [(unit_type, "range", data.range), (unit_type, "speed", data.speed)]
        });
        for (name, value) in reaches {
            if value > MAX_REACH {
                return Err(SiegeError::InvalidConfig(format!(
                    "{name} {value} exceeds {MAX_REACH}"
                )));
            }
        }
        for (unit_type, name, value) in unit_reaches {
            if value > MAX_REACH {
                return Err(SiegeError::InvalidConfig(format!(
                    "{unit_type:?} {name} {value} exceeds {MAX_REACH}"
                )));
            }
        }
        if layout.spawn_offset.saturating_mul(2) >= layout.field_length {
            return Err(SiegeError::InvalidConfig(format!(
                "spawn offset {} does not fit in field length {}",
                layout.spawn_offset, layout.field_length
            )));
        }
        for tower in &layout.towers {
            if !layout.has_lane(tower.lane) {
                return Err(SiegeError::InvalidConfig(format!(
                    "tower placed on unused lane {:?}",
                    tower.lane
                )));
            }
            if tower.distance >= layout.field_length {
                return Err(SiegeError::InvalidConfig(format!(
                    "tower distance {} outside field length {}",
                    tower.distance, layout.field_length
                )));
            }
        }
        let outer_lanes = layout.lanes.iter().any(|lane| *lane != Lane::Center);
        if outer_lanes && self.catapult.range <= layout.lane_spacing {
            return Err(SiegeError::InvalidConfig(format!(
                "catapult range {} cannot reach the castle across lane spacing {}",
                self.catapult.range, layout.lane_spacing
            )));
        }
        if self.castle.health == 0 || self.tower.health == 0 || self.catapult.health == 0 {
            return Err(SiegeError::InvalidConfig(
                "structures and catapults need positive health".into(),
            ));
        }
        if self.mana.regen_interval == 0 {
            return Err(SiegeError::InvalidConfig(
                "mana regen interval must be at least one tick".into(),
            ));
        }
        Ok(())
    }

    /// Parse a configuration from RON.
    ///
    /// # Errors
    ///
    /// Returns [`SiegeError::DataParseError`] on malformed input, or the
    /// validation error if the parsed rules are unusable.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron).map_err(|e| SiegeError::DataParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}
