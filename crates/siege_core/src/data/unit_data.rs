//! Unit catalog for data-driven battalion definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::UnitType;
use crate::error::{Result, SiegeError};
use crate::math::Fixed;

/// Data-driven battalion definition.
///
/// Distances are whole world units and speeds are world units per second,
/// so catalog files stay readable.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     cost: 30,
///     damage: 100,
///     speed: 20,
///     range: 12,
///     attack_interval: 20,
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitData {
    /// Mana cost to deploy one battalion.
    pub cost: u32,
    /// Flat damage per attack against a structure or catapult.
    pub damage: u32,
    /// Movement speed in world units per second.
    pub speed: u32,
    /// Engagement range in world units.
    pub range: u32,
    /// Minimum ticks between attacks.
    #[serde(default = "default_attack_interval")]
    pub attack_interval: u64,
}

const fn default_attack_interval() -> u64 {
    20
}

impl UnitData {
    /// Movement speed as a fixed-point value.
    #[must_use]
    pub fn speed_fixed(&self) -> Fixed {
        Fixed::from_num(self.speed)
    }

    /// Engagement range as a fixed-point value.
    #[must_use]
    pub fn range_fixed(&self) -> Fixed {
        Fixed::from_num(self.range)
    }
}

/// Stats for every [`UnitType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<UnitType, UnitData>",
    into = "BTreeMap<UnitType, UnitData>"
)]
pub struct UnitCatalog {
    entries: BTreeMap<UnitType, UnitData>,
}

impl UnitCatalog {
    /// Build a catalog from explicit entries.
    ///
    /// # Errors
    ///
    /// Returns [`SiegeError::InvalidConfig`] if any unit type is missing.
    pub fn from_entries(entries: BTreeMap<UnitType, UnitData>) -> Result<Self> {
        if let Some(missing) = UnitType::ALL.iter().find(|t| !entries.contains_key(t)) {
            return Err(SiegeError::InvalidConfig(format!(
                "unit catalog has no entry for {missing:?}"
            )));
        }
        Ok(Self { entries })
    }

    /// Parse a catalog from RON, e.g. `{Swordsman: UnitData(...), ...}`.
    ///
    /// # Errors
    ///
    /// Returns [`SiegeError::DataParseError`] on malformed input and
    /// [`SiegeError::InvalidConfig`] if the catalog is incomplete.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let entries: BTreeMap<UnitType, UnitData> =
            ron::from_str(ron).map_err(|e| SiegeError::DataParseError {
                message: e.to_string(),
            })?;
        Self::from_entries(entries)
    }

    /// Stats for a unit type.
    #[must_use]
    pub fn get(&self, unit_type: UnitType) -> &UnitData {
        // Every type is present by construction.
        &self.entries[&unit_type]
    }

    /// Replace one entry (used by tests and tuning tools).
    pub fn set(&mut self, unit_type: UnitType, data: UnitData) {
        self.entries.insert(unit_type, data);
    }

    /// Iterate entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&UnitType, &UnitData)> {
        self.entries.iter()
    }
}

impl TryFrom<BTreeMap<UnitType, UnitData>> for UnitCatalog {
    type Error = SiegeError;

    fn try_from(entries: BTreeMap<UnitType, UnitData>) -> Result<Self> {
        Self::from_entries(entries)
    }
}

impl From<UnitCatalog> for BTreeMap<UnitType, UnitData> {
    fn from(catalog: UnitCatalog) -> Self {
        catalog.entries
    }
}

impl Default for UnitCatalog {
    fn default() -> Self {
        let entries = BTreeMap::from([
            (
                UnitType::Swordsman,
                UnitData {
                    cost: 30,
                    damage: 100,
                    speed: 20,
                    range: 12,
                    attack_interval: 20,
                },
            ),
            (
                UnitType::Archer,
                UnitData {
                    cost: 35,
                    damage: 60,
                    speed: 18,
                    range: 60,
                    attack_interval: 20,
                },
            ),
            (
                UnitType::Cavalry,
                UnitData {
                    cost: 50,
                    damage: 120,
                    speed: 40,
                    range: 14,
                    attack_interval: 25,
                },
            ),
            (
                UnitType::FireMage,
                UnitData {
                    cost: 60,
                    damage: 150,
                    speed: 16,
                    range: 50,
                    attack_interval: 30,
                },
            ),
            (
                UnitType::IceMage,
                UnitData {
                    cost: 55,
                    damage: 80,
                    speed: 16,
                    range: 80,
                    attack_interval: 25,
                },
            ),
            (
                UnitType::LightningMage,
                UnitData {
                    cost: 65,
                    damage: 70,
                    speed: 18,
                    range: 55,
                    attack_interval: 12,
                },
            ),
        ]);
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_complete() {
        let catalog = UnitCatalog::default();
        for unit_type in UnitType::ALL {
            assert!(catalog.get(unit_type).attack_interval >= 1);
        }
    }

    #[test]
    fn test_incomplete_catalog_rejected() {
        let mut entries = BTreeMap::new();
        entries.insert(
            UnitType::Swordsman,
            UnitData {
                cost: 1,
                damage: 1,
                speed: 1,
                range: 1,
                attack_interval: 1,
            },
        );
        assert!(matches!(
            UnitCatalog::from_entries(entries),
            Err(SiegeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_catalog_from_ron_uses_default_interval() {
        let ron = r"{
            Swordsman: (cost: 1, damage: 2, speed: 3, range: 4),
            Archer: (cost: 1, damage: 2, speed: 3, range: 4),
            Cavalry: (cost: 1, damage: 2, speed: 3, range: 4),
            FireMage: (cost: 1, damage: 2, speed: 3, range: 4),
            IceMage: (cost: 1, damage: 2, speed: 3, range: 4),
            LightningMage: (cost: 1, damage: 2, speed: 3, range: 4, attack_interval: 7),
        }";
        let catalog = UnitCatalog::from_ron_str(ron).unwrap();
        assert_eq!(catalog.get(UnitType::Archer).attack_interval, 20);
        assert_eq!(catalog.get(UnitType::LightningMage).attack_interval, 7);
        assert_eq!(catalog.get(UnitType::Swordsman).range_fixed(), Fixed::from_num(4));
    }

    #[test]
    fn test_malformed_ron_is_parse_error() {
        assert!(matches!(
            UnitCatalog::from_ron_str("{ Swordsman: oops }"),
            Err(SiegeError::DataParseError { .. })
        ));
    }
}
