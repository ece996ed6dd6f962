//! Data structures for battle configuration.
//!
//! Pure data that defines the unit catalog and the battlefield layout.
//! Everything here can be deserialized from RON; file loading is left to
//! the caller (`siege_headless` reads scenario files).

mod layout_data;
mod unit_data;

pub use layout_data::{
    BattleConfig, CastleData, CatapultData, EnemyScript, LayoutData, ManaData, RewardTable,
    TowerData, TowerPlacement, MAX_FIELD_LENGTH, MAX_LANE_SPACING, MAX_REACH,
};
pub use unit_data::{UnitCatalog, UnitData};
