//! Species stat tables and land affinity.

use serde::{Deserialize, Deserializer, Serialize};

use super::CreatureStats;
use crate::constants::{
    CAPTURE_MIN_TOTAL, CAPTURE_TIME_MAX_SECS, CAPTURE_TIME_MIN_SECS, CAPTURE_TOTAL_SPAN,
};
use crate::generation::LandType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BaseStats {
    #[serde(alias = "HP")]
    pub hp: u32,
    #[serde(alias = "Attack")]
    pub attack: u32,
    #[serde(alias = "Defense")]
    pub defense: u32,
    #[serde(alias = "Sp. Attack", alias = "SpAttack")]
    pub sp_attack: u32,
    #[serde(alias = "Sp. Defense", alias = "SpDefense")]
    pub sp_defense: u32,
    #[serde(alias = "Speed")]
    pub speed: u32,
}

impl BaseStats {
    /// Sum of all six stats, saturating at `u32::MAX`
    pub fn total(&self) -> u32 {
        [
            self.hp,
            self.attack,
            self.defense,
            self.sp_attack,
            self.sp_defense,
            self.speed,
        ]
        .into_iter()
        .fold(0u32, u32::saturating_add)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub id: u32,
    /// Plain string, or a pokedex-style `{"english": ...}` map
    #[serde(deserialize_with = "english_name")]
    pub name: String,
    /// Elemental types, e.g. `["Grass", "Poison"]`
    #[serde(alias = "type")]
    pub types: Vec<String>,
    #[serde(alias = "baseStats")]
    pub base: BaseStats,
}

fn english_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawName {
        Plain(String),
        Localized { english: String },
    }

    Ok(match RawName::deserialize(deserializer)? {
        RawName::Plain(name) | RawName::Localized { english: name } => name,
    })
}

impl Species {
    pub fn creature_stats(&self) -> CreatureStats {
        CreatureStats {
            species_id: self.id,
            attack: self.base.attack,
            special_attack: self.base.sp_attack,
        }
    }

    /// Seconds the capture minigame takes; sturdier species take longer.
    pub fn capture_time(&self) -> f32 {
        let normalized =
            ((self.base.total() as f32 - CAPTURE_MIN_TOTAL) / CAPTURE_TOTAL_SPAN).clamp(0.0, 1.0);
        CAPTURE_TIME_MIN_SECS + (CAPTURE_TIME_MAX_SECS - CAPTURE_TIME_MIN_SECS) * normalized
    }

    pub fn has_type(&self, element: &str) -> bool {
        self.types.iter().any(|t| t.eq_ignore_ascii_case(element))
    }
}

/// All species available to the spawner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesTable {
    species: Vec<Species>,
}

impl SpeciesTable {
    pub fn new(species: Vec<Species>) -> Self {
        Self { species }
    }

    /// Parse a JSON array of species
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Species> {
        self.species.iter().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }

    /// Species able to live on the given land, in table order
    pub fn for_land(&self, land_type: LandType) -> Vec<&Species> {
        self.species
            .iter()
            .filter(|s| land_type.admits(&s.types))
            .collect()
    }
}
