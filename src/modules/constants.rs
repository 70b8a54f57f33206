use serde::{Deserialize, Serialize};

/// Energy units, the resource carried by ships and banked as reserves.
pub type Halite = u32;

/// Game-wide constants announced by the engine on the first input line.
///
/// Only the keys the bot reads are modelled; the engine sends many more and
/// serde ignores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConstants {
    /// Maximum cargo a single ship can carry.
    #[serde(rename = "MAX_ENERGY", default = "default_max_cargo")]
    pub max_cargo: Halite,
    /// Cost of producing a new ship at the shipyard.
    #[serde(rename = "NEW_ENTITY_ENERGY_COST", default = "default_unit_cost")]
    pub unit_cost: Halite,
    /// Cost of turning a ship into a dropoff.
    #[serde(rename = "DROPOFF_COST", default = "default_expansion_cost")]
    pub expansion_cost: Halite,
    #[serde(rename = "MAX_TURNS", default = "default_max_turns")]
    pub max_turns: u32,
    /// A ship staying still extracts `ceil(halite / extract_ratio)`.
    #[serde(rename = "EXTRACT_RATIO", default = "default_extract_ratio")]
    pub extract_ratio: Halite,
    /// Moving off a cell costs `halite / move_cost_ratio`.
    #[serde(rename = "MOVE_COST_RATIO", default = "default_move_cost_ratio")]
    pub move_cost_ratio: Halite,
}

fn default_max_cargo() -> Halite {
    1000
}

fn default_unit_cost() -> Halite {
    1000
}

fn default_expansion_cost() -> Halite {
    4000
}

fn default_max_turns() -> u32 {
    400
}

fn default_extract_ratio() -> Halite {
    4
}

fn default_move_cost_ratio() -> Halite {
    10
}

impl Default for GameConstants {
    fn default() -> Self {
        Self {
            max_cargo: default_max_cargo(),
            unit_cost: default_unit_cost(),
            expansion_cost: default_expansion_cost(),
            max_turns: default_max_turns(),
            extract_ratio: default_extract_ratio(),
            move_cost_ratio: default_move_cost_ratio(),
        }
    }
}

impl GameConstants {
    pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
