use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::modules::constants::Halite;
use crate::modules::sim::{SimEvent, TurnResult};
use crate::modules::turn::{Command, TurnPlan};

/// Summary of one offline game, persisted after `harvester simulate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameReport {
    pub seed: u64,
    pub width: i32,
    pub height: i32,
    pub turns: u32,
    pub final_reserves: Halite,
    pub halite_deposited: u64,
    pub halite_remaining: u64,
    pub ships_built: u32,
    pub ships_lost: u32,
    pub stations_built: u32,
    pub move_commands: u64,
    pub spawn_commands: u64,
    pub build_commands: u64,
    pub rejections: u64,
    #[serde(default)]
    pub finished_at: Option<String>,
}

impl GameReport {
    pub fn new(seed: u64, width: i32, height: i32) -> Self {
        Self {
            seed,
            width,
            height,
            ..Self::default()
        }
    }

    pub fn record_turn(&mut self, plan: &TurnPlan, result: &TurnResult) {
        self.turns = result.turn;
        for command in &plan.commands {
            match command {
                Command::Move { .. } => self.move_commands += 1,
                Command::Spawn => self.spawn_commands += 1,
                Command::BuildStation { .. } => self.build_commands += 1,
            }
        }
        self.rejections += result.rejections.len() as u64;

        for event in &result.events {
            match event {
                SimEvent::ShipSpawned { .. } => self.ships_built += 1,
                SimEvent::ShipsCollided { units, .. } => self.ships_lost += units.len() as u32,
                SimEvent::StationBuilt { .. } => self.stations_built += 1,
                SimEvent::Deposited { amount, .. } => {
                    self.halite_deposited += *amount as u64;
                }
                _ => {}
            }
        }
    }

    pub fn finish(&mut self, final_reserves: Halite, halite_remaining: u64) {
        self.final_reserves = final_reserves;
        self.halite_remaining = halite_remaining;
        self.finished_at = Some(Utc::now().to_rfc3339());
    }
}

fn report_dir() -> PathBuf {
    PathBuf::from(".harvester")
}

pub fn report_file_path() -> PathBuf {
    report_dir().join("last_game.json")
}

pub fn save_game_report(path: &Path, report: &GameReport) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(report)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_game_report(path: &Path) -> io::Result<Option<GameReport>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    if bytes.is_empty() {
        return Ok(None);
    }
    let report = serde_json::from_slice(&bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "failed to parse game report {}; delete it to reset: {}",
                path.display(),
                e
            ),
        )
    })?;
    Ok(Some(report))
}
