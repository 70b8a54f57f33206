use std::io::{BufRead, Write};

use log::debug;
use thiserror::Error;

use crate::modules::constants::{GameConstants, Halite};
use crate::modules::map::{GameMap, StructureKind};
use crate::modules::position::Position;
use crate::modules::turn::{Command, TurnFrame};
use crate::modules::unit::{Unit, UnitId};

pub type PlayerId = u32;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("engine i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine closed the stream while sending {0}")]
    UnexpectedEof(&'static str),
    #[error("malformed {what} line {line:?}: {reason}")]
    Parse {
        what: &'static str,
        line: String,
        reason: String,
    },
    #[error("failed to parse game constants: {0}")]
    Constants(#[from] serde_json::Error),
    #[error("engine reported unknown player {0}")]
    UnknownPlayer(PlayerId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub id: PlayerId,
    pub shipyard: Position,
    pub halite: Halite,
    pub ships: Vec<Unit>,
    pub dropoffs: Vec<Position>,
}

/// Line-based connection to the game engine.
pub struct Engine<R, W> {
    reader: R,
    writer: W,
    constants: GameConstants,
    my_id: PlayerId,
    players: Vec<PlayerState>,
    map: GameMap,
}

impl<R: BufRead, W: Write> Engine<R, W> {
    /// Reads the initial handshake: constants, players and the full map.
    pub fn connect(reader: R, writer: W) -> Result<Self, ProtocolError> {
        let mut engine = Self {
            reader,
            writer,
            constants: GameConstants::default(),
            my_id: 0,
            players: Vec::new(),
            map: GameMap::new(1, 1),
        };

        let line = engine.read_line("constants")?;
        engine.constants = GameConstants::from_json(&line)?;

        let header = engine.read_numbers::<2>("player header")?;
        let num_players = header[0];
        engine.my_id = header[1] as PlayerId;

        for _ in 0..num_players {
            let [id, x, y] = engine.read_numbers::<3>("player")?;
            engine.players.push(PlayerState {
                id: id as PlayerId,
                shipyard: Position::new(x as i32, y as i32),
                halite: 0,
                ships: Vec::new(),
                dropoffs: Vec::new(),
            });
        }
        if !engine.players.iter().any(|p| p.id == engine.my_id) {
            return Err(ProtocolError::UnknownPlayer(engine.my_id));
        }

        let [width, height] = engine.read_numbers::<2>("map size")?;
        let mut rows: Vec<Vec<Halite>> = Vec::with_capacity(height as usize);
        for _ in 0..height {
            let line = engine.read_line("map row")?;
            let row = parse_all(&line, "map row")?;
            if row.len() != width as usize {
                return Err(ProtocolError::Parse {
                    what: "map row",
                    line,
                    reason: format!("expected {} cells, got {}", width, row.len()),
                });
            }
            rows.push(row.into_iter().map(|v| v as Halite).collect());
        }
        engine.map = GameMap::from_rows(&rows);
        for player in &engine.players {
            engine
                .map
                .set_structure(player.shipyard, StructureKind::Shipyard);
        }

        Ok(engine)
    }

    pub fn constants(&self) -> &GameConstants {
        &self.constants
    }

    pub fn my_id(&self) -> PlayerId {
        self.my_id
    }

    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    pub fn map(&self) -> &GameMap {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut GameMap {
        &mut self.map
    }

    /// Announces the bot name; the engine starts the turn clock after this.
    pub fn ready(&mut self, name: &str) -> Result<(), ProtocolError> {
        writeln!(self.writer, "{}", name)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Reads the next turn and refreshes the map. Returns `Ok(None)` when
    /// the engine has closed the stream between turns (game over).
    pub fn next_frame(&mut self) -> Result<Option<TurnFrame>, ProtocolError> {
        let Some(line) = self.try_read_line()? else {
            return Ok(None);
        };
        let turn = parse_all(&line, "turn")?
            .first()
            .copied()
            .ok_or_else(|| ProtocolError::Parse {
                what: "turn",
                line: line.clone(),
                reason: "empty line".into(),
            })? as u32;

        for _ in 0..self.players.len() {
            let [id, num_ships, num_dropoffs, halite] =
                self.read_numbers::<4>("player status")?;
            let id = id as PlayerId;

            let mut ships = Vec::with_capacity(num_ships as usize);
            for _ in 0..num_ships {
                let [ship_id, x, y, cargo] = self.read_numbers::<4>("ship")?;
                ships.push(Unit {
                    id: ship_id as UnitId,
                    position: Position::new(x as i32, y as i32),
                    cargo: cargo as Halite,
                });
            }
            let mut dropoffs = Vec::with_capacity(num_dropoffs as usize);
            for _ in 0..num_dropoffs {
                let [_, x, y] = self.read_numbers::<3>("dropoff")?;
                dropoffs.push(Position::new(x as i32, y as i32));
            }

            let player = self
                .players
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(ProtocolError::UnknownPlayer(id))?;
            player.halite = halite as Halite;
            player.ships = ships;
            player.dropoffs = dropoffs;
        }

        let [updates] = self.read_numbers::<1>("map update count")?;
        for _ in 0..updates {
            let [x, y, halite] = self.read_numbers::<3>("map update")?;
            self.map
                .set_halite(Position::new(x as i32, y as i32), halite as Halite);
        }

        self.map.clear_occupancy();
        for player in &self.players {
            for ship in &player.ships {
                self.map.mark_unsafe(ship.position, ship.id);
            }
            for dropoff in &player.dropoffs {
                self.map.set_structure(*dropoff, StructureKind::Dropoff);
            }
        }

        let me = self
            .players
            .iter()
            .find(|p| p.id == self.my_id)
            .ok_or(ProtocolError::UnknownPlayer(self.my_id))?;
        debug!(
            "turn {} frame: ships={} dropoffs={} halite={} updates={}",
            turn,
            me.ships.len(),
            me.dropoffs.len(),
            me.halite,
            updates
        );

        Ok(Some(TurnFrame {
            turn,
            units: me.ships.clone(),
            reserves: me.halite,
            home: me.shipyard,
            expansion: me.dropoffs.first().copied(),
        }))
    }

    /// Sends the whole batch as one line, ending our turn.
    pub fn submit(&mut self, commands: &[Command]) -> Result<(), ProtocolError> {
        let line = commands
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }

    fn try_read_line(&mut self) -> Result<Option<String>, ProtocolError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn read_line(&mut self, what: &'static str) -> Result<String, ProtocolError> {
        self.try_read_line()?
            .ok_or(ProtocolError::UnexpectedEof(what))
    }

    fn read_numbers<const N: usize>(
        &mut self,
        what: &'static str,
    ) -> Result<[i64; N], ProtocolError> {
        let line = self.read_line(what)?;
        let values = parse_all(&line, what)?;
        values.try_into().map_err(|values: Vec<i64>| ProtocolError::Parse {
            what,
            line,
            reason: format!("expected {} fields, got {}", N, values.len()),
        })
    }
}

fn parse_all(line: &str, what: &'static str) -> Result<Vec<i64>, ProtocolError> {
    line.split_whitespace()
        .map(|token| {
            token.parse::<i64>().map_err(|e| ProtocolError::Parse {
                what,
                line: line.to_string(),
                reason: format!("{:?}: {}", token, e),
            })
        })
        .collect()
}
