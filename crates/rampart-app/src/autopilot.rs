//! Scripted player for the headless runner.
//!
//! Places a list of tower orders as money allows and optionally starts every
//! round as soon as it is ready. Works purely from snapshots and commands,
//! the same interface a UI would use.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use rampart_core::commands::PlayerCommand;
use rampart_core::config::MatchConfig;
use rampart_core::enums::{InteractionMode, RoundPhase, TowerKind};
use rampart_core::events::SimEvent;
use rampart_core::state::GameStateSnapshot;
use rampart_core::types::Position;

/// A tower to place at a ground point, written `KIND@X,Z` on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TowerOrder {
    pub kind: TowerKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderParseError {
    #[error("expected KIND@X,Z, got {0:?}")]
    Malformed(String),
    #[error("unknown tower kind {0:?} (expected cannon, sniper or rapid)")]
    UnknownKind(String),
    #[error("invalid coordinate {0:?}")]
    BadCoordinate(String),
}

fn parse_kind(name: &str) -> Result<TowerKind, OrderParseError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "cannon" => Ok(TowerKind::Cannon),
        "sniper" => Ok(TowerKind::Sniper),
        "rapid" => Ok(TowerKind::Rapid),
        _ => Err(OrderParseError::UnknownKind(name.to_string())),
    }
}

fn parse_coordinate(text: &str) -> Result<f64, OrderParseError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| OrderParseError::BadCoordinate(text.to_string()))
}

impl FromStr for TowerOrder {
    type Err = OrderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || OrderParseError::Malformed(s.to_string());
        let (kind, coords) = s.split_once('@').ok_or_else(malformed)?;
        let (x, z) = coords.split_once(',').ok_or_else(malformed)?;

        Ok(TowerOrder {
            kind: parse_kind(kind)?,
            position: Position::ground(parse_coordinate(x)?, parse_coordinate(z)?),
        })
    }
}

impl fmt::Display for TowerOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}@{},{}",
            self.kind, self.position.0.x, self.position.0.z
        )
    }
}

pub struct Autopilot {
    orders: VecDeque<TowerOrder>,
    costs: BTreeMap<TowerKind, u32>,
    auto_start: bool,
    /// Order whose commands were queued last tick and await confirmation.
    in_flight: Option<TowerOrder>,
}

impl Autopilot {
    pub fn new(config: &MatchConfig, orders: Vec<TowerOrder>, auto_start: bool) -> Self {
        Self {
            orders: orders.into(),
            costs: config
                .towers
                .iter()
                .map(|(kind, spec)| (*kind, spec.cost))
                .collect(),
            auto_start,
            in_flight: None,
        }
    }

    /// Orders not placed yet.
    pub fn pending_orders(&self) -> usize {
        self.orders.len() + usize::from(self.in_flight.is_some())
    }

    /// Look at the latest snapshot and decide what to send next tick.
    pub fn react(&mut self, snapshot: &GameStateSnapshot) -> Vec<PlayerCommand> {
        let mut commands = Vec::new();
        if !snapshot.phase.is_active() {
            return commands;
        }

        let mut idle = snapshot.interaction.mode == InteractionMode::Idle;
        if let Some(order) = self.in_flight.take() {
            let placed = snapshot
                .events
                .iter()
                .any(|e| matches!(e, SimEvent::TowerPlaced { .. }));
            if placed {
                info!(%order, "tower order placed");
            } else if snapshot.interaction.mode == InteractionMode::Placing {
                warn!(%order, "tower order is not a legal spot, cancelling");
                commands.push(PlayerCommand::CancelPlacement);
                idle = true;
            } else {
                warn!(%order, "tower order was refused");
            }
        }

        if idle {
            self.issue_next_order(snapshot.economy.money, &mut commands);
        }

        if self.auto_start && self.in_flight.is_none() && snapshot.phase == RoundPhase::AwaitingStart {
            commands.push(PlayerCommand::StartRound);
        }
        commands
    }

    fn issue_next_order(&mut self, money: u32, commands: &mut Vec<PlayerCommand>) {
        while let Some(order) = self.orders.front().copied() {
            let Some(&cost) = self.costs.get(&order.kind) else {
                warn!(%order, "tower kind is not in this match's catalog, skipping");
                self.orders.pop_front();
                continue;
            };
            if cost > money {
                return;
            }

            self.orders.pop_front();
            commands.extend([
                PlayerCommand::PointerMoved {
                    point: Some(order.position),
                },
                PlayerCommand::StartPlacingTower { kind: order.kind },
                PlayerCommand::CommitPlacement,
            ]);
            self.in_flight = Some(order);
            return;
        }
    }
}
