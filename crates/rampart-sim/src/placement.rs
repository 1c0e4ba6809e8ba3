//! Placement & sell validator.
//!
//! Every tower creation and removal goes through here and is gated by the
//! economy. Placing and selling are mutually exclusive interaction modes;
//! entering one leaves the other. A preview's cost is debited up front and is
//! either refunded (cancel) or converted into a real tower (commit), never both.

use hecs::World;
use tracing::debug;

use rampart_core::components::Tower;
use rampart_core::config::MatchConfig;
use rampart_core::enums::{InteractionMode, SpatialCategory, TowerKind};
use rampart_core::error::Rejection;
use rampart_core::events::SimEvent;
use rampart_core::state::InteractionView;
use rampart_core::types::Position;

use crate::economy::Economy;
use crate::spatial::SpatialQuery;
use crate::world_setup;

/// A bought but not yet placed tower following the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementPreview {
    pub kind: TowerKind,
    /// Reserved money, refunded on cancel.
    pub cost: u32,
    pub footprint_radius: f64,
    /// Last pointer hit on the ground; `None` while the pointer is off the field.
    pub position: Option<Position>,
    pub legal: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Interaction {
    #[default]
    Idle,
    Placing(PlacementPreview),
    Selling { hovered: Option<u32> },
}

impl Interaction {
    pub fn mode(&self) -> InteractionMode {
        match self {
            Interaction::Idle => InteractionMode::Idle,
            Interaction::Placing(_) => InteractionMode::Placing,
            Interaction::Selling { .. } => InteractionMode::Selling,
        }
    }

    pub fn preview(&self) -> Option<&PlacementPreview> {
        match self {
            Interaction::Placing(preview) => Some(preview),
            _ => None,
        }
    }

    pub fn view(&self) -> InteractionView {
        match *self {
            Interaction::Idle => InteractionView::default(),
            Interaction::Placing(preview) => InteractionView {
                mode: InteractionMode::Placing,
                preview_kind: Some(preview.kind),
                preview_position: preview.position,
                preview_legal: preview.legal,
                hovered_tower: None,
            },
            Interaction::Selling { hovered } => InteractionView {
                mode: InteractionMode::Selling,
                hovered_tower: hovered,
                ..Default::default()
            },
        }
    }

    /// Buy a tower of `kind` and start previewing it. Refused without any
    /// state change if already placing or the player cannot afford it.
    pub fn start_placement(
        &mut self,
        kind: TowerKind,
        config: &MatchConfig,
        economy: &mut Economy,
        events: &mut Vec<SimEvent>,
    ) -> Result<(), Rejection> {
        let spec = config
            .towers
            .get(&kind)
            .ok_or(Rejection::UnknownTowerKind(kind))?;
        if matches!(self, Interaction::Placing(_)) {
            return Err(Rejection::AlreadyPlacing);
        }
        economy.try_spend(spec.cost)?;

        if matches!(self, Interaction::Selling { .. }) {
            debug!("leaving sell mode to place a tower");
        }
        *self = Interaction::Placing(PlacementPreview {
            kind,
            cost: spec.cost,
            footprint_radius: spec.footprint_radius,
            position: None,
            legal: false,
        });

        debug!(?kind, cost = spec.cost, money = economy.money(), "placement started");
        events.push(SimEvent::PlacementStarted {
            kind,
            cost: spec.cost,
        });
        events.push(SimEvent::ModeChanged {
            mode: InteractionMode::Placing,
        });
        Ok(())
    }

    /// Move the preview to the pointer and recompute legality. The preview
    /// follows the pointer whether or not the spot is legal.
    pub fn refresh_preview(
        &mut self,
        pointer: Option<Position>,
        world: &World,
        config: &MatchConfig,
        spatial: &dyn SpatialQuery,
    ) {
        let Interaction::Placing(preview) = self else {
            return;
        };
        let footprint = preview.footprint_radius;
        preview.position = pointer;
        preview.legal = pointer
            .is_some_and(|point| is_legal_placement(world, config, spatial, &point, footprint));
    }

    /// Turn the preview into a real tower at its validated position.
    /// Returns the new tower's id.
    pub fn commit(
        &mut self,
        world: &mut World,
        config: &MatchConfig,
        spatial: &dyn SpatialQuery,
        next_tower_id: &mut u32,
        events: &mut Vec<SimEvent>,
    ) -> Result<u32, Rejection> {
        let Interaction::Placing(preview) = *self else {
            return Err(Rejection::NotPlacing);
        };
        let position = match preview.position {
            Some(point)
                if is_legal_placement(world, config, spatial, &point, preview.footprint_radius) =>
            {
                point
            }
            _ => return Err(Rejection::IllegalPlacement),
        };
        let spec = config
            .towers
            .get(&preview.kind)
            .ok_or(Rejection::UnknownTowerKind(preview.kind))?;

        let tower_id = *next_tower_id;
        *next_tower_id += 1;
        // The reserved money pays for the tower; charge what was reserved.
        let mut spec = *spec;
        spec.cost = preview.cost;
        world_setup::spawn_tower(world, tower_id, preview.kind, &spec, position);
        *self = Interaction::Idle;

        debug!(tower = tower_id, kind = ?preview.kind, "tower placed");
        events.push(SimEvent::TowerPlaced {
            tower_id,
            kind: preview.kind,
            position,
        });
        events.push(SimEvent::ModeChanged {
            mode: InteractionMode::Idle,
        });
        Ok(tower_id)
    }

    /// Discard the preview and refund its reserved cost.
    pub fn cancel(&mut self, economy: &mut Economy, events: &mut Vec<SimEvent>) -> Result<(), Rejection> {
        let Interaction::Placing(preview) = *self else {
            return Err(Rejection::NotPlacing);
        };
        *self = Interaction::Idle;
        economy.earn(preview.cost);

        debug!(kind = ?preview.kind, refund = preview.cost, "placement cancelled");
        events.push(SimEvent::PlacementCancelled {
            kind: preview.kind,
            refund: preview.cost,
        });
        events.push(SimEvent::ModeChanged {
            mode: InteractionMode::Idle,
        });
        Ok(())
    }

    /// Enter sell mode, cancelling (and refunding) any running placement.
    pub fn start_sell_mode(&mut self, economy: &mut Economy, events: &mut Vec<SimEvent>) {
        if matches!(self, Interaction::Selling { .. }) {
            return;
        }
        if matches!(self, Interaction::Placing(_)) {
            // Cannot fail: we are placing.
            let _ = self.cancel(economy, events);
        }
        *self = Interaction::Selling { hovered: None };
        events.push(SimEvent::ModeChanged {
            mode: InteractionMode::Selling,
        });
    }

    pub fn exit_sell_mode(&mut self, events: &mut Vec<SimEvent>) -> Result<(), Rejection> {
        if !matches!(self, Interaction::Selling { .. }) {
            return Err(Rejection::NotSelling);
        }
        *self = Interaction::Idle;
        events.push(SimEvent::ModeChanged {
            mode: InteractionMode::Idle,
        });
        Ok(())
    }

    /// Record the tower under the pointer. Ignored outside sell mode.
    pub fn hover(&mut self, tower_id: Option<u32>) {
        if let Interaction::Selling { hovered } = self {
            *hovered = tower_id;
        }
    }

    /// Remove the hovered tower and pay `floor(cost * refund_percentage)`.
    /// Returns the refund.
    pub fn sell_hovered(
        &mut self,
        world: &mut World,
        config: &MatchConfig,
        economy: &mut Economy,
        events: &mut Vec<SimEvent>,
    ) -> Result<u32, Rejection> {
        let Interaction::Selling { hovered } = self else {
            return Err(Rejection::NotSelling);
        };
        let tower_id = hovered.ok_or(Rejection::NothingHovered)?;

        // A stale hover (tower already gone) counts as nothing hovered.
        let (entity, cost) = world
            .query::<&Tower>()
            .iter()
            .find(|(_, tower)| tower.id == tower_id)
            .map(|(entity, tower)| (entity, tower.cost))
            .ok_or(Rejection::NothingHovered)?;

        let _ = world.despawn(entity);
        *hovered = None;

        let refund = config.refund_for(cost);
        economy.earn(refund);
        debug!(tower = tower_id, refund, money = economy.money(), "tower sold");
        events.push(SimEvent::TowerSold { tower_id, refund });
        Ok(refund)
    }
}

/// Buildable ground and no overlap between the tower's footprint sphere and
/// any no-build zone or existing tower.
pub fn is_legal_placement(
    world: &World,
    config: &MatchConfig,
    spatial: &dyn SpatialQuery,
    point: &Position,
    footprint_radius: f64,
) -> bool {
    config.level.is_buildable(point)
        && spatial
            .find_within_radius(world, point, footprint_radius, SpatialCategory::NoBuild)
            .is_empty()
}
