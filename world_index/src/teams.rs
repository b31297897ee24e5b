//! Team registry and aggregate stat bookkeeping.
//!
//! Teams own structures; the registry tracks each team's mutable aggregate
//! statistics, currently the unit cap contributed by owned structures. Stats
//! can be adjusted incrementally as structures are removed or recomputed
//! wholesale from live grid state, and both paths must agree.

use std::collections::BTreeMap;
use std::fmt;

use bevy::prelude::Resource;
use tracing::{debug, trace};

use crate::content::{Block, ContentRegistry};
use crate::grid::WorldGrid;

/// Identifier for a team owning structures on the map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamId(pub u8);

impl TeamId {
    /// Ownerless team assigned to unclaimed tiles.
    pub const DERELICT: TeamId = TeamId(0);
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutable aggregate statistics tracked per team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamData {
    /// Base cap plus the summed unit-cap modifiers of owned structures.
    pub unit_cap: i32,
}

/// Registry of per-team aggregate statistics.
#[derive(Resource, Debug, Clone)]
pub struct TeamRegistry {
    base_unit_cap: i32,
    teams: BTreeMap<TeamId, TeamData>,
}

impl Default for TeamRegistry {
    fn default() -> Self {
        Self::new(0)
    }
}

impl TeamRegistry {
    pub fn new(base_unit_cap: i32) -> Self {
        Self {
            base_unit_cap,
            teams: BTreeMap::new(),
        }
    }

    /// Stats for a team; teams that never placed a structure report the base
    /// cap.
    pub fn data(&self, team: TeamId) -> TeamData {
        self.teams.get(&team).copied().unwrap_or(TeamData {
            unit_cap: self.base_unit_cap,
        })
    }

    /// Mutable stats for a team, created at the base cap on first access.
    pub fn data_mut(&mut self, team: TeamId) -> &mut TeamData {
        let base = self.base_unit_cap;
        self.teams
            .entry(team)
            .or_insert(TeamData { unit_cap: base })
    }

    /// Teams with recorded stats, in id order.
    pub fn teams(&self) -> impl Iterator<Item = (TeamId, TeamData)> + '_ {
        self.teams.iter().map(|(team, data)| (*team, *data))
    }

    /// Subtracts a removed structure's capacity contribution from its team.
    ///
    /// The addition side is accounted for by the placement path (or by
    /// [`TeamRegistry::update_team_stats`]), not here.
    pub fn apply_removal(&mut self, team: TeamId, block: &Block) {
        if block.unit_cap_modifier == 0 {
            return;
        }
        let data = self.data_mut(team);
        data.unit_cap -= block.unit_cap_modifier;
        trace!(
            team = %team,
            block = %block.name,
            unit_cap = data.unit_cap,
            "applied structure removal to team stats"
        );
    }

    /// Wholesale recompute: resets every team to the base cap and re-adds
    /// the modifier of each owned structure found in the grid.
    pub fn update_team_stats(&mut self, grid: &WorldGrid, content: &ContentRegistry) {
        let base = self.base_unit_cap;
        for data in self.teams.values_mut() {
            data.unit_cap = base;
        }
        for (_pos, tile) in grid.iter() {
            if tile.build.is_none() {
                continue;
            }
            let Some(block) = content.block(tile.block) else {
                continue;
            };
            self.data_mut(tile.team).unit_cap += block.unit_cap_modifier;
        }
        debug!(teams = self.teams.len(), "recomputed team stats from grid");
    }
}
