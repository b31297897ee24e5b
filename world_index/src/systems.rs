//! Event plumbing between the simulation and the structure index.
//!
//! Tile mutations arrive as [`StructureEvent`]s and are applied as one index
//! transaction each: the old tile state is unindexed, the grid mutates, and
//! the new state is indexed before the next event is processed.

use bevy::prelude::*;

use crate::content::{BlockId, ContentRegistry};
use crate::grid::WorldGrid;
use crate::index::StructureIndex;
use crate::teams::{TeamId, TeamRegistry};

/// Tile mutation requested by the simulation for the current step.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureEvent {
    /// Place or replace the structure on a tile, optionally setting the
    /// overlay at the same time.
    Placed {
        pos: UVec2,
        block: BlockId,
        team: TeamId,
        overlay: Option<BlockId>,
    },
    /// Clear the structure from a tile back to air.
    Removed { pos: UVec2 },
}

/// Rebuilds the index and team stats from live tile state on world load.
pub fn initialize_index(
    grid: Res<WorldGrid>,
    content: Res<ContentRegistry>,
    mut index: ResMut<StructureIndex>,
    mut teams: ResMut<TeamRegistry>,
) {
    index.rebuild(&grid, &content);
    teams.update_team_stats(&grid, &content);
}

/// Applies queued structure mutations, one transaction per event.
pub fn apply_structure_events(
    mut events: EventReader<StructureEvent>,
    mut grid: ResMut<WorldGrid>,
    mut index: ResMut<StructureIndex>,
    mut teams: ResMut<TeamRegistry>,
    content: Res<ContentRegistry>,
) {
    for event in events.read() {
        match *event {
            StructureEvent::Placed {
                pos,
                block,
                team,
                overlay,
            } => {
                let Some(block) = content.block(block) else {
                    warn!(block = %block, "ignoring placement of unregistered block");
                    continue;
                };
                index.remove_index(&mut grid, &content, &mut teams, pos);
                grid.set_block(pos, block, team);
                if overlay.is_some() {
                    grid.set_overlay(pos, overlay);
                }
                index.add_index(&grid, &content, pos);
            }
            StructureEvent::Removed { pos } => {
                index.remove_index(&mut grid, &content, &mut teams, pos);
                grid.clear_block(pos);
                // The cleared tile still exists (air plus any surviving
                // overlay) and goes back into the index.
                index.add_index(&grid, &content, pos);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_headless_app, run_step, BlockFlags};

    fn block_id(app: &App, name: &str) -> BlockId {
        app.world
            .resource::<ContentRegistry>()
            .block_by_name(name)
            .unwrap()
            .id
    }

    #[test]
    fn placed_event_reaches_the_index() {
        let mut app = build_headless_app();
        run_step(&mut app);

        let battery = block_id(&app, "battery");
        app.world.send_event(StructureEvent::Placed {
            pos: UVec2::new(12, 9),
            block: battery,
            team: TeamId(2),
            overlay: None,
        });
        run_step(&mut app);

        let index = app.world.resource::<StructureIndex>();
        assert_eq!(
            index.get_enemy(TeamId(1), BlockFlags::BATTERY),
            vec![UVec2::new(12, 9)]
        );
    }

    #[test]
    fn removed_event_clears_tile_and_index() {
        let mut app = build_headless_app();
        run_step(&mut app);

        let battery = block_id(&app, "battery");
        let pos = UVec2::new(3, 3);
        app.world.send_event(StructureEvent::Placed {
            pos,
            block: battery,
            team: TeamId(2),
            overlay: None,
        });
        run_step(&mut app);
        app.world.send_event(StructureEvent::Removed { pos });
        run_step(&mut app);

        let index = app.world.resource::<StructureIndex>();
        assert!(!index.is_block_present(battery));
        assert!(index.get_enemy(TeamId(1), BlockFlags::BATTERY).is_empty());

        let grid = app.world.resource::<WorldGrid>();
        assert_eq!(grid.tile(pos).block, BlockId::AIR);
    }

    #[test]
    fn replacement_is_a_single_transaction() {
        let mut app = build_headless_app();
        run_step(&mut app);

        let battery = block_id(&app, "battery");
        let turret = block_id(&app, "gun-turret");
        let pos = UVec2::new(7, 7);

        app.world.send_event(StructureEvent::Placed {
            pos,
            block: battery,
            team: TeamId(2),
            overlay: None,
        });
        run_step(&mut app);
        app.world.send_event(StructureEvent::Placed {
            pos,
            block: turret,
            team: TeamId(2),
            overlay: None,
        });
        run_step(&mut app);

        let index = app.world.resource::<StructureIndex>();
        assert!(!index.is_block_present(battery));
        assert!(index.is_block_present(turret));
        assert!(index.get_enemy(TeamId(1), BlockFlags::BATTERY).is_empty());
        assert_eq!(
            index.get_enemy(TeamId(1), BlockFlags::TURRET),
            vec![pos]
        );
    }

    #[test]
    fn unregistered_block_placement_is_ignored() {
        let mut app = build_headless_app();
        run_step(&mut app);

        app.world.send_event(StructureEvent::Placed {
            pos: UVec2::new(1, 1),
            block: BlockId(999),
            team: TeamId(1),
            overlay: None,
        });
        run_step(&mut app);

        let grid = app.world.resource::<WorldGrid>();
        assert_eq!(grid.tile(UVec2::new(1, 1)).block, BlockId::AIR);
    }
}
