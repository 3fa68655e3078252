//! Maze catalog and world-space geometry.
//!
//! A layout is a fixed 15x15 occupancy grid; walls, start and goal are
//! derived into world coordinates once per selection and are read-only for
//! the lifetime of a round. The catalog index is the only thing that crosses
//! the wire: both sides of the replication boundary rebuild identical
//! geometry from it.

use crate::config::GameConfig;
use crate::vec3::{vec3, Vec3};

/// Cells per maze side
pub const GRID_SIZE: usize = 15;

pub const CELL_EMPTY: u8 = 0;
pub const CELL_WALL: u8 = 1;
pub const CELL_GOAL: u8 = 2;

/// One entry of the fixed layout catalog.
pub struct MazeLayout {
    pub grid: [[u8; GRID_SIZE]; GRID_SIZE],
    pub start: (usize, usize),
    pub goal: (usize, usize),
}

/// Axis-aligned wall volume on the maze floor.
#[derive(Debug, Clone)]
pub struct Wall {
    pub center: Vec3,
    pub half_x: f64,
    pub half_z: f64,
}

/// World-space maze geometry derived from one catalog entry.
#[derive(Debug, Clone)]
pub struct Maze {
    /// Index into the layout catalog
    pub index: u32,
    pub walls: Vec<Wall>,
    /// Spawn position (y already at ball height)
    pub start_world: Vec3,
    /// Goal reference point; only its horizontal components are meaningful
    pub goal_world: Vec3,
    /// Half the world-space side length of the maze floor
    pub half_size: f64,
}

/// World coordinate of a grid index along one axis.
pub fn cell_to_world(index: usize, config: &GameConfig) -> f64 {
    (index as f64 - GRID_SIZE as f64 / 2.0) * config.cell_size
}

impl Maze {
    /// Build world geometry for catalog entry `index` (wrapped into range).
    pub fn from_catalog(index: u32, config: &GameConfig) -> Self {
        let layouts = catalog();
        let index = index % layouts.len() as u32;
        let layout = &layouts[index as usize];

        let half_cell = config.cell_size / 2.0;
        let mut walls = Vec::new();
        for (x, row) in layout.grid.iter().enumerate() {
            for (z, cell) in row.iter().enumerate() {
                if *cell == CELL_WALL {
                    walls.push(Wall {
                        center: vec3(
                            cell_to_world(x, config),
                            config.wall_height / 2.0,
                            cell_to_world(z, config),
                        ),
                        half_x: half_cell,
                        half_z: half_cell,
                    });
                }
            }
        }

        let start_world = vec3(
            cell_to_world(layout.start.0, config),
            config.ball_height,
            cell_to_world(layout.start.1, config),
        );
        let goal_world = vec3(
            cell_to_world(layout.goal.0, config),
            0.0,
            cell_to_world(layout.goal.1, config),
        );

        Self {
            index,
            walls,
            start_world,
            goal_world,
            half_size: GRID_SIZE as f64 * config.cell_size / 2.0,
        }
    }
}

/// The fixed layout catalog. All entries share start (1,1) and goal (13,13).
pub fn catalog() -> &'static [MazeLayout] {
    &LAYOUTS
}

static LAYOUTS: [MazeLayout; 3] = [
    // Branching maze with dead ends
    MazeLayout {
        grid: [
            [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
            [1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 1, 0, 0, 0, 1],
            [1, 1, 1, 0, 1, 1, 1, 0, 1, 0, 1, 1, 1, 0, 1],
            [1, 0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 1, 0, 1],
            [1, 0, 1, 1, 1, 0, 1, 0, 1, 1, 1, 0, 1, 0, 1],
            [1, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 1, 0, 1],
            [1, 0, 1, 1, 1, 1, 1, 1, 1, 0, 1, 0, 1, 0, 1],
            [1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 1],
            [1, 1, 1, 1, 1, 1, 1, 0, 1, 0, 1, 1, 1, 0, 1],
            [1, 0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 1, 0, 1],
            [1, 0, 1, 1, 1, 0, 1, 0, 1, 1, 1, 0, 1, 0, 1],
            [1, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 1, 0, 1],
            [1, 0, 1, 1, 1, 1, 1, 0, 1, 0, 1, 0, 1, 0, 1],
            [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 1],
            [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
        ],
        start: (1, 1),
        goal: (13, 13),
    },
    // Row serpentine: long sweeps with alternating end gaps
    MazeLayout {
        grid: [
            [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
            [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
            [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 1],
            [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
            [1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
            [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
            [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 1],
            [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
            [1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
            [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
            [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 1],
            [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
            [1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
            [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 1],
            [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
        ],
        start: (1, 1),
        goal: (13, 13),
    },
    // Column serpentine: vertical baffles with alternating end gaps
    MazeLayout {
        grid: [
            [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
            [1, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1],
            [1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
            [1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
            [1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
            [1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
            [1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
            [1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
            [1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
            [1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
            [1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
            [1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
            [1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
            [1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 2, 1],
            [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
        ],
        start: (1, 1),
        goal: (13, 13),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3::horizontal_distance;

    #[test]
    fn catalog_has_multiple_layouts() {
        assert!(catalog().len() >= 2);
    }

    #[test]
    fn every_layout_has_closed_border() {
        for (i, layout) in catalog().iter().enumerate() {
            for k in 0..GRID_SIZE {
                assert_eq!(layout.grid[0][k], CELL_WALL, "layout {} top border", i);
                assert_eq!(
                    layout.grid[GRID_SIZE - 1][k],
                    CELL_WALL,
                    "layout {} bottom border",
                    i
                );
                assert_eq!(layout.grid[k][0], CELL_WALL, "layout {} left border", i);
                assert_eq!(
                    layout.grid[k][GRID_SIZE - 1],
                    CELL_WALL,
                    "layout {} right border",
                    i
                );
            }
        }
    }

    #[test]
    fn start_cell_is_open_and_goal_cell_is_marked() {
        for (i, layout) in catalog().iter().enumerate() {
            let (sx, sz) = layout.start;
            let (gx, gz) = layout.goal;
            assert_eq!(layout.grid[sx][sz], CELL_EMPTY, "layout {} start", i);
            assert_eq!(layout.grid[gx][gz], CELL_GOAL, "layout {} goal", i);
        }
    }

    #[test]
    fn every_layout_is_solvable() {
        // Flood fill over non-wall cells from the start.
        for (i, layout) in catalog().iter().enumerate() {
            let mut seen = [[false; GRID_SIZE]; GRID_SIZE];
            let mut stack = vec![layout.start];
            seen[layout.start.0][layout.start.1] = true;
            while let Some((x, z)) = stack.pop() {
                for (nx, nz) in [
                    (x.wrapping_sub(1), z),
                    (x + 1, z),
                    (x, z.wrapping_sub(1)),
                    (x, z + 1),
                ] {
                    if nx < GRID_SIZE
                        && nz < GRID_SIZE
                        && !seen[nx][nz]
                        && layout.grid[nx][nz] != CELL_WALL
                    {
                        seen[nx][nz] = true;
                        stack.push((nx, nz));
                    }
                }
            }
            assert!(
                seen[layout.goal.0][layout.goal.1],
                "layout {} goal unreachable",
                i
            );
        }
    }

    #[test]
    fn cell_to_world_matches_grid_scaling() {
        let config = GameConfig::default();
        // (index - 7.5) * 4.0
        assert_eq!(cell_to_world(1, &config), -26.0);
        assert_eq!(cell_to_world(13, &config), 22.0);
    }

    #[test]
    fn derived_geometry_uses_world_coordinates() {
        let config = GameConfig::default();
        let maze = Maze::from_catalog(0, &config);
        assert_eq!(maze.start_world.x, -26.0);
        assert_eq!(maze.start_world.z, -26.0);
        assert_eq!(maze.start_world.y, config.ball_height);
        assert_eq!(maze.goal_world.x, 22.0);
        assert_eq!(maze.goal_world.z, 22.0);
        assert_eq!(maze.half_size, 30.0);
        assert!(!maze.walls.is_empty());
    }

    #[test]
    fn start_to_goal_distance_is_scaled_euclidean() {
        let config = GameConfig::default();
        let maze = Maze::from_catalog(0, &config);
        let expected = (2.0 * (48.0f64 * 48.0)).sqrt();
        let actual = horizontal_distance(maze.start_world, maze.goal_world);
        assert!((actual - expected).abs() < 1e-9);
    }

    #[test]
    fn wall_count_matches_grid() {
        let config = GameConfig::default();
        for (i, layout) in catalog().iter().enumerate() {
            let expected = layout
                .grid
                .iter()
                .flatten()
                .filter(|c| **c == CELL_WALL)
                .count();
            let maze = Maze::from_catalog(i as u32, &config);
            assert_eq!(maze.walls.len(), expected, "layout {}", i);
        }
    }

    #[test]
    fn out_of_range_index_wraps() {
        let config = GameConfig::default();
        let maze = Maze::from_catalog(catalog().len() as u32 + 1, &config);
        assert_eq!(maze.index, 1);
    }
}
