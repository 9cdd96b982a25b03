use bevy::{prelude::*, window::PrimaryWindow};

use crate::plugins::universe::Universe;

pub struct MousePositionPlugin;

impl Plugin for MousePositionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MouseCell>();
        app.add_systems(PreUpdate, update_mouse_cell);
    }
}

/// Grid cell under the cursor, this frame and the previous one.
#[derive(Resource, Default)]
pub struct MouseCell {
    pub prev: Option<UVec2>,
    pub cur: Option<UVec2>,
}

/// The grid is drawn centered on the origin with row 0 at the top.
pub fn world_to_cell(world: Vec2, grid: UVec2, cell_size: f32) -> Option<UVec2> {
    let size = grid.as_vec2();
    let x = (world.x / cell_size + size.x / 2.0).floor();
    let y = (size.y / 2.0 - world.y / cell_size).floor();
    if x < 0.0 || y < 0.0 || x >= size.x || y >= size.y {
        return None;
    }
    Some(UVec2::new(x as u32, y as u32))
}

/// World position of the top-left corner of `cell`.
pub fn cell_to_world(cell: UVec2, grid: UVec2, cell_size: f32) -> Vec2 {
    let size = grid.as_vec2();
    Vec2::new(
        (cell.x as f32 - size.x / 2.0) * cell_size,
        (size.y / 2.0 - cell.y as f32) * cell_size,
    )
}

fn update_mouse_cell(
    mut mouse_cell: ResMut<MouseCell>,
    universe: Res<Universe>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform), With<Camera2d>>,
) {
    let Ok(window) = window_query.single() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };

    let grid = UVec2::new(
        universe.simulation.width() as u32,
        universe.simulation.height() as u32,
    );
    mouse_cell.prev = mouse_cell.cur;
    mouse_cell.cur = window
        .cursor_position()
        .and_then(|pos| camera.viewport_to_world_2d(camera_transform, pos).ok())
        .and_then(|world| world_to_cell(world, grid, universe.cell_size()));
}
