use bevy::prelude::*;
use gridlife::simulation::files;

use crate::plugins::mouse_position::{MouseCell, cell_to_world};
use crate::plugins::universe::Universe;

pub struct ControlsPlugin;

impl Plugin for ControlsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<InputMode>()
            .init_resource::<Selection>()
            .init_resource::<Stroke>()
            .add_systems(
                Update,
                (
                    keyboard_controls,
                    draw_cells.run_if(resource_equals(InputMode::Draw)),
                    mark_rectangle.run_if(resource_equals(InputMode::Mark)),
                    draw_hover_cursor,
                    draw_selection,
                )
                    .chain(),
            );
    }
}

/// Ticks per generation changed by `PageUp`/`PageDown`.
const SPEED_STEP: u32 = 5;

/// What the left mouse button does.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Click toggles a cell, dragging paints the toggled state.
    #[default]
    Draw,
    /// Drag a rectangle; releasing saves it as RLE.
    Mark,
}

/// Anchor corner of a rectangle being marked.
#[derive(Resource, Default)]
pub struct Selection {
    pub anchor: Option<UVec2>,
}

// State painted by the current drag, decided by the first toggled cell.
#[derive(Resource, Default)]
struct Stroke {
    paint: Option<bool>,
}

fn keyboard_controls(
    keys: Res<ButtonInput<KeyCode>>,
    mut universe: ResMut<Universe>,
    mut mode: ResMut<InputMode>,
    mut selection: ResMut<Selection>,
    mut exit: MessageWriter<AppExit>,
) {
    if keys.just_pressed(KeyCode::Space) {
        universe.simulation.toggle_paused();
        info!("paused: {}", universe.simulation.is_paused());
    }
    if keys.just_pressed(KeyCode::KeyN) {
        universe.simulation.request_step();
    }
    if keys.just_pressed(KeyCode::ArrowUp) {
        universe.simulation.faster();
    }
    if keys.just_pressed(KeyCode::ArrowDown) {
        universe.simulation.slower();
    }
    if keys.just_pressed(KeyCode::PageUp) {
        let ticks = universe.simulation.ticks_per_generation();
        universe
            .simulation
            .set_ticks_per_generation(ticks.saturating_sub(SPEED_STEP));
    }
    if keys.just_pressed(KeyCode::PageDown) {
        let ticks = universe.simulation.ticks_per_generation();
        universe
            .simulation
            .set_ticks_per_generation(ticks + SPEED_STEP);
    }
    if keys.just_pressed(KeyCode::KeyS) {
        // failures are logged by the helper
        let _ = files::save_state_file(&universe.simulation, &universe.output_dir);
    }
    if keys.just_pressed(KeyCode::KeyR) {
        universe.restart();
    }
    if keys.just_pressed(KeyCode::KeyE) {
        universe.show_evolution = !universe.show_evolution;
    }
    if keys.just_pressed(KeyCode::KeyI) && *mode != InputMode::Draw {
        *mode = InputMode::Draw;
        selection.anchor = None;
        info!("draw mode");
    }
    if keys.just_pressed(KeyCode::KeyC) && *mode != InputMode::Mark {
        *mode = InputMode::Mark;
        info!("mark mode");
    }
    if keys.just_pressed(KeyCode::KeyQ) {
        exit.write(AppExit::Success);
    }
}

/// Cells on the line between two grid positions, both ends included.
pub fn line_cells(from: IVec2, to: IVec2) -> Vec<IVec2> {
    let mut cells = Vec::new();
    let (mut x, mut y) = (from.x, from.y);
    let dx = (to.x - from.x).abs();
    let dy = (to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = (if dx > dy { dx } else { -dy }) / 2;

    loop {
        cells.push(IVec2::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let e2 = err;
        if e2 > -dx {
            err -= dy;
            x += sx;
        }
        if e2 < dy {
            err += dx;
            y += sy;
        }
    }
    cells
}

fn draw_cells(
    mut universe: ResMut<Universe>,
    mut stroke: ResMut<Stroke>,
    mouse_cell: Res<MouseCell>,
    buttons: Res<ButtonInput<MouseButton>>,
) {
    if !buttons.pressed(MouseButton::Left) {
        stroke.paint = None;
        return;
    }
    let Some(cur) = mouse_cell.cur else {
        return;
    };

    let Some(paint) = stroke.paint else {
        universe.simulation.toggle_cell(cur.x as usize, cur.y as usize);
        stroke.paint = Some(universe.simulation.grid().is_alive(cur.x as usize, cur.y as usize));
        return;
    };

    let prev = mouse_cell.prev.unwrap_or(cur);
    if prev == cur {
        return;
    }
    for cell in line_cells(prev.as_ivec2(), cur.as_ivec2()).into_iter().skip(1) {
        universe
            .simulation
            .set_cell(cell.x as usize, cell.y as usize, paint);
    }
}

fn mark_rectangle(
    universe: Res<Universe>,
    mut selection: ResMut<Selection>,
    mouse_cell: Res<MouseCell>,
    buttons: Res<ButtonInput<MouseButton>>,
) {
    if buttons.just_pressed(MouseButton::Left) {
        selection.anchor = mouse_cell.cur;
    }
    if !buttons.just_released(MouseButton::Left) {
        return;
    }
    if let (Some(anchor), Some(corner)) = (selection.anchor.take(), mouse_cell.cur) {
        // failures are logged by the helper
        let _ = files::save_rect_file(&universe.simulation, &universe.output_dir, anchor, corner);
    }
}

fn draw_hover_cursor(universe: Res<Universe>, mouse_cell: Res<MouseCell>, mut gizmos: Gizmos) {
    let Some(cell) = mouse_cell.cur else {
        return;
    };
    let (grid, size) = grid_geometry(&universe);
    let center = cell_to_world(cell, grid, size) + Vec2::new(size, -size) / 2.0;
    gizmos.rect_2d(
        Isometry2d::from_translation(center),
        Vec2::splat(size * 0.9),
        Color::srgb(0.5, 0.5, 0.5).with_alpha(0.6),
    );
}

fn draw_selection(
    universe: Res<Universe>,
    selection: Res<Selection>,
    mouse_cell: Res<MouseCell>,
    mut gizmos: Gizmos,
) {
    let (Some(anchor), Some(corner)) = (selection.anchor, mouse_cell.cur) else {
        return;
    };
    let (grid, size) = grid_geometry(&universe);
    let a = cell_to_world(anchor.min(corner), grid, size);
    let b = cell_to_world(anchor.max(corner), grid, size);
    gizmos.rect_2d(
        Isometry2d::from_translation((a + b) / 2.0),
        (b - a).abs(),
        Color::srgb(0.0, 0.8, 0.8),
    );
}

fn grid_geometry(universe: &Universe) -> (UVec2, f32) {
    let grid = UVec2::new(
        universe.simulation.width() as u32,
        universe.simulation.height() as u32,
    );
    (grid, universe.cell_size())
}
