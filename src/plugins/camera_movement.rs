use bevy::input::common_conditions::input_just_pressed;
use bevy::{input::mouse::MouseWheel, prelude::*, window::PrimaryWindow};

use crate::plugins::universe::Universe;

pub struct CameraMovementPlugin;

impl Plugin for CameraMovementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraMovementSettings>()
            .init_resource::<CameraMovementState>()
            .add_systems(Startup, spawn_camera)
            .add_systems(
                Update,
                (
                    start_pan,
                    pan_camera,
                    zoom_camera.after(pan_camera),
                    fit_camera.run_if(input_just_pressed(KeyCode::Home)),
                )
                    .in_set(CameraMovementSet),
            );
    }
}

#[derive(Resource, Default)]
struct CameraMovementState {
    panning: bool,
    last_cursor_world_pos: Option<Vec2>,
}

#[derive(Resource)]
pub struct CameraMovementSettings {
    pub zoom_sensitivity: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for CameraMovementSettings {
    fn default() -> Self {
        Self {
            zoom_sensitivity: 0.1,
            min_zoom: 0.05,
            max_zoom: 50.0,
        }
    }
}

#[derive(SystemSet, Hash, Debug, Clone, PartialEq, Eq)]
pub struct CameraMovementSet;

/// Scale at which a `world` sized area fits inside `window`.
pub fn fit_scale(world: Vec2, window: Vec2) -> f32 {
    if window.x <= 0.0 || window.y <= 0.0 {
        return 1.0;
    }
    (world.x / window.x).max(world.y / window.y).max(f32::EPSILON)
}

fn spawn_camera(
    mut commands: Commands,
    universe: Res<Universe>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let scale = windows
        .single()
        .map_or(1.0, |window| fit_scale(universe.world_size(), window.size()));
    commands.spawn((Camera2d, Transform::from_scale(Vec3::splat(scale))));
}

fn fit_camera(
    universe: Res<Universe>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut camera_transform_query: Query<&mut Transform, With<Camera2d>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Ok(mut camera_transform) = camera_transform_query.single_mut() else {
        return;
    };
    camera_transform.translation = Vec3::ZERO;
    camera_transform.scale = Vec3::splat(fit_scale(universe.world_size(), window.size()));
}

fn start_pan(
    mut movement_state: ResMut<CameraMovementState>,
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform), With<Camera2d>>,
) {
    if buttons.just_released(MouseButton::Right) {
        movement_state.panning = false;
        movement_state.last_cursor_world_pos = None;
        return;
    }
    if !buttons.just_pressed(MouseButton::Right) {
        return;
    }

    let Ok(window) = windows.single() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    if let Some(world_pos) = window
        .cursor_position()
        .and_then(|pos| camera.viewport_to_world_2d(camera_transform, pos).ok())
    {
        movement_state.panning = true;
        movement_state.last_cursor_world_pos = Some(world_pos);
    }
}

fn pan_camera(
    movement_state: Res<CameraMovementState>,
    windows: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform), With<Camera2d>>,
    mut camera_transform_query: Query<&mut Transform, With<Camera2d>>,
) {
    if !movement_state.panning {
        return;
    }

    let Ok(window) = windows.single() else {
        return;
    };
    let Ok((camera, camera_global_transform)) = camera_query.single() else {
        return;
    };
    let Ok(mut camera_transform) = camera_transform_query.single_mut() else {
        return;
    };

    if let (Some(cursor_pos), Some(last_cursor_world_pos)) = (
        window.cursor_position(),
        movement_state.last_cursor_world_pos,
    ) && let Ok(current_cursor_world_pos) =
        camera.viewport_to_world_2d(camera_global_transform, cursor_pos)
    {
        // the anchor stays under the cursor while dragging
        let world_delta = last_cursor_world_pos - current_cursor_world_pos;
        camera_transform.translation.x += world_delta.x;
        camera_transform.translation.y += world_delta.y;
    }
}

fn zoom_camera(
    mut scroll_events: MessageReader<MouseWheel>,
    camera_query: Query<(&Camera, &GlobalTransform), With<Camera2d>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut camera_transform_query: Query<&mut Transform, With<Camera2d>>,
    settings: Res<CameraMovementSettings>,
) {
    let Ok((camera, global_transform)) = camera_query.single() else {
        return;
    };
    let Ok(mut camera_transform) = camera_transform_query.single_mut() else {
        return;
    };
    let Ok(window) = windows.single() else {
        return;
    };

    for ev in scroll_events.read() {
        let target_world_pos = window
            .cursor_position()
            .and_then(|cursor_pos| {
                camera
                    .viewport_to_world_2d(global_transform, cursor_pos)
                    .ok()
            })
            .unwrap_or(camera_transform.translation.xy());

        let zoom_factor = 1.0 - (ev.y * settings.zoom_sensitivity);
        let old_scale = camera_transform.scale.x;
        let new_scale = (old_scale * zoom_factor).clamp(settings.min_zoom, settings.max_zoom);

        if (new_scale - old_scale).abs() < f32::EPSILON {
            continue;
        }

        let scale_ratio = new_scale / old_scale;
        camera_transform.scale = Vec3::splat(new_scale);

        let old_translation = camera_transform.translation.xy();
        let new_translation = target_world_pos + (old_translation - target_world_pos) * scale_ratio;
        camera_transform.translation.x = new_translation.x;
        camera_transform.translation.y = new_translation.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_uses_the_tighter_axis() {
        assert_eq!(fit_scale(Vec2::new(4800.0, 3200.0), Vec2::new(1200.0, 800.0)), 4.0);
        assert_eq!(fit_scale(Vec2::new(100.0, 400.0), Vec2::new(200.0, 200.0)), 2.0);
        assert_eq!(fit_scale(Vec2::new(100.0, 100.0), Vec2::ZERO), 1.0);
    }
}
