pub mod camera_movement;
pub mod controls;
pub mod mouse_position;
pub mod render;
pub mod stats_boards;
pub mod universe;
