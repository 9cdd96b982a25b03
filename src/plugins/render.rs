use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use gridlife::simulation::AgeClass;
use gridlife::simulation::engine::classify;
use rayon::prelude::*;

use crate::plugins::universe::Universe;

pub struct UniverseRenderPlugin;

impl Plugin for UniverseRenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_universe_layer)
            .add_systems(PostUpdate, render_universe);
    }
}

const COLOR_BACKGROUND: [u8; 4] = [0x18, 0x18, 0x18, 0xff];
const COLOR_ALIVE: [u8; 4] = [0xf0, 0xf0, 0xf0, 0xff];
const COLOR_OLD: [u8; 4] = [0x7f, 0xb8, 0xff, 0xff];
const COLOR_AGE: [[u8; 4]; 4] = [
    [0xc8, 0x3c, 0x28, 0xff],
    [0x8c, 0x32, 0x28, 0xff],
    [0x5a, 0x28, 0x23, 0xff],
    [0x32, 0x20, 0x1e, 0xff],
];

/// One texel per cell, stretched over the grid's world size.
#[derive(Component)]
struct UniverseLayer {
    image: Handle<Image>,
}

pub fn cell_color(class: AgeClass, show_evolution: bool) -> [u8; 4] {
    match class {
        AgeClass::Alive => COLOR_ALIVE,
        AgeClass::Old if show_evolution => COLOR_OLD,
        AgeClass::Old => COLOR_ALIVE,
        _ if !show_evolution => COLOR_BACKGROUND,
        AgeClass::Age1 => COLOR_AGE[0],
        AgeClass::Age2 => COLOR_AGE[1],
        AgeClass::Age3 => COLOR_AGE[2],
        AgeClass::Age4 => COLOR_AGE[3],
        AgeClass::Untouched => COLOR_BACKGROUND,
    }
}

fn grid_image(width: u32, height: u32) -> Image {
    let mut image = Image::new_fill(
        Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &COLOR_BACKGROUND,
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    );
    image.sampler = bevy::image::ImageSampler::nearest();
    image
}

fn setup_universe_layer(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    universe: Res<Universe>,
) {
    let image = images.add(grid_image(
        universe.simulation.width() as u32,
        universe.simulation.height() as u32,
    ));
    commands.spawn((
        Sprite {
            image: image.clone(),
            custom_size: Some(universe.world_size()),
            ..default()
        },
        Transform::default(),
        UniverseLayer { image },
    ));
}

fn render_universe(
    universe: Res<Universe>,
    mut images: ResMut<Assets<Image>>,
    mut q_layer: Query<(&UniverseLayer, &mut Sprite)>,
) {
    if !universe.is_changed() {
        return;
    }
    let Ok((layer, mut sprite)) = q_layer.single_mut() else {
        return;
    };
    let Some(image) = images.get_mut(&layer.image) else {
        return;
    };

    let simulation = &universe.simulation;
    let (width, height) = (simulation.width(), simulation.height());
    if width == 0 || height == 0 {
        return;
    }
    if image.width() != width as u32 || image.height() != height as u32 {
        image.resize(Extent3d {
            width: width as u32,
            height: height as u32,
            depth_or_array_layers: 1,
        });
        sprite.custom_size = Some(universe.world_size());
    }
    let Some(data) = image.data.as_mut() else {
        return;
    };

    let cells = simulation.grid().cells();
    let history = simulation.age_history();
    let generation = simulation.generation();
    let show_evolution = universe.show_evolution;

    data.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, texel) in row.chunks_exact_mut(4).enumerate() {
                let idx = y * width + x;
                let class = classify(cells[idx], generation, history[idx]);
                texel.copy_from_slice(&cell_color(class, show_evolution));
            }
        });
}
