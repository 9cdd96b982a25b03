use std::path::PathBuf;

use bevy::prelude::*;
use gridlife::simulation::{LifeConfig, Simulation};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Advances the simulation on the fixed timestep.
pub struct UniversePlugin {
    pub config: LifeConfig,
    pub output_dir: PathBuf,
}

impl Plugin for UniversePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Universe::new(self.config.clone(), self.output_dir.clone()))
            .add_systems(FixedUpdate, tick_universe);
    }
}

#[derive(Resource)]
pub struct Universe {
    pub simulation: Simulation,
    pub config: LifeConfig,
    pub show_evolution: bool,
    /// Where `S` and mark mode write their files.
    pub output_dir: PathBuf,
}

impl Universe {
    pub fn new(config: LifeConfig, output_dir: PathBuf) -> Self {
        let simulation = Simulation::new(&config);
        info!(
            "universe {}x{} rule {} wrap {}",
            simulation.width(),
            simulation.height(),
            simulation.rule(),
            config.wrap
        );
        Self {
            simulation,
            show_evolution: config.show_evolution,
            config,
            output_dir,
        }
    }

    /// Rebuilds the grid from the startup configuration.
    pub fn restart(&mut self) {
        match self.config.seed {
            Some(seed) => self
                .simulation
                .reset(&self.config, &mut StdRng::seed_from_u64(seed)),
            None => self.simulation.reset(&self.config, &mut rand::rng()),
        }
        info!("restarted at generation 0");
    }

    pub fn cell_size(&self) -> f32 {
        self.config.cell_size as f32
    }

    /// Size of the whole grid in world units.
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.simulation.width() as f32,
            self.simulation.height() as f32,
        ) * self.cell_size()
    }
}

fn tick_universe(mut universe: ResMut<Universe>) {
    // only a computed generation counts as a change for the renderer
    if universe.bypass_change_detection().simulation.tick() {
        universe.set_changed();
    }
}
