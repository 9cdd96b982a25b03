mod plugins;

use std::path::PathBuf;

use anyhow::{Context, bail};
use bevy::{dev_tools::fps_overlay::FpsOverlayPlugin, prelude::*};
use gridlife::simulation::{LifeConfig, Rule};

use crate::plugins::camera_movement::CameraMovementPlugin;
use crate::plugins::controls::ControlsPlugin;
use crate::plugins::mouse_position::MousePositionPlugin;
use crate::plugins::render::UniverseRenderPlugin;
use crate::plugins::stats_boards::StatsBoardPlugin;
use crate::plugins::universe::UniversePlugin;

/// Host ticks per second; a generation takes `ticks_per_generation` of them.
const TICK_RATE: f64 = 60.0;

const USAGE: &str = "usage: gridlife [-W|--width N] [-H|--height N] [-c|--cellsize N] \
[-D|--density N] [-t|--ticks-per-generation N] [-r|--rule B3/S23] \
[-f|--pattern-file FILE] [-l|--load-state FILE] [-w|--wrap-around] [-e|--empty] \
[-p|--paused] [-s|--show-evolution] [--sequential] [--seed N]";

fn parse_args<I>(args: I) -> anyhow::Result<LifeConfig>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut config = LifeConfig::default();
    let (mut width, mut height) = (config.width, config.height);

    fn number<T: std::str::FromStr>(value: Option<String>, flag: &str) -> anyhow::Result<T> {
        let value = value.with_context(|| format!("{flag} requires a value\n{USAGE}"))?;
        value
            .parse()
            .ok()
            .with_context(|| format!("{flag} requires a positive integer, got \"{value}\""))
    }

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-W" | "--width" => width = number(args.next(), &arg)?,
            "-H" | "--height" => height = number(args.next(), &arg)?,
            "-c" | "--cellsize" => config = config.cell_size(number(args.next(), &arg)?),
            "-D" | "--density" => config = config.density(number(args.next(), &arg)?),
            "-t" | "--ticks-per-generation" => {
                config = config.ticks_per_generation(number(args.next(), &arg)?)
            }
            "-r" | "--rule" => {
                let value = args.next().with_context(|| format!("{arg} requires a value"))?;
                let rule = Rule::parse(&value).context("invalid --rule")?;
                config = config.rule(rule);
            }
            "-f" | "--pattern-file" => {
                let value = args.next().with_context(|| format!("{arg} requires a value"))?;
                config = config.pattern_file(value);
            }
            "-l" | "--load-state" => {
                let value = args.next().with_context(|| format!("{arg} requires a value"))?;
                config = config.state_file(value);
            }
            "-w" | "--wrap-around" => config = config.wrap(true),
            "-e" | "--empty" => config = config.empty(true),
            "-p" | "--paused" => config = config.paused(true),
            "-s" | "--show-evolution" => config = config.show_evolution(true),
            "--sequential" => config = config.parallel(false),
            "--seed" => config = config.seed(number(args.next(), &arg)?),
            other => bail!("unknown argument: {other}\n{USAGE}"),
        }
    }

    if width == 0 || height == 0 {
        bail!("grid size must be positive, got {width}x{height}");
    }
    Ok(config.size(width, height))
}

fn main() -> anyhow::Result<()> {
    let config = parse_args(std::env::args().skip(1))?
        .resolve()
        .context("failed to load the initial grid")?;
    let output_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "gridlife".to_string(),
            present_mode: bevy::window::PresentMode::AutoNoVsync,
            ..default()
        }),
        ..default()
    }));

    app.add_plugins(FpsOverlayPlugin::default());
    app.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.05)));
    app.insert_resource(Time::<Fixed>::from_hz(TICK_RATE));

    app.add_plugins(UniversePlugin { config, output_dir });
    app.add_plugins((
        CameraMovementPlugin,
        MousePositionPlugin,
        UniverseRenderPlugin,
        ControlsPlugin,
        StatsBoardPlugin,
    ));

    app.run();
    Ok(())
}
