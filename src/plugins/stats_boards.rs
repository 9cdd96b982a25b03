use std::{collections::BTreeMap, fmt::Display};

use bevy::prelude::*;

use crate::plugins::controls::InputMode;
use crate::plugins::universe::Universe;

#[derive(Resource, Default)]
pub struct StatsBoard {
    data: BTreeMap<String, String>,
}

impl StatsBoard {
    /// Insert or update a stat.
    pub fn insert<V: Display>(&mut self, key: &str, value: V) {
        self.data.insert(key.to_string(), value.to_string());
    }

    pub fn render(&self) -> String {
        use std::fmt::Write;

        if self.data.is_empty() {
            return "No Stats".to_string();
        }
        let mut output = String::new();
        for (key, value) in &self.data {
            let _ = writeln!(output, "{key}: {value}");
        }
        output
    }
}

pub struct StatsBoardPlugin;

impl Plugin for StatsBoardPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StatsBoard>()
            .add_systems(Startup, setup_stats_ui)
            .add_systems(Update, (collect_universe_stats, update_stats_display).chain());
    }
}

#[derive(Component)]
struct StatsText;

fn setup_stats_ui(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Px(10.0),
                left: Val::Px(10.0),
                padding: UiRect::all(Val::Px(10.0)),
                ..default()
            },
            BackgroundColor(Color::BLACK.with_alpha(0.7)),
            GlobalZIndex(100),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Initializing Stats..."),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                StatsText,
            ));
        });
}

fn collect_universe_stats(
    universe: Res<Universe>,
    mode: Res<InputMode>,
    mut stats: ResMut<StatsBoard>,
) {
    let simulation = &universe.simulation;
    // the overlay text only rebuilds when a value actually changed
    let board = stats.bypass_change_detection();
    let before = board.data.clone();

    board.insert("Generation", simulation.generation());
    board.insert("Population", format_metric(simulation.population() as u64));
    board.insert(
        "Speed",
        format!("{} ticks/gen", simulation.ticks_per_generation()),
    );
    board.insert("Rule", simulation.rule());
    board.insert(
        "Mode",
        match (*mode, simulation.is_paused()) {
            (InputMode::Draw, false) => "draw",
            (InputMode::Draw, true) => "draw (paused)",
            (InputMode::Mark, false) => "mark",
            (InputMode::Mark, true) => "mark (paused)",
        },
    );

    if board.data != before {
        stats.set_changed();
    }
}

fn update_stats_display(board: Res<StatsBoard>, mut query: Query<&mut Text, With<StatsText>>) {
    if board.is_changed() {
        for mut text in &mut query {
            **text = board.render();
        }
    }
}

/// Compacts large counts: `1234` becomes `1.23k`.
pub fn format_metric(count: u64) -> String {
    if count < 1_000 {
        return count.to_string();
    }

    let suffixes = ["k", "M", "B", "T", "Q"];
    let mut value = count as f64;
    let mut suffix_idx = 0;
    while value >= 1_000.0 && suffix_idx < suffixes.len() {
        value /= 1_000.0;
        suffix_idx += 1;
    }

    let formatted = format!("{value:.2}");
    let cleaned = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", cleaned, suffixes[suffix_idx - 1])
}
