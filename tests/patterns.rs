use std::fs;
use std::path::PathBuf;

use bevy::math::UVec2;
use gridlife::simulation::files::{save_rect_file, save_state_file};
use gridlife::simulation::pattern::{lif, load_pattern, rle};
use gridlife::simulation::{
    GeometryError, Grid, LifeConfig, LifeError, PatternError, Rule, Simulation,
};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gridlife-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn simulation(width: usize, height: usize, rule: &str, live: &[(usize, usize)]) -> Simulation {
    let mut grid = Grid::new(width, height, 1, false, true);
    for &(x, y) in live {
        grid.set(x, y, true);
    }
    Simulation::from_grid(grid, Rule::parse(rule).unwrap())
}

#[test]
fn extracted_rectangle_survives_rle() {
    let sim = simulation(20, 12, "B36/S23", &[(3, 3), (4, 4), (5, 4), (9, 7), (12, 8)]);
    let pattern = sim.extract_rect(UVec2::new(13, 9), UVec2::new(2, 2)).unwrap();
    assert_eq!((pattern.width(), pattern.height()), (11, 7));

    let text = rle::write(&pattern, Some("selection"));
    assert!(text.starts_with("#N selection\nx = 11, y = 7, rule = B36/S23\n"));
    assert_eq!(rle::parse(&text).unwrap(), pattern);
}

#[test]
fn rectangle_file_has_name_and_rule() {
    let dir = scratch_dir("rect");
    let sim = simulation(8, 8, "B3/S23", &[(1, 1), (2, 1), (3, 1)]);

    let path = save_rect_file(&sim, &dir, UVec2::new(0, 0), UVec2::new(5, 3)).unwrap();
    let name = path.file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("rect-") && name.ends_with("-0.rle"), "{name}");

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().next(), Some(format!("#N {name}").as_str()));
    let pattern = rle::parse(&text).unwrap();
    assert_eq!(pattern.rule(), Some("B3/S23"));
    assert_eq!(pattern.population(), 3);
}

#[test]
fn degenerate_rectangle_is_not_written() {
    let dir = scratch_dir("degenerate");
    let sim = simulation(8, 8, "B3/S23", &[]);
    let err = save_rect_file(&sim, &dir, UVec2::new(4, 1), UVec2::new(4, 6)).unwrap_err();
    assert!(matches!(err, LifeError::Geometry(GeometryError::Degenerate)));
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
}

#[test]
fn state_file_restores_grid_and_rule() {
    let dir = scratch_dir("state");
    let mut sim = simulation(9, 5, "B36/S23", &[(1, 2), (2, 2), (3, 2), (8, 4)]);
    sim.step();

    let path = save_state_file(&sim, &dir).unwrap();
    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("dump-") && name.ends_with("-1.lif"), "{name}");
    assert!(fs::read_to_string(&path).unwrap().starts_with(lif::LIFE_MARKER));

    let (grid, rule) = Grid::load_state(&path, false).unwrap();
    assert_eq!(rule.as_deref(), Some("B36/S23"));
    assert_eq!(grid.cells(), sim.grid().cells());
}

#[test]
fn config_resumes_from_legacy_state() {
    let dir = scratch_dir("legacy");
    let path = dir.join("old.txt");
    fs::write(&path, "0100\n0010\n1110\n").unwrap();

    let config = LifeConfig::default().state_file(&path).resolve().unwrap();
    assert_eq!((config.width, config.height), (4, 3));
    let sim = Simulation::new(&config);
    assert_eq!(sim.population(), 5);
    assert!(sim.grid().is_alive(1, 0));
}

#[test]
fn config_centers_pattern_and_adopts_rule() {
    let dir = scratch_dir("pattern");
    let path = dir.join("glider.rle");
    fs::write(&path, "#N glider\nx = 3, y = 3, rule = B36/S23\nbob$2bo$3o!\n").unwrap();

    let config = LifeConfig::default()
        .size(10, 10)
        .pattern_file(&path)
        .resolve()
        .unwrap();
    assert!(config.empty);
    assert_eq!(config.rule.definition(), "B36/S23");

    let sim = Simulation::new(&config);
    assert_eq!(sim.population(), 5);
    // 3x3 pattern centered at (5 - 1, 5 - 1)
    assert!(sim.grid().is_alive(5, 4));
    assert!(sim.grid().is_alive(6, 5));
    assert!(sim.grid().is_alive(4, 6));
}

#[test]
fn oversized_pattern_doubles_grid() {
    let dir = scratch_dir("oversized");
    let path = dir.join("line.lif");
    fs::write(&path, "#Life 1.05\noooooooo\n").unwrap();

    let config = LifeConfig::default()
        .size(5, 5)
        .pattern_file(&path)
        .resolve()
        .unwrap();
    assert_eq!((config.width, config.height), (16, 2));
    assert_eq!(Simulation::new(&config).population(), 8);
}

#[test]
fn malformed_files_report_their_cause() {
    let dir = scratch_dir("malformed");
    let short_row = dir.join("short.rle");
    fs::write(&short_row, "x = 3, y = 2\nbo$3o!\n").unwrap();
    assert!(matches!(
        load_pattern(&short_row),
        Err(LifeError::Pattern(PatternError::RowWidth { row: 0, .. }))
    ));

    assert!(matches!(
        load_pattern(&dir.join("missing.rle")),
        Err(LifeError::Io(_))
    ));
}
