use gridlife::simulation::{Grid, LifeConfig, Rule, Simulation};
use rustc_hash::FxHashSet;

fn simulation(width: usize, height: usize, wrap: bool, rule: &str, live: &[(usize, usize)]) -> Simulation {
    let mut grid = Grid::new(width, height, 1, wrap, true);
    for &(x, y) in live {
        grid.set(x, y, true);
    }
    Simulation::from_grid(grid, Rule::parse(rule).unwrap())
}

fn live(sim: &Simulation) -> FxHashSet<(usize, usize)> {
    sim.grid().live_cells()
}

fn set(cells: &[(usize, usize)]) -> FxHashSet<(usize, usize)> {
    cells.iter().copied().collect()
}

#[test]
fn blinker_oscillates_on_bounded_grid() {
    let horizontal = [(0, 1), (1, 1), (2, 1)];
    let vertical = [(1, 0), (1, 1), (1, 2)];
    let mut sim = simulation(3, 3, false, "B3/S23", &horizontal);

    sim.step();
    assert_eq!(live(&sim), set(&vertical));
    sim.step();
    assert_eq!(live(&sim), set(&horizontal));
    assert_eq!(sim.generation(), 2);
}

#[test]
fn blinker_oscillates_on_torus() {
    let horizontal = [(1, 2), (2, 2), (3, 2)];
    let vertical = [(2, 1), (2, 2), (2, 3)];
    let mut sim = simulation(5, 5, true, "B3/S23", &horizontal);

    for _ in 0..3 {
        sim.step();
        assert_eq!(live(&sim), set(&vertical));
        sim.step();
        assert_eq!(live(&sim), set(&horizontal));
    }
}

#[test]
fn tiny_torus_blinker_fills_then_dies() {
    // every cell of a 3x3 torus neighbors all others
    let mut sim = simulation(3, 3, true, "B3/S23", &[(0, 1), (1, 1), (2, 1)]);
    sim.step();
    assert_eq!(sim.population(), 9);
    sim.step();
    assert_eq!(sim.population(), 0);
}

#[test]
fn dead_grid_stays_dead() {
    let mut sim = simulation(16, 9, true, "B3/S23", &[]);
    for _ in 0..5 {
        sim.step();
    }
    assert_eq!(sim.population(), 0);
    assert_eq!(sim.generation(), 5);
    assert!(sim.age_history().iter().all(|&a| a == 0));
}

#[test]
fn glider_travels_diagonally() {
    let glider = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)];
    let at = |dx: usize, dy: usize| -> FxHashSet<(usize, usize)> {
        glider.iter().map(|&(x, y)| (x + dx, y + dy)).collect()
    };
    let start: Vec<_> = at(2, 2).into_iter().collect();
    let mut sim = simulation(12, 12, false, "B3/S23", &start);

    for _ in 0..4 {
        sim.step();
    }
    assert_eq!(live(&sim), at(3, 3));
}

#[test]
fn highlife_births_on_six_neighbors() {
    let ring = [(0, 0), (1, 0), (2, 0), (0, 2), (1, 2), (2, 2)];
    let mut conway = simulation(3, 3, false, "B3/S23", &ring);
    let mut highlife = simulation(3, 3, false, "B36/S23", &ring);
    conway.step();
    highlife.step();
    assert!(!conway.grid().is_alive(1, 1));
    assert!(highlife.grid().is_alive(1, 1));
}

#[test]
fn age_history_records_last_change() {
    let config = LifeConfig::default().size(48, 32).density(3).wrap(true).seed(0x5EED);
    let mut sim = Simulation::new(&config);
    let mut previous = sim.grid().cells().to_vec();

    for generation in 0..12u64 {
        sim.step();
        let current = sim.grid().cells();
        for (idx, (&before, &after)) in previous.iter().zip(current).enumerate() {
            if before != after {
                assert_eq!(sim.age_history()[idx], generation, "cell {idx}");
            } else if generation > 0 {
                assert!(sim.age_history()[idx] < generation, "cell {idx}");
            }
        }
        previous = current.to_vec();
    }
}

#[test]
fn tick_throttles_and_respects_pause() {
    let config = LifeConfig::default()
        .size(10, 10)
        .empty(true)
        .ticks_per_generation(4);
    let mut sim = Simulation::new(&config);

    let ran: Vec<bool> = (0..8).map(|_| sim.tick()).collect();
    assert_eq!(ran, [false, false, false, true, false, false, false, true]);

    sim.set_paused(true);
    for _ in 0..10 {
        assert!(!sim.tick());
    }
    assert_eq!(sim.generation(), 2);

    // a requested step still waits for the throttle
    sim.request_step();
    let ran: Vec<bool> = (0..4).map(|_| sim.tick()).collect();
    assert_eq!(ran, [false, false, false, true]);
    assert!(!sim.tick());
    assert_eq!(sim.generation(), 3);
}

#[test]
fn same_seed_gives_same_world() {
    let config = LifeConfig::default().size(64, 64).density(5).seed(99);
    let a = Simulation::new(&config);
    let b = Simulation::new(&config);
    assert_eq!(a.grid().cells(), b.grid().cells());
    assert!(a.population() > 0);
}
