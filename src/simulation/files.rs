use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bevy::log::{info, warn};
use bevy::math::UVec2;

use crate::simulation::engine::Simulation;
use crate::simulation::error::LifeError;
use crate::simulation::pattern::rle;

/// `YYYYMMDDhhmmss` in UTC.
pub fn timestamp(now: SystemTime) -> String {
    let secs = now.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
    let (days, rem) = (secs / 86_400, secs % 86_400);
    let (year, month, day) = civil_from_days(days as i64);
    format!(
        "{year:04}{month:02}{day:02}{:02}{:02}{:02}",
        rem / 3600,
        rem / 60 % 60,
        rem % 60
    )
}

// Days since 1970-01-01 to a proleptic Gregorian date.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

pub fn state_file_name(stamp: &str, generation: u64) -> String {
    format!("dump-{stamp}-{generation}.lif")
}

pub fn rect_file_name(stamp: &str, generation: u64) -> String {
    format!("rect-{stamp}-{generation}.rle")
}

/// Writes the current grid into `dir` as a state file and returns its path.
pub fn save_state_file(simulation: &Simulation, dir: &Path) -> Result<PathBuf, LifeError> {
    let name = state_file_name(&timestamp(SystemTime::now()), simulation.generation());
    let path = dir.join(name);
    match simulation
        .grid()
        .save_state(&path, simulation.rule().definition())
    {
        Ok(()) => {
            info!(
                "saved game state to {} at generation {}",
                path.display(),
                simulation.generation()
            );
            Ok(path)
        }
        Err(err) => {
            warn!("could not save state to {}: {err}", path.display());
            Err(err)
        }
    }
}

/// Writes the rectangle between two corners into `dir` as RLE.
pub fn save_rect_file(
    simulation: &Simulation,
    dir: &Path,
    a: UVec2,
    b: UVec2,
) -> Result<PathBuf, LifeError> {
    let pattern = simulation.extract_rect(a, b).inspect_err(|err| {
        warn!("rectangle {a} to {b} not saved: {err}");
    })?;

    let name = rect_file_name(&timestamp(SystemTime::now()), simulation.generation());
    let path = dir.join(&name);
    fs::write(&path, rle::write(&pattern, Some(&name))).inspect_err(|err| {
        warn!("could not write {}: {err}", path.display());
    })?;

    info!(
        "saved {}x{} rectangle to {}",
        pattern.width(),
        pattern.height(),
        path.display()
    );
    Ok(path)
}
