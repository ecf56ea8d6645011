//! Headless host for the flock simulation: settings loading, the tick loop,
//! periodic reporting and snapshot export.

use anyhow::{Context, Result};
use flock_core::{Flock, FlockStats};
use flock_shared::{FlockSettings, PopulationSnapshot};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Read settings from a JSON file; missing fields take their defaults.
pub fn load_settings(path: &Path) -> Result<FlockSettings> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    FlockSettings::from_json(&json)
        .with_context(|| format!("Failed to parse settings in {}", path.display()))
}

/// Command-line values that take precedence over the settings file
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub agent_count: Option<usize>,
    pub seed: Option<u64>,
    pub delta_time: Option<f32>,
}

impl SettingsOverrides {
    pub fn apply(&self, settings: &mut FlockSettings) {
        if let Some(count) = self.agent_count {
            settings.agent_count = count;
        }
        if let Some(seed) = self.seed {
            settings.seed = Some(seed);
        }
        if let Some(delta_time) = self.delta_time {
            settings.delta_time = delta_time;
        }
    }
}

/// Final state of a headless run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub agent_count: usize,
    pub centroid: [f32; 3],
    pub mean_speed: f32,
    pub polarization: f32,
    pub max_center_distance: f32,
    pub elapsed_secs: f64,
}

impl RunSummary {
    fn new(ticks: u64, stats: FlockStats, elapsed_secs: f64) -> Self {
        Self {
            ticks,
            agent_count: stats.agent_count,
            centroid: [stats.centroid.x, stats.centroid.y, stats.centroid.z],
            mean_speed: stats.mean_speed,
            polarization: stats.polarization,
            max_center_distance: stats.max_center_distance,
            elapsed_secs,
        }
    }
}

pub struct FlockRunner {
    flock: Flock,
}

impl FlockRunner {
    pub fn new(settings: &FlockSettings) -> Result<Self> {
        log::info!(
            "Initializing flock of {} agents (seed: {:?})",
            settings.agent_count,
            settings.seed
        );
        let flock = Flock::from_settings(settings).context("Invalid flock settings")?;
        Ok(Self { flock })
    }

    /// Advance `ticks` ticks, logging statistics every `report_every` ticks
    /// (never when zero).
    pub fn run(&mut self, ticks: u64, report_every: u64) -> Result<RunSummary> {
        log::info!("Running {} ticks...", ticks);
        let started = Instant::now();

        for _ in 0..ticks {
            self.flock
                .tick()
                .with_context(|| format!("Tick {} failed", self.flock.ticks() + 1))?;

            let done = self.flock.ticks();
            if report_every > 0 && done % report_every == 0 {
                log::info!("Tick {}: {}", done, self.flock.stats());
            }
        }

        let elapsed = started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            log::info!(
                "Finished {} ticks in {:.3}s ({:.1} ticks/s)",
                ticks,
                elapsed,
                ticks as f64 / elapsed
            );
        }

        Ok(RunSummary::new(self.flock.ticks(), self.flock.stats(), elapsed))
    }

    pub fn snapshot(&self) -> PopulationSnapshot {
        self.flock.snapshot()
    }

    pub fn write_snapshot(&self, path: &Path) -> Result<()> {
        let json = self.snapshot().to_json().context("Failed to encode snapshot")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
        log::info!("Snapshot written to {}", path.display());
        Ok(())
    }
}
