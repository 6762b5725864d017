use crate::animation::DEFAULT_ARC_RATE;
use crate::camera::ZoomRange;
use crate::catalog::{self, Location};
use crate::settings::Settings;

pub const DEFAULT_POINT_COUNT: usize = 4000;
pub const DEFAULT_RADIUS: f64 = 3.5;

/// Configuration for the globe scene and the generators behind it.
#[derive(Clone, Debug)]
pub struct GlobeConfig {
    pub texture: Option<String>,
    pub point_count: usize,
    pub radius: f64,
    pub seed: u64,
    pub time_step: f32,
    pub arc_rate: f64,
    pub zoom: ZoomRange,
    pub labels: bool,
    pub locations: Vec<Location>,
}

/// Values given on the command line; `None` defers to settings.
#[derive(Clone, Debug, Default)]
pub struct GlobeOverrides {
    pub texture: Option<String>,
    pub point_count: Option<usize>,
    pub radius: Option<f64>,
    pub seed: Option<u64>,
}

impl GlobeConfig {
    /// Command line over settings over built-in defaults.
    pub fn resolve(overrides: GlobeOverrides, settings: &Settings) -> Self {
        let globe = &settings.globe;
        let radius = overrides
            .radius
            .or(globe.radius)
            .filter(|r| *r > 0.0)
            .unwrap_or(DEFAULT_RADIUS);
        Self {
            texture: overrides.texture.or_else(|| globe.texture.clone()),
            point_count: overrides.point_count.or(globe.point_count).unwrap_or(DEFAULT_POINT_COUNT),
            radius,
            seed: resolve_seed(overrides.seed),
            time_step: 0.03,
            arc_rate: globe.arc_rate.filter(|r| *r > 0.0).unwrap_or(DEFAULT_ARC_RATE),
            zoom: ZoomRange::WIDE.for_radius(radius),
            labels: true,
            locations: catalog::merged_locations(&settings.locations),
        }
    }

    /// Switch to the farther camera range of small screens.
    pub fn use_compact_zoom(&mut self) {
        self.zoom = ZoomRange::COMPACT.for_radius(self.radius);
    }

    /// Seed for the arc set, kept apart from the point field stream.
    pub fn arc_seed(&self) -> u64 {
        self.seed.wrapping_add(1)
    }
}

/// The given seed, or one taken from the clock.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    })
}

/// Output format for `points`
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum PointsFormat {
    Json,
    Csv,
    /// Little-endian f32 triples, ready for vertex upload
    F32,
}
