//! Named locations shown on the globe and the arc set built from them.

use crate::arc::ArcCurve;
use crate::geo::GeoCoordinate;
use crossterm::style::Color;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    NorthAmerica,
    SouthAmerica,
    Europe,
    Africa,
    Asia,
}

impl Region {
    pub fn code(self) -> &'static str {
        match self {
            Region::NorthAmerica => "NA",
            Region::SouthAmerica => "SA",
            Region::Europe => "EU",
            Region::Africa => "AF",
            Region::Asia => "AS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(flatten)]
    pub coordinate: GeoCoordinate,
    pub region: Region,
}

impl Location {
    fn builtin(name: &str, lat: f64, lon: f64, region: Region) -> Self {
        Self { name: name.to_string(), coordinate: GeoCoordinate::new(lat, lon), region }
    }
}

/// Three locations per region.
pub fn builtin_locations() -> Vec<Location> {
    use Region::*;
    vec![
        Location::builtin("USA", 37.0902, -95.7129, NorthAmerica),
        Location::builtin("Canada", 56.1304, -106.3468, NorthAmerica),
        Location::builtin("Mexico", 23.6345, -102.5528, NorthAmerica),
        Location::builtin("Brazil", -14.2350, -51.9253, SouthAmerica),
        Location::builtin("Argentina", -38.4161, -63.6167, SouthAmerica),
        Location::builtin("Colombia", 4.5709, -74.2973, SouthAmerica),
        Location::builtin("France", 46.2276, 2.2137, Europe),
        Location::builtin("Germany", 51.1657, 10.4515, Europe),
        Location::builtin("UK", 55.3781, -3.4360, Europe),
        Location::builtin("Nigeria", 9.0820, 8.6753, Africa),
        Location::builtin("South Africa", -30.5595, 22.9375, Africa),
        Location::builtin("Egypt", 26.8206, 30.8025, Africa),
        Location::builtin("China", 35.8617, 104.1954, Asia),
        Location::builtin("India", 20.5937, 78.9629, Asia),
        Location::builtin("Japan", 36.2048, 138.2529, Asia),
    ]
}

/// Built-in locations followed by the valid entries of `extra`.
pub fn merged_locations(extra: &[Location]) -> Vec<Location> {
    let mut locations = builtin_locations();
    for loc in extra {
        if loc.coordinate.is_valid() {
            locations.push(loc.clone());
        } else {
            tracing::warn!(
                name = %loc.name,
                lat = loc.coordinate.latitude,
                lon = loc.coordinate.longitude,
                "ignoring location with out-of-range coordinates"
            );
        }
    }
    locations
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcColor {
    Cyan,
    Gold,
}

impl ArcColor {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            ArcColor::Cyan => (0x00, 0xf3, 0xff),
            ArcColor::Gold => (0xff, 0xd7, 0x00),
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            ArcColor::Cyan => "#00f3ff",
            ArcColor::Gold => "#ffd700",
        }
    }

    /// `alpha` blends toward black, standing in for translucency.
    pub fn color(self, alpha: f32) -> Color {
        let (r, g, b) = self.rgb();
        let scale = |c: u8| (c as f32 * alpha.clamp(0.0, 1.0)).round() as u8;
        Color::Rgb { r: scale(r), g: scale(g), b: scale(b) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arc {
    pub from: String,
    pub to: String,
    pub start: GeoCoordinate,
    pub end: GeoCoordinate,
    pub color: ArcColor,
    pub phase_offset: f64,
}

impl Arc {
    pub fn curve(&self, radius: f64) -> ArcCurve {
        ArcCurve::build(self.start, self.end, radius)
    }
}

/// One arc per location toward a different, randomly chosen location.
/// Colors alternate and each arc gets a phase offset in [0, 1).
pub fn build_arcs<R: Rng + ?Sized>(locations: &[Location], rng: &mut R) -> Vec<Arc> {
    if locations.len() < 2 {
        return Vec::new();
    }

    locations
        .iter()
        .enumerate()
        .map(|(i, origin)| {
            // Draw from the other n-1 entries
            let mut j = rng.gen_range(0..locations.len() - 1);
            if j >= i {
                j += 1;
            }
            let target = &locations[j];
            let color = if i % 2 == 0 { ArcColor::Cyan } else { ArcColor::Gold };
            let phase_offset = rng.gen_range(0.0..1.0);

            tracing::debug!(from = %origin.name, to = %target.name, phase_offset, "arc");

            Arc {
                from: origin.name.clone(),
                to: target.name.clone(),
                start: origin.coordinate,
                end: target.coordinate,
                color,
                phase_offset,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let locations = builtin_locations();
        assert_eq!(locations.len(), 15);
        assert!(locations.iter().all(|l| l.coordinate.is_valid()));
        for region in [Region::NorthAmerica, Region::SouthAmerica, Region::Europe, Region::Africa, Region::Asia] {
            assert_eq!(locations.iter().filter(|l| l.region == region).count(), 3);
        }
    }

    #[test]
    fn test_merge_drops_invalid_locations() {
        let extra = vec![
            Location::builtin("Kenya", -0.02, 37.9, Region::Africa),
            Location::builtin("Nowhere", 123.0, 0.0, Region::Asia),
        ];
        let merged = merged_locations(&extra);
        assert_eq!(merged.len(), 16);
        assert_eq!(merged.last().map(|l| l.name.as_str()), Some("Kenya"));
    }

    #[test]
    fn test_arcs_never_point_at_their_origin() {
        let locations = builtin_locations();
        for seed in 0..20 {
            let arcs = build_arcs(&locations, &mut StdRng::seed_from_u64(seed));
            assert_eq!(arcs.len(), locations.len());
            for (arc, loc) in arcs.iter().zip(&locations) {
                assert_eq!(arc.from, loc.name);
                assert_ne!(arc.from, arc.to);
                assert!((0.0..1.0).contains(&arc.phase_offset));
            }
        }
    }

    #[test]
    fn test_arc_colors_alternate() {
        let arcs = build_arcs(&builtin_locations(), &mut StdRng::seed_from_u64(4));
        assert_eq!(arcs[0].color, ArcColor::Cyan);
        assert_eq!(arcs[1].color, ArcColor::Gold);
        assert_eq!(arcs[2].color, ArcColor::Cyan);
    }

    #[test]
    fn test_too_few_locations_yield_no_arcs() {
        let one = vec![Location::builtin("Solo", 0.0, 0.0, Region::Europe)];
        assert!(build_arcs(&one, &mut StdRng::seed_from_u64(1)).is_empty());
    }

    #[test]
    fn test_same_seed_same_arcs() {
        let locations = builtin_locations();
        let a = build_arcs(&locations, &mut StdRng::seed_from_u64(11));
        let b = build_arcs(&locations, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }

    #[test]
    fn test_location_toml_shape() {
        let loc: Location = toml::from_str("name = \"Kenya\"\nlat = -0.02\nlon = 37.9\nregion = \"africa\"\n").unwrap();
        assert_eq!(loc.region, Region::Africa);
        assert_eq!(loc.coordinate, GeoCoordinate::new(-0.02, 37.9));
    }

    #[test]
    fn test_translucent_color_darkens() {
        assert_eq!(ArcColor::Gold.color(1.0), Color::Rgb { r: 255, g: 215, b: 0 });
        assert_eq!(ArcColor::Cyan.color(0.0), Color::Rgb { r: 0, g: 0, b: 0 });
    }
}
