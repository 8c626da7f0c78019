use serde::{Deserialize, Serialize};

/// One stop of the fixed heat gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub threshold: f32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// RGBA color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// The overlay gradient: transparent blue through cyan, green and yellow to
/// opaque red. Thresholds are strictly increasing; alpha never decreases.
pub const HEAT_STOPS: [ColorStop; 6] = [
    ColorStop { threshold: 0.0, r: 0, g: 0, b: 255, a: 0 },
    ColorStop { threshold: 0.2, r: 0, g: 0, b: 255, a: 64 },
    ColorStop { threshold: 0.4, r: 0, g: 255, b: 255, a: 128 },
    ColorStop { threshold: 0.6, r: 0, g: 255, b: 0, a: 176 },
    ColorStop { threshold: 0.8, r: 255, g: 255, b: 0, a: 220 },
    ColorStop { threshold: 1.0, r: 255, g: 0, b: 0, a: 255 },
];

/// Pure intensity-to-color mapping over [`HEAT_STOPS`].
pub struct ColorMapper;

impl ColorMapper {
    /// Maps a normalized intensity to a gradient color by linear
    /// interpolation inside the surrounding stop segment. `map(0.0)` is the
    /// first stop exactly and `map(1.0)` the last.
    pub fn map(t: f32) -> Rgba {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let spans = (HEAT_STOPS.len() - 1) as f32;
        let scaled = t * spans;
        let index = (scaled as usize).min(HEAT_STOPS.len() - 2);
        let fraction = scaled - index as f32;
        let lo = HEAT_STOPS[index];
        let hi = HEAT_STOPS[index + 1];
        Rgba {
            r: lerp(lo.r, hi.r, fraction),
            g: lerp(lo.g, hi.g, fraction),
            b: lerp(lo.b, hi.b, fraction),
            a: lerp(lo.a, hi.a, fraction),
        }
    }
}

fn lerp(lo: u8, hi: u8, fraction: f32) -> u8 {
    (lo as f32 + (hi as f32 - lo as f32) * fraction).round() as u8
}
