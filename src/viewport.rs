//! Viewport dimensions and the exclusion zone derived from them

use serde::{Deserialize, Serialize};

/// Default viewport width in pixels
pub const DEFAULT_WIDTH: f32 = 1280.0;

/// Default viewport height in pixels
pub const DEFAULT_HEIGHT: f32 = 800.0;

/// Current drawable area. Positions run from (0, 0) to (width, height).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width * 0.5, self.height * 0.5)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

/// Size of the exclusion zone as fractions of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZoneConfig {
    /// Half-width as a fraction of viewport width
    pub half_width_fraction: f32,
    /// Half-height as a fraction of viewport height
    pub half_height_fraction: f32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            half_width_fraction: 0.2,
            half_height_fraction: 0.28,
        }
    }
}

/// Axis-aligned rectangle centred on the viewport that nodes avoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExclusionZone {
    pub cx: f32,
    pub cy: f32,
    pub half_width: f32,
    pub half_height: f32,
}

impl ExclusionZone {
    pub fn new(viewport: Viewport, config: &ZoneConfig) -> Self {
        let (cx, cy) = viewport.center();
        Self {
            cx,
            cy,
            half_width: viewport.width * config.half_width_fraction,
            half_height: viewport.height * config.half_height_fraction,
        }
    }

    /// Strict containment test with the zone grown by `padding` on every side.
    pub fn contains(&self, x: f32, y: f32, padding: f32) -> bool {
        let hw = self.half_width + padding;
        let hh = self.half_height + padding;
        x > self.cx - hw && x < self.cx + hw && y > self.cy - hh && y < self.cy + hh
    }

    /// Unit direction a node at the exact centre escapes along: toward the
    /// nearer pair of zone edges, in the negative direction.
    pub fn escape_direction(&self) -> (f32, f32) {
        if self.half_height <= self.half_width {
            (0.0, -1.0)
        } else {
            (-1.0, 0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> ExclusionZone {
        ExclusionZone::new(Viewport::new(1000.0, 500.0), &ZoneConfig::default())
    }

    #[test]
    fn zone_geometry_follows_viewport() {
        let zone = zone();
        assert_eq!((zone.cx, zone.cy), (500.0, 250.0));
        assert_eq!(zone.half_width, 200.0);
        assert_eq!(zone.half_height, 140.0);
    }

    #[test]
    fn containment_is_strict() {
        let zone = zone();
        assert!(zone.contains(500.0, 250.0, 0.0));
        assert!(!zone.contains(700.0, 250.0, 0.0));
        assert!(zone.contains(699.0, 250.0, 0.0));
        assert!(!zone.contains(500.0, 110.0, 0.0));
    }

    #[test]
    fn padding_grows_zone() {
        let zone = zone();
        assert!(!zone.contains(710.0, 250.0, 0.0));
        assert!(zone.contains(710.0, 250.0, 25.0));
    }

    #[test]
    fn escape_direction_prefers_shorter_axis() {
        assert_eq!(zone().escape_direction(), (0.0, -1.0));

        let tall = ExclusionZone::new(Viewport::new(400.0, 1000.0), &ZoneConfig::default());
        assert_eq!(tall.escape_direction(), (-1.0, 0.0));
    }
}
