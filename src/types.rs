//! Core simulation types: nodes, edges and colours
//!
//! Nodes live in a contiguous `Vec` owned by the simulation; edges refer to
//! them by index. All quantities are f32 and measured in viewport pixels
//! per frame.

use serde::Serialize;

// =============================================================================
// Default Constants
// =============================================================================

/// Minimum distance used when normalising a spring displacement
pub const SPRING_MIN_DISTANCE: f32 = 0.1;

/// Minimum distance used when normalising a repulsion displacement
pub const REPULSION_MIN_DISTANCE: f32 = 0.5;

/// Pointer pushes are skipped for nodes closer than this to the pointer
pub const POINTER_MIN_DISTANCE: f32 = 0.5;

/// Minimum distance used when normalising an exclusion-zone push
pub const EXCLUSION_MIN_DISTANCE: f32 = 1.0;

/// Smallest rest length an edge may carry
pub const MIN_REST_LENGTH: f32 = SPRING_MIN_DISTANCE;

/// An 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Offset each channel independently, rounding and clamping to 0..=255.
    pub fn jittered(self, dr: f32, dg: f32, db: f32) -> Self {
        fn channel(base: u8, delta: f32) -> u8 {
            (base as f32 + delta).round().clamp(0.0, 255.0) as u8
        }
        Self {
            r: channel(self.r, dr),
            g: channel(self.g, dg),
            b: channel(self.b, db),
        }
    }
}

/// A point mass in the simulation.
///
/// `radius` and `mass` are private so that `mass == radius²` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// Position in viewport space
    pub x: f32,
    pub y: f32,
    /// Velocity in pixels per frame
    pub vx: f32,
    pub vy: f32,
    radius: f32,
    mass: f32,
    /// Base colour
    pub color: Rgb,
    /// Base opacity (0-1)
    pub alpha: f32,
}

impl Node {
    /// Create a resting node at the given position.
    ///
    /// Non-positive or non-finite radii are replaced by the smallest dust
    /// radius so the node always has positive mass.
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        let radius = if radius.is_finite() && radius > 0.0 {
            radius
        } else {
            crate::scene::SizeTier::Dust.radius_range().0
        };
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            radius,
            mass: radius * radius,
            color: Rgb::new(128, 128, 128),
            alpha: 1.0,
        }
    }

    /// Set the initial velocity
    pub fn with_velocity(mut self, vx: f32, vy: f32) -> Self {
        self.vx = vx;
        self.vy = vy;
        self
    }

    /// Set the colour
    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    /// Set the opacity, clamped to 0-1
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn speed(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }

    /// True when position and velocity are all finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.vx.is_finite() && self.vy.is_finite()
    }

    /// Euclidean distance to another node
    pub fn distance_to(&self, other: &Node) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A spring between two nodes, stored as indices into the node array.
///
/// Edges are immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Edge {
    a: usize,
    b: usize,
    rest_length: f32,
    stiffness: f32,
}

impl Edge {
    /// Create an edge. The rest length is floored at [`MIN_REST_LENGTH`].
    ///
    /// Endpoint validity is checked when the edge joins a simulation.
    pub fn new(a: usize, b: usize, rest_length: f32, stiffness: f32) -> Self {
        Self {
            a,
            b,
            rest_length: rest_length.max(MIN_REST_LENGTH),
            stiffness,
        }
    }

    pub fn a(&self) -> usize {
        self.a
    }

    pub fn b(&self) -> usize {
        self.b
    }

    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }

    pub fn stiffness(&self) -> f32 {
        self.stiffness
    }

    /// Endpoints ordered (low, high), identifying the unordered pair
    pub fn key(&self) -> (usize, usize) {
        if self.a < self.b {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        }
    }

    /// Current length of this edge given the node array
    pub fn length(&self, nodes: &[Node]) -> f32 {
        nodes[self.a].distance_to(&nodes[self.b])
    }
}
