//! One-time scene generation: clusters, nodes and proximity edges
//!
//! Clusters exist only while seeding. They bias where nodes land and what
//! colour they get, producing organic groupings instead of uniform noise.

use std::collections::HashSet;
use std::f32::consts::TAU;

use rand::Rng;
use thiserror::Error;

use crate::config::{SceneConfig, SimConfig};
use crate::types::{Edge, Node, Rgb};
use crate::viewport::{ExclusionZone, Viewport};

/// Errors raised while building or validating a scene
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Rejection sampling ran out of attempts
    #[error("no free position for {what} outside the exclusion zone after {attempts} attempts")]
    NoFreeSpace { what: &'static str, attempts: u32 },

    /// An edge endpoint does not index a node
    #[error("edge {edge} references node {node}, but only {count} nodes exist")]
    EdgeOutOfRange {
        edge: usize,
        node: usize,
        count: usize,
    },

    /// An edge connects a node to itself
    #[error("edge {edge} connects node {node} to itself")]
    SelfLoop { edge: usize, node: usize },

    /// Two edges share the same unordered pair
    #[error("edge {edge} duplicates the pair ({a}, {b})")]
    DuplicateEdge { edge: usize, a: usize, b: usize },

    /// An edge carries a non-finite or negative spring parameter
    #[error("edge {edge} has an invalid {field}: {value}")]
    InvalidEdge {
        edge: usize,
        field: &'static str,
        value: f32,
    },

    /// A node has a non-finite position or velocity
    #[error("node {node} has a non-finite position or velocity")]
    NonFiniteNode { node: usize },

    /// The configuration failed validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;

/// Base colours, weighted toward blue.
pub const PALETTE: [Rgb; 10] = [
    Rgb::new(50, 100, 190),
    Rgb::new(50, 100, 190),
    Rgb::new(50, 100, 190),
    Rgb::new(170, 55, 55),
    Rgb::new(50, 145, 80),
    Rgb::new(155, 120, 40),
    Rgb::new(120, 60, 155),
    Rgb::new(50, 140, 160),
    Rgb::new(175, 90, 45),
    Rgb::new(155, 50, 110),
];

/// Nodes above this radius are opaque and well connected
pub const HEAVY_RADIUS: f32 = 8.0;

/// Nodes above this radius are moderately opaque and connected
pub const MID_RADIUS: f32 = 3.0;

/// Node size classes and their share of the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTier {
    /// 0.5%
    Hub,
    /// 2.5%
    Major,
    /// 12%
    Medium,
    /// 35%
    Small,
    /// 50%
    Dust,
}

impl SizeTier {
    /// Map a uniform roll in [0, 1) to a tier
    pub fn from_roll(roll: f32) -> Self {
        if roll > 0.995 {
            SizeTier::Hub
        } else if roll > 0.97 {
            SizeTier::Major
        } else if roll > 0.85 {
            SizeTier::Medium
        } else if roll > 0.5 {
            SizeTier::Small
        } else {
            SizeTier::Dust
        }
    }

    /// Radius range `(min, max)` for this tier
    pub fn radius_range(self) -> (f32, f32) {
        match self {
            SizeTier::Hub => (16.0, 28.0),
            SizeTier::Major => (8.0, 16.0),
            SizeTier::Medium => (3.5, 8.0),
            SizeTier::Small => (1.5, 3.5),
            SizeTier::Dust => (0.4, 1.5),
        }
    }
}

/// Opacity range `(min, max)` for a node of the given radius
pub fn alpha_range(radius: f32) -> (f32, f32) {
    if radius > HEAVY_RADIUS {
        (0.65, 0.95)
    } else if radius > MID_RADIUS {
        (0.35, 0.65)
    } else {
        (0.12, 0.32)
    }
}

/// How many nearest neighbours a node of the given radius may link to
pub fn max_connections(radius: f32) -> usize {
    if radius > HEAVY_RADIUS {
        6
    } else if radius > MID_RADIUS {
        3
    } else {
        1
    }
}

/// An initialization-only attractor used to place and colour nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub x: f32,
    pub y: f32,
    pub spread: f32,
    pub color: Rgb,
}

/// Output of seeding
#[derive(Debug, Clone)]
pub struct Scene {
    pub clusters: Vec<Cluster>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Generate clusters, nodes and edges for the configured viewport
pub fn seed<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> SceneResult<Scene> {
    let zone = ExclusionZone::new(config.viewport, &config.zone);
    let clusters = seed_clusters(&config.scene, config.viewport, &zone, rng)?;
    let nodes = seed_nodes(&config.scene, config.viewport, &zone, &clusters, rng)?;
    let edges = build_edges(&nodes, &config.scene, rng);

    tracing::info!(
        clusters = clusters.len(),
        nodes = nodes.len(),
        edges = edges.len(),
        "seeded scene"
    );

    Ok(Scene {
        clusters,
        nodes,
        edges,
    })
}

/// Place cluster seeds inside the viewport inset, outside the padded zone
pub fn seed_clusters<R: Rng + ?Sized>(
    scene: &SceneConfig,
    viewport: Viewport,
    zone: &ExclusionZone,
    rng: &mut R,
) -> SceneResult<Vec<Cluster>> {
    let inset = scene
        .cluster_inset
        .min(viewport.width.min(viewport.height) * 0.25);

    (0..scene.cluster_count)
        .map(|_| {
            let (x, y) = sample_outside(
                zone,
                scene.cluster_zone_padding,
                scene.max_placement_attempts,
                "cluster",
                || {
                    (
                        inset + rng.random::<f32>() * (viewport.width - 2.0 * inset),
                        inset + rng.random::<f32>() * (viewport.height - 2.0 * inset),
                    )
                },
            )?;
            let color = PALETTE[rng.random_range(0..PALETTE.len())];
            let spread = lerp(
                scene.cluster_spread_min,
                scene.cluster_spread_max,
                rng.random(),
            );
            Ok(Cluster {
                x,
                y,
                spread,
                color,
            })
        })
        .collect()
}

/// Create the node population
pub fn seed_nodes<R: Rng + ?Sized>(
    scene: &SceneConfig,
    viewport: Viewport,
    zone: &ExclusionZone,
    clusters: &[Cluster],
    rng: &mut R,
) -> SceneResult<Vec<Node>> {
    let mut nodes = Vec::with_capacity(scene.node_count);

    for _ in 0..scene.node_count {
        let clustered =
            !clusters.is_empty() && rng.random::<f32>() < scene.clustered_probability;

        let (x, y, base) = if clustered {
            let cluster = &clusters[rng.random_range(0..clusters.len())];
            let angle = rng.random::<f32>() * TAU;
            let dist = rng.random::<f32>() * cluster.spread;
            (
                cluster.x + angle.cos() * dist,
                cluster.y + angle.sin() * dist,
                cluster.color,
            )
        } else {
            let (x, y) = sample_outside(
                zone,
                scene.scatter_zone_padding,
                scene.max_placement_attempts,
                "node",
                || {
                    (
                        rng.random::<f32>() * viewport.width,
                        rng.random::<f32>() * viewport.height,
                    )
                },
            )?;
            (x, y, PALETTE[rng.random_range(0..PALETTE.len())])
        };

        let (min_r, max_r) = SizeTier::from_roll(rng.random()).radius_range();
        let radius = lerp(min_r, max_r, rng.random());

        let jitter = scene.color_jitter;
        let color = base.jittered(
            (rng.random::<f32>() - 0.5) * jitter,
            (rng.random::<f32>() - 0.5) * jitter,
            (rng.random::<f32>() - 0.5) * jitter,
        );

        let (min_a, max_a) = alpha_range(radius);
        let alpha = lerp(min_a, max_a, rng.random());

        nodes.push(
            Node::new(x, y, radius)
                .with_color(color)
                .with_alpha(alpha),
        );
    }

    Ok(nodes)
}

/// Connect each node to its nearest neighbours.
///
/// O(n²); only run once at startup.
pub fn build_edges<R: Rng + ?Sized>(nodes: &[Node], scene: &SceneConfig, rng: &mut R) -> Vec<Edge> {
    let mut edges = Vec::new();
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut candidates: Vec<(usize, f32)> = Vec::with_capacity(nodes.len());

    for (i, node) in nodes.iter().enumerate() {
        candidates.clear();
        candidates.extend(
            nodes
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, other)| (j, node.distance_to(other))),
        );
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

        let threshold = scene.edge_base_threshold + node.radius() * scene.edge_radius_factor;

        for &(j, dist) in candidates.iter().take(max_connections(node.radius())) {
            if dist >= threshold {
                continue;
            }
            let key = if i < j { (i, j) } else { (j, i) };
            if !seen.insert(key) {
                continue;
            }
            let rest = dist
                * lerp(
                    scene.rest_length_factor_min,
                    scene.rest_length_factor_max,
                    rng.random(),
                );
            let stiffness = lerp(scene.stiffness_min, scene.stiffness_max, rng.random());
            edges.push(Edge::new(i, j, rest, stiffness));
        }
    }

    edges
}

/// Check that every node has a finite position and velocity
pub fn validate_nodes(nodes: &[Node]) -> SceneResult<()> {
    match nodes.iter().position(|node| !node.is_finite()) {
        Some(node) => Err(SceneError::NonFiniteNode { node }),
        None => Ok(()),
    }
}

/// Check that every edge references live nodes, has distinct endpoints,
/// finite spring parameters and that no unordered pair repeats
pub fn validate_edges(node_count: usize, edges: &[Edge]) -> SceneResult<()> {
    let mut seen = HashSet::with_capacity(edges.len());
    for (index, edge) in edges.iter().enumerate() {
        if !edge.rest_length().is_finite() {
            return Err(SceneError::InvalidEdge {
                edge: index,
                field: "rest_length",
                value: edge.rest_length(),
            });
        }
        if !edge.stiffness().is_finite() || edge.stiffness() < 0.0 {
            return Err(SceneError::InvalidEdge {
                edge: index,
                field: "stiffness",
                value: edge.stiffness(),
            });
        }
        for node in [edge.a(), edge.b()] {
            if node >= node_count {
                return Err(SceneError::EdgeOutOfRange {
                    edge: index,
                    node,
                    count: node_count,
                });
            }
        }
        if edge.a() == edge.b() {
            return Err(SceneError::SelfLoop {
                edge: index,
                node: edge.a(),
            });
        }
        let (a, b) = edge.key();
        if !seen.insert((a, b)) {
            return Err(SceneError::DuplicateEdge { edge: index, a, b });
        }
    }
    Ok(())
}

fn sample_outside(
    zone: &ExclusionZone,
    padding: f32,
    attempts: u32,
    what: &'static str,
    mut sample: impl FnMut() -> (f32, f32),
) -> SceneResult<(f32, f32)> {
    for _ in 0..attempts {
        let (x, y) = sample();
        if !zone.contains(x, y, padding) {
            return Ok((x, y));
        }
    }
    Err(SceneError::NoFreeSpace { what, attempts })
}

fn lerp(min: f32, max: f32, t: f32) -> f32 {
    min + t * (max - min)
}
