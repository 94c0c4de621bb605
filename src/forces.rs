//! Force engine
//!
//! Forces only ever add to node velocities; positions are left to the
//! integrator. Each frame accumulates, in order:
//!
//! 1. **Springs** along every edge, weighted so heavier nodes move less
//! 2. **Repulsion** between nearby pairs found through the spatial grid
//! 3. **Flow**: a smooth, time-varying ambient current
//! 4. **Pointer** push away from an active pointer
//! 5. **Exclusion** push out of the zone at the centre of the viewport
//! 6. **Centering**: a very weak pull toward the viewport centre
//!
//! Every displacement is normalised only after a minimum-distance guard, so
//! coincident nodes never produce NaN or infinite velocities.

use crate::config::{FlowConfig, ForceConfig};
use crate::io::PointerState;
use crate::spatial::SpatialGrid;
use crate::types::{
    EXCLUSION_MIN_DISTANCE, Edge, Node, POINTER_MIN_DISTANCE, REPULSION_MIN_DISTANCE,
    SPRING_MIN_DISTANCE,
};
use crate::viewport::{ExclusionZone, Viewport};

/// Per-frame inputs shared by the per-node forces
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    /// Simulation time in frames
    pub time: f64,
    /// Step size in frames; every velocity increment is scaled by it
    pub dt: f32,
    pub viewport: Viewport,
    pub zone: ExclusionZone,
    pub pointer: PointerState,
}

/// Accumulates all forces for a frame, reusing its neighbour buffer.
#[derive(Debug, Default)]
pub struct ForceEngine {
    neighbors: Vec<usize>,
}

impl ForceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every enabled force for this frame to node velocities.
    ///
    /// `grid` must have been rebuilt from the current positions.
    pub fn accumulate(
        &mut self,
        nodes: &mut [Node],
        edges: &[Edge],
        grid: &SpatialGrid,
        config: &ForceConfig,
        ctx: &FrameContext,
    ) {
        let enabled = config.enabled;

        if enabled.springs {
            spring_forces(nodes, edges, config, ctx.dt);
        }

        for i in 0..nodes.len() {
            if enabled.repulsion {
                repulse_node(nodes, i, grid, config, ctx.dt, &mut self.neighbors);
            }

            let (x, y) = (nodes[i].x, nodes[i].y);
            let mut fx = 0.0;
            let mut fy = 0.0;

            if enabled.flow {
                let (dx, dy) = flow_at(x, y, ctx.time, &config.flow);
                fx += dx;
                fy += dy;
            }
            if enabled.pointer {
                let (dx, dy) = pointer_push(x, y, &ctx.pointer, config);
                fx += dx;
                fy += dy;
            }
            if enabled.exclusion {
                let (dx, dy) = exclusion_push(x, y, &ctx.zone, config);
                fx += dx;
                fy += dy;
            }
            if enabled.centering {
                let (dx, dy) = centering_pull(x, y, ctx.viewport, config);
                fx += dx;
                fy += dy;
            }

            nodes[i].vx += fx * ctx.dt;
            nodes[i].vy += fy * ctx.dt;
        }
    }
}

/// Unit vector along (dx, dy), or `fallback` when the length is ~zero
fn direction(dx: f32, dy: f32, len: f32, fallback: (f32, f32)) -> (f32, f32) {
    if len > f32::EPSILON {
        (dx / len, dy / len)
    } else {
        fallback
    }
}

/// Hooke springs along every edge.
///
/// Force is `(length - rest) * stiffness`, pulling the endpoints together
/// when stretched and apart when compressed. Each endpoint's share is divided
/// by `1 + mass * spring_mass_factor`.
pub fn spring_forces(nodes: &mut [Node], edges: &[Edge], config: &ForceConfig, dt: f32) {
    for edge in edges {
        let (a, b) = (edge.a(), edge.b());
        let dx = nodes[b].x - nodes[a].x;
        let dy = nodes[b].y - nodes[a].y;
        let len = (dx * dx + dy * dy).sqrt();
        let dist = len.max(SPRING_MIN_DISTANCE);

        let force = (dist - edge.rest_length()) * edge.stiffness() * dt;
        let (ux, uy) = direction(dx, dy, len, (1.0, 0.0));
        let fx = ux * force;
        let fy = uy * force;

        let weight_a = 1.0 + nodes[a].mass() * config.spring_mass_factor;
        let weight_b = 1.0 + nodes[b].mass() * config.spring_mass_factor;

        nodes[a].vx += fx / weight_a;
        nodes[a].vy += fy / weight_a;
        nodes[b].vx -= fx / weight_b;
        nodes[b].vy -= fy / weight_b;
    }
}

/// Minimum separation below which two nodes repel
pub fn min_separation(a: &Node, b: &Node, config: &ForceConfig) -> f32 {
    (a.radius() + b.radius()) * config.repulsion_radius_scale + config.repulsion_padding
}

/// Repel node `i` from grid neighbours with a higher index.
///
/// Each unordered pair is handled once, by its lower index, and receives
/// equal and opposite deltas. Coincident pairs separate along the x axis.
pub fn repulse_node(
    nodes: &mut [Node],
    i: usize,
    grid: &SpatialGrid,
    config: &ForceConfig,
    dt: f32,
    neighbors: &mut Vec<usize>,
) {
    neighbors.clear();
    grid.query_into(nodes[i].x, nodes[i].y, neighbors);

    for &j in neighbors.iter() {
        if j <= i {
            continue;
        }
        let dx = nodes[i].x - nodes[j].x;
        let dy = nodes[i].y - nodes[j].y;
        let len = (dx * dx + dy * dy).sqrt();
        let dist = len.max(REPULSION_MIN_DISTANCE);
        let min_dist = min_separation(&nodes[i], &nodes[j], config);

        if dist < min_dist {
            let force = (min_dist - dist) / min_dist * config.repulsion_strength * dt;
            let (ux, uy) = direction(dx, dy, len, (1.0, 0.0));
            let fx = ux * force;
            let fy = uy * force;

            nodes[i].vx += fx;
            nodes[i].vy += fy;
            nodes[j].vx -= fx;
            nodes[j].vy -= fy;
        }
    }
}

/// Short-range repulsion for every node
pub fn repulsion_forces(nodes: &mut [Node], grid: &SpatialGrid, config: &ForceConfig, dt: f32) {
    let mut neighbors = Vec::new();
    for i in 0..nodes.len() {
        repulse_node(nodes, i, grid, config, dt, &mut neighbors);
    }
}

/// Ambient flow vector at a point and time.
///
/// A pure function: products of sines and cosines with phase-shifted time
/// terms, giving slowly drifting currents.
pub fn flow_at(x: f32, y: f32, time: f64, flow: &FlowConfig) -> (f32, f32) {
    let s = flow.scale;
    // Scale in f64 so long runs keep a time-varying phase
    let t = (time * f64::from(flow.time_scale)) as f32;
    let fx = (x * s + t).sin() * (y * s * 0.7 + t * 1.3).cos() * flow.strength;
    let fy = (x * s * 0.8 + t * 0.9).cos() * (y * s + t * 1.1).sin() * flow.strength;
    (fx, fy)
}

/// Push away from the pointer, falling off linearly to zero at the radius
pub fn pointer_push(x: f32, y: f32, pointer: &PointerState, config: &ForceConfig) -> (f32, f32) {
    if !pointer.active {
        return (0.0, 0.0);
    }
    let dx = x - pointer.x;
    let dy = y - pointer.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len >= config.pointer_radius || len <= POINTER_MIN_DISTANCE {
        return (0.0, 0.0);
    }
    let f = (1.0 - len / config.pointer_radius) * config.pointer_strength;
    (dx / len * f, dy / len * f)
}

/// Fixed-magnitude push radially out of the padded exclusion zone.
///
/// Nodes within [`EXCLUSION_MIN_DISTANCE`] of the centre escape along
/// [`ExclusionZone::escape_direction`].
pub fn exclusion_push(x: f32, y: f32, zone: &ExclusionZone, config: &ForceConfig) -> (f32, f32) {
    if !zone.contains(x, y, config.exclusion_padding) {
        return (0.0, 0.0);
    }
    let dx = x - zone.cx;
    let dy = y - zone.cy;
    let len = (dx * dx + dy * dy).sqrt();
    let (ux, uy) = if len < EXCLUSION_MIN_DISTANCE {
        zone.escape_direction()
    } else {
        (dx / len, dy / len)
    };
    (ux * config.exclusion_strength, uy * config.exclusion_strength)
}

/// Weak pull toward the viewport centre, proportional to displacement
pub fn centering_pull(x: f32, y: f32, viewport: Viewport, config: &ForceConfig) -> (f32, f32) {
    let (cx, cy) = viewport.center();
    (
        (cx - x) * config.centering_strength,
        (cy - y) * config.centering_strength,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnabledForces;
    use crate::viewport::ZoneConfig;

    fn config_with(enabled: EnabledForces) -> ForceConfig {
        ForceConfig {
            enabled,
            ..ForceConfig::default()
        }
    }

    fn grid_for(nodes: &[Node]) -> SpatialGrid {
        let mut grid = SpatialGrid::default();
        grid.rebuild(nodes);
        grid
    }

    fn context(pointer: PointerState) -> FrameContext {
        let viewport = Viewport::new(1000.0, 800.0);
        FrameContext {
            time: 1.0,
            dt: 1.0,
            viewport,
            zone: ExclusionZone::new(viewport, &ZoneConfig::default()),
            pointer,
        }
    }

    #[test]
    fn stretched_spring_pulls_endpoints_together() {
        let mut nodes = vec![Node::new(0.0, 0.0, 1.0), Node::new(100.0, 0.0, 1.0)];
        let edges = vec![Edge::new(0, 1, 50.0, 0.001)];
        spring_forces(&mut nodes, &edges, &ForceConfig::default(), 1.0);

        assert!(nodes[0].vx > 0.0);
        assert!(nodes[1].vx < 0.0);
        assert_eq!(nodes[0].vy, 0.0);
        // (100 - 50) * 0.001 / (1 + 1 * 0.01)
        assert!((nodes[0].vx - 0.05 / 1.01).abs() < 1e-6);
    }

    #[test]
    fn heavier_endpoint_moves_less() {
        let mut nodes = vec![Node::new(0.0, 0.0, 1.0), Node::new(100.0, 0.0, 20.0)];
        let edges = vec![Edge::new(0, 1, 50.0, 0.001)];
        spring_forces(&mut nodes, &edges, &ForceConfig::default(), 1.0);

        assert!(nodes[0].vx.abs() > nodes[1].vx.abs());
    }

    #[test]
    fn compressed_spring_pushes_apart() {
        let mut nodes = vec![Node::new(0.0, 0.0, 1.0), Node::new(10.0, 0.0, 1.0)];
        let edges = vec![Edge::new(0, 1, 50.0, 0.001)];
        spring_forces(&mut nodes, &edges, &ForceConfig::default(), 1.0);

        assert!(nodes[0].vx < 0.0);
        assert!(nodes[1].vx > 0.0);
    }

    #[test]
    fn zero_length_spring_stays_finite() {
        let mut nodes = vec![Node::new(5.0, 5.0, 1.0), Node::new(5.0, 5.0, 1.0)];
        let edges = vec![Edge::new(0, 1, 50.0, 0.001)];
        spring_forces(&mut nodes, &edges, &ForceConfig::default(), 1.0);

        assert!(nodes.iter().all(Node::is_finite));
        assert!(nodes[0].vx < 0.0 && nodes[1].vx > 0.0);
    }

    #[test]
    fn overlapping_nodes_repel_symmetrically() {
        let config = ForceConfig::default();
        // threshold for r = 2: (2 + 2) * 1.8 + 8 = 15.2
        let mut nodes = vec![Node::new(100.0, 100.0, 2.0), Node::new(106.0, 108.0, 2.0)];
        let grid = grid_for(&nodes);
        repulsion_forces(&mut nodes, &grid, &config, 1.0);

        assert!(nodes[0].vx != 0.0 || nodes[0].vy != 0.0);
        assert_eq!(nodes[0].vx, -nodes[1].vx);
        assert_eq!(nodes[0].vy, -nodes[1].vy);
        // node 0 is up-left of node 1, so it is pushed further up-left
        assert!(nodes[0].vx < 0.0 && nodes[0].vy < 0.0);
    }

    #[test]
    fn repulsion_threshold_scales_with_radii() {
        let config = ForceConfig::default();

        let mut near = vec![Node::new(100.0, 100.0, 2.0), Node::new(115.0, 100.0, 2.0)];
        let grid = grid_for(&near);
        repulsion_forces(&mut near, &grid, &config, 1.0);
        assert!(near[0].vx < 0.0);
        assert!(near[1].vx > 0.0);

        let mut far = vec![Node::new(100.0, 100.0, 2.0), Node::new(115.5, 100.0, 2.0)];
        let grid = grid_for(&far);
        repulsion_forces(&mut far, &grid, &config, 1.0);
        assert_eq!((far[0].vx, far[0].vy), (0.0, 0.0));
        assert_eq!((far[1].vx, far[1].vy), (0.0, 0.0));
    }

    #[test]
    fn repulsion_force_is_linear_in_overlap() {
        let config = ForceConfig::default();
        // min_dist = (1 + 1) * 1.8 + 8 = 11.6; gap 5.8 is half overlap
        let mut nodes = vec![Node::new(100.0, 100.0, 1.0), Node::new(105.8, 100.0, 1.0)];
        let grid = grid_for(&nodes);
        repulsion_forces(&mut nodes, &grid, &config, 1.0);

        assert!((nodes[0].vx + 0.075).abs() < 1e-4);
    }

    #[test]
    fn coincident_nodes_separate_without_nan() {
        let config = ForceConfig::default();
        let mut nodes = vec![Node::new(50.0, 50.0, 3.0), Node::new(50.0, 50.0, 3.0)];
        let grid = grid_for(&nodes);
        repulsion_forces(&mut nodes, &grid, &config, 1.0);

        assert!(nodes.iter().all(Node::is_finite));
        assert!(nodes[0].vx > 0.0);
        assert_eq!(nodes[0].vx, -nodes[1].vx);
    }

    #[test]
    fn each_pair_is_repelled_once() {
        let config = ForceConfig::default();
        let mut once = vec![Node::new(100.0, 100.0, 2.0), Node::new(110.0, 100.0, 2.0)];
        let grid = grid_for(&once);
        repulsion_forces(&mut once, &grid, &config, 1.0);

        let expected = (15.2 - 10.0) / 15.2 * 0.15;
        assert!((once[1].vx - expected).abs() < 1e-5);
    }

    #[test]
    fn flow_is_pure() {
        let flow = FlowConfig::default();
        let first = flow_at(123.0, 456.0, 789.0, &flow);
        let _ = flow_at(1.0, 2.0, 3.0, &flow);
        let second = flow_at(123.0, 456.0, 789.0, &flow);

        assert_eq!(first, second);
        assert!(first.0.abs() <= flow.strength && first.1.abs() <= flow.strength);
    }

    #[test]
    fn flow_changes_over_time_and_space() {
        let flow = FlowConfig::default();
        assert_ne!(flow_at(100.0, 100.0, 0.0, &flow), flow_at(100.0, 100.0, 5000.0, &flow));
        assert_ne!(flow_at(100.0, 100.0, 0.0, &flow), flow_at(400.0, 300.0, 0.0, &flow));
    }

    #[test]
    fn pointer_pushes_away_with_linear_falloff() {
        let config = ForceConfig::default();
        let pointer = PointerState::at(100.0, 100.0);

        let (fx, fy) = pointer_push(180.0, 100.0, &pointer, &config);
        assert!((fx - 0.3).abs() < 1e-6);
        assert_eq!(fy, 0.0);

        let (near, _) = pointer_push(110.0, 100.0, &pointer, &config);
        assert!(near > fx);

        assert_eq!(pointer_push(260.0, 100.0, &pointer, &config), (0.0, 0.0));
    }

    #[test]
    fn inactive_or_coincident_pointer_does_nothing() {
        let config = ForceConfig::default();
        let inactive = PointerState {
            x: 100.0,
            y: 100.0,
            active: false,
        };
        assert_eq!(pointer_push(110.0, 100.0, &inactive, &config), (0.0, 0.0));

        let pointer = PointerState::at(100.0, 100.0);
        assert_eq!(pointer_push(100.0, 100.0, &pointer, &config), (0.0, 0.0));
    }

    #[test]
    fn exclusion_pushes_outward_with_fixed_magnitude() {
        let config = ForceConfig::default();
        let zone = context(PointerState::default()).zone;

        let (fx, fy) = exclusion_push(zone.cx + 30.0, zone.cy + 40.0, &zone, &config);
        assert!((fx - 0.12).abs() < 1e-6);
        assert!((fy - 0.16).abs() < 1e-6);

        let outside = exclusion_push(zone.cx + zone.half_width + 30.0, zone.cy, &zone, &config);
        assert_eq!(outside, (0.0, 0.0));

        // inside the padding band
        let (fx, _) = exclusion_push(zone.cx + zone.half_width + 10.0, zone.cy, &zone, &config);
        assert!((fx - 0.2).abs() < 1e-6);
    }

    #[test]
    fn exclusion_at_exact_centre_still_pushes() {
        let config = ForceConfig::default();
        let zone = context(PointerState::default()).zone;

        let (fx, fy) = exclusion_push(zone.cx, zone.cy, &zone, &config);
        assert!(fx.is_finite() && fy.is_finite());
        assert!((fx * fx + fy * fy).sqrt() > 0.19);
    }

    #[test]
    fn centering_is_proportional_to_displacement() {
        let config = ForceConfig::default();
        let viewport = Viewport::new(1000.0, 800.0);

        assert_eq!(centering_pull(500.0, 400.0, viewport, &config), (0.0, 0.0));
        let (fx, fy) = centering_pull(0.0, 800.0, viewport, &config);
        assert!((fx - 500.0 * 0.00003).abs() < 1e-9);
        assert!((fy + 400.0 * 0.00003).abs() < 1e-9);
    }

    #[test]
    fn disabled_forces_contribute_nothing() {
        let config = config_with(EnabledForces::none());
        let mut nodes = vec![Node::new(500.0, 400.0, 2.0), Node::new(501.0, 400.0, 2.0)];
        let edges = vec![Edge::new(0, 1, 50.0, 0.001)];
        let grid = grid_for(&nodes);

        ForceEngine::new().accumulate(
            &mut nodes,
            &edges,
            &grid,
            &config,
            &context(PointerState::at(505.0, 400.0)),
        );

        for node in &nodes {
            assert_eq!((node.vx, node.vy), (0.0, 0.0));
        }
    }

    #[test]
    fn accumulate_never_moves_positions() {
        let config = ForceConfig::default();
        let mut nodes = vec![Node::new(500.0, 400.0, 2.0), Node::new(500.0, 400.0, 2.0)];
        let edges = vec![Edge::new(0, 1, 50.0, 0.001)];
        let grid = grid_for(&nodes);

        ForceEngine::new().accumulate(
            &mut nodes,
            &edges,
            &grid,
            &config,
            &context(PointerState::at(500.0, 400.0)),
        );

        for node in &nodes {
            assert_eq!((node.x, node.y), (500.0, 400.0));
            assert!(node.is_finite());
        }
    }

    #[test]
    fn dt_scales_velocity_increments() {
        let config = config_with(EnabledForces {
            centering: true,
            ..EnabledForces::none()
        });
        let grid = SpatialGrid::default();
        let mut ctx = context(PointerState::default());

        let mut full = vec![Node::new(0.0, 0.0, 1.0)];
        ForceEngine::new().accumulate(&mut full, &[], &grid, &config, &ctx);

        ctx.dt = 0.5;
        let mut half = vec![Node::new(0.0, 0.0, 1.0)];
        ForceEngine::new().accumulate(&mut half, &[], &grid, &config, &ctx);

        assert!((full[0].vx - 2.0 * half[0].vx).abs() < 1e-9);
    }
}
