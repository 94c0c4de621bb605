//! Per-frame diagnostics

use serde::Serialize;

use crate::io::{FrameView, RenderResult, Renderer};
use crate::types::{Edge, Node};
use crate::viewport::{ExclusionZone, ZoneConfig};

/// Aggregate measurements of one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FrameStats {
    pub frame: u64,
    pub nodes: usize,
    pub edges: usize,
    /// Sum of ½·m·|v|²
    pub kinetic_energy: f32,
    pub max_speed: f32,
    pub mean_speed: f32,
    /// Mean of |length - rest| / rest over all edges
    pub mean_edge_strain: f32,
    /// Nodes strictly inside the unpadded exclusion zone
    pub nodes_in_zone: usize,
}

impl FrameStats {
    pub fn measure(frame: u64, nodes: &[Node], edges: &[Edge], zone: &ExclusionZone) -> Self {
        let mut kinetic_energy = 0.0;
        let mut max_speed: f32 = 0.0;
        let mut total_speed = 0.0;
        let mut nodes_in_zone = 0;

        for node in nodes {
            let speed = node.speed();
            kinetic_energy += 0.5 * node.mass() * speed * speed;
            max_speed = max_speed.max(speed);
            total_speed += speed;
            if zone.contains(node.x, node.y, 0.0) {
                nodes_in_zone += 1;
            }
        }

        let total_strain: f32 = edges
            .iter()
            .map(|e| (e.length(nodes) - e.rest_length()).abs() / e.rest_length())
            .sum();

        Self {
            frame,
            nodes: nodes.len(),
            edges: edges.len(),
            kinetic_energy,
            max_speed,
            mean_speed: mean(total_speed, nodes.len()),
            mean_edge_strain: mean(total_strain, edges.len()),
            nodes_in_zone,
        }
    }

    /// True when nothing has gone non-finite
    pub fn is_finite(&self) -> bool {
        self.kinetic_energy.is_finite()
            && self.max_speed.is_finite()
            && self.mean_speed.is_finite()
            && self.mean_edge_strain.is_finite()
    }
}

fn mean(total: f32, count: usize) -> f32 {
    if count == 0 { 0.0 } else { total / count as f32 }
}

/// Renderer that measures frames and logs them at a fixed interval.
///
/// The exclusion zone is derived from each frame's viewport, so counts
/// follow resizes.
#[derive(Debug)]
pub struct StatsRenderer {
    zone: ZoneConfig,
    log_every: u64,
    last: Option<FrameStats>,
    history: Vec<FrameStats>,
}

impl StatsRenderer {
    /// `log_every` of 0 disables logging; stats are still collected
    pub fn new(zone: ZoneConfig, log_every: u64) -> Self {
        Self {
            zone,
            log_every,
            last: None,
            history: Vec::new(),
        }
    }

    pub fn last(&self) -> Option<&FrameStats> {
        self.last.as_ref()
    }

    /// Stats of every logged frame
    pub fn history(&self) -> &[FrameStats] {
        &self.history
    }
}

impl Renderer for StatsRenderer {
    fn render(&mut self, frame: &FrameView<'_>) -> RenderResult<()> {
        let zone = ExclusionZone::new(frame.viewport, &self.zone);
        let stats = FrameStats::measure(frame.frame, frame.nodes, frame.edges, &zone);

        if self.log_every > 0 && frame.frame % self.log_every == 0 {
            tracing::info!(
                frame = stats.frame,
                energy = stats.kinetic_energy,
                max_speed = stats.max_speed,
                mean_speed = stats.mean_speed,
                strain = stats.mean_edge_strain,
                in_zone = stats.nodes_in_zone,
                "frame stats"
            );
            self.history.push(stats);
        } else {
            tracing::trace!(frame = stats.frame, energy = stats.kinetic_energy, "frame stats");
        }

        self.last = Some(stats);
        Ok(())
    }
}
