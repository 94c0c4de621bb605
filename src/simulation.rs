//! The simulation aggregate
//!
//! Owns nodes, edges, the spatial grid and per-frame inputs. Each call to
//! [`Simulation::step`] advances time, rebuilds the grid, accumulates every
//! force into velocities and only then integrates positions.

use rand::Rng;

use crate::config::SimConfig;
use crate::forces::{ForceEngine, FrameContext};
use crate::integrator::integrate;
use crate::io::{FrameView, PointerState};
use crate::scene::{self, SceneError, SceneResult, validate_edges, validate_nodes};
use crate::spatial::SpatialGrid;
use crate::stats::FrameStats;
use crate::types::{Edge, Node};
use crate::viewport::{ExclusionZone, Viewport};

/// A running particle network
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    viewport: Viewport,
    zone: ExclusionZone,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    grid: SpatialGrid,
    engine: ForceEngine,
    pointer: PointerState,
    frame: u64,
    time: f64,
}

impl Simulation {
    /// Seed a fresh scene from `config` and wrap it in a simulation
    pub fn seeded<R: Rng + ?Sized>(config: SimConfig, rng: &mut R) -> SceneResult<Self> {
        check_config(&config, config.viewport)?;
        let scene = scene::seed(&config, rng)?;
        let viewport = config.viewport;
        Self::from_parts(config, viewport, scene.nodes, scene.edges)
    }

    /// Build a simulation from existing nodes and edges.
    ///
    /// Fails if the configuration or viewport is invalid, any node is
    /// non-finite, or any edge is a self-loop, a duplicate, carries a
    /// non-finite spring parameter or references a node that does not exist.
    pub fn from_parts(
        config: SimConfig,
        viewport: Viewport,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> SceneResult<Self> {
        check_config(&config, viewport)?;
        validate_nodes(&nodes)?;
        validate_edges(nodes.len(), &edges)?;

        Ok(Self {
            zone: ExclusionZone::new(viewport, &config.zone),
            grid: SpatialGrid::new(config.grid.cell_size),
            engine: ForceEngine::new(),
            pointer: PointerState::default(),
            frame: 0,
            time: 0.0,
            config,
            viewport,
            nodes,
            edges,
        })
    }

    /// Advance by `dt` frames.
    ///
    /// A non-finite or non-positive `dt` is ignored.
    pub fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            tracing::warn!(dt, "ignoring step with invalid dt");
            return;
        }

        self.time += f64::from(dt);
        self.grid.rebuild(&self.nodes);

        let ctx = FrameContext {
            time: self.time,
            dt,
            viewport: self.viewport,
            zone: self.zone,
            pointer: self.pointer,
        };
        self.engine.accumulate(
            &mut self.nodes,
            &self.edges,
            &self.grid,
            &self.config.forces,
            &ctx,
        );
        integrate(&mut self.nodes, &self.config.integrator, self.viewport, dt);

        self.frame += 1;
    }

    /// One step of unit size
    pub fn tick(&mut self) {
        self.step(1.0);
    }

    /// Pointer used from the next step on
    pub fn set_pointer(&mut self, pointer: PointerState) {
        self.pointer = pointer;
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    /// Change the viewport; the exclusion zone follows it.
    ///
    /// Existing positions are left alone, nodes outside the new bounds wrap
    /// back in over the following steps. Non-finite or non-positive
    /// dimensions are ignored.
    pub fn resize(&mut self, viewport: Viewport) {
        if !is_usable(viewport) {
            tracing::warn!(
                width = viewport.width,
                height = viewport.height,
                "ignoring resize to invalid viewport"
            );
            return;
        }
        tracing::debug!(width = viewport.width, height = viewport.height, "resize");
        self.viewport = viewport;
        self.zone = ExclusionZone::new(viewport, &self.config.zone);
    }

    /// Read-only view for renderers
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            frame: self.frame,
            time: self.time,
            viewport: self.viewport,
            pointer: self.pointer,
            nodes: &self.nodes,
            edges: &self.edges,
        }
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats::measure(self.frame, &self.nodes, &self.edges, &self.zone)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn zone(&self) -> ExclusionZone {
        self.zone
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Number of completed steps
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}

fn check_config(config: &SimConfig, viewport: Viewport) -> SceneResult<()> {
    config
        .validate()
        .map_err(|e| SceneError::InvalidConfig(e.to_string()))?;
    if !is_usable(viewport) {
        return Err(SceneError::InvalidConfig(format!(
            "viewport must be finite and positive, got {}x{}",
            viewport.width, viewport.height
        )));
    }
    Ok(())
}

fn is_usable(viewport: Viewport) -> bool {
    viewport.width.is_finite()
        && viewport.height.is_finite()
        && viewport.width > 0.0
        && viewport.height > 0.0
}
