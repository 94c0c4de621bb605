//! Headless frame loop

use crate::io::{InputSource, RenderResult, Renderer};
use crate::simulation::Simulation;

/// Drives a simulation for a fixed number of frames.
///
/// Every frame polls input, applies any resize and the pointer, steps the
/// simulation and hands the result to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct FrameLoop {
    pub frames: u64,
    pub dt: f32,
}

impl FrameLoop {
    pub fn new(frames: u64, dt: f32) -> Self {
        Self { frames, dt }
    }

    /// Run to completion, stopping at the first render error
    pub fn run(
        &self,
        sim: &mut Simulation,
        input: &mut dyn InputSource,
        renderer: &mut dyn Renderer,
    ) -> RenderResult<()> {
        tracing::info!(frames = self.frames, dt = self.dt, "starting frame loop");

        for _ in 0..self.frames {
            let pointer = input.pointer();
            if let Some(viewport) = input.viewport() {
                sim.resize(viewport);
            }
            sim.set_pointer(pointer);
            sim.step(self.dt);
            renderer.render(&sim.view())?;
        }

        tracing::info!(frame = sim.frame(), "frame loop finished");
        Ok(())
    }
}
