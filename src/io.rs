//! Boundaries between the simulation and the outside world
//!
//! The simulation never draws and never listens for events. Instead:
//!
//! - a [`Renderer`] consumes an immutable [`FrameView`] after every step
//! - an [`InputSource`] is polled once per step for the pointer and viewport
//!
//! Both are traits so that windowed front ends, headless drivers and tests
//! can plug in their own implementations.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use thiserror::Error;

use crate::types::{Edge, Node};
use crate::viewport::Viewport;

/// Errors that can occur while rendering a frame
#[derive(Error, Debug)]
pub enum RenderError {
    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The frame could not be serialized
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for renderer operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Latest known pointer position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    pub active: bool,
}

impl PointerState {
    /// An active pointer at the given position
    pub fn at(x: f32, y: f32) -> Self {
        Self { x, y, active: true }
    }
}

/// Read-only snapshot of the simulation handed to renderers
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FrameView<'a> {
    /// Number of completed steps
    pub frame: u64,
    /// Simulation time in frames
    pub time: f64,
    pub viewport: Viewport,
    pub pointer: PointerState,
    pub nodes: &'a [Node],
    pub edges: &'a [Edge],
}

/// Something that turns simulation state into output
pub trait Renderer {
    fn render(&mut self, frame: &FrameView<'_>) -> RenderResult<()>;
}

impl Renderer for Vec<Box<dyn Renderer>> {
    fn render(&mut self, frame: &FrameView<'_>) -> RenderResult<()> {
        for renderer in self.iter_mut() {
            renderer.render(frame)?;
        }
        Ok(())
    }
}

/// Writes every `every`-th frame as one line of JSON
pub struct JsonLinesRenderer<W: Write> {
    writer: W,
    every: u64,
}

impl<W: Write> JsonLinesRenderer<W> {
    /// `every` of 0 is treated as 1
    pub fn new(writer: W, every: u64) -> Self {
        Self {
            writer,
            every: every.max(1),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Renderer for JsonLinesRenderer<W> {
    fn render(&mut self, frame: &FrameView<'_>) -> RenderResult<()> {
        if frame.frame % self.every != 0 {
            return Ok(());
        }
        serde_json::to_writer(&mut self.writer, frame)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Source of live input, polled once at the start of every step
pub trait InputSource {
    /// Current pointer state
    fn pointer(&mut self) -> PointerState;

    /// New viewport dimensions, if they changed since the last poll
    fn viewport(&mut self) -> Option<Viewport> {
        None
    }
}

/// Input that never changes
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticInput {
    pub pointer: PointerState,
}

impl InputSource for StaticInput {
    fn pointer(&mut self) -> PointerState {
        self.pointer
    }
}

#[derive(Debug, Default)]
struct SharedState {
    pointer: PointerState,
    viewport: Option<Viewport>,
}

/// Input updated from elsewhere (an event loop, another thread).
///
/// Clones share state. Writes overwrite each other; the simulation sees
/// whatever was written last before a step begins.
#[derive(Debug, Clone, Default)]
pub struct SharedInput {
    state: Arc<Mutex<SharedState>>,
}

impl SharedInput {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        // A panicked writer cannot leave PointerState half-written
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn move_pointer(&self, x: f32, y: f32) {
        self.lock().pointer = PointerState::at(x, y);
    }

    /// Pointer left the surface; keeps the last position
    pub fn leave(&self) {
        self.lock().pointer.active = false;
    }

    pub fn resize(&self, width: f32, height: f32) {
        self.lock().viewport = Some(Viewport::new(width, height));
    }
}

impl InputSource for SharedInput {
    fn pointer(&mut self) -> PointerState {
        self.lock().pointer
    }

    fn viewport(&mut self) -> Option<Viewport> {
        self.lock().viewport.take()
    }
}

/// Replays a recorded pointer track, holding the final state once exhausted
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    pointers: Vec<PointerState>,
    resizes: Vec<(u64, Viewport)>,
    polls: u64,
}

impl ScriptedInput {
    pub fn new(pointers: Vec<PointerState>) -> Self {
        Self {
            pointers,
            resizes: Vec::new(),
            polls: 0,
        }
    }

    /// Report a resize on the given (zero-based) poll
    pub fn with_resize(mut self, poll: u64, viewport: Viewport) -> Self {
        self.resizes.push((poll, viewport));
        self
    }
}

impl InputSource for ScriptedInput {
    fn pointer(&mut self) -> PointerState {
        let index = (self.polls as usize).min(self.pointers.len().saturating_sub(1));
        self.polls += 1;
        self.pointers.get(index).copied().unwrap_or_default()
    }

    fn viewport(&mut self) -> Option<Viewport> {
        // Called after pointer(), so the current poll is polls - 1
        let current = self.polls.saturating_sub(1);
        self.resizes
            .iter()
            .find(|(poll, _)| *poll == current)
            .map(|(_, viewport)| *viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rgb;

    fn sample_nodes() -> Vec<Node> {
        vec![
            Node::new(10.0, 20.0, 2.0)
                .with_velocity(0.5, -0.25)
                .with_color(Rgb::new(50, 100, 190))
                .with_alpha(0.5),
            Node::new(40.0, 20.0, 1.0)
                .with_color(Rgb::new(170, 55, 55))
                .with_alpha(0.25),
        ]
    }

    fn sample_view<'a>(nodes: &'a [Node], edges: &'a [Edge], frame: u64) -> FrameView<'a> {
        FrameView {
            frame,
            time: frame as f64,
            viewport: Viewport::new(100.0, 50.0),
            pointer: PointerState::default(),
            nodes,
            edges,
        }
    }

    #[test]
    fn frame_view_json() {
        let nodes = sample_nodes();
        let edges = vec![Edge::new(0, 1, 32.5, 0.25)];
        let view = sample_view(&nodes, &edges, 3);

        let json = serde_json::to_string_pretty(&view).unwrap();
        insta::assert_snapshot!("frame_view_json", json);
    }

    #[test]
    fn json_lines_renderer_writes_every_nth_frame() {
        let nodes = sample_nodes();
        let edges = vec![Edge::new(0, 1, 30.0, 0.001)];
        let mut renderer = JsonLinesRenderer::new(Vec::new(), 2);

        for frame in 1..=5 {
            renderer
                .render(&sample_view(&nodes, &edges, frame))
                .unwrap();
        }

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["frame"], 2);
        assert_eq!(parsed["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["edges"][0]["b"], 1);
    }

    #[test]
    fn zero_interval_renders_every_frame() {
        let nodes = sample_nodes();
        let mut renderer = JsonLinesRenderer::new(Vec::new(), 0);
        for frame in 0..3 {
            renderer.render(&sample_view(&nodes, &[], frame)).unwrap();
        }
        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn renderer_list_renders_all() {
        let nodes = sample_nodes();
        let mut renderers: Vec<Box<dyn Renderer>> = vec![
            Box::new(JsonLinesRenderer::new(std::io::sink(), 1)),
            Box::new(JsonLinesRenderer::new(std::io::sink(), 1)),
        ];
        assert!(renderers.render(&sample_view(&nodes, &[], 1)).is_ok());
    }

    #[test]
    fn shared_input_is_last_write_wins() {
        let handle = SharedInput::new();
        let mut source = handle.clone();

        handle.move_pointer(1.0, 2.0);
        handle.move_pointer(3.0, 4.0);
        assert_eq!(source.pointer(), PointerState::at(3.0, 4.0));

        handle.leave();
        let pointer = source.pointer();
        assert!(!pointer.active);
        assert_eq!((pointer.x, pointer.y), (3.0, 4.0));
    }

    #[test]
    fn shared_input_reports_resize_once() {
        let handle = SharedInput::new();
        let mut source = handle.clone();

        assert_eq!(source.viewport(), None);
        handle.resize(640.0, 480.0);
        assert_eq!(source.viewport(), Some(Viewport::new(640.0, 480.0)));
        assert_eq!(source.viewport(), None);
    }

    #[test]
    fn shared_input_accepts_writes_from_other_threads() {
        let handle = SharedInput::new();
        let mut source = handle.clone();

        std::thread::spawn(move || handle.move_pointer(7.0, 8.0))
            .join()
            .unwrap();

        assert_eq!(source.pointer(), PointerState::at(7.0, 8.0));
    }

    #[test]
    fn scripted_input_replays_then_holds() {
        let mut input = ScriptedInput::new(vec![
            PointerState::at(1.0, 1.0),
            PointerState::at(2.0, 2.0),
        ]);

        assert_eq!(input.pointer(), PointerState::at(1.0, 1.0));
        assert_eq!(input.pointer(), PointerState::at(2.0, 2.0));
        assert_eq!(input.pointer(), PointerState::at(2.0, 2.0));
    }

    #[test]
    fn scripted_input_resizes_on_schedule() {
        let mut input = ScriptedInput::default().with_resize(1, Viewport::new(10.0, 10.0));

        assert_eq!(input.pointer(), PointerState::default());
        assert_eq!(input.viewport(), None);
        input.pointer();
        assert_eq!(input.viewport(), Some(Viewport::new(10.0, 10.0)));
        input.pointer();
        assert_eq!(input.viewport(), None);
    }
}
