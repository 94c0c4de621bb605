//! netmap - a real-time force-directed particle network simulation.
//!
//! Nodes of varying size are seeded around coloured clusters and joined by
//! springs. Every frame they repel their neighbours, drift on an ambient
//! flow field, flee the pointer and stay out of a zone at the centre of the
//! viewport. Rendering and input live behind the traits in [`io`].

pub mod config;
pub mod driver;
pub mod forces;
pub mod integrator;
pub mod io;
pub mod scene;
pub mod simulation;
pub mod spatial;
pub mod stats;
pub mod types;
pub mod viewport;
