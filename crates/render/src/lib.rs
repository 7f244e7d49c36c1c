//! Rendering adapter: renderer-agnostic output and the frame loop.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - One failing frame never stops the loop.
//!
//! # Workaround
//! The only renderer is a debug text renderer. A GPU renderer implements
//! [`Renderer`] without changing the loop or its callers.

mod render_loop;
mod renderer;

pub use render_loop::{FrameOutcome, RenderLoop};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};
