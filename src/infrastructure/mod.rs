//! Infrastructure Layer
//!
//! Cross-cutting concerns and infrastructure components.

pub mod page_renderer;
pub mod shutdown;

pub use page_renderer::{PageRenderer, RenderError};
pub use shutdown::{shutdown_signal, ProcessExit, ShutdownController, Terminator};
