//! Frame module
//!
//! Per-frame command recording, batching, and CPU-side geometry caches.

pub mod draw_task;
pub mod draw_target;
pub mod cache_vertices;
pub mod frame;

pub use draw_task::{DrawMaterial, DrawTask};
pub use draw_target::{DrawTarget, Vertex};
pub use cache_vertices::FrameCacheVertices;
pub use frame::{CacheScope, Frame, FrameStats};
