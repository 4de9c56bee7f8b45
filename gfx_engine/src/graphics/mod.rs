//! Graphics module
//!
//! Backend contract (`Graphics`), the native device abstraction it drives
//! (`GraphicsDevice`), and a headless device that records every call.

pub mod graphics_device;
pub mod graphics;
pub mod cache_vertices;
pub mod device_graphics;
pub mod recording_device;

pub use graphics_device::{
    same_resource, Buffer, GeometryBuffers, GraphicsDevice, Program, VertexArray,
};
pub use graphics::{Graphics, GraphicsConfig};
pub use cache_vertices::GraphicsCacheVertices;
pub use device_graphics::DeviceGraphics;
pub use recording_device::{
    BufferKey, DeviceCommand, ProgramKey, RecordedBuffer, RecordedProgram,
    RecordedVertexArray, RecordingDevice, VertexArrayKey,
};
