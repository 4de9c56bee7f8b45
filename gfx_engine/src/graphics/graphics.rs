/// Graphics trait - frame executor and resource factory

use std::sync::Arc;
use winit::dpi::PhysicalSize;
use crate::error::Result;
use crate::frame::Frame;
use crate::graphics::GraphicsCacheVertices;
use crate::material::{CreateMaterialParams, Material};

/// Graphics configuration
#[derive(Debug, Clone)]
pub struct GraphicsConfig {
    /// Viewport size before the first resize (pixels)
    pub initial_size: PhysicalSize<u32>,
    /// Render target scale applied on top of the window size
    pub resolution_scale: f32,
    /// Texture units available to a single draw
    pub texture_units: u32,
    /// Initial back-face culling state
    pub culling: bool,
    /// Initial depth test state
    pub depth_test: bool,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            initial_size: PhysicalSize::new(1000, 1000),
            resolution_scale: 1.0,
            texture_units: 4,
            culling: true,
            depth_test: true,
        }
    }
}

/// Main graphics trait
///
/// Implemented by backends. A frame is drawn atomically: `draw` either
/// executes every task or returns the first error.
pub trait Graphics: Send {
    /// Execute `frame` tasks strictly in order
    ///
    /// # Arguments
    ///
    /// * `frame` - Completed frame, read-only
    fn draw(&mut self, frame: &Frame) -> Result<()>;

    /// Compile a program and create a material around it
    ///
    /// # Errors
    ///
    /// `ShaderCompilation` if the program fails to compile or link. Layout
    /// errors from `Material::new` are propagated.
    fn create_material(&mut self, params: CreateMaterialParams) -> Result<Arc<Material>>;

    /// Allocate a backend cache object drawn with `material`
    ///
    /// The object is empty until `GraphicsCacheVertices::load` is called.
    fn create_cache_vertices(&mut self, material: Arc<Material>) -> Result<Arc<GraphicsCacheVertices>>;

    /// Notify the backend that the viewport has changed
    ///
    /// # Arguments
    ///
    /// * `size` - New window size in pixels
    /// * `scale` - Resolution scale applied to `size`
    fn resize(&mut self, size: PhysicalSize<u32>, scale: f32) -> Result<()>;
}
