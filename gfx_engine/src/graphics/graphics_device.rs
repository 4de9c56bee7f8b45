/// GraphicsDevice trait - the native API surface a backend wraps
///
/// `DeviceGraphics` drives a device while walking a `Frame`; the device only
/// translates individual calls to the native API. State diffing (skipping a
/// bind whose target already holds the desired value) happens above this
/// layer, so a device may issue every call it receives.

use std::fmt;
use std::sync::Arc;
use crate::color::Color;
use crate::error::{Error, Result};
use crate::image::Image;
use crate::material::{ShaderFieldValue, ShaderValuesInfo};

// ============================================================================
// Backend resources
// ============================================================================

/// Compiled and linked shader program
///
/// The native program is released when the last reference drops.
pub trait Program: Send + Sync + fmt::Debug {
    /// Native object name
    fn native_id(&self) -> u64;
}

/// Vertex input state object (VAO-like): records the attribute layout once
pub trait VertexArray: Send + Sync + fmt::Debug {
    /// Native object name
    fn native_id(&self) -> u64;
}

/// GPU buffer
///
/// The native buffer is released when the last reference drops.
pub trait Buffer: Send + Sync + fmt::Debug {
    /// Native object name
    fn native_id(&self) -> u64;

    /// Replace the whole buffer contents with `data`
    fn upload(&self, data: &[u8]) -> Result<()>;

    /// Current size in bytes
    fn size(&self) -> u64;
}

/// Vertex array + vertex buffer + index buffer, allocated together
///
/// The vertex array was described with the owning material's attribute
/// layout at allocation time and is never re-described.
#[derive(Debug, Clone)]
pub struct GeometryBuffers {
    pub vertex_array: Arc<dyn VertexArray>,
    pub vertex_buffer: Arc<dyn Buffer>,
    pub index_buffer: Arc<dyn Buffer>,
}

impl GeometryBuffers {
    /// Upload vertex bytes and u32 indices
    pub fn upload(&self, vertices: &[u8], indices: &[u32]) -> Result<()> {
        self.vertex_buffer.upload(vertices)?;
        self.index_buffer.upload(bytemuck::cast_slice(indices))
    }

    /// Identity comparison (same native vertex array)
    pub fn same_as(&self, other: &GeometryBuffers) -> bool {
        same_resource(&self.vertex_array, &other.vertex_array)
    }
}

/// Identity comparison for backend resources behind `Arc<dyn _>`
///
/// Compares data pointers only; vtable pointers of the same type may differ
/// across codegen units.
pub fn same_resource<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

// ============================================================================
// Device
// ============================================================================

/// Native graphics API wrapper
pub trait GraphicsDevice: Send {
    /// Compile and link a program
    ///
    /// This is where a backend rejects uniform types it has no native setter
    /// for, so that `set_uniform` never fails on a type mismatch mid-frame.
    ///
    /// # Errors
    ///
    /// - `ShaderCompilation` on compile or link failure
    /// - `UnsupportedFieldType` if a uniform has no native setter
    fn compile_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
        attributes: &ShaderValuesInfo,
        uniforms: &ShaderValuesInfo,
    ) -> Result<Arc<dyn Program>>;

    /// Allocate geometry buffers and describe `layout` on the vertex array
    ///
    /// # Errors
    ///
    /// `UnsupportedFieldType` if an attribute has no native format.
    fn create_geometry(&mut self, layout: &ShaderValuesInfo) -> Result<GeometryBuffers>;

    /// Start a frame (bind the offscreen target)
    fn begin_frame(&mut self) -> Result<()>;

    /// Finish a frame (resolve / blit to the window)
    fn end_frame(&mut self) -> Result<()>;

    fn use_program(&mut self, program: &Arc<dyn Program>) -> Result<()>;

    fn bind_geometry(&mut self, geometry: &GeometryBuffers) -> Result<()>;

    /// Set a non-texture uniform on the current program
    ///
    /// Value types were validated by `compile_program`.
    fn set_uniform(&mut self, location: u32, value: &ShaderFieldValue) -> Result<()>;

    /// Upload `image` into texture unit `unit`
    fn bind_texture(&mut self, unit: u32, image: &Arc<Image>) -> Result<()>;

    /// Point the sampler uniform at `location` to texture unit `unit`
    fn set_sampler(&mut self, location: u32, unit: u32) -> Result<()>;

    /// Draw `index_count` u32 indices from the bound geometry as triangles
    fn draw_indexed(&mut self, index_count: u32) -> Result<()>;

    /// Clear color and depth
    fn clear(&mut self, color: Color) -> Result<()>;

    fn set_wireframe(&mut self, enable: bool) -> Result<()>;

    /// Back-face culling, counter-clockwise front faces
    fn set_culling(&mut self, enable: bool) -> Result<()>;

    fn set_depth_test(&mut self, enable: bool) -> Result<()>;

    /// Alpha blending
    ///
    /// Not implemented unless a backend overrides it.
    fn set_blend(&mut self, enable: bool) -> Result<()> {
        let _ = enable;
        Err(Error::Unsupported("blend toggle".to_string()))
    }

    /// Resize render targets and viewport (pixels)
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;
}
