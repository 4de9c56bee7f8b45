/// Backend-resident cache object.
///
/// Holds a material and dedicated geometry buffers. `load` uploads a
/// `FrameCacheVertices` once; afterwards a frame can draw it any number of
/// times through `Frame::add_graphics_cached_vertices` with no per-frame
/// upload.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use crate::engine_debug;
use crate::error::{Error, Result};
use crate::frame::FrameCacheVertices;
use crate::graphics::GeometryBuffers;
use crate::material::Material;

#[derive(Debug)]
pub struct GraphicsCacheVertices {
    material: Arc<Material>,
    geometry: GeometryBuffers,
    vertices_count: AtomicUsize,
    indices_count: AtomicUsize,
}

impl GraphicsCacheVertices {
    /// Wrap buffers allocated by the backend for `material`
    ///
    /// Called by `Graphics::create_cache_vertices` implementations.
    pub fn new(material: Arc<Material>, geometry: GeometryBuffers) -> Self {
        Self {
            material,
            geometry,
            vertices_count: AtomicUsize::new(0),
            indices_count: AtomicUsize::new(0),
        }
    }

    /// Upload `cache` into the backend buffers, replacing previous contents
    ///
    /// # Errors
    ///
    /// - `IncompatibleLayout` if `cache` was recorded with another attribute layout
    /// - backend errors from the buffer upload; the cache then draws nothing
    ///   until the next successful `load`
    pub fn load(&self, cache: &FrameCacheVertices) -> Result<()> {
        if let Some(layout) = cache.layout() {
            if layout != self.material.attribute_info() {
                return Err(Error::IncompatibleLayout(format!(
                    "cache holds {}-byte vertices, cache object material uses {}-byte vertices",
                    layout.total_byte_size(),
                    self.material.stride()
                )));
            }
        }

        // counts stay at zero until both buffers hold the new contents
        self.vertices_count.store(0, Ordering::Release);
        self.indices_count.store(0, Ordering::Release);
        self.geometry.upload(cache.vertices(), cache.indices())?;

        let vertices = cache.vertices().len() / self.material.stride();
        self.vertices_count.store(vertices, Ordering::Release);
        self.indices_count.store(cache.indices().len(), Ordering::Release);

        engine_debug!(
            "gfx::GraphicsCacheVertices",
            "Loaded cache: {} vertices, {} indices",
            vertices,
            cache.indices().len()
        );
        Ok(())
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    pub fn geometry(&self) -> &GeometryBuffers {
        &self.geometry
    }

    /// Vertex count of the last `load`, 0 if it failed
    pub fn stats_vertices_count(&self) -> usize {
        self.vertices_count.load(Ordering::Acquire)
    }

    /// Index count of the last `load`, 0 if it failed
    pub fn stats_indices_count(&self) -> usize {
        self.indices_count.load(Ordering::Acquire)
    }
}
