/// CPU-side reusable vertex/index blob.
///
/// Geometry recorded into a cache follows the same batching rule as a frame:
/// every `add_vertices` call is appended to one growing vertex buffer and its
/// indices are rebased onto it. Indices are always relative to the cache's own
/// vertex buffer.
///
/// A cache is bound to the attribute layout of the first material recorded
/// into it; recording with a material whose layout differs is rejected. The
/// binding is released by `clear()` / `hard_clear()`.
///
/// Caches are never invalidated implicitly: re-record when the source
/// geometry changes.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::frame::DrawTarget;
use crate::material::{Material, ShaderValuesInfo};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameCacheVertices {
    vertices: Vec<u8>,
    indices: Vec<u32>,
    layout: Option<ShaderValuesInfo>,
}

impl FrameCacheVertices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty cache with reserved storage
    pub fn with_capacity(vertex_bytes: usize, indices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_bytes),
            indices: Vec::with_capacity(indices),
            layout: None,
        }
    }

    pub fn vertices(&self) -> &[u8] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Attribute layout the cache is bound to (None while empty)
    pub fn layout(&self) -> Option<&ShaderValuesInfo> {
        self.layout.as_ref()
    }

    /// Number of whole vertices recorded
    pub fn vertex_count(&self) -> usize {
        match &self.layout {
            Some(layout) => self.vertices.len() / layout.total_byte_size(),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    /// Empty the cache, keeping its storage
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.layout = None;
    }

    /// Empty the cache and release its storage
    pub fn hard_clear(&mut self) {
        self.vertices = Vec::new();
        self.indices = Vec::new();
        self.layout = None;
    }

    /// Check that `material` can record into this cache
    pub(crate) fn check_compatible(&self, material: &Material) -> Result<()> {
        match &self.layout {
            Some(layout) if layout != material.attribute_info() => {
                Err(Error::IncompatibleLayout(format!(
                    "cache holds {}-byte vertices ({} fields), material uses {}-byte vertices ({} fields)",
                    layout.total_byte_size(),
                    layout.len(),
                    material.stride(),
                    material.attribute_info().len()
                )))
            }
            _ => Ok(()),
        }
    }
}

impl DrawTarget for FrameCacheVertices {
    fn add_vertices(&mut self, material: &Arc<Material>, vertices: &[u8], indices: &[u32]) -> Result<()> {
        material.check_vertex_bytes(vertices.len())?;
        self.check_compatible(material)?;

        append_rebased(material.stride(), &mut self.vertices, &mut self.indices, vertices, indices)?;

        if self.layout.is_none() {
            self.layout = Some(material.attribute_info().clone());
        }
        Ok(())
    }
}

/// Append `new_vertices` / `new_indices`, rebasing the new indices by the
/// number of vertices already present.
///
/// On error both buffers are left unchanged.
pub(crate) fn append_rebased(
    stride: usize,
    vertices: &mut Vec<u8>,
    indices: &mut Vec<u32>,
    new_vertices: &[u8],
    new_indices: &[u32],
) -> Result<()> {
    let base = u32::try_from(vertices.len() / stride).map_err(|_| Error::IndexOverflow)?;
    let total_vertices = (vertices.len() + new_vertices.len()) / stride;
    if u32::try_from(total_vertices).is_err() {
        return Err(Error::IndexOverflow);
    }

    let prev_indices = indices.len();
    indices.reserve(new_indices.len());
    for &index in new_indices {
        match index.checked_add(base) {
            Some(rebased) => indices.push(rebased),
            None => {
                indices.truncate(prev_indices);
                return Err(Error::IndexOverflow);
            }
        }
    }

    vertices.extend_from_slice(new_vertices);
    Ok(())
}

#[cfg(test)]
#[path = "cache_vertices_tests.rs"]
mod tests;
