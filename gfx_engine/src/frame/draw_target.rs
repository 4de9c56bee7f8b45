/// Recording destination shared by `Frame` and `FrameCacheVertices`.
///
/// Helpers that emit geometry take a `DrawTarget` so the same code can record
/// straight into the frame or into a cache for later reuse.

use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use crate::color::Color;
use crate::error::Result;
use crate::frame::FrameCacheVertices;
use crate::material::{Material, ShaderFieldInfo, ShaderFieldType, ShaderValuesInfo};

/// Position + color vertex used by the triangle/quad helpers
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub pos: Vec3,
    pub color: Color,
}

impl Vertex {
    pub fn new(pos: Vec3, color: Color) -> Self {
        Self { pos, color }
    }

    /// Vertex in the z = 0 plane
    pub fn flat(pos: Vec2, color: Color) -> Self {
        Self { pos: pos.extend(0.0), color }
    }

    /// Attribute layout matching this struct (`pos`: 3 x f32, `color`: 4 x f32)
    pub fn layout() -> ShaderValuesInfo {
        ShaderValuesInfo::new()
            .with(ShaderFieldInfo::new("pos", ShaderFieldType::F32, 3))
            .with(ShaderFieldInfo::new("color", ShaderFieldType::F32, 4))
    }
}

const TRIANGLE_INDICES: [u32; 3] = [0, 1, 2];
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

pub trait DrawTarget {
    /// Record `vertices` (raw bytes in `material`'s attribute layout) and
    /// `indices` (relative to `vertices`).
    ///
    /// # Errors
    ///
    /// - `InvalidVertexData` if the byte length is not a multiple of the material stride
    /// - `IncompatibleLayout` if the destination is bound to a different layout
    /// - `IndexOverflow` if rebased indices leave the u32 range
    ///
    /// The destination is unchanged when an error is returned.
    fn add_vertices(&mut self, material: &Arc<Material>, vertices: &[u8], indices: &[u32]) -> Result<()>;

    /// Typed form of `add_vertices`
    fn add_vertices_typed<V: Pod>(&mut self, material: &Arc<Material>, vertices: &[V], indices: &[u32]) -> Result<()>
    where
        Self: Sized,
    {
        self.add_vertices(material, bytemuck::cast_slice(vertices), indices)
    }

    fn add_triangle(&mut self, material: &Arc<Material>, v0: Vertex, v1: Vertex, v2: Vertex) -> Result<()> {
        let vertices = [v0, v1, v2];
        self.add_vertices(material, bytemuck::cast_slice(&vertices), &TRIANGLE_INDICES)
    }

    /// Quad as two triangles (0, 1, 2) and (0, 2, 3)
    fn add_quad(&mut self, material: &Arc<Material>, v0: Vertex, v1: Vertex, v2: Vertex, v3: Vertex) -> Result<()> {
        let vertices = [v0, v1, v2, v3];
        self.add_vertices(material, bytemuck::cast_slice(&vertices), &QUAD_INDICES)
    }

    /// Axis-aligned quad in the z = 0 plane, counter-clockwise from `min`
    fn add_rect(&mut self, material: &Arc<Material>, min: Vec2, max: Vec2, color: Color) -> Result<()> {
        self.add_quad(
            material,
            Vertex::flat(min, color),
            Vertex::flat(Vec2::new(max.x, min.y), color),
            Vertex::flat(max, color),
            Vertex::flat(Vec2::new(min.x, max.y), color),
        )
    }

    /// Replay a cache's geometry through the normal recording path
    ///
    /// # Errors
    ///
    /// `IncompatibleLayout` if the cache was recorded with a different layout.
    fn add_cached_vertices(&mut self, material: &Arc<Material>, cache: &FrameCacheVertices) -> Result<()> {
        cache.check_compatible(material)?;
        self.add_vertices(material, cache.vertices(), cache.indices())
    }
}
