use std::sync::Arc;
use crate::color::Color;
use crate::graphics::GraphicsCacheVertices;
use crate::material::Material;

/// Batched geometry drawn with one material
///
/// Indices are relative to this task's own vertex buffer.
#[derive(Debug, Clone)]
pub struct DrawMaterial {
    pub material: Arc<Material>,
    pub vertices: Vec<u8>,
    pub indices: Vec<u32>,
}

impl DrawMaterial {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.material.stride()
    }
}

/// One recorded unit of frame work
///
/// Tasks execute strictly in append order. Setting tasks change global
/// pipeline state for every draw that follows them.
///
/// Adding a variant forces the batching rule, `Frame::stats` and every
/// backend `draw` to handle it.
#[derive(Debug, Clone)]
pub enum DrawTask {
    DrawMaterial(DrawMaterial),
    /// Geometry already resident in a backend cache object
    DrawCached(Arc<GraphicsCacheVertices>),
    ClearBackground(Color),
    SettingWireframe(bool),
    SettingCulling(bool),
    SettingBlend(bool),
    SettingDepth(bool),
}

impl DrawTask {
    /// Whether the task issues a draw call
    pub fn is_draw(&self) -> bool {
        matches!(self, DrawTask::DrawMaterial(_) | DrawTask::DrawCached(_))
    }
}
