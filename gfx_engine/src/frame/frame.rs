/// Per-frame command buffer.
///
/// Application code records draw and state operations into a `Frame` every
/// tick, then hands it read-only to `Graphics::draw`.
///
/// Batching: consecutive `add_vertices` calls with the same material (by `Arc`
/// identity) are merged into the last `DrawMaterial` task, rebasing the new
/// indices by the vertex count already in that task. Any other task in
/// between (setting toggle, clear, cached draw) or a material switch starts a
/// new task, and therefore a new draw call.
///
/// Cache redirection: while a `CacheScope` is alive, geometry is routed to
/// every active cache (outermost first) instead of the frame. Setting tasks
/// and cached draws still go to the frame.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use crate::color::Color;
use crate::error::Result;
use crate::frame::cache_vertices::append_rebased;
use crate::frame::{DrawMaterial, DrawTarget, DrawTask, FrameCacheVertices};
use crate::graphics::GraphicsCacheVertices;
use crate::material::Material;

// ===== FRAME STATS =====

/// Profiling snapshot computed from a frame's tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// One per `DrawMaterial` or `DrawCached` task
    pub draw_calls: usize,
    /// Vertices uploaded this frame
    pub vertices: usize,
    /// Indices uploaded this frame
    pub indices: usize,
    /// Vertices drawn from backend caches (no upload)
    pub cache_vertices: usize,
    /// Indices drawn from backend caches (no upload)
    pub cache_indices: usize,
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "draw calls: {}, vertices: {}, indices: {}, cached vertices: {}, cached indices: {}",
            self.draw_calls, self.vertices, self.indices, self.cache_vertices, self.cache_indices
        )
    }
}

// ===== FRAME =====

#[derive(Debug, Default)]
pub struct Frame {
    tasks: Vec<DrawTask>,
    /// Active cache redirects, innermost last
    redirects: Vec<FrameCacheVertices>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty frame with room for `tasks` tasks
    pub fn with_capacity(tasks: usize) -> Self {
        Self {
            tasks: Vec::with_capacity(tasks),
            redirects: Vec::new(),
        }
    }

    /// Recorded tasks in execution order
    pub fn tasks(&self) -> &[DrawTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drop all tasks, keeping storage for the next tick
    ///
    /// Materials and backend caches referenced by the tasks are only released
    /// if nothing else holds them.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Drop all tasks and release storage
    pub fn reset(&mut self) {
        self.tasks = Vec::new();
    }

    // ===== STATE TASKS =====

    pub fn clear_background(&mut self, color: Color) {
        self.tasks.push(DrawTask::ClearBackground(color));
    }

    pub fn setting_wireframe(&mut self, enable: bool) {
        self.tasks.push(DrawTask::SettingWireframe(enable));
    }

    pub fn setting_culling(&mut self, enable: bool) {
        self.tasks.push(DrawTask::SettingCulling(enable));
    }

    pub fn setting_blend(&mut self, enable: bool) {
        self.tasks.push(DrawTask::SettingBlend(enable));
    }

    pub fn setting_depth(&mut self, enable: bool) {
        self.tasks.push(DrawTask::SettingDepth(enable));
    }

    // ===== CACHED GEOMETRY =====

    /// Draw geometry already uploaded to a backend cache object
    ///
    /// Nothing is copied; the backend binds the cache's buffers directly.
    pub fn add_graphics_cached_vertices(&mut self, cache: &Arc<GraphicsCacheVertices>) {
        self.tasks.push(DrawTask::DrawCached(Arc::clone(cache)));
    }

    /// Start routing geometry into a fresh cache
    ///
    /// The redirect ends when the returned scope is finished or dropped.
    /// Nested scopes borrow the outer one, so they always end first.
    pub fn begin_cache(&mut self) -> CacheScope<'_> {
        self.redirects.push(FrameCacheVertices::new());
        let depth = self.redirects.len();
        CacheScope {
            frame: self,
            depth,
            finished: false,
        }
    }

    /// Record everything `record` emits into a new cache
    ///
    /// # Example
    ///
    /// ```ignore
    /// let terrain = frame.cached(|scope| {
    ///     for tile in &tiles {
    ///         scope.add_quad(&material, tile.v0, tile.v1, tile.v2, tile.v3)?;
    ///     }
    ///     Ok(())
    /// })?;
    /// ```
    pub fn cached<F>(&mut self, record: F) -> Result<FrameCacheVertices>
    where
        F: FnOnce(&mut CacheScope<'_>) -> Result<()>,
    {
        let mut scope = self.begin_cache();
        record(&mut scope)?;
        Ok(scope.finish())
    }

    /// Number of active cache redirects
    pub fn redirect_depth(&self) -> usize {
        self.redirects.len()
    }

    fn pop_redirect(&mut self, depth: usize) -> FrameCacheVertices {
        debug_assert_eq!(self.redirects.len(), depth, "cache scopes must end in LIFO order");
        self.redirects.pop().unwrap_or_default()
    }

    // ===== STATS =====

    /// Sum per-task contributions in one pass
    pub fn stats(&self) -> FrameStats {
        let mut stats = FrameStats::default();

        for task in &self.tasks {
            match task {
                DrawTask::DrawMaterial(draw) => {
                    stats.draw_calls += 1;
                    stats.vertices += draw.vertex_count();
                    stats.indices += draw.indices.len();
                }
                DrawTask::DrawCached(cache) => {
                    stats.draw_calls += 1;
                    stats.cache_vertices += cache.stats_vertices_count();
                    stats.cache_indices += cache.stats_indices_count();
                }
                DrawTask::ClearBackground(_)
                | DrawTask::SettingWireframe(_)
                | DrawTask::SettingCulling(_)
                | DrawTask::SettingBlend(_)
                | DrawTask::SettingDepth(_) => {}
            }
        }

        stats
    }
}

impl DrawTarget for Frame {
    fn add_vertices(&mut self, material: &Arc<Material>, vertices: &[u8], indices: &[u32]) -> Result<()> {
        material.check_vertex_bytes(vertices.len())?;

        if !self.redirects.is_empty() {
            for cache in &self.redirects {
                cache.check_compatible(material)?;
            }
            for cache in &mut self.redirects {
                cache.add_vertices(material, vertices, indices)?;
            }
            return Ok(());
        }

        if vertices.is_empty() && indices.is_empty() {
            return Ok(());
        }

        if let Some(DrawTask::DrawMaterial(prev)) = self.tasks.last_mut() {
            if Arc::ptr_eq(&prev.material, material) {
                return append_rebased(
                    material.stride(),
                    &mut prev.vertices,
                    &mut prev.indices,
                    vertices,
                    indices,
                );
            }
        }

        self.tasks.push(DrawTask::DrawMaterial(DrawMaterial {
            material: Arc::clone(material),
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
        }));
        Ok(())
    }
}

// ===== CACHE SCOPE =====

/// Active cache redirect on a frame
///
/// Exposes the recording API of the frame: geometry recorded through it lands
/// in the scope's cache (and in every enclosing scope's cache), settings and
/// backend cache draws go to the frame. Only shared access to the frame is
/// handed out, so the redirect stack cannot be replaced while the scope is
/// alive. Dropping the scope without `finish` discards the cache.
pub struct CacheScope<'a> {
    frame: &'a mut Frame,
    depth: usize,
    finished: bool,
}

impl CacheScope<'_> {
    /// End the redirect and take the recorded cache
    pub fn finish(mut self) -> FrameCacheVertices {
        self.finished = true;
        self.frame.pop_redirect(self.depth)
    }

    /// Geometry recorded so far in this scope
    pub fn cache(&self) -> &FrameCacheVertices {
        &self.frame.redirects[self.depth - 1]
    }

    /// Nested redirect, ended before this one
    pub fn begin_cache(&mut self) -> CacheScope<'_> {
        self.frame.begin_cache()
    }

    pub fn clear_background(&mut self, color: Color) {
        self.frame.clear_background(color);
    }

    pub fn setting_wireframe(&mut self, enable: bool) {
        self.frame.setting_wireframe(enable);
    }

    pub fn setting_culling(&mut self, enable: bool) {
        self.frame.setting_culling(enable);
    }

    pub fn setting_blend(&mut self, enable: bool) {
        self.frame.setting_blend(enable);
    }

    pub fn setting_depth(&mut self, enable: bool) {
        self.frame.setting_depth(enable);
    }

    pub fn add_graphics_cached_vertices(&mut self, cache: &Arc<GraphicsCacheVertices>) {
        self.frame.add_graphics_cached_vertices(cache);
    }
}

impl DrawTarget for CacheScope<'_> {
    fn add_vertices(&mut self, material: &Arc<Material>, vertices: &[u8], indices: &[u32]) -> Result<()> {
        self.frame.add_vertices(material, vertices, indices)
    }
}

impl Deref for CacheScope<'_> {
    type Target = Frame;

    fn deref(&self) -> &Frame {
        &*self.frame
    }
}

impl Drop for CacheScope<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.frame.pop_redirect(self.depth);
        }
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
