/// Generic `Graphics` implementation over a `GraphicsDevice`.
///
/// Walks a frame's tasks once, in order, and translates them into device
/// calls. Within one `draw`, binds are only issued when the target does not
/// already hold the desired object:
/// - program and geometry are compared by resource identity
/// - each texture unit is compared by `Arc<Image>` identity
///
/// Tracking starts empty at every `draw`, so the first draw of a frame
/// always binds.

use std::sync::Arc;
use winit::dpi::PhysicalSize;
use crate::error::{Error, Result};
use crate::frame::{DrawMaterial, DrawTask, Frame};
use crate::graphics::{
    same_resource, GeometryBuffers, Graphics, GraphicsCacheVertices, GraphicsConfig,
    GraphicsDevice, Program,
};
use crate::image::Image;
use crate::material::{CreateMaterialParams, Material, ShaderFieldValue};
use crate::{engine_debug, engine_info, engine_warn};

/// Objects currently bound on the device
struct BoundState {
    program: Option<Arc<dyn Program>>,
    geometry: Option<GeometryBuffers>,
    textures: Vec<Option<Arc<Image>>>,
}

impl BoundState {
    fn new(texture_units: u32) -> Self {
        Self {
            program: None,
            geometry: None,
            textures: vec![None; texture_units as usize],
        }
    }
}

pub struct DeviceGraphics<D: GraphicsDevice> {
    device: D,
    config: GraphicsConfig,
    render_size: PhysicalSize<u32>,
}

impl<D: GraphicsDevice> DeviceGraphics<D> {
    /// Wrap `device` and apply the initial pipeline state from `config`
    ///
    /// # Errors
    ///
    /// `InitializationFailed` if the initial render size is zero.
    pub fn new(mut device: D, config: GraphicsConfig) -> Result<Self> {
        let render_size = scaled_size(config.initial_size, config.resolution_scale);
        if render_size.width == 0 || render_size.height == 0 {
            return Err(Error::InitializationFailed(format!(
                "Initial render size is {}x{}",
                render_size.width, render_size.height
            )));
        }

        device.resize(render_size.width, render_size.height)?;
        device.set_culling(config.culling)?;
        device.set_depth_test(config.depth_test)?;

        engine_info!(
            "gfx::DeviceGraphics",
            "Graphics initialized: {}x{}, {} texture units",
            render_size.width,
            render_size.height,
            config.texture_units
        );

        Ok(Self {
            device,
            config,
            render_size,
        })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    /// Current render target size (window size times resolution scale)
    pub fn render_size(&self) -> PhysicalSize<u32> {
        self.render_size
    }

    // ===== TASK EXECUTION =====

    fn draw_material(&mut self, bound: &mut BoundState, draw: &DrawMaterial) -> Result<()> {
        let material = &draw.material;
        let geometry = self.material_geometry(material)?;

        self.bind(bound, material.program(), geometry)?;
        geometry.upload(&draw.vertices, &draw.indices)?;
        self.apply_uniforms(bound, material)?;

        self.draw_elements(draw.indices.len())
    }

    fn draw_cached(&mut self, bound: &mut BoundState, cache: &GraphicsCacheVertices) -> Result<()> {
        let material = cache.material();

        self.bind(bound, material.program(), cache.geometry())?;
        self.apply_uniforms(bound, material)?;

        self.draw_elements(cache.stats_indices_count())
    }

    /// Geometry buffers of `material`, allocated on first use
    fn material_geometry<'m>(&mut self, material: &'m Material) -> Result<&'m GeometryBuffers> {
        if let Some(geometry) = material.geometry() {
            return Ok(geometry);
        }

        let buffers = self.device.create_geometry(material.attribute_info())?;
        engine_debug!(
            "gfx::DeviceGraphics",
            "Allocated geometry buffers for material ({} byte stride)",
            material.stride()
        );
        Ok(material.init_geometry(buffers))
    }

    fn bind(
        &mut self,
        bound: &mut BoundState,
        program: &Arc<dyn Program>,
        geometry: &GeometryBuffers,
    ) -> Result<()> {
        let program_bound = bound
            .program
            .as_ref()
            .is_some_and(|current| same_resource(current, program));
        if !program_bound {
            self.device.use_program(program)?;
            bound.program = Some(Arc::clone(program));
        }

        let geometry_bound = bound
            .geometry
            .as_ref()
            .is_some_and(|current| current.same_as(geometry));
        if !geometry_bound {
            self.device.bind_geometry(geometry)?;
            bound.geometry = Some(geometry.clone());
        }

        Ok(())
    }

    /// Upload every uniform of `material` to the current program
    ///
    /// Texture uniforms take texture units in declaration order.
    fn apply_uniforms(&mut self, bound: &mut BoundState, material: &Material) -> Result<()> {
        let fields = material.uniform_info().fields();
        let texture_units = self.config.texture_units;
        let device = &mut self.device;

        material.with_uniforms(|values| -> Result<()> {
            let mut unit = 0u32;

            for (location, (field, value)) in fields.iter().zip(values).enumerate() {
                let location = location as u32;
                let value = value.as_ref().ok_or_else(|| {
                    Error::InvalidResource(format!("Uniform '{}' has no value", field.name))
                })?;

                match value {
                    ShaderFieldValue::Texture(image) => {
                        if unit >= texture_units {
                            return Err(Error::InvalidResource(format!(
                                "Texture uniform '{}' exceeds the {} available texture units",
                                field.name, texture_units
                            )));
                        }

                        let slot = &mut bound.textures[unit as usize];
                        let already_bound = slot
                            .as_ref()
                            .is_some_and(|current| Arc::ptr_eq(current, image));
                        if !already_bound {
                            device.bind_texture(unit, image)?;
                            *slot = Some(Arc::clone(image));
                        }

                        device.set_sampler(location, unit)?;
                        unit += 1;
                    }
                    other => device.set_uniform(location, other)?,
                }
            }

            Ok(())
        })
    }

    fn draw_elements(&mut self, index_count: usize) -> Result<()> {
        if index_count == 0 {
            return Ok(());
        }
        let count = u32::try_from(index_count).map_err(|_| Error::IndexOverflow)?;
        self.device.draw_indexed(count)
    }
}

impl<D: GraphicsDevice> Graphics for DeviceGraphics<D> {
    fn draw(&mut self, frame: &Frame) -> Result<()> {
        self.device.begin_frame()?;

        let mut bound = BoundState::new(self.config.texture_units);

        for task in frame.tasks() {
            match task {
                DrawTask::DrawMaterial(draw) => self.draw_material(&mut bound, draw)?,
                DrawTask::DrawCached(cache) => self.draw_cached(&mut bound, cache)?,
                DrawTask::ClearBackground(color) => self.device.clear(*color)?,
                DrawTask::SettingWireframe(enable) => self.device.set_wireframe(*enable)?,
                DrawTask::SettingCulling(enable) => self.device.set_culling(*enable)?,
                DrawTask::SettingBlend(enable) => self.device.set_blend(*enable)?,
                DrawTask::SettingDepth(enable) => self.device.set_depth_test(*enable)?,
            }
        }

        self.device.end_frame()
    }

    fn create_material(&mut self, params: CreateMaterialParams) -> Result<Arc<Material>> {
        let program = self.device.compile_program(
            &params.vertex_shader,
            &params.fragment_shader,
            &params.attributes,
            &params.uniforms,
        )?;

        let material = Material::new(program, params.attributes, params.uniforms)?;

        engine_info!(
            "gfx::DeviceGraphics",
            "Created material: {} attributes ({} byte stride), {} uniforms",
            material.attribute_info().len(),
            material.stride(),
            material.uniform_info().len()
        );

        Ok(Arc::new(material))
    }

    fn create_cache_vertices(&mut self, material: Arc<Material>) -> Result<Arc<GraphicsCacheVertices>> {
        let geometry = self.device.create_geometry(material.attribute_info())?;
        Ok(Arc::new(GraphicsCacheVertices::new(material, geometry)))
    }

    fn resize(&mut self, size: PhysicalSize<u32>, scale: f32) -> Result<()> {
        let render_size = scaled_size(size, scale);
        if render_size.width == 0 || render_size.height == 0 {
            engine_warn!(
                "gfx::DeviceGraphics",
                "Ignoring resize to {}x{} (scale {})",
                size.width,
                size.height,
                scale
            );
            return Ok(());
        }

        self.device.resize(render_size.width, render_size.height)?;
        self.render_size = render_size;
        self.config.resolution_scale = scale;
        Ok(())
    }
}

fn scaled_size(size: PhysicalSize<u32>, scale: f32) -> PhysicalSize<u32> {
    PhysicalSize::new(
        (size.width as f32 * scale) as u32,
        (size.height as f32 * scale) as u32,
    )
}

#[cfg(test)]
#[path = "device_graphics_tests.rs"]
mod tests;
