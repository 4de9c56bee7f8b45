/// Backend-opaque material handle.
///
/// A Material bundles a compiled program with its attribute layout (vertex
/// stride and memory layout) and its uniform layout (binding locations), plus
/// one optional typed value per uniform.
///
/// Materials are shared as `Arc<Material>` by every frame task, cache and
/// backend object that uses them. Batching compares materials by `Arc`
/// identity, never structurally.
///
/// GPU lifetime:
/// - the compiled program is created with the material
/// - per-material geometry buffers are allocated by the backend on first draw
///   and stored here, so they are released exactly when the last `Arc` drops

use std::sync::{Arc, OnceLock, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use crate::error::{Error, Result};
use crate::engine_error;
use crate::graphics::{GeometryBuffers, Program};
use crate::material::{ShaderFieldValue, ShaderValuesInfo};

/// Material creation parameters
///
/// Shader sources are backend-specific text and opaque to the frame core.
#[derive(Debug, Clone, Default)]
pub struct CreateMaterialParams {
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub attributes: ShaderValuesInfo,
    pub uniforms: ShaderValuesInfo,
}

#[derive(Debug)]
pub struct Material {
    program: Arc<dyn Program>,
    attribute_info: ShaderValuesInfo,
    uniform_info: ShaderValuesInfo,
    uniform_names: FxHashMap<String, usize>,
    uniforms: RwLock<Vec<Option<ShaderFieldValue>>>,
    geometry: OnceLock<GeometryBuffers>,
}

impl Material {
    /// Create a material around an already compiled program
    ///
    /// Called by `Graphics::create_material` implementations.
    ///
    /// # Errors
    ///
    /// - `InvalidResource` if the attribute layout is empty
    /// - `UnsupportedFieldType` if an attribute has no vertex input mapping
    /// - `BackendError` on duplicate attribute or uniform names
    pub fn new(
        program: Arc<dyn Program>,
        attributes: ShaderValuesInfo,
        uniforms: ShaderValuesInfo,
    ) -> Result<Self> {
        if attributes.total_byte_size() == 0 {
            return Err(Error::InvalidResource(
                "Material attribute layout must have a non-zero stride".to_string(),
            ));
        }

        for field in attributes.fields() {
            if !field.field_type.is_attribute_type() {
                return Err(Error::UnsupportedFieldType {
                    field: field.name.clone(),
                    field_type: field.field_type,
                });
            }
        }

        let mut seen_attributes = FxHashSet::default();
        for field in attributes.fields() {
            if !seen_attributes.insert(field.name.as_str()) {
                return Err(duplicate_name("attribute", &field.name));
            }
        }

        let mut uniform_names = FxHashMap::default();
        for (index, field) in uniforms.fields().iter().enumerate() {
            if uniform_names.insert(field.name.clone(), index).is_some() {
                return Err(duplicate_name("uniform", &field.name));
            }
        }

        let values = vec![None; uniforms.len()];

        Ok(Self {
            program,
            attribute_info: attributes,
            uniform_info: uniforms,
            uniform_names,
            uniforms: RwLock::new(values),
            geometry: OnceLock::new(),
        })
    }

    // ===== ACCESSORS =====

    pub fn program(&self) -> &Arc<dyn Program> {
        &self.program
    }

    pub fn attribute_info(&self) -> &ShaderValuesInfo {
        &self.attribute_info
    }

    pub fn uniform_info(&self) -> &ShaderValuesInfo {
        &self.uniform_info
    }

    /// Vertex stride in bytes (attribute `total_byte_size`)
    pub fn stride(&self) -> usize {
        self.attribute_info.total_byte_size()
    }

    /// Check that `byte_len` bytes hold a whole number of vertices
    pub fn check_vertex_bytes(&self, byte_len: usize) -> Result<usize> {
        let stride = self.stride();
        if byte_len % stride != 0 {
            return Err(Error::InvalidVertexData { byte_len, stride });
        }
        Ok(byte_len / stride)
    }

    // ===== UNIFORMS =====

    pub fn uniform_index(&self, name: &str) -> Option<usize> {
        self.uniform_names.get(name).copied()
    }

    /// Write uniform `index`
    ///
    /// # Errors
    ///
    /// `InvalidResource` if the index is out of range or the value type does
    /// not match the declared field type.
    pub fn set_uniform(&self, index: usize, value: impl Into<ShaderFieldValue>) -> Result<()> {
        let value = value.into();
        let field = self.uniform_info.fields().get(index).ok_or_else(|| {
            Error::InvalidResource(format!(
                "Uniform index {} out of range ({} uniforms)",
                index,
                self.uniform_info.len()
            ))
        })?;

        if value.field_type() != field.field_type {
            return Err(Error::InvalidResource(format!(
                "Uniform '{}' expects {:?}, got {:?}",
                field.name,
                field.field_type,
                value.field_type()
            )));
        }

        let mut uniforms = self.uniforms.write().unwrap_or_else(|p| p.into_inner());
        uniforms[index] = Some(value);
        Ok(())
    }

    pub fn set_uniform_by_name(&self, name: &str, value: impl Into<ShaderFieldValue>) -> Result<()> {
        let index = self
            .uniform_index(name)
            .ok_or_else(|| Error::InvalidResource(format!("Unknown uniform '{}'", name)))?;
        self.set_uniform(index, value)
    }

    /// Current value of uniform `index` (None if unset or out of range)
    pub fn uniform(&self, index: usize) -> Option<ShaderFieldValue> {
        let uniforms = self.uniforms.read().unwrap_or_else(|p| p.into_inner());
        uniforms.get(index).cloned().flatten()
    }

    /// Run `f` over all uniform slots under a single read lock
    pub fn with_uniforms<R>(&self, f: impl FnOnce(&[Option<ShaderFieldValue>]) -> R) -> R {
        let uniforms = self.uniforms.read().unwrap_or_else(|p| p.into_inner());
        f(&uniforms)
    }

    // ===== BACKEND GEOMETRY =====

    /// Geometry buffers allocated by the backend, if the material was drawn
    pub fn geometry(&self) -> Option<&GeometryBuffers> {
        self.geometry.get()
    }

    /// Store the geometry buffers allocated on first draw
    ///
    /// If buffers were already stored, the existing ones are kept and `buffers`
    /// is dropped.
    pub fn init_geometry(&self, buffers: GeometryBuffers) -> &GeometryBuffers {
        self.geometry.get_or_init(|| buffers)
    }
}

fn duplicate_name(kind: &str, name: &str) -> Error {
    let message = format!("Duplicate {} name '{}'", kind, name);
    engine_error!("gfx::Material", "{}", message);
    Error::InvalidResource(message)
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
