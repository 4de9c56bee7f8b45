/// Shader value layouts and typed uniform values.
///
/// A `ShaderValuesInfo` describes either a vertex attribute layout (field order
/// defines the memory layout, `total_byte_size` is the vertex stride) or a
/// uniform layout (field order defines the binding location).

use std::sync::Arc;
use glam::{Mat4, Vec2, Vec3, Vec4};
use crate::image::Image;

// ===== FIELD TYPES =====

/// Closed set of shader field kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderFieldType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    /// 4x4 f32 matrix, column-major
    Matrix4,
    Vec1,
    Vec2,
    Vec3,
    Vec4,
    /// Texture slot; stores an image reference rather than inline bytes
    Texture,
}

impl ShaderFieldType {
    /// Size in bytes of one element of this type
    pub const fn size(self) -> usize {
        match self {
            ShaderFieldType::I8 | ShaderFieldType::U8 => 1,
            ShaderFieldType::I16 | ShaderFieldType::U16 => 2,
            ShaderFieldType::I32 | ShaderFieldType::U32 | ShaderFieldType::F32 => 4,
            ShaderFieldType::I64 | ShaderFieldType::U64 | ShaderFieldType::F64 => 8,
            ShaderFieldType::Matrix4 => 4 * 16,
            ShaderFieldType::Vec1 => 4,
            ShaderFieldType::Vec2 => 8,
            ShaderFieldType::Vec3 => 12,
            ShaderFieldType::Vec4 => 16,
            ShaderFieldType::Texture => 4,
        }
    }

    /// Whether the type can be fed to the vertex input stage
    ///
    /// 64-bit integers, matrices and textures have no vertex attribute mapping.
    pub const fn is_attribute_type(self) -> bool {
        !matches!(
            self,
            ShaderFieldType::I64
                | ShaderFieldType::U64
                | ShaderFieldType::Matrix4
                | ShaderFieldType::Texture
        )
    }
}

// ===== FIELD INFO =====

/// One named field of a layout
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderFieldInfo {
    pub name: String,
    pub field_type: ShaderFieldType,
    /// Normalize integer attributes to [0, 1] / [-1, 1]
    pub normalize: bool,
    /// Number of components
    pub count: u32,
}

impl ShaderFieldInfo {
    pub fn new(name: impl Into<String>, field_type: ShaderFieldType, count: u32) -> Self {
        Self {
            name: name.into(),
            field_type,
            normalize: false,
            count,
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }

    pub const fn byte_size(&self) -> usize {
        Self::type_size(self.field_type) * self.count as usize
    }

    pub const fn type_size(field_type: ShaderFieldType) -> usize {
        field_type.size()
    }
}

// ===== VALUES INFO =====

/// Ordered list of fields plus their running byte total
///
/// `total_byte_size` always equals the sum of `byte_size()` over `fields`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderValuesInfo {
    total_byte_size: usize,
    fields: Vec<ShaderFieldInfo>,
}

impl ShaderValuesInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field and advance the running byte size
    pub fn add(&mut self, field: ShaderFieldInfo) {
        self.total_byte_size += field.byte_size();
        self.fields.push(field);
    }

    /// Builder form of `add`
    pub fn with(mut self, field: ShaderFieldInfo) -> Self {
        self.add(field);
        self
    }

    pub fn total_byte_size(&self) -> usize {
        self.total_byte_size
    }

    pub fn fields(&self) -> &[ShaderFieldInfo] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Byte offset of field `index` inside one element
    pub fn field_offset(&self, index: usize) -> Option<usize> {
        if index >= self.fields.len() {
            return None;
        }
        Some(self.fields[..index].iter().map(ShaderFieldInfo::byte_size).sum())
    }

    /// Index of the field called `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

// ===== VALUES =====

/// Typed uniform value
#[derive(Debug, Clone, PartialEq)]
pub enum ShaderFieldValue {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Matrix4(Mat4),
    Vec1(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Texture(Arc<Image>),
}

impl ShaderFieldValue {
    /// The layout type this value satisfies
    pub fn field_type(&self) -> ShaderFieldType {
        match self {
            ShaderFieldValue::I8(_) => ShaderFieldType::I8,
            ShaderFieldValue::U8(_) => ShaderFieldType::U8,
            ShaderFieldValue::I16(_) => ShaderFieldType::I16,
            ShaderFieldValue::U16(_) => ShaderFieldType::U16,
            ShaderFieldValue::I32(_) => ShaderFieldType::I32,
            ShaderFieldValue::U32(_) => ShaderFieldType::U32,
            ShaderFieldValue::I64(_) => ShaderFieldType::I64,
            ShaderFieldValue::U64(_) => ShaderFieldType::U64,
            ShaderFieldValue::F32(_) => ShaderFieldType::F32,
            ShaderFieldValue::F64(_) => ShaderFieldType::F64,
            ShaderFieldValue::Matrix4(_) => ShaderFieldType::Matrix4,
            ShaderFieldValue::Vec1(_) => ShaderFieldType::Vec1,
            ShaderFieldValue::Vec2(_) => ShaderFieldType::Vec2,
            ShaderFieldValue::Vec3(_) => ShaderFieldType::Vec3,
            ShaderFieldValue::Vec4(_) => ShaderFieldType::Vec4,
            ShaderFieldValue::Texture(_) => ShaderFieldType::Texture,
        }
    }

    /// Image reference of a texture value
    pub fn as_texture(&self) -> Option<&Arc<Image>> {
        match self {
            ShaderFieldValue::Texture(image) => Some(image),
            _ => None,
        }
    }
}

impl From<Mat4> for ShaderFieldValue {
    fn from(m: Mat4) -> Self {
        ShaderFieldValue::Matrix4(m)
    }
}

impl From<Arc<Image>> for ShaderFieldValue {
    fn from(image: Arc<Image>) -> Self {
        ShaderFieldValue::Texture(image)
    }
}

impl From<Vec4> for ShaderFieldValue {
    fn from(v: Vec4) -> Self {
        ShaderFieldValue::Vec4(v)
    }
}

impl From<f32> for ShaderFieldValue {
    fn from(v: f32) -> Self {
        ShaderFieldValue::F32(v)
    }
}

#[cfg(test)]
#[path = "shader_values_tests.rs"]
mod tests;
