//! Material module
//!
//! Shader layouts, typed uniform values, and the shared material handle.

pub mod shader_values;
pub mod material;

pub use shader_values::{ShaderFieldInfo, ShaderFieldType, ShaderFieldValue, ShaderValuesInfo};
pub use material::{CreateMaterialParams, Material};
