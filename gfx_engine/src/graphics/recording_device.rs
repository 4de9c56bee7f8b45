/// Headless graphics device (no GPU required)
///
/// Records every native call as a `DeviceCommand` and keeps live backend
/// objects in slotmap tables, so tests and headless runs can check exactly
/// which calls a frame produced and that resources are released with their
/// last owner.
///
/// Cloning a `RecordingDevice` shares the same recording: keep a clone to
/// inspect a device that was moved into `DeviceGraphics`.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use slotmap::{new_key_type, Key, KeyData, SlotMap};
use crate::color::Color;
use crate::error::{Error, Result};
use crate::graphics::{Buffer, GeometryBuffers, GraphicsDevice, Program, VertexArray};
use crate::image::Image;
use crate::material::{ShaderFieldType, ShaderFieldValue, ShaderValuesInfo};

new_key_type! {
    /// Key of a recorded program
    pub struct ProgramKey;
    /// Key of a recorded buffer
    pub struct BufferKey;
    /// Key of a recorded vertex array
    pub struct VertexArrayKey;
}

// ============================================================================
// Commands
// ============================================================================

/// One native call issued to the device
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    CompileProgram(ProgramKey),
    CreateGeometry {
        vertex_array: VertexArrayKey,
        vertex_buffer: BufferKey,
        index_buffer: BufferKey,
        stride: usize,
    },
    BeginFrame,
    EndFrame,
    UseProgram(ProgramKey),
    BindGeometry(VertexArrayKey),
    UploadBuffer { buffer: BufferKey, size: usize },
    SetUniform { location: u32, value: ShaderFieldValue },
    BindTexture { unit: u32, width: u32, height: u32 },
    SetSampler { location: u32, unit: u32 },
    DrawIndexed(u32),
    Clear(Color),
    SetWireframe(bool),
    SetCulling(bool),
    SetDepthTest(bool),
    SetBlend(bool),
    Resize { width: u32, height: u32 },
    ReleaseProgram(ProgramKey),
    ReleaseBuffer(BufferKey),
    ReleaseVertexArray(VertexArrayKey),
}

impl DeviceCommand {
    /// Whether the command is a GPU state change (bind or toggle)
    pub fn is_state_change(&self) -> bool {
        matches!(
            self,
            DeviceCommand::UseProgram(_)
                | DeviceCommand::BindGeometry(_)
                | DeviceCommand::BindTexture { .. }
                | DeviceCommand::SetWireframe(_)
                | DeviceCommand::SetCulling(_)
                | DeviceCommand::SetDepthTest(_)
                | DeviceCommand::SetBlend(_)
        )
    }
}

// ============================================================================
// Shared state
// ============================================================================

#[derive(Default)]
struct RecordingState {
    commands: Vec<DeviceCommand>,
    programs: SlotMap<ProgramKey, ShaderValuesInfo>,
    buffers: SlotMap<BufferKey, Vec<u8>>,
    vertex_arrays: SlotMap<VertexArrayKey, ShaderValuesInfo>,
}

type SharedState = Arc<Mutex<RecordingState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, RecordingState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn key_from_id<K: From<KeyData>>(id: u64) -> K {
    KeyData::from_ffi(id).into()
}

// ============================================================================
// Recorded resources
// ============================================================================

pub struct RecordedProgram {
    key: ProgramKey,
    state: SharedState,
}

impl fmt::Debug for RecordedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordedProgram").field("key", &self.key).finish()
    }
}

impl Program for RecordedProgram {
    fn native_id(&self) -> u64 {
        self.key.data().as_ffi()
    }
}

impl Drop for RecordedProgram {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.programs.remove(self.key);
        state.commands.push(DeviceCommand::ReleaseProgram(self.key));
    }
}

pub struct RecordedBuffer {
    key: BufferKey,
    state: SharedState,
}

impl fmt::Debug for RecordedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordedBuffer").field("key", &self.key).finish()
    }
}

impl Buffer for RecordedBuffer {
    fn native_id(&self) -> u64 {
        self.key.data().as_ffi()
    }

    fn upload(&self, data: &[u8]) -> Result<()> {
        let mut state = lock(&self.state);
        let contents = state
            .buffers
            .get_mut(self.key)
            .ok_or_else(|| Error::InvalidResource("Upload to a released buffer".to_string()))?;
        contents.clear();
        contents.extend_from_slice(data);
        state.commands.push(DeviceCommand::UploadBuffer {
            buffer: self.key,
            size: data.len(),
        });
        Ok(())
    }

    fn size(&self) -> u64 {
        lock(&self.state)
            .buffers
            .get(self.key)
            .map_or(0, |contents| contents.len() as u64)
    }
}

impl Drop for RecordedBuffer {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.buffers.remove(self.key);
        state.commands.push(DeviceCommand::ReleaseBuffer(self.key));
    }
}

pub struct RecordedVertexArray {
    key: VertexArrayKey,
    state: SharedState,
}

impl fmt::Debug for RecordedVertexArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordedVertexArray").field("key", &self.key).finish()
    }
}

impl VertexArray for RecordedVertexArray {
    fn native_id(&self) -> u64 {
        self.key.data().as_ffi()
    }
}

impl Drop for RecordedVertexArray {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.vertex_arrays.remove(self.key);
        state.commands.push(DeviceCommand::ReleaseVertexArray(self.key));
    }
}

// ============================================================================
// Device
// ============================================================================

#[derive(Clone, Default)]
pub struct RecordingDevice {
    state: SharedState,
}

impl fmt::Debug for RecordingDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("RecordingDevice")
            .field("commands", &state.commands.len())
            .field("programs", &state.programs.len())
            .field("buffers", &state.buffers.len())
            .field("vertex_arrays", &state.vertex_arrays.len())
            .finish()
    }
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every command recorded so far
    pub fn commands(&self) -> Vec<DeviceCommand> {
        lock(&self.state).commands.clone()
    }

    /// Forget recorded commands (live resources are kept)
    pub fn clear_commands(&self) {
        lock(&self.state).commands.clear();
    }

    /// Number of recorded commands matching `predicate`
    pub fn count(&self, predicate: impl Fn(&DeviceCommand) -> bool) -> usize {
        lock(&self.state).commands.iter().filter(|command| predicate(*command)).count()
    }

    pub fn live_programs(&self) -> usize {
        lock(&self.state).programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        lock(&self.state).buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        lock(&self.state).vertex_arrays.len()
    }

    /// Current contents of a live buffer
    pub fn buffer_contents(&self, buffer: &dyn Buffer) -> Option<Vec<u8>> {
        let key: BufferKey = key_from_id(buffer.native_id());
        lock(&self.state).buffers.get(key).cloned()
    }

    /// Attribute layout a live vertex array was described with
    pub fn vertex_array_layout(&self, vertex_array: &dyn VertexArray) -> Option<ShaderValuesInfo> {
        let key: VertexArrayKey = key_from_id(vertex_array.native_id());
        lock(&self.state).vertex_arrays.get(key).cloned()
    }

    fn record(&self, command: DeviceCommand) {
        lock(&self.state).commands.push(command);
    }
}

impl GraphicsDevice for RecordingDevice {
    fn compile_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
        attributes: &ShaderValuesInfo,
        uniforms: &ShaderValuesInfo,
    ) -> Result<Arc<dyn Program>> {
        if vertex_source.trim().is_empty() {
            return Err(Error::ShaderCompilation("Vertex shader source is empty".to_string()));
        }
        if fragment_source.trim().is_empty() {
            return Err(Error::ShaderCompilation("Fragment shader source is empty".to_string()));
        }
        // no 64-bit integer uniform setters in core GL
        if let Some(field) = uniforms
            .fields()
            .iter()
            .find(|field| matches!(field.field_type, ShaderFieldType::I64 | ShaderFieldType::U64))
        {
            return Err(Error::UnsupportedFieldType {
                field: field.name.clone(),
                field_type: field.field_type,
            });
        }

        let mut state = lock(&self.state);
        let key = state.programs.insert(attributes.clone());
        state.commands.push(DeviceCommand::CompileProgram(key));
        drop(state);

        Ok(Arc::new(RecordedProgram {
            key,
            state: Arc::clone(&self.state),
        }))
    }

    fn create_geometry(&mut self, layout: &ShaderValuesInfo) -> Result<GeometryBuffers> {
        let mut state = lock(&self.state);
        let vertex_array = state.vertex_arrays.insert(layout.clone());
        let vertex_buffer = state.buffers.insert(Vec::new());
        let index_buffer = state.buffers.insert(Vec::new());
        state.commands.push(DeviceCommand::CreateGeometry {
            vertex_array,
            vertex_buffer,
            index_buffer,
            stride: layout.total_byte_size(),
        });
        drop(state);

        Ok(GeometryBuffers {
            vertex_array: Arc::new(RecordedVertexArray {
                key: vertex_array,
                state: Arc::clone(&self.state),
            }),
            vertex_buffer: Arc::new(RecordedBuffer {
                key: vertex_buffer,
                state: Arc::clone(&self.state),
            }),
            index_buffer: Arc::new(RecordedBuffer {
                key: index_buffer,
                state: Arc::clone(&self.state),
            }),
        })
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.record(DeviceCommand::BeginFrame);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.record(DeviceCommand::EndFrame);
        Ok(())
    }

    fn use_program(&mut self, program: &Arc<dyn Program>) -> Result<()> {
        self.record(DeviceCommand::UseProgram(key_from_id(program.native_id())));
        Ok(())
    }

    fn bind_geometry(&mut self, geometry: &GeometryBuffers) -> Result<()> {
        self.record(DeviceCommand::BindGeometry(key_from_id(geometry.vertex_array.native_id())));
        Ok(())
    }

    fn set_uniform(&mut self, location: u32, value: &ShaderFieldValue) -> Result<()> {
        self.record(DeviceCommand::SetUniform {
            location,
            value: value.clone(),
        });
        Ok(())
    }

    fn bind_texture(&mut self, unit: u32, image: &Arc<Image>) -> Result<()> {
        self.record(DeviceCommand::BindTexture {
            unit,
            width: image.width(),
            height: image.height(),
        });
        Ok(())
    }

    fn set_sampler(&mut self, location: u32, unit: u32) -> Result<()> {
        self.record(DeviceCommand::SetSampler { location, unit });
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32) -> Result<()> {
        self.record(DeviceCommand::DrawIndexed(index_count));
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        self.record(DeviceCommand::Clear(color));
        Ok(())
    }

    fn set_wireframe(&mut self, enable: bool) -> Result<()> {
        self.record(DeviceCommand::SetWireframe(enable));
        Ok(())
    }

    fn set_culling(&mut self, enable: bool) -> Result<()> {
        self.record(DeviceCommand::SetCulling(enable));
        Ok(())
    }

    fn set_depth_test(&mut self, enable: bool) -> Result<()> {
        self.record(DeviceCommand::SetDepthTest(enable));
        Ok(())
    }

    fn set_blend(&mut self, enable: bool) -> Result<()> {
        self.record(DeviceCommand::SetBlend(enable));
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.record(DeviceCommand::Resize { width, height });
        Ok(())
    }
}

#[cfg(test)]
#[path = "recording_device_tests.rs"]
mod tests;
