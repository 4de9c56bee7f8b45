//! Integration tests for Engine logging system
//!
//! These tests verify the logging system functionality, including records
//! emitted by the graphics layer itself.
//!
//! Run with: cargo test --test logging_integration_tests

use gfx_engine::gfx::Engine;
use gfx_engine::gfx::graphics::{DeviceGraphics, Graphics, GraphicsConfig, RecordingDevice};
use gfx_engine::gfx::log::{format_entry, LogEntry, LogSeverity, Logger};
use gfx_engine::gfx::material::{CreateMaterialParams, ShaderFieldInfo, ShaderFieldType, ShaderValuesInfo};
use gfx_engine::gfx::Error;
use std::sync::{Arc, Mutex};
use serial_test::serial;
use winit::dpi::PhysicalSize;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn material_params(uniforms: ShaderValuesInfo) -> CreateMaterialParams {
    CreateMaterialParams {
        vertex_shader: "void main() {}".to_string(),
        fragment_shader: "void main() {}".to_string(),
        attributes: ShaderValuesInfo::new().with(ShaderFieldInfo::new("pos", ShaderFieldType::F32, 2)),
        uniforms,
    }
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Info, "test::module", "Test info message".to_string());
    Engine::log(LogSeverity::Warn, "test::module", "Test warning message".to_string());
    Engine::log(LogSeverity::Error, "test::module", "Test error message".to_string());

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 3);
        assert_eq!(captured[0].severity, LogSeverity::Info);
        assert_eq!(captured[0].message, "Test info message");
        assert_eq!(captured[1].severity, LogSeverity::Warn);
        assert_eq!(captured[2].severity, LogSeverity::Error);
        assert!(captured.iter().all(|entry| entry.source == "test::module"));
        assert!(captured.iter().all(|entry| entry.file.is_none() && entry.line.is_none()));
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_error_logging_with_location() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log_detailed(
        LogSeverity::Error,
        "test::module",
        "Detailed error".to_string(),
        "src/frame.rs",
        42,
    );

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].file, Some("src/frame.rs"));
        assert_eq!(captured[0].line, Some(42));

        let formatted = format_entry(&captured[0]);
        assert!(formatted.contains("[ERROR]"));
        assert!(formatted.contains("[test::module] Detailed error"));
        assert!(formatted.ends_with("(src/frame.rs:42)"));
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_logger_reset() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Info, "test::module", "captured".to_string());
    Engine::reset_logger();
    Engine::log(LogSeverity::Info, "test::module", "not captured".to_string());

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].message, "captured");
}

#[test]
#[serial]
fn test_integration_graphics_logs_material_creation() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let mut graphics = DeviceGraphics::new(RecordingDevice::new(), GraphicsConfig::default()).unwrap();
    graphics.create_material(material_params(ShaderValuesInfo::new())).unwrap();

    {
        let captured = entries.lock().unwrap();
        let infos: Vec<&LogEntry> = captured
            .iter()
            .filter(|entry| entry.source == "gfx::DeviceGraphics" && entry.severity == LogSeverity::Info)
            .collect();
        assert_eq!(infos.len(), 2);
        assert!(infos[0].message.contains("1000x1000"));
        assert!(infos[1].message.contains("8 byte stride"));
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_material_error_logged_with_location() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let mut graphics = DeviceGraphics::new(RecordingDevice::new(), GraphicsConfig::default()).unwrap();
    let uniforms = ShaderValuesInfo::new()
        .with(ShaderFieldInfo::new("tint", ShaderFieldType::Vec4, 1))
        .with(ShaderFieldInfo::new("tint", ShaderFieldType::Vec4, 1));

    let result = graphics.create_material(material_params(uniforms));
    assert!(matches!(result, Err(Error::InvalidResource(_))));

    {
        let captured = entries.lock().unwrap();
        let errors: Vec<&LogEntry> = captured
            .iter()
            .filter(|entry| entry.severity == LogSeverity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].source, "gfx::Material");
        assert!(errors[0].message.contains("tint"));
        assert!(errors[0].file.is_some());
        assert!(errors[0].line.is_some());
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_resize_to_zero_warns() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let mut graphics = DeviceGraphics::new(RecordingDevice::new(), GraphicsConfig::default()).unwrap();
    graphics.resize(PhysicalSize::new(0, 720), 1.0).unwrap();

    {
        let captured = entries.lock().unwrap();
        assert!(captured
            .iter()
            .any(|entry| entry.severity == LogSeverity::Warn && entry.message.contains("0x720")));
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}
