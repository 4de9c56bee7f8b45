/// Tests for Frame batching, cache redirection and stats

use super::*;
use crate::error::Error;
use crate::graphics::{GraphicsDevice, Program, RecordingDevice};
use crate::material::{ShaderFieldInfo, ShaderFieldType, ShaderValuesInfo};
use crate::frame::Vertex;
use glam::{Vec2, Vec3};

// ============================================================================
// Helper Functions
// ============================================================================

#[derive(Debug)]
struct TestProgram;

impl Program for TestProgram {
    fn native_id(&self) -> u64 {
        1
    }
}

fn vertex_material() -> Arc<Material> {
    Arc::new(Material::new(Arc::new(TestProgram), Vertex::layout(), ShaderValuesInfo::new()).unwrap())
}

fn position_only_material() -> Arc<Material> {
    let attributes = ShaderValuesInfo::new().with(ShaderFieldInfo::new("pos", ShaderFieldType::F32, 2));
    Arc::new(Material::new(Arc::new(TestProgram), attributes, ShaderValuesInfo::new()).unwrap())
}

fn quad(offset: f32) -> [Vertex; 4] {
    [
        Vertex::new(Vec3::new(offset, 0.0, 0.0), Color::WHITE),
        Vertex::new(Vec3::new(offset + 1.0, 0.0, 0.0), Color::WHITE),
        Vertex::new(Vec3::new(offset + 1.0, 1.0, 0.0), Color::WHITE),
        Vertex::new(Vec3::new(offset, 1.0, 0.0), Color::WHITE),
    ]
}

const QUAD: [u32; 6] = [0, 1, 2, 0, 2, 3];

fn draw_task(frame: &Frame, index: usize) -> &DrawMaterial {
    match &frame.tasks()[index] {
        DrawTask::DrawMaterial(draw) => draw,
        other => panic!("expected DrawMaterial at {}, got {:?}", index, other),
    }
}

// ============================================================================
// Batching
// ============================================================================

#[test]
fn test_same_material_merges_and_switch_splits() {
    let mat_a = vertex_material();
    let mat_b = vertex_material();
    let mut frame = Frame::new();

    frame.add_vertices_typed(&mat_a, &quad(0.0), &QUAD).unwrap();
    frame.add_vertices_typed(&mat_a, &quad(2.0), &QUAD).unwrap();
    frame.add_vertices_typed(&mat_b, &quad(4.0), &QUAD).unwrap();

    assert_eq!(frame.len(), 2);

    let first = draw_task(&frame, 0);
    assert!(Arc::ptr_eq(&first.material, &mat_a));
    assert_eq!(first.vertex_count(), 8);
    assert_eq!(first.indices, vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);

    let second = draw_task(&frame, 1);
    assert!(Arc::ptr_eq(&second.material, &mat_b));
    assert_eq!(second.vertex_count(), 4);
    assert_eq!(second.indices, QUAD.to_vec());
}

#[test]
fn test_merged_vertices_are_concatenated() {
    let material = vertex_material();
    let mut frame = Frame::new();
    let first = quad(0.0);
    let second = quad(5.0);

    frame.add_vertices_typed(&material, &first, &QUAD).unwrap();
    frame.add_vertices_typed(&material, &second, &QUAD).unwrap();

    let mut expected = bytemuck::cast_slice::<Vertex, u8>(&first).to_vec();
    expected.extend_from_slice(bytemuck::cast_slice(&second));
    assert_eq!(draw_task(&frame, 0).vertices, expected);
}

#[test]
fn test_rebasing_accumulates_over_many_calls() {
    let material = vertex_material();
    let mut frame = Frame::new();

    for i in 0..5 {
        frame.add_triangle(
            &material,
            Vertex::flat(Vec2::new(i as f32, 0.0), Color::RED),
            Vertex::flat(Vec2::new(i as f32 + 1.0, 0.0), Color::RED),
            Vertex::flat(Vec2::new(i as f32, 1.0), Color::RED),
        )
        .unwrap();
    }

    assert_eq!(frame.len(), 1);
    let expected: Vec<u32> = (0..15).collect();
    assert_eq!(draw_task(&frame, 0).indices, expected);
}

#[test]
fn test_setting_breaks_merge() {
    let material = vertex_material();
    let mut frame = Frame::new();

    frame.add_vertices_typed(&material, &quad(0.0), &QUAD).unwrap();
    frame.setting_wireframe(true);
    frame.add_vertices_typed(&material, &quad(2.0), &QUAD).unwrap();

    assert_eq!(frame.len(), 3);
    assert_eq!(draw_task(&frame, 0).indices, QUAD.to_vec());
    assert!(matches!(frame.tasks()[1], DrawTask::SettingWireframe(true)));
    assert_eq!(draw_task(&frame, 2).indices, QUAD.to_vec());
}

#[test]
fn test_every_state_task_breaks_merge() {
    let material = vertex_material();
    let toggles: [fn(&mut Frame); 5] = [
        |frame| frame.clear_background(Color::BLACK),
        |frame| frame.setting_wireframe(false),
        |frame| frame.setting_culling(false),
        |frame| frame.setting_blend(true),
        |frame| frame.setting_depth(false),
    ];

    for toggle in toggles {
        let mut frame = Frame::new();
        frame.add_vertices_typed(&material, &quad(0.0), &QUAD).unwrap();
        toggle(&mut frame);
        frame.add_vertices_typed(&material, &quad(2.0), &QUAD).unwrap();

        assert_eq!(frame.stats().draw_calls, 2);
    }
}

#[test]
fn test_no_merge_across_material_gap() {
    let mat_a = vertex_material();
    let mat_b = vertex_material();
    let mut frame = Frame::new();

    frame.add_vertices_typed(&mat_a, &quad(0.0), &QUAD).unwrap();
    frame.add_vertices_typed(&mat_b, &quad(2.0), &QUAD).unwrap();
    frame.add_vertices_typed(&mat_a, &quad(4.0), &QUAD).unwrap();

    assert_eq!(frame.len(), 3);
    assert!(Arc::ptr_eq(&draw_task(&frame, 2).material, &mat_a));
    assert_eq!(draw_task(&frame, 2).indices, QUAD.to_vec());
}

#[test]
fn test_equal_layout_is_not_same_material() {
    let mat_a = vertex_material();
    let mat_b = vertex_material();
    let mut frame = Frame::new();

    frame.add_vertices_typed(&mat_a, &quad(0.0), &QUAD).unwrap();
    frame.add_vertices_typed(&mat_b, &quad(0.0), &QUAD).unwrap();

    assert_eq!(frame.len(), 2);
}

#[test]
fn test_empty_add_is_noop() {
    let material = vertex_material();
    let mut frame = Frame::new();

    frame.add_vertices(&material, &[], &[]).unwrap();

    assert!(frame.is_empty());
}

#[test]
fn test_partial_vertex_rejected_and_frame_unchanged() {
    let material = vertex_material();
    let mut frame = Frame::new();
    frame.add_vertices_typed(&material, &quad(0.0), &QUAD).unwrap();

    let result = frame.add_vertices(&material, &[0u8; 27], &[0]);

    assert_eq!(result, Err(Error::InvalidVertexData { byte_len: 27, stride: 28 }));
    assert_eq!(frame.len(), 1);
    assert_eq!(draw_task(&frame, 0).vertex_count(), 4);
    assert_eq!(draw_task(&frame, 0).indices, QUAD.to_vec());
}

#[test]
fn test_add_rect_winding() {
    let material = vertex_material();
    let mut frame = Frame::new();

    frame.add_rect(&material, Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0), Color::BLUE).unwrap();

    let draw = draw_task(&frame, 0);
    let vertices: &[Vertex] = bytemuck::cast_slice(&draw.vertices);
    assert_eq!(vertices[0].pos, Vec3::new(1.0, 2.0, 0.0));
    assert_eq!(vertices[1].pos, Vec3::new(3.0, 2.0, 0.0));
    assert_eq!(vertices[2].pos, Vec3::new(3.0, 4.0, 0.0));
    assert_eq!(vertices[3].pos, Vec3::new(1.0, 4.0, 0.0));
    assert!(vertices.iter().all(|v| v.color == Color::BLUE));
    assert_eq!(draw.indices, QUAD.to_vec());
}

// ============================================================================
// Clear / ownership
// ============================================================================

#[test]
fn test_clear_keeps_materials_and_caches_alive() {
    let material = vertex_material();
    let mut cache = FrameCacheVertices::new();
    cache.add_rect(&material, Vec2::ZERO, Vec2::ONE, Color::WHITE).unwrap();
    let cache_before = cache.clone();

    let mut frame = Frame::new();
    frame.add_cached_vertices(&material, &cache).unwrap();
    frame.clear_background(Color::BLACK);
    assert_eq!(Arc::strong_count(&material), 2);

    frame.clear();

    assert!(frame.is_empty());
    assert_eq!(Arc::strong_count(&material), 1);
    assert_eq!(cache, cache_before);
    assert_eq!(material.stride(), 28);
}

#[test]
fn test_reset_releases_storage() {
    let mut frame = Frame::with_capacity(64);
    frame.setting_depth(true);

    frame.reset();

    assert!(frame.is_empty());
    assert_eq!(frame.tasks.capacity(), 0);
}

// ============================================================================
// Cache redirection
// ============================================================================

#[test]
fn test_cache_round_trip_matches_direct_recording() {
    let material = vertex_material();

    let mut direct = Frame::new();
    direct.add_vertices_typed(&material, &quad(0.0), &QUAD).unwrap();
    direct.add_vertices_typed(&material, &quad(2.0), &QUAD).unwrap();

    let mut frame = Frame::new();
    let cache = frame
        .cached(|frame| {
            frame.add_vertices_typed(&material, &quad(0.0), &QUAD)?;
            frame.add_vertices_typed(&material, &quad(2.0), &QUAD)
        })
        .unwrap();
    assert!(frame.is_empty());

    frame.add_cached_vertices(&material, &cache).unwrap();

    assert_eq!(frame.len(), 1);
    assert_eq!(draw_task(&frame, 0).vertices, draw_task(&direct, 0).vertices);
    assert_eq!(draw_task(&frame, 0).indices, draw_task(&direct, 0).indices);
}

#[test]
fn test_cached_geometry_merges_with_direct_geometry() {
    let material = vertex_material();
    let mut frame = Frame::new();
    let cache = frame
        .cached(|frame| frame.add_vertices_typed(&material, &quad(0.0), &QUAD))
        .unwrap();

    frame.add_vertices_typed(&material, &quad(2.0), &QUAD).unwrap();
    frame.add_cached_vertices(&material, &cache).unwrap();

    assert_eq!(frame.len(), 1);
    assert_eq!(draw_task(&frame, 0).indices, vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);
}

#[test]
fn test_scope_routes_geometry_but_not_settings() {
    let material = vertex_material();
    let mut frame = Frame::new();

    let mut scope = frame.begin_cache();
    scope.add_rect(&material, Vec2::ZERO, Vec2::ONE, Color::WHITE).unwrap();
    scope.setting_culling(false);
    assert_eq!(scope.redirect_depth(), 1);
    assert_eq!(scope.cache().vertex_count(), 4);
    let cache = scope.finish();

    assert_eq!(cache.vertex_count(), 4);
    assert_eq!(frame.redirect_depth(), 0);
    assert_eq!(frame.len(), 1);
    assert!(matches!(frame.tasks()[0], DrawTask::SettingCulling(false)));
}

#[test]
fn test_nested_scopes_feed_every_active_cache() {
    let material = vertex_material();
    let mut frame = Frame::new();

    let mut outer = frame.begin_cache();
    outer.add_rect(&material, Vec2::ZERO, Vec2::ONE, Color::WHITE).unwrap();

    let inner_cache = {
        let mut inner = outer.begin_cache();
        assert_eq!(inner.redirect_depth(), 2);
        inner.add_rect(&material, Vec2::ONE, Vec2::splat(2.0), Color::WHITE).unwrap();
        inner.finish()
    };

    assert_eq!(outer.redirect_depth(), 1);
    let outer_cache = outer.finish();

    assert_eq!(inner_cache.vertex_count(), 4);
    assert_eq!(inner_cache.indices(), &QUAD);
    assert_eq!(outer_cache.vertex_count(), 8);
    assert_eq!(outer_cache.indices(), &[0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);
    assert!(frame.is_empty());
}

#[test]
fn test_dropped_scope_pops_redirect() {
    let material = vertex_material();
    let mut frame = Frame::new();

    {
        let mut scope = frame.begin_cache();
        scope.add_rect(&material, Vec2::ZERO, Vec2::ONE, Color::WHITE).unwrap();
    }

    assert_eq!(frame.redirect_depth(), 0);
    frame.add_rect(&material, Vec2::ZERO, Vec2::ONE, Color::WHITE).unwrap();
    assert_eq!(frame.len(), 1);
}

#[test]
fn test_swapped_scopes_end_on_their_own_frames() {
    let material = vertex_material();
    let mut first = Frame::new();
    let mut second = Frame::new();

    let mut scope_a = first.begin_cache();
    let mut scope_b = second.begin_cache();
    scope_a.add_rect(&material, Vec2::ZERO, Vec2::ONE, Color::WHITE).unwrap();
    scope_a.setting_wireframe(true);
    std::mem::swap(&mut scope_a, &mut scope_b);

    let from_second = scope_a.finish();
    let from_first = scope_b.finish();

    assert!(from_second.is_empty());
    assert_eq!(from_first.vertex_count(), 4);
    assert_eq!(first.redirect_depth(), 0);
    assert_eq!(second.redirect_depth(), 0);
    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
}

#[test]
fn test_cached_error_pops_redirect() {
    let material = vertex_material();
    let mut frame = Frame::new();

    let result = frame.cached(|frame| {
        frame.add_rect(&material, Vec2::ZERO, Vec2::ONE, Color::WHITE)?;
        frame.add_vertices(&material, &[0u8; 3], &[])
    });

    assert!(matches!(result, Err(Error::InvalidVertexData { .. })));
    assert_eq!(frame.redirect_depth(), 0);
    assert!(frame.is_empty());
}

#[test]
fn test_redirect_rejects_incompatible_layout_for_all_caches() {
    let material = vertex_material();
    let other = position_only_material();
    let mut frame = Frame::new();

    let mut outer = frame.begin_cache();
    outer.add_rect(&material, Vec2::ZERO, Vec2::ONE, Color::WHITE).unwrap();
    let mut inner = outer.begin_cache();

    let result = inner.add_vertices(&other, &[0u8; 8], &[0]);

    assert!(matches!(result, Err(Error::IncompatibleLayout(_))));
    assert!(inner.cache().is_empty());
    drop(inner);
    assert_eq!(outer.cache().vertex_count(), 4);
}

// ============================================================================
// Stats
// ============================================================================

#[test]
fn test_stats_sum_per_task() {
    let mat_a = vertex_material();
    let mat_b = vertex_material();
    let mut frame = Frame::new();

    frame.clear_background(Color::BLACK);
    frame.add_vertices_typed(&mat_a, &quad(0.0), &QUAD).unwrap();
    frame.add_vertices_typed(&mat_a, &quad(2.0), &QUAD).unwrap();
    frame.add_vertices_typed(&mat_b, &quad(4.0), &QUAD).unwrap();

    let stats = frame.stats();
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.vertices, 12);
    assert_eq!(stats.indices, 18);
    assert_eq!(stats.cache_vertices, 0);
    assert_eq!(stats.cache_indices, 0);
}

#[test]
fn test_stats_include_backend_caches() {
    let material = vertex_material();
    let mut device = RecordingDevice::new();
    let geometry = device.create_geometry(material.attribute_info()).unwrap();
    let graphics_cache = Arc::new(GraphicsCacheVertices::new(Arc::clone(&material), geometry));

    let mut frame = Frame::new();
    let cache = frame
        .cached(|frame| frame.add_rect(&material, Vec2::ZERO, Vec2::ONE, Color::WHITE))
        .unwrap();
    graphics_cache.load(&cache).unwrap();

    frame.add_graphics_cached_vertices(&graphics_cache);
    frame.add_graphics_cached_vertices(&graphics_cache);

    let stats = frame.stats();
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.vertices, 0);
    assert_eq!(stats.cache_vertices, 8);
    assert_eq!(stats.cache_indices, 12);
}

#[test]
fn test_stats_display() {
    let stats = FrameStats {
        draw_calls: 3,
        vertices: 12,
        indices: 18,
        cache_vertices: 4,
        cache_indices: 6,
    };

    assert_eq!(
        stats.to_string(),
        "draw calls: 3, vertices: 12, indices: 18, cached vertices: 4, cached indices: 6"
    );
}
