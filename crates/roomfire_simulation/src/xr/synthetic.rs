//! Синтетическая room geometry
//!
//! Используется headless бинарником, desktop эмулятором и тестами вместо
//! настоящего mesh detection.

use bevy::prelude::*;

use super::{DetectedSurface, Pose};

/// Axis-aligned коробка (мебель, стена) как detected surface.
///
/// Вершины в local space относительно `center`, winding — наружу (CCW).
pub fn box_surface(
    handle: u64,
    center: Vec3,
    half_extents: Vec3,
    last_changed: u64,
    label: Option<&str>,
) -> DetectedSurface {
    let h = half_extents;
    let vertices = vec![
        Vec3::new(-h.x, -h.y, -h.z),
        Vec3::new(h.x, -h.y, -h.z),
        Vec3::new(h.x, h.y, -h.z),
        Vec3::new(-h.x, h.y, -h.z),
        Vec3::new(-h.x, -h.y, h.z),
        Vec3::new(h.x, -h.y, h.z),
        Vec3::new(h.x, h.y, h.z),
        Vec3::new(-h.x, h.y, h.z),
    ];
    #[rustfmt::skip]
    let indices = vec![
        0, 3, 2, 0, 2, 1, // -Z
        4, 5, 6, 4, 6, 7, // +Z
        0, 4, 7, 0, 7, 3, // -X
        1, 2, 6, 1, 6, 5, // +X
        0, 1, 5, 0, 5, 4, // -Y
        3, 7, 6, 3, 6, 2, // +Y
    ];

    DetectedSurface {
        handle,
        pose: Pose::from_position(center),
        vertices,
        indices,
        label: label.map(str::to_string),
        last_changed,
    }
}

/// Плоская сетка `cells × cells` квадов (пол/стена с большим числом треугольников)
pub fn grid_surface(handle: u64, center: Vec3, size: f32, cells: u32, last_changed: u64) -> DetectedSurface {
    let cells = cells.max(1);
    let step = size / cells as f32;
    let half = size * 0.5;
    let row = cells + 1;

    let mut vertices = Vec::with_capacity((row * row) as usize);
    for z in 0..row {
        for x in 0..row {
            vertices.push(Vec3::new(x as f32 * step - half, 0.0, z as f32 * step - half));
        }
    }

    let mut indices = Vec::with_capacity((cells * cells * 6) as usize);
    for z in 0..cells {
        for x in 0..cells {
            let i = z * row + x;
            indices.extend_from_slice(&[i, i + row, i + 1, i + 1, i + row, i + row + 1]);
        }
    }

    DetectedSurface {
        handle,
        pose: Pose::from_position(center),
        vertices,
        indices,
        label: Some("floor".to_string()),
        last_changed,
    }
}
