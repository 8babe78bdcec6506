//! Построение physics shape из detected surface geometry

use bevy::prelude::*;
use bevy_rapier3d::prelude::Collider;
use thiserror::Error;

use super::subsample::subsample_triangles;

/// Почему surface не превратилась в collider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeBuildError {
    #[error("surface has no triangles")]
    Empty,
    #[error("index buffer length {0} is not a multiple of 3")]
    RaggedIndices(usize),
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("vertex {0} is not finite")]
    NonFiniteVertex(usize),
    #[error("all triangles are degenerate")]
    Degenerate,
    #[error("physics backend rejected trimesh: {0}")]
    Backend(String),
}

/// Геометрия, готовая к постройке collider (после прореживания)
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    /// Сколько треугольников было до прореживания
    pub source_triangles: usize,
}

/// Ниже этой площади треугольник считаем вырожденным (м²)
const MIN_TRIANGLE_AREA: f32 = 1.0e-8;

/// Валидирует геометрию и прореживает до `max_triangles`
pub fn prepare_mesh(
    vertices: &[Vec3],
    indices: &[u32],
    max_triangles: usize,
) -> Result<PreparedMesh, ShapeBuildError> {
    if indices.is_empty() || vertices.is_empty() {
        return Err(ShapeBuildError::Empty);
    }
    if indices.len() % 3 != 0 {
        return Err(ShapeBuildError::RaggedIndices(indices.len()));
    }
    if let Some(i) = vertices.iter().position(|v| !v.is_finite()) {
        return Err(ShapeBuildError::NonFiniteVertex(i));
    }
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
        return Err(ShapeBuildError::IndexOutOfRange {
            index,
            vertex_count: vertices.len(),
        });
    }

    let triangles = subsample_triangles(indices, max_triangles);
    let has_area = triangles.iter().any(|[a, b, c]| {
        let (a, b, c) = (vertices[*a as usize], vertices[*b as usize], vertices[*c as usize]);
        (b - a).cross(c - a).length() * 0.5 > MIN_TRIANGLE_AREA
    });
    if !has_area {
        return Err(ShapeBuildError::Degenerate);
    }

    Ok(PreparedMesh {
        vertices: vertices.to_vec(),
        triangles,
        source_triangles: indices.len() / 3,
    })
}

/// Trimesh collider из подготовленной геометрии (local space surface)
pub fn build_collider(mesh: &PreparedMesh) -> Result<Collider, ShapeBuildError> {
    Collider::trimesh(mesh.vertices.clone(), mesh.triangles.clone())
        .map_err(|e| ShapeBuildError::Backend(format!("{:?}", e)))
}

/// Bounding radius: max расстояние вершины от local origin surface
pub fn bounding_radius(vertices: &[Vec3]) -> f32 {
    vertices
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| v.length())
        .fold(0.0, f32::max)
}
