//! Детерминированное прореживание треугольников
//!
//! T треугольников, cap C, T > C:
//! - stride = ceil(T / C)
//! - оставляем треугольники с индексами 0, stride, 2·stride, …
//! - итого ceil(T / stride) ≤ C треугольников
//! - порядок вершин внутри треугольника (winding) не трогаем

/// Шаг прореживания; 1 = без прореживания
pub fn triangle_stride(triangle_count: usize, cap: usize) -> usize {
    if cap == 0 || triangle_count <= cap {
        return 1;
    }
    triangle_count.div_ceil(cap)
}

/// Треугольники из плоского index buffer, с прореживанием до `cap`.
///
/// Хвост index buffer, не кратный 3, игнорируется (валидация — в shape builder).
pub fn subsample_triangles(indices: &[u32], cap: usize) -> Vec<[u32; 3]> {
    let triangles = indices.chunks_exact(3);
    let stride = triangle_stride(triangles.len(), cap);

    triangles
        .step_by(stride)
        .map(|tri| [tri[0], tri[1], tri[2]])
        .collect()
}
