//! Hardcoded geometry for the "T" and "F" letters.
//!
//! Coordinates are clip space, `z = 0`. Each vertex carries its own colour;
//! the shaders pass it through with flat interpolation so every triangle is a
//! single solid colour.

use learngl_engine::paint::Color;
use learngl_engine::render::Vertex;

pub const CLEAR_COLOR: Color = Color::rgb(0.71, 0.44, 0.76);

pub const GREEN: Color = Color::rgb(0.196, 0.804, 0.196);
pub const RED: Color = Color::rgb(0.8, 0.0, 0.1);

const fn v(x: f32, y: f32, color: Color) -> Vertex {
    Vertex::new([x, y, 0.0], color.to_array())
}

pub const T_VERTICES: [Vertex; 8] = [
    // stem
    v(-0.5, -0.5, GREEN),
    v(-0.3, -0.5, RED),
    v(-0.3, 0.3, GREEN),
    v(-0.5, 0.3, RED),
    // bar
    v(-0.9, 0.3, GREEN),
    v(-0.9, 0.5, RED),
    v(0.1, 0.5, GREEN),
    v(0.1, 0.3, RED),
];

pub const T_INDICES: [u32; 12] = [
    0, 1, 2,
    0, 2, 3,
    4, 7, 6,
    4, 6, 5,
];

pub const F_VERTICES: [Vertex; 12] = [
    v(0.2, -0.5, RED),
    v(0.4, -0.5, RED),
    v(0.4, -0.1, RED),
    v(0.7, -0.1, RED),
    v(0.7, 0.1, RED),
    v(0.4, 0.1, GREEN),
    v(0.4, 0.3, GREEN),
    v(0.9, 0.3, RED),
    v(0.9, 0.5, RED),
    v(0.4, 0.5, GREEN),
    v(0.2, 0.5, GREEN),
    // Same position as 9, different colour: the stem's provoking vertex.
    v(0.4, 0.5, RED),
];

pub const F_INDICES: [u32; 18] = [
    0, 1, 11,
    0, 9, 10,
    2, 3, 4,
    2, 4, 5,
    6, 7, 8,
    6, 8, 9,
];

/// Rotates every triangle so its last vertex comes first.
///
/// The colour tables were authored for the last vertex of a triangle to
/// supply flat-interpolated attributes; WebGPU takes them from the first.
/// Rotating keeps the winding order. A trailing partial triangle is passed
/// through unchanged so the element buffer still rejects it.
pub fn last_vertex_first(indices: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(indices.len());
    for tri in indices.chunks(3) {
        match *tri {
            [a, b, c] => out.extend([c, a, b]),
            _ => out.extend_from_slice(tri),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_range(indices: &[u32], vertices: &[Vertex]) -> bool {
        indices.iter().all(|&i| (i as usize) < vertices.len())
    }

    #[test]
    fn t_is_four_triangles_over_eight_vertices() {
        assert_eq!(T_INDICES.len(), 12);
        assert!(in_range(&T_INDICES, &T_VERTICES));
        // Every vertex is used.
        for i in 0..T_VERTICES.len() as u32 {
            assert!(T_INDICES.contains(&i), "vertex {i} unused");
        }
    }

    #[test]
    fn f_is_six_triangles_over_twelve_vertices() {
        assert_eq!(F_INDICES.len(), 18);
        assert!(in_range(&F_INDICES, &F_VERTICES));
    }

    #[test]
    fn letters_do_not_overlap() {
        let t_max_x = T_VERTICES.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        let f_min_x = F_VERTICES.iter().map(|v| v.position[0]).fold(f32::MAX, f32::min);
        assert!(t_max_x < f_min_x);
    }

    #[test]
    fn everything_is_inside_clip_space() {
        for v in T_VERTICES.iter().chain(F_VERTICES.iter()) {
            assert!(v.position.iter().all(|c| (-1.0..=1.0).contains(c)));
            assert_eq!(v.position[2], 0.0);
        }
    }

    #[test]
    fn colors_are_opaque_red_or_green() {
        for v in T_VERTICES.iter().chain(F_VERTICES.iter()) {
            assert!(v.color == RED.to_array() || v.color == GREEN.to_array());
        }
    }

    #[test]
    fn rotation_keeps_triangles_and_moves_last_vertex_first() {
        let rotated = last_vertex_first(&F_INDICES);
        assert_eq!(rotated.len(), F_INDICES.len());
        assert_eq!(&rotated[..3], &[11, 0, 1]);

        for (orig, rot) in F_INDICES.chunks(3).zip(rotated.chunks(3)) {
            assert_eq!(F_VERTICES[orig[2] as usize].color, F_VERTICES[rot[0] as usize].color);
        }
    }

    #[test]
    fn rotation_preserves_winding() {
        fn signed_area(vs: &[Vertex], tri: &[u32]) -> f32 {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| vs[i as usize].position);
            (b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])
        }

        let rotated = last_vertex_first(&T_INDICES);
        for (orig, rot) in T_INDICES.chunks(3).zip(rotated.chunks(3)) {
            let (a0, a1) = (signed_area(&T_VERTICES, orig), signed_area(&T_VERTICES, rot));
            assert!((a0 - a1).abs() < 1e-6);
        }
    }

    #[test]
    fn t_provoking_colors_alternate() {
        // Stem triangles end on green then red; bar triangles end on green then red.
        let provoking: Vec<[f32; 4]> = T_INDICES
            .chunks(3)
            .map(|tri| T_VERTICES[tri[2] as usize].color)
            .collect();
        let expected: Vec<[f32; 4]> = [GREEN, RED, GREEN, RED].map(Color::to_array).into();
        assert_eq!(provoking, expected);
    }

    #[test]
    fn rotation_keeps_a_partial_triangle() {
        let rotated = last_vertex_first(&[0, 1, 2, 3]);
        assert_eq!(rotated, vec![2, 0, 1, 3]);
        assert_ne!(rotated.len() % 3, 0);
    }
}
