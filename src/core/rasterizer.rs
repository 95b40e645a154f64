use crate::core::framebuffer::FrameBuffer;
use crate::core::geometry::Vertex;
use crate::core::math::interpolation::{
    barycentric_coordinates, is_inside_triangle, perspective_correct_barycentric,
};
use crate::core::math::transform::{apply_perspective_division, ndc_to_screen};
use crate::core::pipeline::Shader;
use nalgebra::{Point2, Vector4};

/// Runs `shader` over an indexed triangle list and writes the shaded
/// fragments into `framebuffer`.
///
/// `indices.len()` must be a multiple of 3; the caller (the device)
/// guarantees this because mesh construction already validated it.
pub fn draw_triangles<S: Shader>(
    framebuffer: &mut FrameBuffer,
    shader: &S,
    vertices: &[Vertex],
    indices: &[u32],
) {
    for tri in indices.chunks_exact(3) {
        let (c0, v0) = shader.vertex(&vertices[tri[0] as usize]);
        let (c1, v1) = shader.vertex(&vertices[tri[1] as usize]);
        let (c2, v2) = shader.vertex(&vertices[tri[2] as usize]);
        rasterize_triangle(framebuffer, shader, &[c0, c1, c2], &[v0, v1, v2]);
    }
}

/// Rasterize a single triangle given clip-space coordinates and varyings.
///
/// Performs Sutherland-Hodgman clipping against the canonical view frustum
/// in homogeneous clip space before triangulating the resulting polygon.
fn rasterize_triangle<S: Shader>(
    framebuffer: &mut FrameBuffer,
    shader: &S,
    clip_coords: &[Vector4<f32>; 3],
    varyings: &[S::Varying; 3],
) {
    // Capacity 16 is plenty: a triangle clipped by a cube has at most 9 vertices.
    let mut current_poly: Vec<(Vector4<f32>, S::Varying)> = Vec::with_capacity(16);
    let mut clip_buffer: Vec<(Vector4<f32>, S::Varying)> = Vec::with_capacity(16);

    for i in 0..3 {
        current_poly.push((clip_coords[i], varyings[i]));
    }

    // (Axis Index, Sign). Plane equation: Sign * P[Axis] <= P.w
    let planes = [
        (0, 1.0),  // Right:  +X <= W
        (0, -1.0), // Left:   -X <= W
        (1, 1.0),  // Top:    +Y <= W
        (1, -1.0), // Bottom: -Y <= W
        (2, 1.0),  // Far:    +Z <= W
        (2, -1.0), // Near:   -Z <= W
    ];

    for &(axis, sign) in &planes {
        if current_poly.is_empty() {
            return;
        }
        clip_polygon_against_plane::<S>(&current_poly, &mut clip_buffer, axis, sign);
        std::mem::swap(&mut current_poly, &mut clip_buffer);
    }

    // The clipped result is a convex polygon; rasterize it as a fan from v0.
    if current_poly.len() < 3 {
        return;
    }
    let v0 = current_poly[0];
    for i in 1..(current_poly.len() - 1) {
        let v1 = current_poly[i];
        let v2 = current_poly[i + 1];
        rasterize_clipped_triangle(
            framebuffer,
            shader,
            &[v0.0, v1.0, v2.0],
            &[v0.1, v1.1, v2.1],
        );
    }
}

/// Clips a polygon against one frustum plane (axis 0/1/2, sign +-1).
fn clip_polygon_against_plane<S: Shader>(
    input: &[(Vector4<f32>, S::Varying)],
    output: &mut Vec<(Vector4<f32>, S::Varying)>,
    axis: usize,
    sign: f32,
) {
    output.clear();
    if input.is_empty() {
        return;
    }

    let is_inside = |p: &Vector4<f32>| sign * p[axis] <= p.w + 1e-6;

    let mut prev = input[input.len() - 1];
    let mut prev_inside = is_inside(&prev.0);

    for curr in input {
        let curr_inside = is_inside(&curr.0);

        if curr_inside {
            if !prev_inside {
                // OUT -> IN: intersection point, then the current point
                if let Some(inter) = intersect_edge_plane::<S>(prev, *curr, axis, sign) {
                    output.push(inter);
                }
            }
            output.push(*curr);
        } else if prev_inside {
            // IN -> OUT: intersection point only
            if let Some(inter) = intersect_edge_plane::<S>(prev, *curr, axis, sign) {
                output.push(inter);
            }
        }

        prev = *curr;
        prev_inside = curr_inside;
    }
}

/// Intersection of a line segment and a clip plane; linearly interpolates
/// both the position and the varying.
#[inline(always)]
fn intersect_edge_plane<S: Shader>(
    a: (Vector4<f32>, S::Varying),
    b: (Vector4<f32>, S::Varying),
    axis: usize,
    sign: f32,
) -> Option<(Vector4<f32>, S::Varying)> {
    let ac = a.0[axis];
    let bc = b.0[axis];
    let aw = a.0.w;
    let bw = b.0.w;

    let denom = sign * (bc - ac) - (bw - aw);
    if denom.abs() < 1e-9 {
        return None;
    }

    let t = (aw - sign * ac) / denom;
    if !t.is_finite() {
        return None;
    }

    let pos = a.0 + (b.0 - a.0) * t;
    let vary = a.1 * (1.0 - t) + b.1 * t;
    Some((pos, vary))
}

/// Rasterizes a triangle guaranteed to lie inside the frustum: perspective
/// division, viewport transform, depth test, and per-pixel shading.
fn rasterize_clipped_triangle<S: Shader>(
    framebuffer: &mut FrameBuffer,
    shader: &S,
    clip_coords: &[Vector4<f32>; 3],
    varyings: &[S::Varying; 3],
) {
    let width = framebuffer.width as f32;
    let height = framebuffer.height as f32;

    // 1. Perspective division and viewport transform
    let mut screen_coords = [Point2::origin(); 3];
    let mut w_values = [0.0; 3];
    for i in 0..3 {
        // Clipping keeps W away from zero; this is a numeric safeguard.
        if clip_coords[i].w.abs() < 1e-6 {
            return;
        }
        let ndc = apply_perspective_division(&clip_coords[i]);
        w_values[i] = clip_coords[i].w;
        screen_coords[i] = ndc_to_screen(ndc.x, ndc.y, width, height);
    }

    // 2. Bounding box and scissor
    let (min_x, min_y, max_x, max_y) = bounding_box(&screen_coords);
    if max_x < 0 || max_y < 0 || min_x >= framebuffer.width as i32 || min_y >= framebuffer.height as i32
    {
        return;
    }
    let start_x = min_x.max(0) as usize;
    let end_x = max_x.min(framebuffer.width as i32 - 1) as usize;
    let start_y = min_y.max(0) as usize;
    let end_y = max_y.min(framebuffer.height as i32 - 1) as usize;

    // 3. Pixel loop
    for y in start_y..=end_y {
        for x in start_x..=end_x {
            let pixel_center = Point2::new(x as f32 + 0.5, y as f32 + 0.5);

            let Some(bary) = barycentric_coordinates(
                pixel_center,
                screen_coords[0],
                screen_coords[1],
                screen_coords[2],
            ) else {
                continue;
            };
            if !is_inside_triangle(bary) {
                continue;
            }

            // Perspective-correct weights shared by depth and attributes.
            let Some(corrected) =
                perspective_correct_barycentric(bary, w_values[0], w_values[1], w_values[2])
            else {
                continue;
            };

            // NDC depth interpolates linearly in screen space (plain
            // barycentrics); attributes use the corrected weights.
            let z_ndc = bary.x * clip_coords[0].z / w_values[0]
                + bary.y * clip_coords[1].z / w_values[1]
                + bary.z * clip_coords[2].z / w_values[2];
            let depth = z_ndc * 0.5 + 0.5;

            if framebuffer.depth_test_and_set(x, y, depth) {
                let varying = varyings[0] * corrected.x
                    + varyings[1] * corrected.y
                    + varyings[2] * corrected.z;
                let color = shader.fragment(varying);
                framebuffer.set_pixel(x, y, color);
            }
        }
    }
}

fn bounding_box(points: &[Point2<f32>; 3]) -> (i32, i32, i32, i32) {
    let min_x = points[0].x.min(points[1].x).min(points[2].x).floor() as i32;
    let min_y = points[0].y.min(points[1].y).min(points[2].y).floor() as i32;
    let max_x = points[0].x.max(points[1].x).max(points[2].x).ceil() as i32;
    let max_y = points[0].y.max(points[1].y).max(points[2].y).ceil() as i32;
    (min_x, min_y, max_x, max_y)
}
