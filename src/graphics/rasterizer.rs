use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::graphics::framebuffer::Framebuffer;
use crate::graphics::shader::{Fragment, FragmentShader, Varying, VertexShader};
use crate::graphics::texture::CompareFunction;

/// Pixel rectangle that normalized device coordinates are mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Viewport covering a whole `width` x `height` target.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }
}

/// Counters accumulated by a [`Rasterizer`] since its last reset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RasterStats {
    pub triangles: u64,
    /// Triangles dropped before coverage: degenerate or crossing the eye plane.
    pub culled: u64,
    pub fragments_shaded: u64,
    pub depth_rejected: u64,
    pub discarded: u64,
}

/// Scan converts triangles into a bound [`Framebuffer`] using the currently
/// bound vertex/fragment shader pair.
pub struct Rasterizer<'s, V, F> {
    vertex_shader: &'s V,
    fragment_shader: &'s F,
    viewport: Viewport,
    depth_compare: CompareFunction,
    stats: RasterStats,
}

impl<'s, V, F> Rasterizer<'s, V, F> {
    pub fn new(vertex_shader: &'s V, fragment_shader: &'s F, viewport: Viewport) -> Self {
        Self {
            vertex_shader,
            fragment_shader,
            viewport,
            depth_compare: CompareFunction::Less,
            stats: RasterStats::default(),
        }
    }

    /// Rebinds the shader pair, keeping viewport and depth state.
    pub fn bind_shaders<'t, V2, F2>(
        self,
        vertex_shader: &'t V2,
        fragment_shader: &'t F2,
    ) -> Rasterizer<'t, V2, F2> {
        Rasterizer {
            vertex_shader,
            fragment_shader,
            viewport: self.viewport,
            depth_compare: self.depth_compare,
            stats: self.stats,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_depth_compare(&mut self, compare: CompareFunction) {
        self.depth_compare = compare;
    }

    pub fn stats(&self) -> RasterStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = RasterStats::default();
    }

    /// Shades one triangle into `framebuffer`.
    ///
    /// Coverage follows the top-left rule, varyings are interpolated
    /// perspective-correctly and depth uses the `[0, 1]` window range.
    /// Triangles with a vertex at or behind the eye plane (`w <= 0`) are
    /// dropped whole; there is no near-plane clipping.
    pub fn draw_triangle<U>(
        &mut self,
        framebuffer: &mut Framebuffer<'_>,
        uniform: &U,
        attributes: [&V::Attribute; 3],
    ) where
        V: VertexShader<U>,
        F: FragmentShader<U, Varying = V::Varying>,
    {
        self.stats.triangles += 1;
        let Some((target_width, target_height)) = framebuffer.size() else {
            return;
        };

        let vertex_shader = self.vertex_shader;
        let outputs = attributes.map(|attribute| vertex_shader.shade_vertex(attribute, uniform));
        if outputs
            .iter()
            .any(|output| !(output.clip_position.w > 0.0))
        {
            self.stats.culled += 1;
            return;
        }

        let screen = [0, 1, 2].map(|i| self.to_window(outputs[i].clip_position));
        let mut order = [0usize, 1, 2];
        let mut area = edge(
            screen[0].truncate(),
            screen[1].truncate(),
            screen[2].truncate(),
        );
        if !(area.abs() > f32::EPSILON) {
            self.stats.culled += 1;
            return;
        }
        if area < 0.0 {
            order.swap(1, 2);
            area = -area;
        }

        let [i0, i1, i2] = order;
        let (p0, p1, p2) = (
            screen[i0].truncate(),
            screen[i1].truncate(),
            screen[i2].truncate(),
        );
        let depths = Vec3::new(screen[i0].z, screen[i1].z, screen[i2].z);
        let inverse_w = Vec3::new(
            1.0 / outputs[i0].clip_position.w,
            1.0 / outputs[i1].clip_position.w,
            1.0 / outputs[i2].clip_position.w,
        );
        let varyings = [
            &outputs[i0].varying,
            &outputs[i1].varying,
            &outputs[i2].varying,
        ];
        let owned = [is_top_left(p1, p2), is_top_left(p2, p0), is_top_left(p0, p1)];

        let lower = p0.min(p1).min(p2);
        let upper = p0.max(p1).max(p2);
        let viewport = self.viewport;
        let min_x = (lower.x.floor() as i64).max(viewport.x as i64).max(0);
        let min_y = (lower.y.floor() as i64).max(viewport.y as i64).max(0);
        let max_x = (upper.x.ceil() as i64)
            .min(viewport.x as i64 + viewport.width as i64)
            .min(target_width as i64);
        let max_y = (upper.y.ceil() as i64)
            .min(viewport.y as i64 + viewport.height as i64)
            .min(target_height as i64);

        let fragment_shader = self.fragment_shader;
        let compare = self.depth_compare;
        let (mut color_target, mut depth_target) = framebuffer.targets_mut();

        for y in min_y..max_y {
            for x in min_x..max_x {
                let point = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let weights = Vec3::new(
                    edge(p1, p2, point),
                    edge(p2, p0, point),
                    edge(p0, p1, point),
                );
                if !covers(weights.x, owned[0])
                    || !covers(weights.y, owned[1])
                    || !covers(weights.z, owned[2])
                {
                    continue;
                }

                let (px, py) = (x as u32, y as u32);
                let barycentric = weights / area;
                let depth = barycentric.dot(depths);
                if let Some(target) = depth_target.as_deref() {
                    if !compare.passes(depth, target.read_depth(px, py)) {
                        self.stats.depth_rejected += 1;
                        continue;
                    }
                }

                let varying = <V::Varying as Varying>::interpolate(
                    varyings,
                    perspective_correct(barycentric, inverse_w),
                );
                match fragment_shader.shade_fragment(&varying, uniform) {
                    Fragment::Discard => self.stats.discarded += 1,
                    Fragment::Color(color) => {
                        if let Some(target) = depth_target.as_deref_mut() {
                            target.write_depth(px, py, depth);
                        }
                        if let Some(target) = color_target.as_deref_mut() {
                            target.write_pixel(px, py, color);
                        }
                        self.stats.fragments_shaded += 1;
                    }
                }
            }
        }
    }

    /// Perspective divide followed by the viewport transform. `z` holds the
    /// window depth in `[0, 1]`.
    fn to_window(&self, clip: Vec4) -> Vec3 {
        let ndc = clip.truncate() / clip.w;
        let viewport = self.viewport;
        Vec3::new(
            viewport.x as f32 + (ndc.x + 1.0) * 0.5 * viewport.width as f32,
            viewport.y as f32 + (ndc.y + 1.0) * 0.5 * viewport.height as f32,
            ndc.z * 0.5 + 0.5,
        )
    }
}

/// Twice the signed area of `(a, b, p)`; positive when `p` lies to the left
/// of the directed edge `a -> b`.
pub fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Converts window-space barycentric weights into perspective-correct
/// interpolation weights given each vertex's `1 / w`.
pub fn perspective_correct(barycentric: Vec3, inverse_w: Vec3) -> Vec3 {
    let weights = barycentric * inverse_w;
    weights / (weights.x + weights.y + weights.z)
}

/// Top-left ownership for a counter-clockwise edge in a y-up window: left
/// edges run downwards, top edges run in -x.
fn is_top_left(a: Vec2, b: Vec2) -> bool {
    let d = b - a;
    d.y < 0.0 || (d.y == 0.0 && d.x < 0.0)
}

fn covers(weight: f32, owned: bool) -> bool {
    weight > 0.0 || (weight == 0.0 && owned)
}
