use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use softlight::graphics::{
    AttachmentSlot, Fragment, FragmentShader, Framebuffer, Rasterizer, Texture, TextureFormat,
    VertexOutput, VertexShader, Viewport,
};
use softlight::math::scale_bias;
use softlight::shaders::{
    shadow_factor, ShadowCastingFragmentShader, ShadowCastingUniform, ShadowCastingVertexShader,
    StandardAttribute, StandardFragmentShader, StandardMaterial, StandardUniform,
    StandardVertexShader,
};
use softlight::{
    load_obj_from_str, Camera, DirectionalLight, FrameParams, FrameRenderer, Model, RenderSettings,
};

fn attribute(x: f32, y: f32) -> StandardAttribute {
    StandardAttribute {
        position: Vec3::new(x, y, 0.0),
        normal: Vec3::Z,
        tangent: Vec4::new(1.0, 0.0, 0.0, 1.0),
        texcoord: Vec2::new(x + 0.5, y + 0.5),
    }
}

fn standard_uniform(shadow_map: &Texture) -> StandardUniform<'_> {
    StandardUniform {
        local2world: Mat4::IDENTITY,
        world2clip: Mat4::IDENTITY,
        local2world_direction: Mat3::IDENTITY,
        local2world_normal: Mat3::IDENTITY,
        camera_position: Vec3::new(0.0, 0.0, 2.0),
        light_direction: Vec3::Z,
        illuminance: Vec3::ONE,
        world2light: scale_bias(),
        shadow_map,
        shadow_bias: 0.005,
        ambient_luminance: Vec3::splat(0.1),
        material: StandardMaterial::default(),
    }
}

#[test]
fn lit_triangle_over_transparent_background() {
    let shadow_map = Texture::with_pixels(TextureFormat::DepthFloat, 1, 1, &[1.0f32]).unwrap();
    let mut color = Texture::new(TextureFormat::Srgb8A8, 64, 64).unwrap();
    let mut depth = Texture::new(TextureFormat::DepthFloat, 64, 64).unwrap();
    {
        let mut framebuffer = Framebuffer::new();
        framebuffer.attach(AttachmentSlot::Color, &mut color).unwrap();
        framebuffer.attach(AttachmentSlot::Depth, &mut depth).unwrap();
        framebuffer.clear(Vec4::ZERO, 1.0);

        let uniform = standard_uniform(&shadow_map);
        let mut rasterizer = Rasterizer::new(
            &StandardVertexShader,
            &StandardFragmentShader,
            Viewport::full(64, 64),
        );
        let (a, b, c) = (attribute(-0.5, -0.5), attribute(0.5, -0.5), attribute(0.0, 0.5));
        rasterizer.draw_triangle(&mut framebuffer, &uniform, [&a, &b, &c]);
        assert!(rasterizer.stats().fragments_shaded > 0);
    }

    let center = color.read_pixel(32, 32);
    assert!(center.x > 0.1);
    assert_eq!(center.w, 1.0);
    assert!((depth.read_depth(32, 32) - 0.5).abs() < 1e-6);
    for (x, y) in [(0, 0), (63, 0), (0, 63), (63, 63)] {
        assert_eq!(color.read_pixel(x, y), Vec4::ZERO);
        assert_eq!(depth.read_depth(x, y), 1.0);
    }
}

#[test]
fn redrawing_the_same_triangle_changes_nothing() {
    let shadow_map = Texture::with_pixels(TextureFormat::DepthFloat, 1, 1, &[1.0f32]).unwrap();
    let mut color = Texture::new(TextureFormat::Srgb8A8, 32, 32).unwrap();
    let mut depth = Texture::new(TextureFormat::DepthFloat, 32, 32).unwrap();
    let uniform = standard_uniform(&shadow_map);
    let (a, b, c) = (attribute(-0.7, -0.4), attribute(0.6, -0.6), attribute(0.1, 0.8));

    let mut framebuffer = Framebuffer::new();
    framebuffer.attach(AttachmentSlot::Color, &mut color).unwrap();
    framebuffer.attach(AttachmentSlot::Depth, &mut depth).unwrap();
    framebuffer.clear(Vec4::ZERO, 1.0);
    let mut rasterizer = Rasterizer::new(
        &StandardVertexShader,
        &StandardFragmentShader,
        Viewport::full(32, 32),
    );
    rasterizer.draw_triangle(&mut framebuffer, &uniform, [&a, &b, &c]);
    let first = rasterizer.stats();
    let color_before = framebuffer.attachment(AttachmentSlot::Color).unwrap().clone();
    let depth_before = framebuffer.attachment(AttachmentSlot::Depth).unwrap().clone();

    rasterizer.reset_stats();
    rasterizer.draw_triangle(&mut framebuffer, &uniform, [&a, &b, &c]);
    let second = rasterizer.stats();
    assert_eq!(second.fragments_shaded, 0);
    assert_eq!(second.depth_rejected, first.fragments_shaded);
    assert_eq!(framebuffer.attachment(AttachmentSlot::Color).unwrap(), &color_before);
    assert_eq!(framebuffer.attachment(AttachmentSlot::Depth).unwrap(), &depth_before);
}

struct Ndc;

impl VertexShader<()> for Ndc {
    type Attribute = Vec2;
    type Varying = ();

    fn shade_vertex(&self, position: &Vec2, _: &()) -> VertexOutput<()> {
        VertexOutput {
            clip_position: Vec4::new(position.x, position.y, 0.0, 1.0),
            varying: (),
        }
    }
}

struct Accumulate;

impl FragmentShader<()> for Accumulate {
    type Varying = ();

    fn shade_fragment(&self, _: &(), _: &()) -> Fragment {
        Fragment::Color(Vec4::new(1.0, 0.0, 0.0, 1.0))
    }
}

#[test]
fn shared_edge_pixels_are_shaded_exactly_once() {
    let corners = [
        Vec2::new(-1.0, -1.0),
        Vec2::new(1.0, -1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(-1.0, 1.0),
    ];
    let mut color = Texture::new(TextureFormat::Rgba8, 8, 8).unwrap();
    let mut framebuffer = Framebuffer::new();
    framebuffer.attach(AttachmentSlot::Color, &mut color).unwrap();
    let mut rasterizer = Rasterizer::new(&Ndc, &Accumulate, Viewport::full(8, 8));
    rasterizer.draw_triangle(&mut framebuffer, &(), [&corners[0], &corners[1], &corners[2]]);
    rasterizer.draw_triangle(&mut framebuffer, &(), [&corners[0], &corners[2], &corners[3]]);
    assert_eq!(rasterizer.stats().fragments_shaded, 64);
    drop(framebuffer);

    for y in 0..8 {
        for x in 0..8 {
            assert_eq!(color.read_pixel(x, y), Vec4::new(1.0, 0.0, 0.0, 1.0));
        }
    }
}

#[test]
fn shadow_pass_occludes_positions_below_the_caster() {
    let light = DirectionalLight {
        direction: Vec3::Y,
        illuminance: Vec3::ONE,
    };
    let light_world2clip = light.world2clip(Vec3::ZERO, 2.0, 2.0);
    let mut shadow_map = Texture::new(TextureFormat::DepthFloat, 64, 64).unwrap();
    {
        let mut framebuffer = Framebuffer::new();
        framebuffer
            .attach(AttachmentSlot::Depth, &mut shadow_map)
            .unwrap();
        framebuffer.clear_depth(1.0);
        let uniform = ShadowCastingUniform::new(Mat4::IDENTITY, light_world2clip);
        let mut rasterizer = Rasterizer::new(
            &ShadowCastingVertexShader,
            &ShadowCastingFragmentShader,
            Viewport::full(64, 64),
        );
        let quad = [
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(-1.0, 0.0, 1.0),
        ];
        rasterizer.draw_triangle(&mut framebuffer, &uniform, [&quad[0], &quad[1], &quad[2]]);
        rasterizer.draw_triangle(&mut framebuffer, &uniform, [&quad[0], &quad[2], &quad[3]]);
        assert!(rasterizer.stats().fragments_shaded > 0);
    }

    let world2light = scale_bias() * light_world2clip;
    let bias = 0.005;
    assert_eq!(shadow_factor(world2light, &shadow_map, Vec3::new(0.0, -0.5, 0.0), bias), 0.0);
    assert_eq!(shadow_factor(world2light, &shadow_map, Vec3::new(0.0, 0.5, 0.0), bias), 1.0);
    assert_eq!(shadow_factor(world2light, &shadow_map, Vec3::new(1.5, -0.5, 0.0), bias), 1.0);
    assert_eq!(shadow_factor(world2light, &shadow_map, Vec3::new(5.0, -0.5, 0.0), bias), 1.0);
}

#[test]
fn unit_triangle_in_front_of_the_camera() {
    let mesh = load_obj_from_str("v -0.5 -0.5 0\nv 0.5 -0.5 0\nv 0 0.5 0\nf 1 2 3\n").unwrap();
    let model = Model::new(mesh);
    let params = FrameParams {
        camera: Camera {
            position: Vec3::new(0.0, 0.0, 2.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 90f32.to_radians(),
            near: 0.1,
            far: 5.0,
        },
        light: DirectionalLight {
            direction: Vec3::new(0.0, 0.0, 1.0),
            illuminance: Vec3::ONE,
        },
        ..FrameParams::default()
    };
    let mut renderer = FrameRenderer::new(RenderSettings {
        width: 64,
        height: 64,
        ..RenderSettings::default()
    })
    .unwrap();

    let color = renderer.render(&model, &params).unwrap();
    assert_ne!(color.read_pixel(32, 32), Vec4::ZERO);
    assert_eq!(color.read_pixel(32, 32).w, 1.0);
    for (x, y) in [(0, 0), (63, 0), (0, 63), (63, 63)] {
        assert_eq!(color.read_pixel(x, y), Vec4::ZERO);
    }
}
