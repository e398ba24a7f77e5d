//! Viewer for a procedurally built island scene
//!
//! Usage: `godcore-viewer [config.ron]`

use std::f32::consts::TAU;
use std::time::Duration;

use godcore::environment::LandIslandInterface;
use godcore::graphics::Texture2D;
use godcore::l3d::{
    AnmBone, AnmKeyframe, L3dBone, L3dMaterial, L3dMeshFlags, L3dTexture, L3dVertex, L3dVertexGroup, NO_BONE,
    PrimitiveData, SubmeshFlags,
};
use godcore::prelude::*;

const ISLAND_BLOCKS: usize = 4;
const HUT_SKIN: u32 = 1;
const CHEST_SKIN: u32 = 2;

/// Eight-corner box of `size` around `center`, all vertices bound to `bone`
fn box_primitive(center: Vec3, size: Vec3, skin_id: u32, bone: Option<u16>) -> PrimitiveData {
    let mut vertices = Vec::with_capacity(8);
    for i in 0..8 {
        let corner = Vec3::new(
            if i & 1 == 0 { -0.5 } else { 0.5 },
            if i & 2 == 0 { -0.5 } else { 0.5 },
            if i & 4 == 0 { -0.5 } else { 0.5 },
        );
        let uv = Vec2::new(corner.x + 0.5, corner.z + 0.5);
        vertices.push(L3dVertex::new(center + corner * size, uv, corner.normalize()));
    }
    let indices = vec![
        0, 2, 1, 1, 2, 3, // -z
        4, 5, 6, 5, 7, 6, // +z
        0, 1, 4, 1, 5, 4, // -y
        2, 6, 3, 3, 6, 7, // +y
        0, 4, 2, 2, 4, 6, // -x
        1, 3, 5, 3, 7, 5, // +x
    ];
    PrimitiveData {
        material: L3dMaterial {
            kind: 2,
            skin_id,
            alpha_cutout_threshold: 0,
        },
        vertices,
        indices,
        groups: bone
            .map(|bone_index| vec![L3dVertexGroup { vertex_count: 8, bone_index }])
            .unwrap_or_default(),
    }
}

fn hut() -> L3dFile {
    let mut file = L3dFile::new("hut", L3dMeshFlags::empty());
    file.add_skin(L3dTexture::solid(HUT_SKIN, 0xF269));
    file.add_submesh(
        SubmeshFlags::drawable(),
        vec![
            box_primitive(Vec3::new(0.0, 2.0, 0.0), Vec3::new(6.0, 4.0, 6.0), HUT_SKIN, None),
            box_primitive(Vec3::new(0.0, 5.0, 0.0), Vec3::new(4.0, 2.0, 4.0), HUT_SKIN, None),
        ],
    );
    file.add_submesh(
        SubmeshFlags::physics(),
        vec![box_primitive(Vec3::new(0.0, 3.0, 0.0), Vec3::splat(6.0), HUT_SKIN, None)],
    );
    file
}

fn bone(parent: u32, position: Vec3) -> L3dBone {
    L3dBone {
        parent,
        first_child: NO_BONE,
        right_sibling: NO_BONE,
        orientation: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        position,
    }
}

/// Two-bone chest whose lid hangs off the body
fn chest() -> (L3dFile, AnmFile) {
    let mut file = L3dFile::new("coffre", L3dMeshFlags::HAS_BONES);
    file.add_skin(L3dTexture::solid(CHEST_SKIN, 0xF47A));
    file.add_submesh(
        SubmeshFlags::drawable(),
        vec![
            box_primitive(Vec3::new(0.0, 0.5, 0.0), Vec3::new(2.0, 1.0, 1.2), CHEST_SKIN, Some(0)),
            box_primitive(Vec3::new(0.0, 0.15, 0.0), Vec3::new(2.0, 0.3, 1.2), CHEST_SKIN, Some(1)),
        ],
    );
    file.set_bones(vec![bone(NO_BONE, Vec3::ZERO), bone(0, Vec3::new(0.0, 1.0, 0.0))]);

    let keyframe = |time: u32, lift: f32| AnmKeyframe {
        time,
        bones: vec![AnmBone::IDENTITY, AnmBone::from_translation(0.0, 1.0 + lift, 0.0)],
    };
    let animation = AnmFile::new(
        "coffre",
        2000,
        vec![keyframe(0, 0.0), keyframe(1000, 0.8), keyframe(2000, 0.0)],
    );
    (file, animation)
}

fn height(position: Vec2) -> f32 {
    let size = ISLAND_BLOCKS as f32 * godcore::environment::BLOCK_SIZE;
    let centered = position / size - Vec2::splat(0.5);
    let falloff = (1.0 - centered.length() * 2.0).max(0.0);
    let ridges = (position.x * 0.02).sin() * (position.y * 0.015).cos();
    falloff * (90.0 + 30.0 * ridges)
}

struct Viewer {
    yaw: f32,
    pitch: f32,
    distance: f32,
    target: Vec3,
}

impl Viewer {
    fn new() -> Self {
        Self {
            yaw: 0.6,
            pitch: 0.5,
            distance: 420.0,
            target: Vec3::ZERO,
        }
    }

    fn load(&mut self, ctx: &mut EngineContext) -> Result<(), Box<dyn std::error::Error>> {
        for name in ["raw/sea", "raw/seaalpha", "raw/smallbumpa"] {
            let color = match name {
                "raw/sea" => [40, 90, 140, 255],
                "raw/seaalpha" => [200, 200, 200, 255],
                _ => [128, 128, 128, 255],
            };
            ctx.resources.textures.load(name, Texture2D::solid_color(name, color));
        }
        ctx.resources
            .textures
            .load("sprite", Texture2D::solid_color("sprite", [255, 220, 90, 255]));

        ctx.island = LandIsland::from_height_field(ISLAND_BLOCKS, ISLAND_BLOCKS, height)?;
        let extent = ctx.island.extent();
        let center = (extent.minimum + extent.maximum) * 0.5;
        self.target = Vec3::new(center.x, 40.0, center.y);

        let hut_id = ctx.resources.meshes.load("hut", L3dMesh::load(&hut())?).id();
        let (chest, animation) = chest();
        ctx.resources.meshes.load("coffre", L3dMesh::load(&chest)?);
        ctx.resources.animations.load("coffre", L3dAnim::load(&animation)?);

        for ring in 0..3 {
            let radius = 60.0 + ring as f32 * 45.0;
            let count = 6 + ring * 4;
            for i in 0..count {
                let angle = TAU * i as f32 / count as f32;
                let xz = center + Vec2::new(angle.cos(), angle.sin()) * radius;
                let ground = ctx.island.height_at(xz);
                let transform = Transform::from_position_rotation(
                    Vec3::new(xz.x, ground, xz.y),
                    Quat::from_rotation_y(-angle),
                );
                if ring == 2 {
                    ctx.world.spawn_morphing_mesh(hut_id, transform);
                } else {
                    ctx.world.spawn_mesh(hut_id, transform);
                }
            }
        }

        let sprite_id = hash_name("sprite");
        for i in 0..4 {
            let xz = center + Vec2::new(i as f32 * 20.0 - 30.0, -20.0);
            let position = Vec3::new(xz.x, ctx.island.height_at(xz) + 25.0, xz.y);
            ctx.world
                .spawn((Sprite::new(sprite_id), Transform::from_position(position).with_scale(Vec3::splat(8.0))));
        }

        ctx.world.spawn((DebugCross {
            pose: Mat4::from_scale_rotation_translation(Vec3::splat(20.0), Quat::IDENTITY, self.target),
        },));
        Ok(())
    }

    fn update_camera(&self, camera: &mut Camera) {
        camera.orbit(self.target, self.yaw, self.pitch, self.distance);
    }
}

impl Game for Viewer {
    fn init(&mut self, ctx: &mut EngineContext) {
        if let Err(err) = self.load(ctx) {
            log::error!("Failed to build the scene: {err}");
        }
        self.update_camera(&mut ctx.camera);
        log::info!("Scene ready with {} entities", ctx.world.len());
    }

    fn update(&mut self, ctx: &mut EngineContext, delta: Duration) {
        let dt = delta.as_secs_f32();
        let rotation_speed = 1.5;
        if ctx.is_key_pressed(KeyCode::ArrowLeft) {
            self.yaw -= rotation_speed * dt;
        }
        if ctx.is_key_pressed(KeyCode::ArrowRight) {
            self.yaw += rotation_speed * dt;
        }
        if ctx.is_key_pressed(KeyCode::ArrowUp) {
            self.pitch += rotation_speed * dt;
        }
        if ctx.is_key_pressed(KeyCode::ArrowDown) {
            self.pitch -= rotation_speed * dt;
        }
        if ctx.is_key_pressed(KeyCode::KeyW) {
            self.distance -= 200.0 * dt;
        }
        if ctx.is_key_pressed(KeyCode::KeyS) {
            self.distance += 200.0 * dt;
        }
        if ctx.is_key_pressed(KeyCode::KeyT) {
            ctx.config.render.time_of_day = (ctx.config.render.time_of_day + 2.0 * dt).rem_euclid(24.0);
        }
        self.pitch = self.pitch.clamp(-0.2, 1.4);
        self.distance = self.distance.clamp(30.0, 1200.0);
        self.update_camera(&mut ctx.camera);
    }

    fn on_key(&mut self, ctx: &mut EngineContext, key: KeyCode, pressed: bool) {
        if !pressed {
            return;
        }
        let render = &mut ctx.config.render;
        match key {
            KeyCode::F1 => render.wireframe ^= true,
            KeyCode::F2 => render.draw_bounding_boxes ^= true,
            KeyCode::F3 => render.draw_test_model ^= true,
            KeyCode::F4 => render.draw_debug_cross ^= true,
            KeyCode::F5 => render.cull_back ^= true,
            KeyCode::F12 => ctx.screenshot(),
            KeyCode::Tab => log::info!("{}", ctx.stats.format_stats()),
            KeyCode::Escape => ctx.quit(),
            _ => {}
        }
    }
}

fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::from_ron_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Config error: {e}");
                std::process::exit(1);
            }
        },
        None => EngineConfig::default().with_title("godcore viewer"),
    };

    let engine = match Engine::new(config, Viewer::new()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Engine error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = engine.run() {
        eprintln!("Engine error: {e}");
    }
}
