//! Per-frame instance aggregation
//!
//! Scans the world for renderable entities, groups them by model into
//! contiguous ranges of one instance buffer and uploads their model matrices.
//! The work is only redone when the world was marked dirty or a debug overlay
//! was toggled.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};

use super::components::{Footpath, Mesh, MorphWithTerrain, Stream, TempleInteriorPart, TempleRoom, Transform};
use super::world::World;
use crate::graphics::{DynamicVertexBuffer, Gpu, INSTANCE_LAYOUT, LineVertex, Mesh as GpuMesh, debug_lines};
use crate::mesh::L3dMesh;
use crate::resources::{ResourceId, ResourceManager};

/// Range of the instance buffer drawn for one model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstancedDrawDesc {
    pub offset: u32,
    pub count: u32,
    pub morph_with_terrain: bool,
}

/// Everything the techniques read from the rendering system
#[derive(Debug)]
pub struct RenderContext {
    pub dirty: bool,
    pub has_bounding_boxes: bool,
    /// Model matrices, followed by bounding box matrices when boxes are drawn
    pub instance_uniforms: Vec<Mat4>,
    pub instance_uniform_buffer: DynamicVertexBuffer,
    /// Ranges keyed and ordered by mesh id
    pub instanced_draw_descs: BTreeMap<ResourceId, InstancedDrawDesc>,
    pub bounding_box: Option<GpuMesh>,
    pub footpaths: Option<GpuMesh>,
    pub streams: Option<GpuMesh>,
    has_footpaths: bool,
    has_streams: bool,
}

impl RenderContext {
    pub fn new() -> Self {
        Self {
            dirty: true,
            has_bounding_boxes: false,
            instance_uniforms: Vec::new(),
            instance_uniform_buffer: DynamicVertexBuffer::new("instance uniforms", INSTANCE_LAYOUT),
            instanced_draw_descs: BTreeMap::new(),
            bounding_box: None,
            footpaths: None,
            streams: None,
            has_footpaths: false,
            has_streams: false,
        }
    }

    /// Offset and count of the bounding box matrices
    pub fn bounding_box_range(&self) -> (u32, u32) {
        let half = (self.instance_uniforms.len() / 2) as u32;
        (half, half)
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

/// World state a rebuild reads
pub struct PrepareScene<'a> {
    pub world: &'a World,
    pub meshes: &'a ResourceManager<L3dMesh>,
    pub camera_origin: Vec3,
}

/// One entity to instance
#[derive(Debug, Clone, Copy)]
pub struct InstanceSource {
    pub mesh_id: ResourceId,
    pub transform: Transform,
    pub morph_with_terrain: bool,
}

/// Chooses which entities get instanced
pub trait InstancePolicy {
    fn collect_instances(&mut self, scene: &PrepareScene<'_>) -> Vec<InstanceSource>;
}

/// Every model outside the temple interior
#[derive(Debug, Default)]
pub struct CommonInstances;

impl InstancePolicy for CommonInstances {
    fn collect_instances(&mut self, scene: &PrepareScene<'_>) -> Vec<InstanceSource> {
        let mut instances = Vec::new();
        let mut flat = scene
            .world
            .query::<(&Mesh, &Transform)>()
            .without::<&MorphWithTerrain>()
            .without::<&TempleInteriorPart>();
        for (_, (mesh, transform)) in flat.iter() {
            instances.push(InstanceSource {
                mesh_id: mesh.id,
                transform: *transform,
                morph_with_terrain: false,
            });
        }

        let mut morphing = scene
            .world
            .query::<(&Mesh, &Transform, &MorphWithTerrain)>()
            .without::<&TempleInteriorPart>();
        for (_, (mesh, transform, _)) in morphing.iter() {
            instances.push(InstanceSource {
                mesh_id: mesh.id,
                transform: *transform,
                morph_with_terrain: true,
            });
        }
        instances
    }
}

/// Temple interior parts of the rooms around the camera
#[derive(Debug, Default)]
pub struct TempleInstances {
    loaded_rooms: BTreeSet<TempleRoom>,
}

impl TempleInstances {
    pub fn loaded_rooms(&self) -> &BTreeSet<TempleRoom> {
        &self.loaded_rooms
    }
}

impl InstancePolicy for TempleInstances {
    fn collect_instances(&mut self, scene: &PrepareScene<'_>) -> Vec<InstanceSource> {
        let mut query = scene
            .world
            .query::<(&Mesh, &Transform, &TempleInteriorPart)>();
        let parts: Vec<_> = query
            .iter()
            .map(|(_, (mesh, transform, part))| (*mesh, *transform, part.room))
            .collect();

        self.loaded_rooms.clear();
        self.loaded_rooms.insert(TempleRoom::Main);
        for (mesh, transform, room) in &parts {
            let inside = scene
                .meshes
                .get(mesh.id)
                .is_some_and(|l3d| l3d.bounding_box().contains(scene.camera_origin - transform.position));
            if inside {
                self.loaded_rooms.insert(*room);
            }
        }

        parts
            .into_iter()
            .filter(|(_, _, room)| self.loaded_rooms.contains(room))
            .map(|(mesh, transform, _)| InstanceSource {
                mesh_id: mesh.id,
                transform,
                morph_with_terrain: false,
            })
            .collect()
    }
}

pub trait RenderingSystemInterface {
    /// Force a rebuild on the next `prepare_draw`
    fn set_dirty(&mut self);
    fn prepare_draw(&mut self, scene: &PrepareScene<'_>, draw_bounding_box: bool, draw_footpaths: bool, draw_streams: bool);
    fn context(&self) -> &RenderContext;
}

/// Model matrix of an instance: `scale(translate(mat4(rotation), position * rotation), scale)`
pub fn instance_matrix(transform: &Transform) -> Mat4 {
    // glm's `vec * quat` rotates by the inverse
    let rotated_position = transform.rotation.inverse() * transform.position;
    Mat4::from_quat(transform.rotation)
        * Mat4::from_translation(rotated_position)
        * Mat4::from_scale(transform.scale)
}

pub struct RenderingSystem<P> {
    policy: P,
    context: RenderContext,
    gpu: Option<Arc<Gpu>>,
    rebuilds: u64,
}

pub type RenderingSystemCommon = RenderingSystem<CommonInstances>;
pub type RenderingSystemTemple = RenderingSystem<TempleInstances>;

impl<P: InstancePolicy + Default> RenderingSystem<P> {
    pub fn new(gpu: Option<Arc<Gpu>>) -> Self {
        Self::with_policy(P::default(), gpu)
    }
}

impl<P: InstancePolicy> RenderingSystem<P> {
    pub fn with_policy(policy: P, gpu: Option<Arc<Gpu>>) -> Self {
        Self {
            policy,
            context: RenderContext::new(),
            gpu,
            rebuilds: 0,
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Number of rebuilds so far
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    fn prepare_draw_descs(&mut self, instances: &[InstanceSource], draw_bounding_box: bool) {
        let mut mesh_ids: BTreeMap<ResourceId, (u32, bool)> = BTreeMap::new();
        for instance in instances {
            let entry = mesh_ids
                .entry(instance.mesh_id)
                .or_insert((0, instance.morph_with_terrain));
            entry.0 += 1;
        }

        let mut instance_count = instances.len() as u32;
        if draw_bounding_box {
            instance_count *= 2;
        }

        self.context
            .instance_uniform_buffer
            .ensure_capacity(self.gpu.as_deref(), instance_count);
        self.context
            .instance_uniforms
            .resize(instance_count as usize, Mat4::IDENTITY);

        let mut offset = 0;
        self.context.instanced_draw_descs.clear();
        for (mesh_id, (count, morph_with_terrain)) in mesh_ids {
            self.context.instanced_draw_descs.insert(
                mesh_id,
                InstancedDrawDesc {
                    offset,
                    count,
                    morph_with_terrain,
                },
            );
            offset += count;
        }
    }

    fn prepare_draw_upload_uniforms(
        &mut self,
        instances: &[InstanceSource],
        meshes: &ResourceManager<L3dMesh>,
        draw_bounding_box: bool,
    ) {
        let half = self.context.instance_uniforms.len() / 2;
        let mut uniform_offsets: BTreeMap<ResourceId, u32> = BTreeMap::new();
        for instance in instances {
            let Some(desc) = self.context.instanced_draw_descs.get(&instance.mesh_id) else {
                continue;
            };
            let running = uniform_offsets.entry(instance.mesh_id).or_insert(0);
            let index = (desc.offset + *running) as usize;
            *running += 1;

            let model = instance_matrix(&instance.transform);
            self.context.instance_uniforms[index] = model;

            if draw_bounding_box {
                let box_matrix = match meshes.get(instance.mesh_id).map(L3dMesh::bounding_box) {
                    Some(aabb) if aabb.is_valid() => {
                        model * Mat4::from_translation(aabb.center()) * Mat4::from_scale(aabb.size())
                    }
                    _ => model * Mat4::from_scale(Vec3::ZERO),
                };
                self.context.instance_uniforms[index + half] = box_matrix;
            }
        }

        if !self.context.instance_uniforms.is_empty() {
            let data: &[u8] = bytemuck::cast_slice(&self.context.instance_uniforms);
            self.context
                .instance_uniform_buffer
                .update(self.gpu.as_deref(), data);
        }
    }

    fn upload_debug_mesh(&self, mut mesh: GpuMesh) -> GpuMesh {
        if let Some(gpu) = &self.gpu {
            mesh.upload(gpu);
        }
        mesh
    }

    fn build_footpaths(world: &World) -> Vec<LineVertex> {
        let color = Vec4::new(0.0, 1.0, 0.0, 1.0);
        let offset = Vec3::new(0.0, 1.0, 0.0);
        let mut edges = Vec::new();
        for (_, footpath) in world.query::<&Footpath>().iter() {
            for pair in footpath.nodes.windows(2) {
                edges.push(LineVertex::new(pair[0].position + offset, color));
                edges.push(LineVertex::new(pair[1].position + offset, color));
            }
        }
        edges
    }

    fn build_streams(world: &World) -> Vec<LineVertex> {
        let color = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let mut edges = Vec::new();
        for (_, stream) in world.query::<&Stream>().iter() {
            for (from, to) in stream.segments() {
                edges.push(LineVertex::new(from, color));
                edges.push(LineVertex::new(to, color));
            }
        }
        edges
    }
}

impl<P: InstancePolicy> RenderingSystemInterface for RenderingSystem<P> {
    fn set_dirty(&mut self) {
        self.context.dirty = true;
    }

    fn prepare_draw(&mut self, scene: &PrepareScene<'_>, draw_bounding_box: bool, draw_footpaths: bool, draw_streams: bool) {
        let context = &self.context;
        let rebuild = context.dirty
            || context.has_bounding_boxes != draw_bounding_box
            || context.has_footpaths != draw_footpaths
            || context.has_streams != draw_streams;
        if !rebuild {
            return;
        }

        let instances = self.policy.collect_instances(scene);
        self.prepare_draw_descs(&instances, draw_bounding_box);
        self.prepare_draw_upload_uniforms(&instances, scene.meshes, draw_bounding_box);

        self.context.bounding_box = draw_bounding_box
            .then(|| self.upload_debug_mesh(debug_lines::create_box(Vec4::new(1.0, 0.0, 0.0, 0.5))));

        self.context.footpaths = None;
        if draw_footpaths {
            let edges = Self::build_footpaths(scene.world);
            if !edges.is_empty() {
                self.context.footpaths =
                    Some(self.upload_debug_mesh(debug_lines::create_lines("footpaths", &edges)));
            }
        }

        self.context.streams = None;
        if draw_streams {
            let edges = Self::build_streams(scene.world);
            if !edges.is_empty() {
                self.context.streams = Some(self.upload_debug_mesh(debug_lines::create_lines("streams", &edges)));
            }
        }

        self.context.dirty = false;
        self.context.has_bounding_boxes = draw_bounding_box;
        self.context.has_footpaths = draw_footpaths;
        self.context.has_streams = draw_streams;
        self.rebuilds += 1;
        log::trace!(
            "Rebuilt instance buffer: {} instances over {} meshes",
            instances.len(),
            self.context.instanced_draw_descs.len()
        );
    }

    fn context(&self) -> &RenderContext {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{FootpathNode, StreamNode};
    use crate::l3d::{L3dFile, L3dMeshFlags, L3dVertex, PrimitiveData, SubmeshFlags};
    use crate::resources::hash_name;
    use glam::{Quat, Vec2};

    /// Model whose box spans `[min, max]`
    fn box_mesh(name: &str, min: Vec3, max: Vec3) -> L3dMesh {
        let mut file = L3dFile::new(name, L3dMeshFlags::empty());
        file.add_submesh(
            SubmeshFlags::drawable(),
            vec![PrimitiveData {
                vertices: vec![
                    L3dVertex::new(min, Vec2::ZERO, Vec3::Y),
                    L3dVertex::new(max, Vec2::ZERO, Vec3::Y),
                    L3dVertex::new(Vec3::new(min.x, max.y, min.z), Vec2::ZERO, Vec3::Y),
                ],
                indices: vec![0, 1, 2],
                ..Default::default()
            }],
        );
        L3dMesh::load(&file).unwrap()
    }

    fn meshes() -> ResourceManager<L3dMesh> {
        let mut meshes = ResourceManager::new();
        meshes.load("tree", box_mesh("tree", Vec3::ZERO, Vec3::new(2.0, 4.0, 2.0)));
        meshes.load("rock", box_mesh("rock", Vec3::splat(-1.0), Vec3::splat(1.0)));
        meshes
    }

    fn scene<'a>(world: &'a World, meshes: &'a ResourceManager<L3dMesh>) -> PrepareScene<'a> {
        PrepareScene {
            world,
            meshes,
            camera_origin: Vec3::ZERO,
        }
    }

    fn approx_eq(a: &Mat4, b: &Mat4) -> bool {
        a.abs_diff_eq(*b, 0.0001)
    }

    #[test]
    fn test_instance_matrix_matches_trs() {
        let transform = Transform::from_position_rotation(
            Vec3::new(3.0, -2.0, 7.0),
            Quat::from_rotation_y(0.7) * Quat::from_rotation_x(0.2),
        )
        .with_scale(Vec3::new(1.0, 2.0, 0.5));
        assert!(approx_eq(&instance_matrix(&transform), &transform.matrix()));
    }

    #[test]
    fn test_bounding_boxes_fill_second_half() {
        let meshes = meshes();
        let mut world = World::new();
        for i in 0..5 {
            world.spawn_mesh(hash_name("tree"), Transform::from_position(Vec3::X * i as f32));
        }

        let mut system = RenderingSystemCommon::new(None);
        system.prepare_draw(&scene(&world, &meshes), true, false, false);

        let context = system.context();
        assert_eq!(context.instance_uniforms.len(), 10);
        assert_eq!(context.bounding_box_range(), (5, 5));
        assert!(context.bounding_box.is_some());

        let aabb = *meshes.get_by_name("tree").unwrap().bounding_box();
        let box_local = Mat4::from_translation(aabb.center()) * Mat4::from_scale(aabb.size());
        for i in 0..5 {
            let model = context.instance_uniforms[i];
            let position = model.transform_point3(Vec3::ZERO);
            assert!((position - Vec3::X * i as f32).length() < 0.0001);
            assert!(approx_eq(&context.instance_uniforms[i + 5], &(model * box_local)));
        }
    }

    #[test]
    fn test_prepare_draw_is_idempotent() {
        let meshes = meshes();
        let mut world = World::new();
        world.spawn_mesh(hash_name("tree"), Transform::new());

        let mut system = RenderingSystemCommon::new(None);
        system.prepare_draw(&scene(&world, &meshes), false, false, false);
        let uploads = system.context().instance_uniform_buffer.upload_count();
        assert!(!system.context().dirty);

        system.prepare_draw(&scene(&world, &meshes), false, false, false);
        assert_eq!(system.context().instance_uniform_buffer.upload_count(), uploads);
        assert_eq!(system.rebuilds(), 1);

        // Toggling an overlay rebuilds without a world change
        system.prepare_draw(&scene(&world, &meshes), false, true, false);
        assert_eq!(system.rebuilds(), 2);
        system.prepare_draw(&scene(&world, &meshes), false, true, false);
        assert_eq!(system.rebuilds(), 2);
    }

    #[test]
    fn test_empty_world_skips_upload() {
        let meshes = meshes();
        let world = World::new();
        let mut system = RenderingSystemCommon::new(None);
        system.prepare_draw(&scene(&world, &meshes), true, false, false);

        let context = system.context();
        assert!(context.instance_uniforms.is_empty());
        assert!(context.instanced_draw_descs.is_empty());
        assert_eq!(context.instance_uniform_buffer.upload_count(), 0);
        assert_eq!(system.rebuilds(), 1);
    }

    #[test]
    fn test_bounding_box_toggle_rebuilds() {
        let meshes = meshes();
        let mut world = World::new();
        world.spawn_mesh(hash_name("rock"), Transform::new());

        let mut system = RenderingSystemCommon::new(None);
        system.prepare_draw(&scene(&world, &meshes), false, false, false);
        assert_eq!(system.context().instance_uniforms.len(), 1);
        assert!(system.context().bounding_box.is_none());

        system.prepare_draw(&scene(&world, &meshes), true, false, false);
        assert_eq!(system.rebuilds(), 2);
        assert_eq!(system.context().instance_uniforms.len(), 2);
        assert!(system.context().bounding_box.is_some());

        system.prepare_draw(&scene(&world, &meshes), false, false, false);
        assert_eq!(system.rebuilds(), 3);
        assert_eq!(system.context().instance_uniforms.len(), 1);
        assert!(system.context().bounding_box.is_none());
    }

    #[test]
    fn test_capacity_never_shrinks() {
        let meshes = meshes();
        let mut world = World::new();
        let entities: Vec<_> = (0..6)
            .map(|_| world.spawn_mesh(hash_name("rock"), Transform::new()))
            .collect();

        let mut system = RenderingSystemCommon::new(None);
        system.prepare_draw(&scene(&world, &meshes), false, false, false);
        assert_eq!(system.context().instance_uniform_buffer.capacity(), 6);

        for entity in &entities[..4] {
            world.despawn(*entity).unwrap();
        }
        system.set_dirty();
        system.prepare_draw(&scene(&world, &meshes), false, false, false);
        assert_eq!(system.context().instance_uniforms.len(), 2);
        assert_eq!(system.context().instance_uniform_buffer.capacity(), 6);
    }

    #[test]
    fn test_descs_partition_instances() {
        let meshes = meshes();
        let mut world = World::new();
        for _ in 0..3 {
            world.spawn_mesh(hash_name("tree"), Transform::new());
        }
        for _ in 0..2 {
            world.spawn_morphing_mesh(hash_name("rock"), Transform::new());
        }

        let mut system = RenderingSystemCommon::new(None);
        system.prepare_draw(&scene(&world, &meshes), false, false, false);

        let descs = &system.context().instanced_draw_descs;
        let ids: Vec<_> = descs.keys().copied().collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);

        let mut offset = 0;
        for desc in descs.values() {
            assert_eq!(desc.offset, offset);
            offset += desc.count;
        }
        assert_eq!(offset, 5);
        assert!(descs[&hash_name("rock")].morph_with_terrain);
        assert!(!descs[&hash_name("tree")].morph_with_terrain);
    }

    #[test]
    fn test_debug_line_meshes() {
        let meshes = meshes();
        let mut world = World::new();
        world.spawn((Footpath {
            nodes: vec![
                FootpathNode { position: Vec3::ZERO },
                FootpathNode { position: Vec3::X },
                FootpathNode { position: Vec3::Z },
            ],
        },));
        world.spawn((Stream {
            nodes: vec![
                StreamNode { position: Vec3::ZERO, edges: vec![1] },
                StreamNode { position: Vec3::X, edges: vec![] },
            ],
        },));

        let mut system = RenderingSystemCommon::new(None);
        system.prepare_draw(&scene(&world, &meshes), false, true, true);

        let footpaths = system.context().footpaths.as_ref().unwrap();
        let vertices = footpaths.vertex_buffer().vertices::<LineVertex>();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[0].position, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(vertices[0].color, [0.0, 1.0, 0.0, 1.0]);

        let streams = system.context().streams.as_ref().unwrap();
        assert_eq!(streams.vertex_buffer().count(), 2);

        system.prepare_draw(&scene(&world, &meshes), false, false, false);
        assert!(system.context().footpaths.is_none());
        assert!(system.context().streams.is_none());
    }

    #[test]
    fn test_temple_loads_rooms_around_camera() {
        let meshes = meshes();
        let mut world = World::new();
        world.spawn_temple_part(hash_name("rock"), Transform::new(), TempleRoom::Main);
        world.spawn_temple_part(
            hash_name("rock"),
            Transform::from_position(Vec3::new(10.0, 0.0, 0.0)),
            TempleRoom::Challenge,
        );
        world.spawn_temple_part(
            hash_name("tree"),
            Transform::from_position(Vec3::new(50.0, 0.0, 0.0)),
            TempleRoom::Credits,
        );
        world.spawn_mesh(hash_name("tree"), Transform::new());

        let mut system = RenderingSystemTemple::new(None);
        let camera = PrepareScene {
            world: &world,
            meshes: &meshes,
            camera_origin: Vec3::new(10.5, 0.0, 0.0),
        };
        system.prepare_draw(&camera, false, false, false);

        let rooms: Vec<_> = system.policy().loaded_rooms().iter().copied().collect();
        assert_eq!(rooms, vec![TempleRoom::Main, TempleRoom::Challenge]);
        let descs = &system.context().instanced_draw_descs;
        assert_eq!(descs.len(), 1);
        assert_eq!(descs[&hash_name("rock")].count, 2);
        assert!(!descs.contains_key(&hash_name("tree")));
    }
}
