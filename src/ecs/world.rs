//! World wrapper around hecs

use hecs::Entity;

use super::components::{Mesh, MorphWithTerrain, TempleInteriorPart, TempleRoom, Transform};
use crate::resources::ResourceId;

/// Entity registry the rendering systems scan
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
}

impl World {
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Spawn a model instance
    pub fn spawn_mesh(&mut self, mesh_id: ResourceId, transform: Transform) -> Entity {
        self.inner.spawn((Mesh::new(mesh_id), transform))
    }

    /// Spawn a model instance that follows the terrain
    pub fn spawn_morphing_mesh(&mut self, mesh_id: ResourceId, transform: Transform) -> Entity {
        self.inner
            .spawn((Mesh::new(mesh_id), transform, MorphWithTerrain))
    }

    /// Spawn a piece of temple interior
    pub fn spawn_temple_part(&mut self, mesh_id: ResourceId, transform: Transform, room: TempleRoom) -> Entity {
        self.inner
            .spawn((Mesh::new(mesh_id), transform, TempleInteriorPart { room }))
    }

    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Get a reference to a component
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Query for entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query::<Q>()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
