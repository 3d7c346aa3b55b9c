//! Frame composition.
//!
//! [`Render`] describes what a frame should draw. It can name a single
//! entity, a batch, a whole [`SceneNode`] tree or a composition of those.
//! [`Context::render`](crate::context::Context::render) flattens it into a
//! draw list and records every entity with the textured pipeline.

use crate::data_structures::{entity::Entity, scene_graph::SceneNode};

pub enum Render<'a> {
    None,
    Entity(&'a Entity),
    Entities(Vec<&'a Entity>),
    Node(&'a SceneNode<Entity>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    /// Appends every entity of `self` to `out` in draw order.
    pub(crate) fn collect(self, out: &mut Vec<&'a Entity>) {
        match self {
            Render::None => (),
            Render::Entity(entity) => out.push(entity),
            Render::Entities(mut entities) => out.append(&mut entities),
            Render::Node(node) => out.extend(node.entities()),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.collect(out)),
        }
    }

    /// Flattens `self` into the list of entities it draws, in draw order.
    pub fn entities(self) -> Vec<&'a Entity> {
        let mut entities = Vec::new();
        self.collect(&mut entities);
        entities
    }
}

impl<'a> Default for Render<'a> {
    fn default() -> Self {
        Render::None
    }
}

impl<'a> From<&'a Entity> for Render<'a> {
    fn from(entity: &'a Entity) -> Self {
        Render::Entity(entity)
    }
}

impl<'a> From<&'a [Entity]> for Render<'a> {
    fn from(entities: &'a [Entity]) -> Self {
        Render::Entities(entities.iter().collect())
    }
}

impl<'a> From<&'a Vec<Entity>> for Render<'a> {
    fn from(entities: &'a Vec<Entity>) -> Self {
        Render::from(entities.as_slice())
    }
}

impl<'a> From<&'a SceneNode<Entity>> for Render<'a> {
    fn from(node: &'a SceneNode<Entity>) -> Self {
        Render::Node(node)
    }
}

impl<'a> From<Vec<Render<'a>>> for Render<'a> {
    fn from(renders: Vec<Render<'a>>) -> Self {
        Render::Composed(renders)
    }
}
