//! The base entity: anything that exists in the world.

use attributed_core::{Mat4, Reflect, Signature, Vec4};
use serde::{Deserialize, Serialize};

use super::EntityId;

/// A named object with health, speed and a place in the world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thing {
    /// Not reflected; identifies the entity outside the scope tree.
    pub id: EntityId,
    pub name: String,
    pub health: i32,
    pub speed: f32,
    pub position: Vec4,
    pub transform: Mat4,
}

impl Thing {
    pub const NAME: &'static str = "Name";
    pub const HEALTH: &'static str = "Health";
    pub const SPEED: &'static str = "Speed";
    pub const POSITION: &'static str = "Position";
    pub const TRANSFORM: &'static str = "Transform";

    /// Create a thing at the origin with an identity transform.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec4::new(0.0, 0.0, 0.0, 1.0),
            ..Self::default()
        }
    }
}

impl Reflect for Thing {
    const TYPE_NAME: &'static str = "Thing";

    fn signatures() -> Vec<Signature> {
        vec![
            Signature::field(Self::NAME, |t: &Thing| &t.name, |t: &mut Thing| &mut t.name),
            Signature::field(Self::HEALTH, |t: &Thing| &t.health, |t: &mut Thing| &mut t.health),
            Signature::field(Self::SPEED, |t: &Thing| &t.speed, |t: &mut Thing| &mut t.speed),
            Signature::field(
                Self::POSITION,
                |t: &Thing| &t.position,
                |t: &mut Thing| &mut t.position,
            ),
            Signature::field(
                Self::TRANSFORM,
                |t: &Thing| &t.transform,
                |t: &mut Thing| &mut t.transform,
            ),
        ]
    }
}
