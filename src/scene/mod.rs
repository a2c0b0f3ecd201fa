//! Scene description
//!
//! Turns animation state into renderer input:
//! - Shapes: primitive descriptors expanded into instanced unit meshes
//! - Lighting: ambient plus distant and local lights
//! - Bottle scene: the static bottle and the per-frame animated parts

pub mod bottle_scene;
pub mod lighting;
pub mod shapes;

pub use bottle_scene::BottleScene;
pub use lighting::{Light, Lighting};
pub use shapes::{Material, MeshKind, SceneObject, Shape, ShapeInstance};
