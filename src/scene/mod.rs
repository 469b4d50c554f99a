//! Scene graph: nodes, meshes, lights and the scene root.
//!
//! ```text
//! Scene ── root: Node ─┬─ child Node ── meshes (shared)
//!    │                 ├─ light Node (NodeKind::Light)
//!    │                 └─ meshes (shared)
//!    ├── MaterialRegistry
//!    └── frozen static vertex / index / mesh-record buffers
//! ```
//!
//! Nodes own their children; meshes are shared through [`SharedMesh`]
//! handles and encoded once per occurrence. World transforms are never
//! stored: traversal recomputes them every frame.

mod events;
mod light;
mod mesh;
mod node;
pub mod primitives;
mod root;

pub use crate::codec::Vertex;
pub use events::{NodeEvent, NodeEvents};
pub use light::{Light, LightParams, LightType, PointLight, SunLight, Visibility};
pub use mesh::{Mesh, SharedMesh};
pub use node::{Node, NodeKind};
pub use root::Scene;
