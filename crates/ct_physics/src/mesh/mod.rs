// crates/ct_physics/src/mesh/mod.rs

//! 网格几何
//!
//! 边界通量只通过 [`FacetGeometry`] 访问网格，
//! [`TetMesh`] 是内置的四面体实现。

pub mod geometry;
pub mod length_scale;
pub mod tet;

pub use geometry::{FacetContext, FacetGeometry};
pub use length_scale::VertexLengthScale;
pub use tet::TetMesh;
