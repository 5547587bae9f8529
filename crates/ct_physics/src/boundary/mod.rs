// crates/ct_physics/src/boundary/mod.rs

//! 边界通量
//!
//! 入口速度、出口压力与球囊温度三类时变边界值。

pub mod flux;

pub use flux::{
    BoundaryFlux, BoundaryFluxSet, FluxValue, ValueShape, BLOOD_DENSITY, MMHG_TO_PA,
};
