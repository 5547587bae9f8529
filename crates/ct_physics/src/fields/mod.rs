// crates/ct_physics/src/fields/mod.rs

//! 节点场、时间层历史与自由度统计

pub mod dofs;
pub mod history;
pub mod nodal;

pub use dofs::{count_total_dofs, DofGroup};
pub use history::{
    rotate_histories, FieldHistories, History, PRESSURE_GENERATIONS, TEMPERATURE_GENERATIONS,
    VELOCITY_GENERATIONS,
};
pub use nodal::{DofCarrier, ScalarField, VectorField};
