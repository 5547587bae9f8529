// crates/ct_physics/src/lib.rs

//! CardioTherm Physics Layer (Layer 3)
//!
//! 血流-传热求解器的稳定性控制与边界通量层。流动与能量方程本身由外部
//! 有限元引擎求解，本层负责其外围：
//!
//! - 时间波形驱动 (forcing) - B 样条波形、周期偏移
//! - 网格几何 (mesh) - 面法向、顶点特征长度、四面体网格
//! - 边界通量 (boundary) - 入口速度、出口压力、球囊温度
//! - 数值工具 (numerics) - 稀疏矩阵、压力零空间
//! - 场与历史 (fields) - 节点场、时间层平移、自由度统计
//! - 引擎 (engine) - 稳定性统计、变步长、诊断日志、仿真时钟
//!
//! # 并行模型
//!
//! 每个进程一个逻辑线程，进程间通过 [`ct_runtime::Collective`] 做集合归约；
//! 进程内的批量求值与最大值归约使用 rayon。所有集合操作必须在每个进程上
//! 以相同顺序调用。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod boundary;
pub mod engine;
pub mod fields;
pub mod forcing;
pub mod mesh;
pub mod numerics;

/// 层级标识
pub const LAYER: u8 = 3;

// 重导出常用类型
pub use boundary::{BoundaryFlux, BoundaryFluxSet, FluxValue, ValueShape};
pub use engine::{
    ClockSnapshot, DiagnosticLog, SimulationClock, StabilityControl, StabilityMonitor,
    StabilityStats, StepReport, TimeControl, TimestepController,
};
pub use fields::{
    count_total_dofs, DofCarrier, FieldHistories, History, ScalarField, VectorField,
};
pub use forcing::{BSpline, WaveformSampler};
pub use mesh::{FacetContext, FacetGeometry, TetMesh, VertexLengthScale};
pub use numerics::{attach_nullspace, NullSpaceBasis, PressureOperator, SubspaceDofs};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::boundary::{BoundaryFlux, BoundaryFluxSet, FluxValue, ValueShape};
    pub use crate::engine::{
        ClockSnapshot, SimulationClock, StabilityControl, StepReport, TimeControl,
        TimestepController,
    };
    pub use crate::fields::{FieldHistories, ScalarField, VectorField};
    pub use crate::forcing::{BSpline, WaveformSampler};
    pub use crate::mesh::{FacetContext, FacetGeometry, TetMesh, VertexLengthScale};
    pub use ct_foundation::{CtError, CtResult};
    pub use ct_runtime::{Collective, SerialComm};
}
