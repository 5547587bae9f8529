// crates/ct_physics/src/engine/mod.rs

//! 稳定性控制引擎
//!
//! # 模块结构
//!
//! - `clock` - 仿真时钟与心动周期计数
//! - `stability` - 全局 Courant 分母与流动尺度
//! - `timestep` - 变步长控制与向下截断
//! - `runtime_stats` - 每步运行统计与 0 号进程诊断日志

pub mod clock;
pub mod runtime_stats;
pub mod stability;
pub mod timestep;

// 重导出常用类型
pub use clock::{ClockSnapshot, SimulationClock};
pub use runtime_stats::{DiagnosticLog, StabilityControl, StepReport};
pub use stability::{StabilityMonitor, StabilityStats};
pub use timestep::{
    truncate_down, update_timestep, TimeControl, TimestepController, TIMESTEP_DECIMALS,
};
