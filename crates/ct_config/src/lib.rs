// crates/ct_config/src/lib.rs

//! CardioTherm Config Layer (Layer 4)
//!
//! 配置层，负责算例配置的加载、校验以及向物理层对象的转换。
//!
//! # 模块概览
//!
//! - [`case_config`]: CaseConfig 算例配置（JSON / YAML）
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: ct_cli        ─> uses CaseConfig
//! Layer 4: ct_config     ─> CaseConfig, ConfigError (本层)
//! Layer 3: ct_physics    ─> BoundaryFluxSet, TimeControl
//! Layer 2: ct_runtime
//! Layer 1: ct_foundation
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod case_config;
pub mod error;

/// 层级标识
pub const LAYER: u8 = 4;

// 重导出核心类型
pub use case_config::{
    BoxMeshConfig, CaseConfig, OutputConfig, ScaleConfig, TimeConfig, WaveformSource,
    WaveformsConfig,
};
pub use error::ConfigError;
