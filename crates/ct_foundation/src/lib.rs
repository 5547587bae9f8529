// crates/ct_foundation/src/lib.rs

//! CardioTherm Foundation Layer (Layer 1)
//!
//! 基础层，提供整个项目共享的最小抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `CtError` / `CtResult`
//! - [`index`]: 强类型索引（单元、顶点）
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: ct_cli        ─> 命令行驱动
//! Layer 4: ct_config     ─> CaseConfig
//! Layer 3: ct_physics    ─> 边界通量、稳定性、零空间、历史缓冲
//! Layer 2: ct_runtime    ─> Collective 集合通信
//! Layer 1: ct_foundation ─> CtError, CellIndex (本层)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod index;

/// 层级标识
pub const LAYER: u8 = 1;

// 重导出常用类型
pub use error::{CtError, CtResult};
pub use index::{CellIndex, VertexIndex};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{CtError, CtResult};
    pub use crate::index::{cell, vertex, CellIndex, VertexIndex};
}
