// crates/ct_runtime/src/lib.rs

//! CardioTherm Runtime Layer (Layer 2)
//!
//! 运行时抽象层，提供跨进程集合通信接口。
//!
//! # 模块概览
//!
//! - [`comm`]: `Collective` trait、`SerialComm` 单进程实现、
//!   `LocalGroup` 进程内多 rank 实现

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod comm;

/// 层级标识
pub const LAYER: u8 = 2;

pub use comm::{Collective, LocalComm, LocalGroup, SerialComm};
