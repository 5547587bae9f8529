// crates/ct_physics/src/numerics/mod.rs

//! 数值工具
//!
//! # 模块结构
//!
//! - `vector_ops` - BLAS-1 向量运算
//! - `csr` - CSR 稀疏矩阵
//! - `nullspace` - 压力算子常数零空间

pub mod csr;
pub mod nullspace;
pub mod vector_ops;

pub use csr::{CsrBuilder, CsrMatrix};
pub use nullspace::{attach_nullspace, DofMap, NullSpaceBasis, PressureOperator, SubspaceDofs};
