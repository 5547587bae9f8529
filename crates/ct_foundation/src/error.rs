// crates/ct_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `CtError` 枚举和 `CtResult` 类型别名。本层没有瞬态故障（无网络、无重试），
//! 任何错误都意味着配置或不变量被破坏，调用方必须立即中止当前时间步。
//!
//! # 示例
//!
//! ```
//! use ct_foundation::error::{CtError, CtResult};
//!
//! fn check_decimals(decimals: i32) -> CtResult<()> {
//!     if decimals < 0 {
//!         return Err(CtError::InvalidDecimalCount { decimals });
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_decimals(-1).is_err());
//! ```

use thiserror::Error;

/// 统一结果类型
pub type CtResult<T> = Result<T, CtError>;

/// CardioTherm 错误类型
#[derive(Error, Debug)]
pub enum CtError {
    // ========================================================================
    // 核心错误
    // ========================================================================

    /// 波形在样条定义域之外采样
    #[error("采样时间超出波形定义域: x={value}, 有效范围=[{lower}, {upper}]")]
    OutOfDomain {
        /// 缩放后的样条参数
        value: f64,
        /// 定义域下界
        lower: f64,
        /// 定义域上界
        upper: f64,
    },

    /// 在非边界实体上调用边界求值器
    #[error("无效的局部面索引: 单元 {cell} 的局部面 {local_facet} 不是边界面")]
    InvalidFacet {
        /// 单元索引
        cell: usize,
        /// 局部面索引（内部实体为负值）
        local_facet: i32,
    },

    /// 压力零空间向量范数接近零
    #[error("零空间向量退化: ||v||_2 = {norm:e}")]
    DegenerateNullVector {
        /// 归一化前的全局 ℓ2 范数
        norm: f64,
    },

    /// 截断精度请求非法
    #[error("小数位数必须为非负整数, 实际为 {decimals}")]
    InvalidDecimalCount {
        /// 请求的小数位数
        decimals: i32,
    },

    // ========================================================================
    // 通用错误
    // ========================================================================

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 无效网格
    #[error("无效的网格: {message}")]
    InvalidMesh {
        /// 具体错误信息
        message: String,
    },

    /// 数值计算失败
    #[error("数值计算失败: {message}")]
    Numerical {
        /// 具体错误信息
        message: String,
    },

    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        /// 底层 IO 错误
        #[source]
        source: std::io::Error,
    },
}

impl CtError {
    /// 创建无效输入错误
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 创建无效网格错误
    pub fn invalid_mesh(message: impl Into<String>) -> Self {
        Self::InvalidMesh {
            message: message.into(),
        }
    }

    /// 创建数值错误
    pub fn numerical(message: impl Into<String>) -> Self {
        Self::Numerical {
            message: message.into(),
        }
    }

    /// 创建 IO 错误
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// 检查大小一致性
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> CtResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::SizeMismatch {
                name,
                expected,
                actual,
            })
        }
    }

    /// 是否为致命的编程错误（调用约定被违反）
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidFacet { .. } | Self::DegenerateNullVector { .. } | Self::SizeMismatch { .. }
        )
    }
}

impl From<std::io::Error> for CtError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
        }
    }
}
