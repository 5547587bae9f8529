// crates/ct_foundation/src/index.rs

//! 强类型索引
//!
//! 单元、顶点索引不可混用；编译期检查，运行时零开销。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 无效索引标记
pub const INVALID_INDEX: usize = usize::MAX;

// ============================================================================
// 宏：生成索引类型
// ============================================================================

macro_rules! define_index {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub usize);

        impl $name {
            /// 无效索引常量
            pub const INVALID: Self = Self(INVALID_INDEX);

            /// 创建新索引
            #[inline]
            pub const fn new(idx: usize) -> Self {
                Self(idx)
            }

            /// 获取索引值
            #[inline]
            pub const fn get(self) -> usize {
                self.0
            }

            /// 检查是否有效
            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != INVALID_INDEX
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", stringify!($name), self.0)
                } else {
                    write!(f, "{}(INVALID)", stringify!($name))
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}", self.0)
                } else {
                    write!(f, "INVALID")
                }
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(idx: usize) -> Self {
                Self(idx)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(idx: $name) -> usize {
                idx.0
            }
        }
    };
}

define_index! {
    /// 单元索引 - 用于索引网格单元
    CellIndex
}

define_index! {
    /// 顶点索引 - 用于索引网格顶点（节点自由度）
    VertexIndex
}

/// 创建单元索引
#[inline]
pub const fn cell(idx: usize) -> CellIndex {
    CellIndex::new(idx)
}

/// 创建顶点索引
#[inline]
pub const fn vertex(idx: usize) -> VertexIndex {
    VertexIndex::new(idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_basic() {
        let c = cell(3);
        assert_eq!(c.get(), 3);
        assert!(c.is_valid());
        assert!(!CellIndex::default().is_valid());
        assert_eq!(format!("{:?}", vertex(2)), "VertexIndex(2)");
        assert_eq!(format!("{}", CellIndex::INVALID), "INVALID");
    }

    #[test]
    fn test_index_serde() {
        let c = cell(42);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "42");
        let back: CellIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
