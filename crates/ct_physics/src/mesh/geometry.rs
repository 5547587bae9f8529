// crates/ct_physics/src/mesh/geometry.rs

//! 面法向查询接口
//!
//! 边界求值器通过 [`FacetGeometry`] 获取 (单元, 局部面) 的外法向，
//! 不关心网格的具体存储。局部面索引沿用有限元引擎的约定：
//! 边界面为非负值，内部实体为 `-1`。

use ct_foundation::{CellIndex, CtError, CtResult};
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// 求值点所在的单元与局部面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FacetContext {
    /// 单元索引
    pub cell: CellIndex,
    /// 局部面索引（内部实体为负）
    pub local_facet: i32,
}

impl FacetContext {
    /// 创建面上下文
    #[inline]
    pub const fn new(cell: CellIndex, local_facet: i32) -> Self {
        Self { cell, local_facet }
    }

    /// 校验为边界面并返回非负的局部面索引
    pub fn boundary_facet(&self) -> CtResult<usize> {
        if self.local_facet < 0 {
            return Err(CtError::InvalidFacet {
                cell: self.cell.get(),
                local_facet: self.local_facet,
            });
        }
        Ok(self.local_facet as usize)
    }
}

/// 面外法向提供者
pub trait FacetGeometry: Sync {
    /// 单元数量
    fn n_cells(&self) -> usize;

    /// 返回单元 `facet.cell` 第 `facet.local_facet` 个面的单位外法向
    ///
    /// 局部面索引为负或越界时返回 `InvalidFacet`。
    fn facet_normal(&self, facet: FacetContext) -> CtResult<DVec3>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ct_foundation::index::cell;

    #[test]
    fn test_boundary_facet_check() {
        assert_eq!(FacetContext::new(cell(0), 2).boundary_facet().unwrap(), 2);
        let err = FacetContext::new(cell(5), -1).boundary_facet().unwrap_err();
        assert!(matches!(err, CtError::InvalidFacet { cell: 5, local_facet: -1 }));
    }
}
