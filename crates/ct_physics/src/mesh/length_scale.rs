// crates/ct_physics/src/mesh/length_scale.rs

//! 顶点特征长度
//!
//! 稳定性估计中 `|u_i| / h` 的分母。构造时保证每个值为正有限数，
//! 因此后续计算无需再检查除零。

use ct_foundation::{CtError, CtResult};

/// 每个顶点的特征网格长度 h
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLengthScale {
    values: Vec<f64>,
}

impl VertexLengthScale {
    /// 从顶点值创建，拒绝非正或非有限值
    pub fn new(values: Vec<f64>) -> CtResult<Self> {
        if let Some((i, h)) = values
            .iter()
            .enumerate()
            .find(|(_, h)| !(h.is_finite() && **h > 0.0))
        {
            return Err(CtError::invalid_input(format!(
                "顶点 {} 的特征长度必须为正有限值, 实际为 {}",
                i, h
            )));
        }
        Ok(Self { values })
    }

    /// 顶点数
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空（空分区）
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 顶点值切片
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// 最小特征长度
    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    /// 取连续顶点区间作为一个分区
    pub fn slice(&self, range: std::ops::Range<usize>) -> CtResult<Self> {
        if range.end > self.values.len() || range.start > range.end {
            return Err(CtError::invalid_input(format!(
                "分区区间 {:?} 超出 0..{}",
                range,
                self.values.len()
            )));
        }
        Ok(Self {
            values: self.values[range].to_vec(),
        })
    }
}
