// crates/ct_physics/src/fields/nodal.rs

//! 节点场
//!
//! 速度、压力、温度都以顶点值存储（一阶连续拉格朗日空间），
//! 因此"顶点值"即场的自由度本身。向量场按分量分开存放，
//! 便于逐分量计算最大值。

use ct_foundation::{CtError, CtResult};
use serde::{Deserialize, Serialize};

/// 可统计自由度的场对象
pub trait DofCarrier {
    /// 场名称
    fn name(&self) -> &str;

    /// 本进程持有的自由度数
    fn local_dofs(&self) -> usize;
}

/// 标量节点场
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarField {
    name: String,
    values: Vec<f64>,
}

impl ScalarField {
    /// 创建常值场
    pub fn constant(name: impl Into<String>, n_vertices: usize, value: f64) -> Self {
        Self {
            name: name.into(),
            values: vec![value; n_vertices],
        }
    }

    /// 由顶点值创建
    pub fn from_values(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// 顶点数
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 顶点值
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 可变顶点值
    #[inline]
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// 用另一个场的值覆盖本场（保留名称，复用内存）
    pub fn assign(&mut self, other: &Self) -> CtResult<()> {
        CtError::check_size("scalar field", self.values.len(), other.values.len())?;
        self.values.copy_from_slice(&other.values);
        Ok(())
    }
}

impl DofCarrier for ScalarField {
    fn name(&self) -> &str {
        &self.name
    }

    fn local_dofs(&self) -> usize {
        self.values.len()
    }
}

/// 三分量向量节点场
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorField {
    name: String,
    components: [Vec<f64>; 3],
}

impl VectorField {
    /// 几何维数
    pub const DIM: usize = 3;

    /// 创建零场
    pub fn zeros(name: impl Into<String>, n_vertices: usize) -> Self {
        Self {
            name: name.into(),
            components: [vec![0.0; n_vertices], vec![0.0; n_vertices], vec![0.0; n_vertices]],
        }
    }

    /// 由三个分量数组创建，长度必须一致
    pub fn from_components(name: impl Into<String>, components: [Vec<f64>; 3]) -> CtResult<Self> {
        let n = components[0].len();
        CtError::check_size("velocity component y", n, components[1].len())?;
        CtError::check_size("velocity component z", n, components[2].len())?;
        Ok(Self {
            name: name.into(),
            components,
        })
    }

    /// 由逐顶点函数创建
    pub fn from_fn<F>(name: impl Into<String>, n_vertices: usize, mut f: F) -> Self
    where
        F: FnMut(usize) -> [f64; 3],
    {
        let mut field = Self::zeros(name, n_vertices);
        for v in 0..n_vertices {
            let u = f(v);
            for (i, c) in field.components.iter_mut().enumerate() {
                c[v] = u[i];
            }
        }
        field
    }

    /// 顶点数
    #[inline]
    pub fn n_vertices(&self) -> usize {
        self.components[0].len()
    }

    /// 第 `i` 个分量的顶点值
    #[inline]
    pub fn component(&self, i: usize) -> &[f64] {
        &self.components[i]
    }

    /// 第 `i` 个分量的可变顶点值
    #[inline]
    pub fn component_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.components[i]
    }

    /// 顶点 `v` 处的向量值
    #[inline]
    pub fn at(&self, v: usize) -> [f64; 3] {
        [self.components[0][v], self.components[1][v], self.components[2][v]]
    }

    /// 用另一个场的值覆盖本场
    pub fn assign(&mut self, other: &Self) -> CtResult<()> {
        CtError::check_size("vector field", self.n_vertices(), other.n_vertices())?;
        for (dst, src) in self.components.iter_mut().zip(other.components.iter()) {
            dst.copy_from_slice(src);
        }
        Ok(())
    }

    /// 取连续顶点区间作为一个分区
    pub fn slice(&self, range: std::ops::Range<usize>) -> CtResult<Self> {
        if range.start > range.end || range.end > self.n_vertices() {
            return Err(CtError::invalid_input(format!(
                "分区区间 {:?} 超出 0..{}",
                range,
                self.n_vertices()
            )));
        }
        Ok(Self {
            name: self.name.clone(),
            components: [
                self.components[0][range.clone()].to_vec(),
                self.components[1][range.clone()].to_vec(),
                self.components[2][range].to_vec(),
            ],
        })
    }
}

impl DofCarrier for VectorField {
    fn name(&self) -> &str {
        &self.name
    }

    fn local_dofs(&self) -> usize {
        Self::DIM * self.n_vertices()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_field_layout() {
        let u = VectorField::from_fn("u", 4, |v| [v as f64, 2.0 * v as f64, -1.0]);
        assert_eq!(u.n_vertices(), 4);
        assert_eq!(u.at(3), [3.0, 6.0, -1.0]);
        assert_eq!(u.component(1), &[0.0, 2.0, 4.0, 6.0]);
        assert_eq!(u.local_dofs(), 12);
    }

    #[test]
    fn test_component_length_mismatch() {
        let r = VectorField::from_components("u", [vec![0.0; 2], vec![0.0; 3], vec![0.0; 2]]);
        assert!(r.is_err());
    }

    #[test]
    fn test_assign() {
        let mut a = ScalarField::constant("p", 3, 0.0);
        let b = ScalarField::from_values("p_n", vec![1.0, 2.0, 3.0]);
        a.assign(&b).unwrap();
        assert_eq!(a.values(), b.values());
        assert_eq!(a.name(), "p");
        assert!(a.assign(&ScalarField::constant("q", 2, 0.0)).is_err());
    }

    #[test]
    fn test_slice() {
        let u = VectorField::from_fn("u", 5, |v| [v as f64; 3]);
        let part = u.slice(2..4).unwrap();
        assert_eq!(part.component(2), &[2.0, 3.0]);
        assert!(u.slice(4..6).is_err());
    }
}
