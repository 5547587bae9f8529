// crates/ct_physics/src/numerics/nullspace.rs

//! 压力算子的常数零空间
//!
//! 纯 Neumann 压力方程的算子奇异，压力只确定到一个常数。
//! 在交给 Krylov 求解器前，为算子附加一维零空间基：
//!
//! 1. 构造与参考向量同形的向量，压力自由度置 1，其余置 0
//! 2. 以全局 ℓ2 范数归一化（范数需跨进程求和）
//! 3. 以 `Arc` 形式挂到算子上，算子与调用方共同持有
//!
//! 求解前用 [`PressureOperator::project_rhs`] 去掉右端项的零空间分量。

use std::sync::Arc;

use ct_foundation::{CtError, CtResult};
use ct_runtime::Collective;

use super::csr::CsrMatrix;
use super::vector_ops::{axpy, dot, norm2_squared, scale};

/// 子空间自由度映射：给出本进程向量中属于该子空间的位置
pub trait DofMap {
    /// 本进程持有的自由度在向量中的位置
    fn owned_dofs(&self) -> &[usize];
}

/// 显式列出的子空间自由度
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubspaceDofs {
    indices: Vec<usize>,
}

impl SubspaceDofs {
    /// 由位置列表创建
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    /// 连续区间 `range`
    pub fn contiguous(range: std::ops::Range<usize>) -> Self {
        Self {
            indices: range.collect(),
        }
    }

    /// 混合空间中按 `stride` 交错存放的第 `component` 个分量
    pub fn interleaved(n_nodes: usize, stride: usize, component: usize) -> Self {
        Self {
            indices: (0..n_nodes).map(|i| i * stride + component).collect(),
        }
    }
}

impl DofMap for SubspaceDofs {
    fn owned_dofs(&self) -> &[usize] {
        &self.indices
    }
}

/// 零空间正交基
#[derive(Debug, Clone)]
pub struct NullSpaceBasis {
    vectors: Vec<Vec<f64>>,
}

impl NullSpaceBasis {
    /// 基向量个数
    #[inline]
    pub fn dim(&self) -> usize {
        self.vectors.len()
    }

    /// 第 `i` 个基向量（本进程部分）
    #[inline]
    pub fn vector(&self, i: usize) -> &[f64] {
        &self.vectors[i]
    }

    /// 向量长度（本进程部分）
    pub fn local_len(&self) -> usize {
        self.vectors.first().map_or(0, |v| v.len())
    }

    /// 去掉 `x` 在零空间上的分量：x ← x − Σ (x·v) v
    pub fn orthogonalize(&self, x: &mut [f64], comm: &dyn Collective) -> CtResult<()> {
        CtError::check_size("nullspace target", self.local_len(), x.len())?;
        for v in &self.vectors {
            let alpha = comm.sum_f64(dot(x, v));
            axpy(-alpha, v, x);
        }
        Ok(())
    }

    /// 检查基向量是否全局正交归一
    pub fn is_orthonormal(&self, comm: &dyn Collective, tol: f64) -> bool {
        for (i, vi) in self.vectors.iter().enumerate() {
            for (j, vj) in self.vectors.iter().enumerate().skip(i) {
                let g = comm.sum_f64(dot(vi, vj));
                let expected = if i == j { 1.0 } else { 0.0 };
                if (g - expected).abs() > tol {
                    return false;
                }
            }
        }
        true
    }
}

/// 附带零空间的压力算子
#[derive(Debug, Clone)]
pub struct PressureOperator {
    matrix: CsrMatrix,
    null_space: Option<Arc<NullSpaceBasis>>,
}

impl PressureOperator {
    /// 包装已组装的方阵
    pub fn new(matrix: CsrMatrix) -> CtResult<Self> {
        if !matrix.is_square() {
            return Err(CtError::invalid_input(format!(
                "压力算子必须为方阵, 实际为 {}x{}",
                matrix.n_rows(),
                matrix.n_cols()
            )));
        }
        Ok(Self {
            matrix,
            null_space: None,
        })
    }

    /// 底层矩阵
    #[inline]
    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }

    /// 已附加的零空间
    #[inline]
    pub fn null_space(&self) -> Option<&Arc<NullSpaceBasis>> {
        self.null_space.as_ref()
    }

    /// 附加零空间，算子与调用方共同持有
    pub fn set_null_space(&mut self, basis: Arc<NullSpaceBasis>) -> CtResult<()> {
        CtError::check_size("nullspace basis", self.matrix.n_rows(), basis.local_len())?;
        self.null_space = Some(basis);
        Ok(())
    }

    /// y = A x
    pub fn apply(&self, x: &[f64], y: &mut [f64]) -> CtResult<()> {
        self.matrix.mul_vec(x, y)
    }

    /// 若附加了零空间，则把右端项投影到其正交补上；返回是否做了投影
    pub fn project_rhs(&self, rhs: &mut [f64], comm: &dyn Collective) -> CtResult<bool> {
        match &self.null_space {
            Some(basis) => {
                basis.orthogonalize(rhs, comm)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// 构建常数压力零空间并附加到算子
///
/// `reference` 决定向量形状（通常是求解变量的本进程部分），
/// `pressure_dofs` 给出其中属于压力空间的位置。
pub fn attach_nullspace<D>(
    operator: &mut PressureOperator,
    reference: &[f64],
    pressure_dofs: &D,
    comm: &dyn Collective,
) -> CtResult<Arc<NullSpaceBasis>>
where
    D: DofMap + ?Sized,
{
    let mut null_vec = vec![0.0; reference.len()];
    for &dof in pressure_dofs.owned_dofs() {
        let slot = null_vec.get_mut(dof).ok_or_else(|| {
            CtError::invalid_input(format!(
                "压力自由度 {} 超出参考向量长度 {}",
                dof,
                reference.len()
            ))
        })?;
        *slot = 1.0;
    }

    // 全局范数：所有进程都必须参与这次归约
    let norm = comm.sum_f64(norm2_squared(&null_vec)).sqrt();
    if !(norm > f64::EPSILON) {
        return Err(CtError::DegenerateNullVector { norm });
    }
    scale(1.0 / norm, &mut null_vec);

    let basis = Arc::new(NullSpaceBasis {
        vectors: vec![null_vec],
    });
    operator.set_null_space(Arc::clone(&basis))?;
    tracing::debug!(
        "压力零空间已附加: 本地长度 {}, 全局范数 {:.6e}",
        reference.len(),
        norm
    );
    Ok(basis)
}
