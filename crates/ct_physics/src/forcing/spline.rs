// crates/ct_physics/src/forcing/spline.rs

//! B 样条表示与求值
//!
//! 样条由 (节点向量 t, 系数 c, 阶数 k) 三元组描述，与常见的 tck 表示一致：
//! 节点数为 n 时使用前 n-k-1 个系数，定义域为 `[t[k], t[n-k-1]]`。
//!
//! - [`BSpline::evaluate`]: Cox–de Boor 基函数求值，不做任何外推
//! - [`BSpline::interpolate`]: 由离散采样构造插值样条（奇数阶，not-a-knot 型节点），
//!   配置方程组用 nalgebra 的 LU 分解求解
//!
//! 定义域之外的求值返回 [`CtError::OutOfDomain`]。

use ct_foundation::{CtError, CtResult};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// 支持的最高阶数
pub const MAX_DEGREE: usize = 5;

/// B 样条曲线（只读）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SplineRepr", into = "SplineRepr")]
pub struct BSpline {
    knots: Vec<f64>,
    coeffs: Vec<f64>,
    degree: usize,
}

/// 序列化形式，反序列化时经过 [`BSpline::new`] 校验
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SplineRepr {
    knots: Vec<f64>,
    coeffs: Vec<f64>,
    degree: usize,
}

impl TryFrom<SplineRepr> for BSpline {
    type Error = CtError;

    fn try_from(repr: SplineRepr) -> CtResult<Self> {
        BSpline::new(repr.knots, repr.coeffs, repr.degree)
    }
}

impl From<BSpline> for SplineRepr {
    fn from(s: BSpline) -> Self {
        Self {
            knots: s.knots,
            coeffs: s.coeffs,
            degree: s.degree,
        }
    }
}

impl BSpline {
    /// 由 tck 三元组创建
    ///
    /// # 约束
    ///
    /// - `1 <= degree <= MAX_DEGREE`
    /// - 节点有限且单调不减，数量至少 `2(k+1)`
    /// - 系数数量至少 `n - k - 1`（多余系数被忽略）
    /// - 定义域非空
    pub fn new(knots: Vec<f64>, coeffs: Vec<f64>, degree: usize) -> CtResult<Self> {
        if degree == 0 || degree > MAX_DEGREE {
            return Err(CtError::invalid_input(format!(
                "样条阶数必须在 1..={} 之间, 实际为 {}",
                MAX_DEGREE, degree
            )));
        }
        let n = knots.len();
        if n < 2 * (degree + 1) {
            return Err(CtError::invalid_input(format!(
                "{} 阶样条至少需要 {} 个节点, 实际为 {}",
                degree,
                2 * (degree + 1),
                n
            )));
        }
        if knots.iter().any(|t| !t.is_finite()) {
            return Err(CtError::invalid_input("节点向量包含非有限值"));
        }
        if knots.windows(2).any(|w| w[1] < w[0]) {
            return Err(CtError::invalid_input("节点向量必须单调不减"));
        }
        let n_coeffs = n - degree - 1;
        if coeffs.len() < n_coeffs {
            return Err(CtError::SizeMismatch {
                name: "spline coeffs",
                expected: n_coeffs,
                actual: coeffs.len(),
            });
        }
        if !(knots[degree] < knots[n - degree - 1]) {
            return Err(CtError::invalid_input("样条定义域为空"));
        }

        let mut coeffs = coeffs;
        coeffs.truncate(n_coeffs);
        Ok(Self {
            knots,
            coeffs,
            degree,
        })
    }

    /// 由离散采样构造插值样条
    ///
    /// 端点节点重复 `k+1` 次，内部节点取 `xs[(k+1)/2 .. n-(k+1)/2]`，
    /// 曲线精确通过每个采样点。仅支持奇数阶。
    pub fn interpolate(xs: &[f64], ys: &[f64], degree: usize) -> CtResult<Self> {
        CtError::check_size("waveform samples", xs.len(), ys.len())?;
        if degree == 0 || degree > MAX_DEGREE || degree % 2 == 0 {
            return Err(CtError::invalid_input(format!(
                "插值样条阶数必须为不超过 {} 的奇数, 实际为 {}",
                MAX_DEGREE, degree
            )));
        }
        let n = xs.len();
        if n < degree + 1 {
            return Err(CtError::invalid_input(format!(
                "{} 阶插值至少需要 {} 个采样点, 实际为 {}",
                degree,
                degree + 1,
                n
            )));
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(CtError::invalid_input("采样数据包含非有限值"));
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CtError::invalid_input("采样时间必须严格单调递增"));
        }

        let half = (degree + 1) / 2;
        let mut knots = Vec::with_capacity(n + degree + 1);
        knots.extend(std::iter::repeat(xs[0]).take(degree + 1));
        knots.extend_from_slice(&xs[half..n - half]);
        knots.extend(std::iter::repeat(xs[n - 1]).take(degree + 1));

        // 先用零系数搭好节点结构，再求配置系统
        let mut spline = Self::new(knots, vec![0.0; n], degree)?;

        let mut colloc = DMatrix::<f64>::zeros(n, n);
        for (row, &x) in xs.iter().enumerate() {
            let span = spline.find_span(x);
            let basis = spline.basis_functions(span, x);
            for (r, b) in basis.iter().enumerate() {
                colloc[(row, span - degree + r)] = *b;
            }
        }
        let rhs = DVector::from_column_slice(ys);
        let coeffs = colloc
            .lu()
            .solve(&rhs)
            .ok_or_else(|| CtError::numerical("样条配置矩阵奇异"))?;
        spline.coeffs = coeffs.iter().copied().collect();
        Ok(spline)
    }

    /// 阶数
    #[inline]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// 节点向量
    #[inline]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// 有效系数
    #[inline]
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// 定义域 `[t[k], t[n-k-1]]`
    #[inline]
    pub fn domain(&self) -> (f64, f64) {
        let n = self.knots.len();
        (self.knots[self.degree], self.knots[n - self.degree - 1])
    }

    /// 是否在定义域内
    #[inline]
    pub fn contains(&self, x: f64) -> bool {
        let (lo, hi) = self.domain();
        x >= lo && x <= hi
    }

    /// 在 `x` 处求值
    pub fn evaluate(&self, x: f64) -> CtResult<f64> {
        let (lower, upper) = self.domain();
        if !self.contains(x) {
            return Err(CtError::OutOfDomain {
                value: x,
                lower,
                upper,
            });
        }

        let span = self.find_span(x);
        let basis = self.basis_functions(span, x);
        let first = span - self.degree;
        Ok(basis
            .iter()
            .enumerate()
            .map(|(r, b)| b * self.coeffs[first + r])
            .sum())
    }

    /// 查找满足 `t[l] <= x < t[l+1]` 的节点区间
    ///
    /// 右端点归入最后一个非空区间。调用方保证 `x` 在定义域内。
    fn find_span(&self, x: f64) -> usize {
        let n = self.knots.len();
        let last = n - self.degree - 2;
        let idx = self.knots.partition_point(|&t| t <= x);
        idx.saturating_sub(1).clamp(self.degree, last)
    }

    /// 计算区间 `span` 上非零的 k+1 个基函数值
    fn basis_functions(&self, span: usize, x: f64) -> Vec<f64> {
        let k = self.degree;
        let t = &self.knots;
        let mut values = vec![0.0; k + 1];
        let mut left = vec![0.0; k + 1];
        let mut right = vec![0.0; k + 1];

        values[0] = 1.0;
        for j in 1..=k {
            left[j] = x - t[span + 1 - j];
            right[j] = t[span + j] - x;
            let mut saved = 0.0;
            for r in 0..j {
                let denom = right[r + 1] + left[j - r];
                let temp = if denom == 0.0 { 0.0 } else { values[r] / denom };
                values[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            values[j] = saved;
        }
        values
    }
}
