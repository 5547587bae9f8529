// crates/ct_physics/src/engine/stability.rs

//! 稳定性监控
//!
//! 由速度场和顶点特征长度 h 估计全局 Courant 数分母和流动尺度：
//!
//! $$ C = \sum_{i} \max_v \frac{|u_i(v)|}{h(v)}, \qquad
//!    F = \max_v |\mathbf{u}(v)| \, h(v) $$
//!
//! Courant 估计按分量**求和**各分量最大值（分量间的 L1 上界，而非向量范数），
//! 偏保守。求和在本进程内完成，随后 `[C, F]` 两个本地标量做一次全局
//! **最大值**归约（从不求和）。
//!
//! 多进程时各分量的最大值可能落在不同进程上，此时全局 C 是各进程本地
//! 求和后的最大值，可能小于把整个场放在一个进程上算出的值；F 与分区无关。

use ct_foundation::{CtError, CtResult};
use ct_runtime::Collective;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::fields::nodal::VectorField;
use crate::mesh::length_scale::VertexLengthScale;

/// 单步稳定性统计（全局归约后）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StabilityStats {
    /// Courant 数分母：Σ_i max |u_i|/h
    pub max_courant: f64,
    /// 流动尺度：max |u|·h
    pub max_flow_scale: f64,
}

/// 稳定性监控器
#[derive(Debug, Clone)]
pub struct StabilityMonitor {
    /// 低于此顶点数时串行计算
    min_parallel_size: usize,
}

impl Default for StabilityMonitor {
    fn default() -> Self {
        Self {
            min_parallel_size: 4096,
        }
    }
}

/// NaN 不会被 f64::max 丢弃
#[inline]
fn max_propagating_nan(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

impl StabilityMonitor {
    /// 创建监控器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置并行阈值
    pub fn with_min_parallel_size(mut self, n: usize) -> Self {
        self.min_parallel_size = n;
        self
    }

    /// 本进程的各分量最大值 `max |u_i|/h` 与流动尺度，空分区全为 0
    pub fn local_maxima(
        &self,
        velocity: &VectorField,
        h: &VertexLengthScale,
    ) -> CtResult<[f64; 4]> {
        let n = velocity.n_vertices();
        CtError::check_size("vertex length scale", n, h.len())?;
        let h = h.as_slice();
        let parallel = n >= self.min_parallel_size;

        let mut maxima = [0.0; 4];
        for (i, slot) in maxima.iter_mut().take(VectorField::DIM).enumerate() {
            let ui = velocity.component(i);
            *slot = if parallel {
                ui.par_iter()
                    .zip(h.par_iter())
                    .map(|(u, h)| u.abs() / h)
                    .reduce(|| 0.0, max_propagating_nan)
            } else {
                ui.iter()
                    .zip(h.iter())
                    .map(|(u, h)| u.abs() / h)
                    .fold(0.0, max_propagating_nan)
            };
        }

        let flow_at = |v: usize| {
            let [x, y, z] = velocity.at(v);
            (x * x + y * y + z * z).sqrt() * h[v]
        };
        maxima[3] = if parallel {
            (0..n)
                .into_par_iter()
                .map(flow_at)
                .reduce(|| 0.0, max_propagating_nan)
        } else {
            (0..n).map(flow_at).fold(0.0, max_propagating_nan)
        };

        Ok(maxima)
    }

    /// 本进程的 (Courant 分母, 流动尺度)
    pub fn local_estimates(
        &self,
        velocity: &VectorField,
        h: &VertexLengthScale,
    ) -> CtResult<(f64, f64)> {
        let [cx, cy, cz, flow] = self.local_maxima(velocity, h)?;
        Ok((cx + cy + cz, flow))
    }

    /// 计算全局稳定性统计
    ///
    /// 本地出现非有限值时以 +∞ 参与归约，使所有进程一致地返回错误，
    /// 而不是部分进程提前退出导致集合操作死锁。
    pub fn compute(
        &self,
        velocity: &VectorField,
        h: &VertexLengthScale,
        comm: &dyn Collective,
    ) -> CtResult<StabilityStats> {
        let (courant, flow) = self.local_estimates(velocity, h)?;
        let mut local = [courant, flow];
        for v in local.iter_mut() {
            if !v.is_finite() {
                *v = f64::INFINITY;
            }
        }
        comm.max_f64_slice(&mut local);

        let [max_courant, max_flow_scale] = local;
        if !(max_courant.is_finite() && max_flow_scale.is_finite()) {
            return Err(CtError::numerical(format!(
                "速度场包含非有限值 (rank {}): C={}, F={}",
                comm.rank(),
                max_courant,
                max_flow_scale
            )));
        }

        Ok(StabilityStats {
            max_courant,
            max_flow_scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ct_runtime::SerialComm;

    #[test]
    fn test_components_are_summed() {
        // 每个分量的最大值出现在不同顶点
        let u = VectorField::from_components(
            "u",
            [vec![2.0, 0.0, 0.0], vec![0.0, -3.0, 0.0], vec![0.0, 0.0, 1.0]],
        )
        .unwrap();
        let h = VertexLengthScale::new(vec![1.0, 1.0, 0.5]).unwrap();
        let stats = StabilityMonitor::new().compute(&u, &h, &SerialComm).unwrap();

        // 2/1 + 3/1 + 1/0.5
        assert!((stats.max_courant - 7.0).abs() < 1e-12);
        // max(2*1, 3*1, 1*0.5)
        assert!((stats.max_flow_scale - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_flow_scale_uses_magnitude() {
        let u = VectorField::from_fn("u", 2, |v| if v == 0 { [3.0, 4.0, 0.0] } else { [1.0, 0.0, 0.0] });
        let h = VertexLengthScale::new(vec![0.1, 10.0]).unwrap();
        let stats = StabilityMonitor::new().compute(&u, &h, &SerialComm).unwrap();
        assert!((stats.max_flow_scale - 10.0).abs() < 1e-12);
        assert!((stats.max_courant - (30.0 + 40.0)).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let n = 5000;
        let u = VectorField::from_fn("u", n, |v| {
            let x = v as f64 * 0.001;
            [x.sin(), (2.0 * x).cos(), x * 0.1]
        });
        let h = VertexLengthScale::new((0..n).map(|v| 0.01 + (v % 7) as f64 * 0.001).collect())
            .unwrap();
        let serial = StabilityMonitor::new()
            .with_min_parallel_size(usize::MAX)
            .local_estimates(&u, &h)
            .unwrap();
        let parallel = StabilityMonitor::new()
            .with_min_parallel_size(1)
            .local_estimates(&u, &h)
            .unwrap();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_empty_partition() {
        let u = VectorField::zeros("u", 0);
        let h = VertexLengthScale::new(Vec::new()).unwrap();
        let stats = StabilityMonitor::new().compute(&u, &h, &SerialComm).unwrap();
        assert_eq!(stats, StabilityStats::default());
    }

    #[test]
    fn test_size_mismatch() {
        let u = VectorField::zeros("u", 3);
        let h = VertexLengthScale::new(vec![1.0; 2]).unwrap();
        assert!(StabilityMonitor::new().compute(&u, &h, &SerialComm).is_err());
    }

    #[test]
    fn test_non_finite_velocity() {
        let u = VectorField::from_fn("u", 2, |v| if v == 1 { [f64::NAN, 0.0, 0.0] } else { [1.0; 3] });
        let h = VertexLengthScale::new(vec![1.0; 2]).unwrap();
        let err = StabilityMonitor::new().compute(&u, &h, &SerialComm).unwrap_err();
        assert!(matches!(err, CtError::Numerical { .. }));
    }
}
