// crates/ct_physics/src/forcing/waveform.rs

//! 周期波形采样器
//!
//! 同一条样条在每个周期重复使用：样条参数为
//!
//! $$ x = t \cdot T_{sc} - n_m \cdot P \cdot T_{sc} $$
//!
//! 其中 $n_m$ 为已完成的周期数，$P$ 为周期长度。采样器不做截断，
//! 调用方需保证 `x` 位于样条定义域内，否则返回 `OutOfDomain`。
//!
//! 样条只读且通过 `Arc` 共享，采样器可在多个线程中并发使用。

use std::sync::Arc;

use ct_foundation::{CtError, CtResult};

use super::spline::BSpline;
use crate::engine::clock::ClockSnapshot;

/// 波形采样器
#[derive(Debug, Clone)]
pub struct WaveformSampler {
    spline: Arc<BSpline>,
    /// 时间缩放 Tsc
    time_scale: f64,
    /// 周期长度（0 表示非周期信号）
    period: f64,
}

impl WaveformSampler {
    /// 创建周期采样器
    pub fn new(spline: Arc<BSpline>, time_scale: f64, period: f64) -> CtResult<Self> {
        if !(time_scale.is_finite() && time_scale > 0.0) {
            return Err(CtError::invalid_input(format!(
                "时间缩放必须为正有限值, 实际为 {}",
                time_scale
            )));
        }
        if !(period.is_finite() && period >= 0.0) {
            return Err(CtError::invalid_input(format!(
                "周期必须为非负有限值, 实际为 {}",
                period
            )));
        }
        Ok(Self {
            spline,
            time_scale,
            period,
        })
    }

    /// 创建非周期采样器（周期偏移恒为零）
    pub fn aperiodic(spline: Arc<BSpline>, time_scale: f64) -> CtResult<Self> {
        Self::new(spline, time_scale, 0.0)
    }

    /// 底层样条
    #[inline]
    pub fn spline(&self) -> &Arc<BSpline> {
        &self.spline
    }

    /// 时间缩放
    #[inline]
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// 周期长度
    #[inline]
    pub fn period(&self) -> f64 {
        self.period
    }

    /// 计算样条参数 `t·Tsc − nm·P·Tsc`
    #[inline]
    pub fn spline_argument(&self, clock: ClockSnapshot) -> f64 {
        clock.time * self.time_scale - clock.cycle as f64 * self.period * self.time_scale
    }

    /// 按周期偏移采样
    pub fn sample(&self, clock: ClockSnapshot) -> CtResult<f64> {
        self.spline.evaluate(self.spline_argument(clock))
    }

    /// 忽略周期偏移采样（参数仅按 Tsc 缩放）
    pub fn sample_aperiodic(&self, time: f64) -> CtResult<f64> {
        self.spline.evaluate(time * self.time_scale)
    }

    /// 第 `cycle` 个周期内可合法采样的物理时间区间
    pub fn valid_time_range(&self, cycle: u64) -> (f64, f64) {
        let (lo, hi) = self.spline.domain();
        let offset = cycle as f64 * self.period;
        (lo / self.time_scale + offset, hi / self.time_scale + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_like() -> Arc<BSpline> {
        Arc::new(BSpline::interpolate(&[0.0, 1.0, 2.0, 3.0], &[0.0, 10.0, 0.0, 10.0], 3).unwrap())
    }

    #[test]
    fn test_sample_at_knot() {
        let sampler = WaveformSampler::new(square_like(), 1.0, 3.0).unwrap();
        let v = sampler.sample(ClockSnapshot::new(1.0, 0)).unwrap();
        assert!((v - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_periodicity() {
        let spline = square_like();
        for &tsc in &[1.0, 0.5, 2.0] {
            let period = 3.0 / tsc;
            let sampler = WaveformSampler::new(Arc::clone(&spline), tsc, period).unwrap();
            for k in 0..4u64 {
                for &t in &[0.2, 0.9, 1.1] {
                    let base = sampler.sample(ClockSnapshot::new(t, 0)).unwrap();
                    let shifted = sampler
                        .sample(ClockSnapshot::new(t + k as f64 * period, k))
                        .unwrap();
                    assert!((base - shifted).abs() < 1e-9, "tsc={} k={} t={}", tsc, k, t);
                }
            }
        }
    }

    #[test]
    fn test_stale_cycle_is_out_of_domain() {
        let sampler = WaveformSampler::new(square_like(), 1.0, 3.0).unwrap();
        // 进入第二个周期却未更新周期计数
        let err = sampler.sample(ClockSnapshot::new(4.0, 0)).unwrap_err();
        assert!(matches!(err, CtError::OutOfDomain { .. }));
    }

    #[test]
    fn test_aperiodic() {
        let sampler = WaveformSampler::aperiodic(square_like(), 0.5).unwrap();
        let v = sampler.sample_aperiodic(2.0).unwrap();
        assert!((v - 10.0).abs() < 1e-10);
        // 周期为零时周期计数不起作用
        let w = sampler.sample(ClockSnapshot::new(2.0, 7)).unwrap();
        assert!((v - w).abs() < 1e-12);
    }

    #[test]
    fn test_valid_time_range() {
        let sampler = WaveformSampler::new(square_like(), 2.0, 1.5).unwrap();
        let (lo, hi) = sampler.valid_time_range(2);
        assert!((lo - 3.0).abs() < 1e-12);
        assert!((hi - 4.5).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_scales() {
        assert!(WaveformSampler::new(square_like(), 0.0, 1.0).is_err());
        assert!(WaveformSampler::new(square_like(), 1.0, -1.0).is_err());
        assert!(WaveformSampler::new(square_like(), f64::NAN, 1.0).is_err());
    }
}
