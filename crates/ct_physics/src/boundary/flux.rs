// crates/ct_physics/src/boundary/flux.rs

//! 边界通量求值器
//!
//! 三种求值器组成封闭集合：
//!
//! | 变体 | 形状 | 值 |
//! |------|------|----|
//! | `Inflow` | 3 维向量 | $-\mathbf{n} \cdot s(t) / A / V_{sc}$ |
//! | `Outflow` | 标量 | $s(t) \cdot 133.322 / (1060 V_{sc}^2)$ |
//! | `BalloonTemperature` | 标量 | $s(t \cdot T_{sc})$（无周期偏移） |
//!
//! 其中 $s$ 为波形采样值，$\mathbf{n}$ 为面外法向。
//!
//! 求值只读取样条、几何和时间快照，可在单元之间完全并行；
//! [`BoundaryFlux::eval_facets`] 使用 rayon 批量求值。

use ct_foundation::{CtError, CtResult};
use glam::DVec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::clock::ClockSnapshot;
use crate::forcing::waveform::WaveformSampler;
use crate::mesh::geometry::{FacetContext, FacetGeometry};

/// mmHg → Pa 换算系数
pub const MMHG_TO_PA: f64 = 133.322;

/// 血液密度 [kg/m³]
pub const BLOOD_DENSITY: f64 = 1060.0;

/// 求值结果的形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// 三分量向量
    Vector3,
    /// 标量
    Scalar,
}

impl ValueShape {
    /// 分量数
    #[inline]
    pub fn n_components(self) -> usize {
        match self {
            Self::Vector3 => 3,
            Self::Scalar => 1,
        }
    }
}

/// 单点求值结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FluxValue {
    /// 向量值
    Vector(DVec3),
    /// 标量值
    Scalar(f64),
}

impl FluxValue {
    /// 结果形状
    #[inline]
    pub fn shape(&self) -> ValueShape {
        match self {
            Self::Vector(_) => ValueShape::Vector3,
            Self::Scalar(_) => ValueShape::Scalar,
        }
    }

    /// 向量值（标量返回 None）
    #[inline]
    pub fn as_vector(&self) -> Option<DVec3> {
        match self {
            Self::Vector(v) => Some(*v),
            Self::Scalar(_) => None,
        }
    }

    /// 标量值（向量返回 None）
    #[inline]
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(s) => Some(*s),
            Self::Vector(_) => None,
        }
    }

    /// 幅值
    #[inline]
    pub fn magnitude(&self) -> f64 {
        match self {
            Self::Vector(v) => v.length(),
            Self::Scalar(s) => s.abs(),
        }
    }

    /// 写入组装器提供的输出缓冲区
    pub fn write_to(&self, out: &mut [f64]) -> CtResult<()> {
        CtError::check_size("boundary values", self.shape().n_components(), out.len())?;
        match self {
            Self::Vector(v) => out.copy_from_slice(&v.to_array()),
            Self::Scalar(s) => out[0] = *s,
        }
        Ok(())
    }
}

/// 边界通量求值器
#[derive(Debug, Clone)]
pub enum BoundaryFlux {
    /// 入口速度：沿内法向，幅值由流量波形除以截面积得到
    Inflow {
        /// 流量波形
        sampler: WaveformSampler,
        /// 入口截面积
        area: f64,
        /// 速度归一化尺度 Vsc
        velocity_scale: f64,
    },
    /// 出口压力：mmHg 波形换算为无量纲压力
    Outflow {
        /// 压力波形 [mmHg]
        sampler: WaveformSampler,
        /// 速度归一化尺度 Vsc
        velocity_scale: f64,
    },
    /// 球囊温度：非周期温度曲线
    BalloonTemperature {
        /// 温度波形
        sampler: WaveformSampler,
    },
}

fn positive(name: &str, value: f64) -> CtResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CtError::invalid_input(format!("{} 必须为正有限值, 实际为 {}", name, value)))
    }
}

impl BoundaryFlux {
    /// 创建入口求值器
    pub fn inflow(sampler: WaveformSampler, area: f64, velocity_scale: f64) -> CtResult<Self> {
        Ok(Self::Inflow {
            sampler,
            area: positive("入口面积", area)?,
            velocity_scale: positive("速度尺度", velocity_scale)?,
        })
    }

    /// 创建出口求值器
    pub fn outflow(sampler: WaveformSampler, velocity_scale: f64) -> CtResult<Self> {
        Ok(Self::Outflow {
            sampler,
            velocity_scale: positive("速度尺度", velocity_scale)?,
        })
    }

    /// 创建球囊温度求值器
    pub fn balloon_temperature(sampler: WaveformSampler) -> Self {
        Self::BalloonTemperature { sampler }
    }

    /// 声明的输出形状
    #[inline]
    pub fn value_shape(&self) -> ValueShape {
        match self {
            Self::Inflow { .. } => ValueShape::Vector3,
            Self::Outflow { .. } | Self::BalloonTemperature { .. } => ValueShape::Scalar,
        }
    }

    /// 变体名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Inflow { .. } => "inflow",
            Self::Outflow { .. } => "outflow",
            Self::BalloonTemperature { .. } => "balloon_temperature",
        }
    }

    /// 波形采样器
    pub fn sampler(&self) -> &WaveformSampler {
        match self {
            Self::Inflow { sampler, .. }
            | Self::Outflow { sampler, .. }
            | Self::BalloonTemperature { sampler } => sampler,
        }
    }

    /// 在边界面 `facet` 上求值
    ///
    /// 所有变体都要求 `facet` 为边界面；只有 `Inflow` 查询法向。
    pub fn eval<G>(&self, geometry: &G, facet: FacetContext, clock: ClockSnapshot) -> CtResult<FluxValue>
    where
        G: FacetGeometry + ?Sized,
    {
        facet.boundary_facet()?;

        match self {
            Self::Inflow {
                sampler,
                area,
                velocity_scale,
            } => {
                let n = geometry.facet_normal(facet)?;
                let val = sampler.sample(clock)? / area / velocity_scale;
                Ok(FluxValue::Vector(-n * val))
            }
            Self::Outflow {
                sampler,
                velocity_scale,
            } => {
                let s = sampler.sample(clock)?;
                Ok(FluxValue::Scalar(
                    s * MMHG_TO_PA / (BLOOD_DENSITY * velocity_scale * velocity_scale),
                ))
            }
            Self::BalloonTemperature { sampler } => {
                Ok(FluxValue::Scalar(sampler.sample_aperiodic(clock.time)?))
            }
        }
    }

    /// 批量并行求值，任一面出错即返回该错误
    pub fn eval_facets<G>(
        &self,
        geometry: &G,
        facets: &[FacetContext],
        clock: ClockSnapshot,
    ) -> CtResult<Vec<FluxValue>>
    where
        G: FacetGeometry + ?Sized,
    {
        facets
            .par_iter()
            .map(|&facet| self.eval(geometry, facet, clock))
            .collect()
    }
}

/// 一个算例使用的三类边界求值器
#[derive(Debug, Clone)]
pub struct BoundaryFluxSet {
    /// 入口速度
    pub inflow: BoundaryFlux,
    /// 出口压力
    pub outflow: BoundaryFlux,
    /// 球囊温度
    pub balloon: BoundaryFlux,
}

impl BoundaryFluxSet {
    /// 依次遍历
    pub fn iter(&self) -> impl Iterator<Item = &BoundaryFlux> {
        [&self.inflow, &self.outflow, &self.balloon].into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forcing::spline::BSpline;
    use ct_foundation::index::cell;
    use std::sync::Arc;

    /// 所有面法向都为 +x 的测试几何
    struct UniformNormal(DVec3);

    impl FacetGeometry for UniformNormal {
        fn n_cells(&self) -> usize {
            1
        }

        fn facet_normal(&self, facet: FacetContext) -> CtResult<DVec3> {
            facet.boundary_facet()?;
            Ok(self.0)
        }
    }

    fn sampler(tsc: f64, period: f64) -> WaveformSampler {
        let spline =
            BSpline::interpolate(&[0.0, 1.0, 2.0, 3.0], &[0.0, 10.0, 0.0, 10.0], 3).unwrap();
        WaveformSampler::new(Arc::new(spline), tsc, period).unwrap()
    }

    #[test]
    fn test_inflow_scenario() {
        let flux = BoundaryFlux::inflow(sampler(1.0, 3.0), 2.0, 5.0).unwrap();
        let geom = UniformNormal(DVec3::X);
        let v = flux
            .eval(&geom, FacetContext::new(cell(0), 0), ClockSnapshot::new(1.0, 0))
            .unwrap();
        let v = v.as_vector().unwrap();
        assert!((v - DVec3::new(-1.0, 0.0, 0.0)).length() < 1e-10);
        assert_eq!(flux.value_shape(), ValueShape::Vector3);
    }

    #[test]
    fn test_outflow_conversion() {
        let flux = BoundaryFlux::outflow(sampler(1.0, 3.0), 0.5).unwrap();
        let geom = UniformNormal(DVec3::Z);
        let v = flux
            .eval(&geom, FacetContext::new(cell(0), 1), ClockSnapshot::new(1.0, 0))
            .unwrap()
            .as_scalar()
            .unwrap();
        let expected = 10.0 * 133.322 / (1060.0 * 0.25);
        assert!((v - expected).abs() < 1e-9);
    }

    #[test]
    fn test_balloon_ignores_cycle() {
        let flux = BoundaryFlux::balloon_temperature(sampler(0.5, 3.0));
        let geom = UniformNormal(DVec3::Y);
        let facet = FacetContext::new(cell(0), 2);
        let a = flux.eval(&geom, facet, ClockSnapshot::new(2.0, 0)).unwrap();
        let b = flux.eval(&geom, facet, ClockSnapshot::new(2.0, 5)).unwrap();
        assert_eq!(a, b);
        assert!((a.as_scalar().unwrap() - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_interior_entity_rejected() {
        let geom = UniformNormal(DVec3::X);
        let interior = FacetContext::new(cell(3), -1);
        for flux in [
            BoundaryFlux::inflow(sampler(1.0, 3.0), 1.0, 1.0).unwrap(),
            BoundaryFlux::outflow(sampler(1.0, 3.0), 1.0).unwrap(),
            BoundaryFlux::balloon_temperature(sampler(1.0, 3.0)),
        ] {
            let err = flux.eval(&geom, interior, ClockSnapshot::new(1.0, 0)).unwrap_err();
            assert!(matches!(err, CtError::InvalidFacet { cell: 3, .. }), "{}", flux.name());
        }
    }

    #[test]
    fn test_out_of_domain_propagates() {
        let flux = BoundaryFlux::inflow(sampler(1.0, 3.0), 1.0, 1.0).unwrap();
        let geom = UniformNormal(DVec3::X);
        let err = flux
            .eval(&geom, FacetContext::new(cell(0), 0), ClockSnapshot::new(3.5, 0))
            .unwrap_err();
        assert!(matches!(err, CtError::OutOfDomain { .. }));
    }

    #[test]
    fn test_eval_facets_parallel() {
        let flux = BoundaryFlux::inflow(sampler(1.0, 3.0), 2.0, 5.0).unwrap();
        let geom = UniformNormal(DVec3::X);
        let facets: Vec<_> = (0..64).map(|c| FacetContext::new(cell(c), 0)).collect();
        let values = flux.eval_facets(&geom, &facets, ClockSnapshot::new(1.0, 0)).unwrap();
        assert_eq!(values.len(), 64);
        assert!(values.iter().all(|v| (v.magnitude() - 1.0).abs() < 1e-10));
    }

    #[test]
    fn test_write_to_buffer() {
        let mut out = [0.0; 3];
        FluxValue::Vector(DVec3::new(1.0, 2.0, 3.0)).write_to(&mut out).unwrap();
        assert_eq!(out, [1.0, 2.0, 3.0]);
        assert!(FluxValue::Scalar(1.0).write_to(&mut out).is_err());
    }

    #[test]
    fn test_invalid_scales() {
        assert!(BoundaryFlux::inflow(sampler(1.0, 3.0), 0.0, 1.0).is_err());
        assert!(BoundaryFlux::outflow(sampler(1.0, 3.0), -2.0).is_err());
    }
}
