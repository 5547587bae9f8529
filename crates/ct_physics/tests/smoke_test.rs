// crates/ct_physics/tests/smoke_test.rs

//! 快速冒烟测试
//!
//! 验证各组件可以正确初始化并串起来运行。
//! 这些测试应该快速完成（<1秒）。

use std::sync::Arc;

use ct_foundation::CtError;
use ct_physics::prelude::*;
use glam::DVec3;

fn pulse_spline() -> Arc<BSpline> {
    Arc::new(BSpline::interpolate(&[0.0, 1.0, 2.0, 3.0], &[0.0, 10.0, 0.0, 10.0], 3).unwrap())
}

// ============================================================
// 边界通量
// ============================================================

#[test]
fn test_inflow_on_box_outlet_face() {
    let mesh = TetMesh::box_mesh([1, 1, 1], DVec3::ONE).unwrap();
    let sampler = WaveformSampler::new(pulse_spline(), 1.0, 3.0).unwrap();
    let inflow = BoundaryFlux::inflow(sampler, 2.0, 5.0).unwrap();

    // x = 1 面上的边界面法向为 +x
    let facet = mesh
        .boundary_facets()
        .into_iter()
        .find(|&f| (mesh.facet_normal(f).unwrap() - DVec3::X).length() < 1e-12)
        .unwrap();

    let value = inflow
        .eval(&mesh, facet, ClockSnapshot::new(1.0, 0))
        .unwrap()
        .as_vector()
        .unwrap();
    assert!((value - DVec3::new(-1.0, 0.0, 0.0)).length() < 1e-10);
}

#[test]
fn test_inflow_points_into_domain_everywhere() {
    let mesh = TetMesh::box_mesh([2, 2, 2], DVec3::new(2.0, 1.0, 1.0)).unwrap();
    let sampler = WaveformSampler::new(pulse_spline(), 1.0, 3.0).unwrap();
    let inflow = BoundaryFlux::inflow(sampler, 1.0, 1.0).unwrap();
    let facets = mesh.boundary_facets();
    let clock = ClockSnapshot::new(1.0, 0);

    let values = inflow.eval_facets(&mesh, &facets, clock).unwrap();
    assert_eq!(values.len(), facets.len());
    for (facet, value) in facets.iter().zip(&values) {
        let n = mesh.facet_normal(*facet).unwrap();
        let v = value.as_vector().unwrap();
        // 正波形值给出指向域内的速度
        assert!(v.dot(n) < 0.0);
        assert!((v.length() - 10.0).abs() < 1e-9);
    }
}

#[test]
fn test_interior_facet_rejected_by_all_variants() {
    let mesh = TetMesh::box_mesh([1, 1, 1], DVec3::ONE).unwrap();
    let set = BoundaryFluxSet {
        inflow: BoundaryFlux::inflow(WaveformSampler::new(pulse_spline(), 1.0, 3.0).unwrap(), 1.0, 1.0)
            .unwrap(),
        outflow: BoundaryFlux::outflow(WaveformSampler::new(pulse_spline(), 1.0, 3.0).unwrap(), 1.0)
            .unwrap(),
        balloon: BoundaryFlux::balloon_temperature(
            WaveformSampler::aperiodic(pulse_spline(), 1.0).unwrap(),
        ),
    };
    let interior = FacetContext::new(ct_foundation::CellIndex::new(0), -1);

    for flux in set.iter() {
        let err = flux.eval(&mesh, interior, ClockSnapshot::new(1.0, 0)).unwrap_err();
        assert!(matches!(err, CtError::InvalidFacet { local_facet: -1, .. }), "{}", flux.name());
    }
}

#[test]
fn test_outflow_pressure_conversion() {
    let flat = Arc::new(BSpline::interpolate(&[0.0, 1.0, 2.0, 3.0], &[80.0; 4], 3).unwrap());
    let outflow = BoundaryFlux::outflow(WaveformSampler::new(flat, 1.0, 3.0).unwrap(), 0.5).unwrap();
    let mesh = TetMesh::box_mesh([1, 1, 1], DVec3::ONE).unwrap();
    let facet = mesh.boundary_facets()[0];

    let p = outflow
        .eval(&mesh, facet, ClockSnapshot::new(2.5, 0))
        .unwrap()
        .as_scalar()
        .unwrap();
    let expected = 80.0 * 133.322 / (1060.0 * 0.25);
    assert!((p - expected).abs() < 1e-9);
}

// ============================================================
// 波形与时钟
// ============================================================

#[test]
fn test_periodic_waveform_over_cycles() {
    let sampler = WaveformSampler::new(pulse_spline(), 1.0, 3.0).unwrap();
    let mut clock = SimulationClock::new(0.0, 3.0).unwrap();
    let reference = sampler.sample(ClockSnapshot::new(0.7, 0)).unwrap();

    // 推进到第 2 个周期的同一相位
    for _ in 0..10 {
        clock.advance(0.5).unwrap();
    }
    clock.advance(0.7 + 1.0).unwrap();
    assert_eq!(clock.cycle(), 2);
    let later = sampler.sample(clock.snapshot()).unwrap();
    assert!((later - reference).abs() < 1e-9);
}

#[test]
fn test_sample_outside_domain() {
    let sampler = WaveformSampler::new(pulse_spline(), 1.0, 3.0).unwrap();
    // 周期编号未更新时，时间越过样条定义域
    let err = sampler.sample(ClockSnapshot::new(4.0, 0)).unwrap_err();
    assert!(matches!(err, CtError::OutOfDomain { .. }));
}

// ============================================================
// 稳定性控制
// ============================================================

#[test]
fn test_stability_control_on_box_mesh() {
    let mesh = TetMesh::box_mesh([4, 1, 1], DVec3::new(4.0, 1.0, 1.0)).unwrap();
    let h = mesh.vertex_length_scale().unwrap();
    let u = VectorField::from_fn("u", mesh.n_vertices(), |_| [1.0, 0.0, 0.0]);

    let controller = TimestepController::new(TimeControl {
        variable_timestep: true,
        target_courant: 0.5,
    })
    .unwrap();
    let mut control = StabilityControl::new(controller, 1.0);
    let report = control
        .advance(ClockSnapshot::default(), 0.01, &u, &h, &SerialComm)
        .unwrap();

    // 单元最长边为体对角线 √3
    let diag = 3f64.sqrt();
    assert!((report.stats.max_courant - 1.0 / diag).abs() < 1e-12);
    assert!((report.stats.max_flow_scale - diag).abs() < 1e-12);
    assert!(report.tsp_next <= 0.5 * diag);
    assert!(0.5 * diag - report.tsp_next < 1e-5 + 1e-12);
}

#[test]
fn test_timestep_scenarios() {
    let variable = TimestepController::new(TimeControl {
        variable_timestep: true,
        target_courant: 0.5,
    })
    .unwrap();
    assert!((variable.update(0.01, 2.0).unwrap() - 0.25).abs() < 1e-15);

    let fixed = TimestepController::new(TimeControl {
        variable_timestep: false,
        target_courant: 0.5,
    })
    .unwrap();
    assert_eq!(fixed.update(0.01, 2.0).unwrap(), 0.01);
}

// ============================================================
// 历史缓冲
// ============================================================

#[test]
fn test_history_rotation_through_steps() {
    let n = 5;
    let u0 = VectorField::zeros("u", n);
    let p0 = ScalarField::constant("p", n, 0.0);
    let t0 = ScalarField::constant("T", n, 37.0);
    let mut hist = FieldHistories::new(&u0, &p0, &t0);

    for step in 1..=4 {
        let value = step as f64;
        hist.temperature.current_mut().values_mut().fill(37.0 + value);
        hist.velocity.current_mut().component_mut(2).fill(value);
        hist.pressure.current_mut().values_mut().fill(-value);
        hist.rotate();
    }

    let t: Vec<f64> = hist.temperature.iter().map(|f| f.values()[0]).collect();
    assert_eq!(t, vec![41.0, 41.0, 40.0, 39.0]);
    let w: Vec<f64> = hist.velocity.iter().map(|f| f.component(2)[n - 1]).collect();
    assert_eq!(w, vec![4.0, 4.0, 3.0]);
    let p: Vec<f64> = hist.pressure.iter().map(|f| f.values()[0]).collect();
    assert_eq!(p, vec![-4.0, -4.0, -3.0]);
}
