// apps/ct_cli/src/commands/run.rs

//! 运行演示算例
//!
//! 在长方体四面体网格上驱动完整的一步流程，但不求解流动方程：
//! 速度场由入口波形给出的平均速度乘以抛物型截面分布构成（运动学给定）。
//!
//! 每一步：
//! 1. 推进时钟，在入口/出口/壁面上批量求值边界通量
//! 2. 用边界值更新当前速度、压力、温度
//! 3. 稳定性控制：统计、0 号进程写诊断日志、更新步长
//! 4. 平移历史缓冲
//!
//! `--ranks N` 时顶点与边界面按连续区间切成 N 个分区，在进程内通信组上运行。

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::ops::Range;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Args;
use ct_config::CaseConfig;
use ct_foundation::{CellIndex, CtResult};
use ct_physics::boundary::{BoundaryFluxSet, FluxValue};
use ct_physics::engine::{
    DiagnosticLog, SimulationClock, StabilityControl, StepReport, TimestepController,
};
use ct_physics::fields::{
    count_total_dofs, DofCarrier, DofGroup, FieldHistories, ScalarField, VectorField,
};
use ct_physics::mesh::{FacetContext, FacetGeometry, TetMesh, VertexLengthScale};
use ct_physics::numerics::{attach_nullspace, CsrBuilder, CsrMatrix, PressureOperator, SubspaceDofs};
use ct_runtime::{Collective, LocalGroup, SerialComm};
use glam::DVec3;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// 运行参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径 (.json / .yaml / .yml)
    #[arg(short, long)]
    pub config: PathBuf,

    /// 输出目录（覆盖配置）
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 模拟结束时间 [秒]（覆盖配置）
    #[arg(short = 't', long)]
    pub end_time: Option<f64>,

    /// 进程内模拟的分区数
    #[arg(long, default_value = "1")]
    pub ranks: usize,

    /// 最大步数
    #[arg(long, default_value = "100000")]
    pub max_steps: usize,

    /// 进度日志间隔（步）
    #[arg(long, default_value = "100")]
    pub report_every: usize,
}

/// 演示网格的边界分组
struct BoundaryPatches {
    /// x = 0 面
    inlet: Vec<FacetContext>,
    /// x = Lx 面
    outlet: Vec<FacetContext>,
    /// 其余边界（球囊温度作用面）
    wall: Vec<FacetContext>,
}

impl BoundaryPatches {
    fn classify(mesh: &TetMesh) -> Result<Self> {
        let mut patches = Self {
            inlet: Vec::new(),
            outlet: Vec::new(),
            wall: Vec::new(),
        };
        for facet in mesh.boundary_facets() {
            let n = mesh.facet_normal(facet)?;
            if n.dot(DVec3::NEG_X) > 0.99 {
                patches.inlet.push(facet);
            } else if n.dot(DVec3::X) > 0.99 {
                patches.outlet.push(facet);
            } else {
                patches.wall.push(facet);
            }
        }
        if patches.inlet.is_empty() || patches.outlet.is_empty() {
            bail!("网格缺少入口或出口边界面");
        }
        Ok(patches)
    }
}

/// 所有分区共享的只读算例数据
struct Case {
    config: CaseConfig,
    boundaries: BoundaryFluxSet,
    mesh: TetMesh,
    h: VertexLengthScale,
    patches: BoundaryPatches,
    max_steps: usize,
    report_every: usize,
}

/// 单个分区的运行结果
struct RankSummary {
    steps: usize,
    last: Option<StepReport>,
    dofs: BTreeMap<String, usize>,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== CardioTherm 演示算例启动 ===");

    let mut config = CaseConfig::load(&args.config)
        .with_context(|| format!("无法加载配置 {}", args.config.display()))?;
    if let Some(dir) = args.output {
        config.output.directory = dir;
    }
    if let Some(t_end) = args.end_time {
        config.time.t_end = t_end;
    }
    config.validate().context("配置校验失败")?;
    if args.ranks == 0 {
        bail!("分区数至少为 1");
    }

    let boundaries = config.build_boundaries().context("构建边界求值器失败")?;
    if let Err(e) = config.check_time_window(&boundaries) {
        warn!("{}", e);
    }

    let mesh = TetMesh::box_mesh(config.mesh.divisions, DVec3::from_array(config.mesh.extent))?;
    let h = mesh.vertex_length_scale()?;
    let patches = BoundaryPatches::classify(&mesh)?;
    info!(
        "网格: {} 顶点, {} 单元; 入口 {} 面, 出口 {} 面, 壁面 {} 面",
        mesh.n_vertices(),
        mesh.n_cells(),
        patches.inlet.len(),
        patches.outlet.len(),
        patches.wall.len()
    );
    info!(
        "时间: [{}, {}], 初始步长 {}, 变步长 {}",
        config.time.t_start, config.time.t_end, config.time.tsp, config.time.variable_timestep
    );

    std::fs::create_dir_all(&config.output.directory).with_context(|| {
        format!("无法创建输出目录 {}", config.output.directory.display())
    })?;
    let log_path = config.diagnostics_path();
    let log = DiagnosticLog::create(&log_path)
        .with_context(|| format!("无法创建诊断日志 {}", log_path.display()))?;

    let case = Case {
        config,
        boundaries,
        mesh,
        h,
        patches,
        max_steps: args.max_steps,
        report_every: args.report_every.max(1),
    };

    let start = Instant::now();
    let results: Vec<Result<RankSummary>> = if args.ranks == 1 {
        vec![drive(&SerialComm, &case, Some(log))]
    } else {
        // 日志在启动分区前创建好，只交给 0 号分区
        let log_slot = Mutex::new(Some(log));
        LocalGroup::run(args.ranks, |comm| {
            let log = if comm.is_root() { log_slot.lock().take() } else { None };
            drive(&comm, &case, log)
        })?
    };

    let mut root = None;
    for (rank, result) in results.into_iter().enumerate() {
        let summary = result.with_context(|| format!("分区 {} 运行失败", rank))?;
        if rank == 0 {
            root = Some(summary);
        }
    }
    let Some(summary) = root else {
        bail!("没有分区返回结果");
    };

    info!("=== 模拟完成 ===");
    info!("分区数: {}", args.ranks);
    info!("总步数: {}", summary.steps);
    for (name, n) in &summary.dofs {
        info!("自由度 {}: {}", name, n);
    }
    if let Some(last) = summary.last {
        info!(
            "最终: t={:.5} (周期 {}), tsp={}, C={:.4}, Re_l={:.4}",
            last.time, last.cycle, last.tsp_next, last.courant, last.local_reynolds
        );
    }
    info!("计算时间: {:.2} s", start.elapsed().as_secs_f64());
    info!("诊断日志: {}", log_path.display());

    Ok(())
}

/// 连续均分：第 `rank` 段（允许为空）
fn chunk(n: usize, parts: usize, rank: usize) -> Range<usize> {
    let size = (n + parts - 1) / parts;
    (rank * size).min(n)..((rank + 1) * size).min(n)
}

/// 所有分区一致地判定是否出错，避免部分分区提前退出而其余分区卡在集合操作
fn agree<T>(comm: &dyn Collective, local: CtResult<T>) -> Result<T> {
    let failed = comm.max_f64(if local.is_ok() { 0.0 } else { 1.0 }) > 0.0;
    match local {
        Ok(value) if !failed => Ok(value),
        Ok(_) => bail!("其他分区求值失败 (rank {})", comm.rank()),
        Err(e) => Err(e.into()),
    }
}

/// 全局平均值，所有分区都没有样本时为 0
fn global_mean(comm: &dyn Collective, values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    let sum = comm.sum_f64(sum);
    let count = comm.sum_usize(count);
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// 本分区顶点上的图拉普拉斯（行和为零，常数在零空间中）
fn assemble_pressure_laplacian(mesh: &TetMesh, vertices: Range<usize>) -> CtResult<CsrMatrix> {
    let mut builder = CsrBuilder::new_square(vertices.len());
    for c in 0..mesh.n_cells() {
        let conn = mesh.cell_vertices(CellIndex::new(c))?;
        for a in 0..4 {
            for b in (a + 1)..4 {
                let (i, j) = (conn[a], conn[b]);
                if vertices.contains(&i) && vertices.contains(&j) {
                    let (li, lj) = (i - vertices.start, j - vertices.start);
                    builder.add(li, li, 1.0)?;
                    builder.add(lj, lj, 1.0)?;
                    builder.add(li, lj, -1.0)?;
                    builder.add(lj, li, -1.0)?;
                }
            }
        }
    }
    Ok(builder.build())
}

/// 一个分区的时间推进循环
fn drive(
    comm: &dyn Collective,
    case: &Case,
    log: Option<DiagnosticLog<BufWriter<File>>>,
) -> Result<RankSummary> {
    let (rank, size) = (comm.rank(), comm.size());
    let vertices = chunk(case.mesh.n_vertices(), size, rank);
    let h = case.h.slice(vertices.clone())?;
    let inlet = &case.patches.inlet[chunk(case.patches.inlet.len(), size, rank)];
    let outlet = &case.patches.outlet[chunk(case.patches.outlet.len(), size, rank)];
    let wall = &case.patches.wall[chunk(case.patches.wall.len(), size, rank)];
    debug!(
        "rank {}: 顶点 {:?}, 入口 {} 面, 出口 {} 面, 壁面 {} 面",
        rank,
        vertices,
        inlet.len(),
        outlet.len(),
        wall.len()
    );

    let n_local = vertices.len();
    let u0 = VectorField::zeros("u", n_local);
    let p0 = ScalarField::constant("p", n_local, 0.0);
    let t0 = ScalarField::constant("T", n_local, 0.0);

    let groups: Vec<DofGroup<'_>> = vec![
        ("velocity", vec![&u0 as &dyn DofCarrier]),
        ("pressure", vec![&p0 as &dyn DofCarrier]),
        ("temperature", vec![&t0 as &dyn DofCarrier]),
    ];
    let dofs = count_total_dofs(comm, &groups);

    let laplacian = agree(comm, assemble_pressure_laplacian(&case.mesh, vertices.clone()))?;
    let mut pressure_operator = PressureOperator::new(laplacian)?;
    attach_nullspace(
        &mut pressure_operator,
        p0.values(),
        &SubspaceDofs::contiguous(0..n_local),
        comm,
    )?;

    let mut histories = FieldHistories::new(&u0, &p0, &t0);

    let controller = TimestepController::new(case.config.time_control())?;
    let mut control = StabilityControl::new(controller, case.config.scales.reynolds);
    if let Some(log) = log {
        control = control.with_log(log);
    }

    let [_, ly, lz] = case.config.mesh.extent;
    let t_end = case.config.time.t_end;
    let mut clock = SimulationClock::new(case.config.time.t_start, case.config.scales.period)?;
    let mut tsp = case.config.time.tsp;
    let mut steps = 0;
    let mut last = None;

    while clock.time() < t_end && steps < case.max_steps {
        clock.advance(tsp)?;
        let snapshot = clock.snapshot();

        let bounds = &case.boundaries;
        let evaluated = (|| -> CtResult<_> {
            Ok((
                bounds.inflow.eval_facets(&case.mesh, inlet, snapshot)?,
                bounds.outflow.eval_facets(&case.mesh, outlet, snapshot)?,
                bounds.balloon.eval_facets(&case.mesh, wall, snapshot)?,
            ))
        })();
        let (inflow, outflow, balloon) = agree(comm, evaluated)?;

        // 入口面法向为 -x，入口速度沿 +x
        let speed = global_mean(comm, inflow.iter().filter_map(FluxValue::as_vector).map(|v| v.x));
        let pressure = global_mean(comm, outflow.iter().filter_map(FluxValue::as_scalar));
        let wall_temperature = global_mean(comm, balloon.iter().filter_map(FluxValue::as_scalar));

        {
            let u = histories.velocity.current_mut();
            let positions = &case.mesh.vertices()[vertices.clone()];
            for (ux, x) in u.component_mut(0).iter_mut().zip(positions) {
                let (eta, zeta) = (x.y / ly, x.z / lz);
                *ux = speed * 16.0 * eta * (1.0 - eta) * zeta * (1.0 - zeta);
            }
        }
        histories.pressure.current_mut().values_mut().fill(pressure);
        histories.temperature.current_mut().values_mut().fill(wall_temperature);

        let report = control.advance(snapshot, tsp, histories.velocity.current(), &h, comm)?;
        tsp = report.tsp_next;
        histories.rotate();
        steps += 1;

        if comm.is_root() && steps % case.report_every == 0 {
            info!(
                "step {}: t={:.5}, 周期 {}, U={:.4e}, p={:.4e}, T={:.3}, C={:.4}, tsp={}",
                steps,
                report.time,
                report.cycle,
                speed,
                pressure,
                wall_temperature,
                report.courant,
                report.tsp_next
            );
        }
        last = Some(report);
    }

    control.flush()?;
    Ok(RankSummary { steps, last, dofs })
}
