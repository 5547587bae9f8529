// apps/ct_cli/src/commands/validate.rs

//! 配置验证命令
//!
//! 加载并校验算例配置，构建波形与边界求值器，检查仿真时间窗口是否落在
//! 波形定义域内，并输出演示网格的自由度统计。

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Args;
use ct_config::CaseConfig;
use ct_physics::fields::{count_total_dofs, DofCarrier, DofGroup, ScalarField, VectorField};
use ct_physics::mesh::{FacetGeometry, TetMesh};
use ct_runtime::SerialComm;
use glam::DVec3;
use tracing::info;

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

/// 验证结果
#[derive(Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn is_ok_strict(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== CardioTherm 配置验证 ===");

    let mut result = ValidationResult::default();
    validate_case(&args.config, &mut result);
    print_validation_result(&result, args.strict)
}

fn validate_case(path: &Path, result: &mut ValidationResult) {
    println!("\n检查配置文件: {}", path.display());

    let config = match CaseConfig::load(path) {
        Ok(c) => c,
        Err(e) => {
            result.add_error(e.to_string());
            return;
        }
    };
    println!("  ✓ 配置文件格式有效");

    check_soft_limits(&config, result);

    match config.build_boundaries() {
        Ok(boundaries) => {
            for flux in boundaries.iter() {
                let (lo, hi) = flux.sampler().spline().domain();
                println!(
                    "  ✓ {} 波形: 阶数 {}, 定义域 [{}, {}]",
                    flux.name(),
                    flux.sampler().spline().degree(),
                    lo,
                    hi
                );
            }
            match config.check_time_window(&boundaries) {
                Ok(()) => println!("  ✓ 时间窗口位于波形定义域内"),
                Err(e) => result.add_error(e.to_string()),
            }
        }
        Err(e) => result.add_error(e.to_string()),
    }

    match TetMesh::box_mesh(config.mesh.divisions, DVec3::from_array(config.mesh.extent)) {
        Ok(mesh) => report_mesh(&mesh),
        Err(e) => result.add_error(format!("网格构建失败: {}", e)),
    }
}

fn check_soft_limits(config: &CaseConfig, result: &mut ValidationResult) {
    let t = &config.time;
    if t.variable_timestep && t.target_courant > 1.0 {
        result.add_warning(format!("目标 Courant 数 {} 大于 1.0 可能导致不稳定", t.target_courant));
    }
    if t.tsp > config.scales.period / 10.0 {
        result.add_warning(format!(
            "初始步长 {} 超过周期 {} 的 1/10，波形分辨率不足",
            t.tsp, config.scales.period
        ));
    }
    if t.t_end - t.t_start < config.scales.period {
        result.add_warning("模拟时长不足一个心动周期");
    }
}

fn report_mesh(mesh: &TetMesh) {
    let n = mesh.n_vertices();
    let u = VectorField::zeros("u", n);
    let p = ScalarField::constant("p", n, 0.0);
    let t = ScalarField::constant("T", n, 0.0);
    let groups: Vec<DofGroup<'_>> = vec![
        ("flow", vec![&u as &dyn DofCarrier, &p]),
        ("energy", vec![&t as &dyn DofCarrier]),
    ];
    let dofs = count_total_dofs(&SerialComm, &groups);

    println!(
        "  ✓ 演示网格: {} 顶点, {} 单元, {} 边界面",
        n,
        mesh.n_cells(),
        mesh.boundary_facets().len()
    );
    for (name, count) in &dofs {
        println!("    自由度 {}: {}", name, count);
    }
}

fn print_validation_result(result: &ValidationResult, strict: bool) -> Result<()> {
    println!();
    for warning in &result.warnings {
        println!("  ⚠ 警告: {}", warning);
    }
    for error in &result.errors {
        println!("  ✗ 错误: {}", error);
    }

    let passed = if strict {
        result.is_ok_strict()
    } else {
        result.is_ok()
    };
    if !passed {
        bail!(
            "验证失败: {} 个错误, {} 个警告",
            result.errors.len(),
            result.warnings.len()
        );
    }

    println!("\n验证通过 ({} 个警告)", result.warnings.len());
    Ok(())
}
