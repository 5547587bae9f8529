// crates/ct_config/src/case_config.rs

//! CaseConfig - 算例配置
//!
//! 一个算例包括无量纲化尺度、时间控制、三条驱动波形、演示网格与输出位置。
//! 按扩展名从 JSON 或 YAML 加载：
//!
//! ```yaml
//! scales: { tsc: 1.0, vsc: 0.5, area: 3.1e-4, period: 0.8, reynolds: 250.0 }
//! time: { t_start: 0.0, t_end: 2.4, tsp: 1.0e-3, variable_timestep: true, target_courant: 0.5 }
//! waveforms:
//!   inflow:  { kind: samples, times: [0.0, 0.2, 0.4, 0.8], values: [0.0, 5.0e-5, 1.0e-5, 0.0] }
//!   outflow: { kind: samples, times: [0.0, 0.4, 0.8, 1.2], values: [80.0, 120.0, 90.0, 80.0] }
//!   balloon: { kind: spline, knots: [0, 0, 0, 0, 10, 10, 10, 10], coeffs: [37, 30, 20, 15], degree: 3 }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ct_physics::boundary::{BoundaryFlux, BoundaryFluxSet};
use ct_physics::engine::TimeControl;
use ct_physics::forcing::{BSpline, WaveformSampler};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 算例配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseConfig {
    /// 无量纲化尺度
    #[serde(default)]
    pub scales: ScaleConfig,

    /// 时间控制
    #[serde(default)]
    pub time: TimeConfig,

    /// 驱动波形
    pub waveforms: WaveformsConfig,

    /// 演示驱动使用的长方体网格
    #[serde(default)]
    pub mesh: BoxMeshConfig,

    /// 输出配置
    #[serde(default)]
    pub output: OutputConfig,
}

/// 尺度参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleConfig {
    /// 时间缩放 Tsc
    #[serde(default = "default_one")]
    pub tsc: f64,

    /// 速度尺度 Vsc
    #[serde(default = "default_one")]
    pub vsc: f64,

    /// 入口面积
    #[serde(default = "default_one")]
    pub area: f64,

    /// 心动周期 [s]
    #[serde(default = "default_one")]
    pub period: f64,

    /// Reynolds 数
    #[serde(default = "default_one")]
    pub reynolds: f64,
}

fn default_one() -> f64 { 1.0 }

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            tsc: default_one(),
            vsc: default_one(),
            area: default_one(),
            period: default_one(),
            reynolds: default_one(),
        }
    }
}

/// 时间控制
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// 起始时间
    #[serde(default)]
    pub t_start: f64,

    /// 结束时间
    #[serde(default = "default_t_end")]
    pub t_end: f64,

    /// 初始时间步长
    #[serde(default = "default_tsp")]
    pub tsp: f64,

    /// 是否启用变步长
    #[serde(default)]
    pub variable_timestep: bool,

    /// 目标 Courant 数
    #[serde(default = "default_target_courant")]
    pub target_courant: f64,
}

fn default_t_end() -> f64 { 1.0 }
fn default_tsp() -> f64 { 1e-3 }
fn default_target_courant() -> f64 { 0.5 }

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            t_start: 0.0,
            t_end: default_t_end(),
            tsp: default_tsp(),
            variable_timestep: false,
            target_courant: default_target_courant(),
        }
    }
}

/// 三条驱动波形
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveformsConfig {
    /// 入口流量
    pub inflow: WaveformSource,
    /// 出口压力 [mmHg]
    pub outflow: WaveformSource,
    /// 球囊温度（非周期）
    pub balloon: WaveformSource,
}

/// 波形来源：采样点插值或显式样条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaveformSource {
    /// 采样点，插值为 B 样条
    Samples {
        /// 采样时刻（严格递增）
        times: Vec<f64>,
        /// 采样值
        values: Vec<f64>,
        /// 样条阶数（奇数）
        #[serde(default = "default_degree")]
        degree: usize,
    },
    /// 显式 B 样条 (t, c, k)
    Spline {
        /// 节点向量
        knots: Vec<f64>,
        /// 系数
        coeffs: Vec<f64>,
        /// 阶数
        #[serde(default = "default_degree")]
        degree: usize,
    },
}

fn default_degree() -> usize { 3 }

impl WaveformSource {
    /// 构建 B 样条
    pub fn build_spline(&self) -> Result<BSpline, ct_foundation::CtError> {
        match self {
            Self::Samples {
                times,
                values,
                degree,
            } => BSpline::interpolate(times, values, *degree),
            Self::Spline {
                knots,
                coeffs,
                degree,
            } => BSpline::new(knots.clone(), coeffs.clone(), *degree),
        }
    }
}

/// 长方体网格
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxMeshConfig {
    /// 各方向剖分数
    #[serde(default = "default_divisions")]
    pub divisions: [usize; 3],

    /// 各方向长度
    #[serde(default = "default_extent")]
    pub extent: [f64; 3],
}

fn default_divisions() -> [usize; 3] { [8, 4, 4] }
fn default_extent() -> [f64; 3] { [4.0, 1.0, 1.0] }

impl Default for BoxMeshConfig {
    fn default() -> Self {
        Self {
            divisions: default_divisions(),
            extent: default_extent(),
        }
    }
}

/// 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 输出目录
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,

    /// 诊断日志文件名
    #[serde(default = "default_diagnostics")]
    pub diagnostics: String,
}

fn default_output_dir() -> PathBuf { PathBuf::from("output") }
fn default_diagnostics() -> String { "runtime_stats.txt".to_string() }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            diagnostics: default_diagnostics(),
        }
    }
}

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

fn positive(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, value, "必须为正有限值"))
    }
}

impl CaseConfig {
    /// 从文件加载并校验，按扩展名选择 JSON 或 YAML
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let content = std::fs::read_to_string(path)?;

        let config = match format {
            Format::Json => Self::from_json(&content)?,
            Format::Yaml => Self::from_yaml(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 字符串解析（不校验）
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 从 YAML 字符串解析（不校验）
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 保存到文件，按扩展名选择格式
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = match Format::from_path(path)? {
            Format::Json => {
                serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            Format::Yaml => {
                serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.scales;
        positive("scales.tsc", s.tsc)?;
        positive("scales.vsc", s.vsc)?;
        positive("scales.area", s.area)?;
        positive("scales.period", s.period)?;
        positive("scales.reynolds", s.reynolds)?;

        let t = &self.time;
        positive("time.tsp", t.tsp)?;
        if !t.t_start.is_finite() || t.t_start < 0.0 {
            return Err(ConfigError::invalid("time.t_start", t.t_start, "不能为负"));
        }
        if !(t.t_end.is_finite() && t.t_end > t.t_start) {
            return Err(ConfigError::invalid("time.t_end", t.t_end, "必须大于 t_start"));
        }
        if t.variable_timestep {
            positive("time.target_courant", t.target_courant)?;
        }

        for (axis, n) in ["x", "y", "z"].iter().zip(self.mesh.divisions) {
            if n == 0 {
                return Err(ConfigError::invalid(format!("mesh.divisions.{axis}"), n, "至少为 1"));
            }
        }
        for (axis, len) in ["x", "y", "z"].iter().zip(self.mesh.extent) {
            positive(&format!("mesh.extent.{axis}"), len)?;
        }

        if self.output.diagnostics.trim().is_empty() {
            return Err(ConfigError::invalid("output.diagnostics", "", "文件名不能为空"));
        }

        for (key, source) in self.waveform_entries() {
            source.build_spline().map_err(|e| ConfigError::build(key, e))?;
        }
        Ok(())
    }

    fn waveform_entries(&self) -> [(&'static str, &WaveformSource); 3] {
        [
            ("waveforms.inflow", &self.waveforms.inflow),
            ("waveforms.outflow", &self.waveforms.outflow),
            ("waveforms.balloon", &self.waveforms.balloon),
        ]
    }

    /// 时间步长控制参数
    pub fn time_control(&self) -> TimeControl {
        TimeControl {
            variable_timestep: self.time.variable_timestep,
            target_courant: self.time.target_courant,
        }
    }

    /// 诊断日志路径
    pub fn diagnostics_path(&self) -> PathBuf {
        self.output.directory.join(&self.output.diagnostics)
    }

    /// 构建三类边界求值器
    pub fn build_boundaries(&self) -> Result<BoundaryFluxSet, ConfigError> {
        let s = &self.scales;
        let periodic = |key: &str, source: &WaveformSource| -> Result<WaveformSampler, ConfigError> {
            let spline = source.build_spline().map_err(|e| ConfigError::build(key, e))?;
            WaveformSampler::new(Arc::new(spline), s.tsc, s.period)
                .map_err(|e| ConfigError::build(key, e))
        };

        let inflow = BoundaryFlux::inflow(
            periodic("waveforms.inflow", &self.waveforms.inflow)?,
            s.area,
            s.vsc,
        )
        .map_err(|e| ConfigError::build("inflow", e))?;
        let outflow = BoundaryFlux::outflow(
            periodic("waveforms.outflow", &self.waveforms.outflow)?,
            s.vsc,
        )
        .map_err(|e| ConfigError::build("outflow", e))?;

        let balloon_spline = self
            .waveforms
            .balloon
            .build_spline()
            .map_err(|e| ConfigError::build("waveforms.balloon", e))?;
        let balloon = BoundaryFlux::balloon_temperature(
            WaveformSampler::aperiodic(Arc::new(balloon_spline), s.tsc)
                .map_err(|e| ConfigError::build("waveforms.balloon", e))?,
        );

        Ok(BoundaryFluxSet {
            inflow,
            outflow,
            balloon,
        })
    }

    /// 检查仿真时间窗口落在各波形的定义域内
    ///
    /// 周期波形在每个周期内的样条参数覆盖 `[0, P·Tsc]`；
    /// 球囊波形的参数覆盖 `[t_start·Tsc, t_end·Tsc]`。
    pub fn check_time_window(&self, boundaries: &BoundaryFluxSet) -> Result<(), ConfigError> {
        let s = &self.scales;
        let periodic_window = (0.0, s.period * s.tsc);
        let balloon_window = (self.time.t_start * s.tsc, self.time.t_end * s.tsc);

        let checks = [
            ("waveforms.inflow", &boundaries.inflow, periodic_window),
            ("waveforms.outflow", &boundaries.outflow, periodic_window),
            ("waveforms.balloon", &boundaries.balloon, balloon_window),
        ];
        for (key, flux, (lo, hi)) in checks {
            let spline = flux.sampler().spline();
            if !(spline.contains(lo) && spline.contains(hi)) {
                let (a, b) = spline.domain();
                return Err(ConfigError::invalid(
                    key,
                    format!("[{a}, {b}]"),
                    format!("样条定义域未覆盖所需参数区间 [{lo}, {hi}]"),
                ));
            }
        }
        Ok(())
    }
}
