// crates/ct_physics/src/forcing/mod.rs

//! 时间波形驱动
//!
//! - `spline` - B 样条表示、插值与求值
//! - `waveform` - 周期/非周期波形采样

pub mod spline;
pub mod waveform;

pub use spline::{BSpline, MAX_DEGREE};
pub use waveform::WaveformSampler;
