// crates/ct_physics/src/engine/timestep.rs

//! 时间步长控制模块
//!
//! 启用变步长时，新步长由目标 Courant 数与全局 Courant 分母之比给出，
//! 并**向下**截断到 5 位小数：
//!
//! $$ \Delta t_{new} = \mathrm{trunc}_{5}\left( \frac{C_{target}}{C_{est}} \right) $$
//!
//! 截断保证新步长不超过比值本身，即不会超过目标 Courant 数。
//!
//! ## 退化情况
//!
//! - Courant 分母为零或非有限（静止流场）：保持当前步长并给出警告
//! - 截断结果为零（比值小于 `10^-5`）：返回 [`CtError::Numerical`]，
//!   不把零步长交给时钟

use ct_foundation::{CtError, CtResult};
use serde::{Deserialize, Serialize};

/// 时间步长保留的小数位数
pub const TIMESTEP_DECIMALS: i32 = 5;

/// 向下截断到 `decimals` 位小数
///
/// 计算 `floor(x · 10^d) / 10^d`，结果满足 `truncate_down(x, d) <= x`。
/// 乘积的舍入误差不做向上补偿，`x · 10^d` 略低于整数时结果少一个单位
/// （如 `0.29 -> 0.28999`）。
pub fn truncate_down(x: f64, decimals: i32) -> CtResult<f64> {
    if decimals < 0 {
        return Err(CtError::InvalidDecimalCount { decimals });
    }
    if !x.is_finite() {
        return Err(CtError::invalid_input(format!("截断输入必须为有限值, 实际为 {x}")));
    }
    if decimals == 0 {
        return Ok(x.floor());
    }

    let factor = 10f64.powi(decimals);
    let scaled = x * factor;
    if !scaled.is_finite() {
        // 精度超出浮点表示范围
        return Ok(x);
    }

    let floored = scaled.floor();
    let result = floored / factor;
    // 除法舍入偶尔落在 x 之上
    if result > x {
        return Ok((floored - 1.0) / factor);
    }
    Ok(result)
}

/// 计算下一步的时间步长
///
/// `enabled == false` 时原样返回 `current`。
pub fn update_timestep(current: f64, target: f64, estimate: f64, enabled: bool) -> CtResult<f64> {
    if !enabled {
        return Ok(current);
    }
    if !(estimate > 0.0) || !estimate.is_finite() {
        tracing::warn!(
            "Courant 分母 {} 无效（静止流场?），保持时间步长 {}",
            estimate,
            current
        );
        return Ok(current);
    }

    let next = truncate_down(target / estimate, TIMESTEP_DECIMALS)?;
    if next <= 0.0 {
        return Err(CtError::numerical(format!(
            "时间步长截断为零: target={target}, estimate={estimate}"
        )));
    }
    Ok(next)
}

/// 时间步长控制参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeControl {
    /// 是否启用变步长
    pub variable_timestep: bool,
    /// 目标 Courant 数
    pub target_courant: f64,
}

impl Default for TimeControl {
    fn default() -> Self {
        Self {
            variable_timestep: false,
            target_courant: 0.5,
        }
    }
}

/// 时间步长控制器
#[derive(Debug, Clone)]
pub struct TimestepController {
    control: TimeControl,
}

impl TimestepController {
    /// 创建控制器，启用变步长时目标 Courant 数必须为正
    pub fn new(control: TimeControl) -> CtResult<Self> {
        if control.variable_timestep && !(control.target_courant > 0.0 && control.target_courant.is_finite()) {
            return Err(CtError::invalid_input(format!(
                "目标 Courant 数必须为正, 实际为 {}",
                control.target_courant
            )));
        }
        Ok(Self { control })
    }

    /// 固定步长控制器
    pub fn fixed() -> Self {
        Self {
            control: TimeControl::default(),
        }
    }

    /// 控制参数
    #[inline]
    pub fn control(&self) -> &TimeControl {
        &self.control
    }

    /// 由 Courant 分母计算下一步步长
    pub fn update(&self, current: f64, estimate: f64) -> CtResult<f64> {
        update_timestep(
            current,
            self.control.target_courant,
            estimate,
            self.control.variable_timestep,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_basic() {
        assert_eq!(truncate_down(0.123456789, 5).unwrap(), 0.12345);
        assert_eq!(truncate_down(2.7, 0).unwrap(), 2.0);
        assert_eq!(truncate_down(0.25, 5).unwrap(), 0.25);
        // 0.29 * 1e5 = 28999.999999999996，floor 后少一个单位
        assert_eq!(truncate_down(0.29, 5).unwrap(), 0.28999);
        assert_eq!(truncate_down(0.57, 2).unwrap(), 0.56);
    }

    #[test]
    fn test_truncate_negative_decimals() {
        let err = truncate_down(1.0, -1).unwrap_err();
        assert!(matches!(err, CtError::InvalidDecimalCount { decimals: -1 }));
    }

    #[test]
    fn test_truncate_bounds() {
        for i in 0..2000 {
            let x = i as f64 * 0.000_731 + (i as f64).sin().abs() * 1e-3;
            let q = truncate_down(x, TIMESTEP_DECIMALS).unwrap();
            assert!(q <= x, "x = {x}, q = {q}");
            assert!(x - q < 1e-5 + 1e-12, "x = {x}, q = {q}");
        }
    }

    #[test]
    fn test_update_variable() {
        let next = update_timestep(0.01, 0.5, 2.0, true).unwrap();
        assert!((next - 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_update_disabled() {
        assert_eq!(update_timestep(0.01, 0.5, 2.0, false).unwrap(), 0.01);
        assert_eq!(update_timestep(0.01, 0.5, 0.0, false).unwrap(), 0.01);
    }

    #[test]
    fn test_update_never_exceeds_target() {
        let next = update_timestep(0.01, 0.5, 3.0, true).unwrap();
        assert!(next * 3.0 <= 0.5);
        assert_eq!(next, 0.16666);
    }

    #[test]
    fn test_update_quiescent_flow_keeps_step() {
        assert_eq!(update_timestep(0.01, 0.5, 0.0, true).unwrap(), 0.01);
    }

    #[test]
    fn test_update_truncated_to_zero() {
        // 0.5 / 1e9 = 5e-10 截断为 0
        let err = update_timestep(0.01, 0.5, 1e9, true).unwrap_err();
        assert!(matches!(err, CtError::Numerical { .. }));
        // 刚好一个单位时仍然可用
        assert_eq!(update_timestep(0.01, 0.5, 0.5e5, true).unwrap(), 0.00001);
    }

    #[test]
    fn test_controller() {
        let c = TimestepController::new(TimeControl {
            variable_timestep: true,
            target_courant: 0.5,
        })
        .unwrap();
        assert!((c.update(0.01, 2.0).unwrap() - 0.25).abs() < 1e-15);
        assert_eq!(TimestepController::fixed().update(0.01, 2.0).unwrap(), 0.01);
        assert!(TimestepController::new(TimeControl {
            variable_timestep: true,
            target_courant: 0.0,
        })
        .is_err());
    }
}
