// crates/ct_physics/src/engine/clock.rs

//! 模拟时钟
//!
//! 时钟由驱动程序独占持有并推进；边界求值器只接收不可变的
//! [`ClockSnapshot`]，不持有对时钟的引用。

use ct_foundation::{CtError, CtResult};
use serde::{Deserialize, Serialize};

/// 单次求值使用的时间快照
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClockSnapshot {
    /// 物理时间
    pub time: f64,
    /// 已完成的周期数
    pub cycle: u64,
}

impl ClockSnapshot {
    /// 创建快照
    #[inline]
    pub const fn new(time: f64, cycle: u64) -> Self {
        Self { time, cycle }
    }
}

/// 模拟时钟：当前时间、周期计数与周期长度
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationClock {
    t: f64,
    cycle: u64,
    period: f64,
}

impl SimulationClock {
    /// 从 `t_start` 开始计时
    ///
    /// 初始周期数按 `floor(t_start / period)` 确定；`period == 0` 表示非周期。
    pub fn new(t_start: f64, period: f64) -> CtResult<Self> {
        if !t_start.is_finite() {
            return Err(CtError::invalid_input("起始时间必须为有限值"));
        }
        if !(period.is_finite() && period >= 0.0) {
            return Err(CtError::invalid_input(format!(
                "周期必须为非负有限值, 实际为 {}",
                period
            )));
        }
        let cycle = if period > 0.0 && t_start > 0.0 {
            (t_start / period).floor() as u64
        } else {
            0
        };
        Ok(Self {
            t: t_start,
            cycle,
            period,
        })
    }

    /// 当前时间
    #[inline]
    pub fn time(&self) -> f64 {
        self.t
    }

    /// 周期计数
    #[inline]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// 周期长度
    #[inline]
    pub fn period(&self) -> f64 {
        self.period
    }

    /// 推进 `dt`，跨越周期边界时递增周期计数
    ///
    /// `dt` 必须为非负有限值，推进后的时间也必须有限；否则时钟保持不变。
    pub fn advance(&mut self, dt: f64) -> CtResult<()> {
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(CtError::invalid_input(format!(
                "时间步长必须为非负有限值, 实际为 {}",
                dt
            )));
        }
        let t = self.t + dt;
        if !t.is_finite() {
            return Err(CtError::invalid_input(format!(
                "推进后时间溢出: t={}, dt={}",
                self.t, dt
            )));
        }
        self.t = t;
        if self.period > 0.0 {
            while self.t >= (self.cycle + 1) as f64 * self.period {
                self.cycle += 1;
            }
        }
        Ok(())
    }

    /// 当前快照
    #[inline]
    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot::new(self.t, self.cycle)
    }
}
