// crates/ct_physics/src/fields/history.rs

//! 时间层历史缓冲
//!
//! 多层时间格式需要保留若干代旧解：速度、压力各 3 代，温度 4 代。
//! 槽位 0 为最新，槽位 N-1 为最旧。
//!
//! 每步结束时 [`History::rotate`] 按目标槽位**严格递减**的顺序复制：
//! 先用槽位 N-2 覆盖 N-1，最后用槽位 0 覆盖槽位 1。递增顺序会在复制前
//! 覆盖仍需要的值。槽位 0 保持原值，等待外部求解器写入新解。

use super::nodal::{ScalarField, VectorField};

/// 速度历史代数
pub const VELOCITY_GENERATIONS: usize = 3;
/// 压力历史代数
pub const PRESSURE_GENERATIONS: usize = 3;
/// 温度历史代数（高阶时间格式）
pub const TEMPERATURE_GENERATIONS: usize = 4;

/// 固定长度的历史缓冲
#[derive(Debug, Clone, PartialEq)]
pub struct History<T, const N: usize> {
    slots: [T; N],
}

impl<T: Clone, const N: usize> History<T, N> {
    /// 由各代初值创建（下标 0 为最新）
    pub fn new(slots: [T; N]) -> Self {
        Self { slots }
    }

    /// 所有代都初始化为同一个值
    pub fn filled(value: &T) -> Self {
        Self {
            slots: std::array::from_fn(|_| value.clone()),
        }
    }

    /// 代数
    #[inline]
    pub const fn generations(&self) -> usize {
        N
    }

    /// 最新一代（槽位 0）
    #[inline]
    pub fn current(&self) -> &T {
        &self.slots[0]
    }

    /// 最新一代的可变引用，供求解器写入新解
    #[inline]
    pub fn current_mut(&mut self) -> &mut T {
        &mut self.slots[0]
    }

    /// 第 `k` 代（0 最新）
    #[inline]
    pub fn get(&self, k: usize) -> Option<&T> {
        self.slots.get(k)
    }

    /// 从新到旧遍历
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.slots.iter()
    }

    /// 向后平移一代：对 k = N-1 … 1，槽位 k ← 槽位 k-1
    pub fn rotate(&mut self) {
        for k in (1..N).rev() {
            let (newer, older) = self.slots.split_at_mut(k);
            older[0].clone_from(&newer[k - 1]);
        }
    }
}

impl<T, const N: usize> std::ops::Index<usize> for History<T, N> {
    type Output = T;

    fn index(&self, k: usize) -> &T {
        &self.slots[k]
    }
}

/// 求解器持有的全部历史缓冲
#[derive(Debug, Clone)]
pub struct FieldHistories {
    /// 速度 u, u_n, u_nm1
    pub velocity: History<VectorField, VELOCITY_GENERATIONS>,
    /// 压力 p, p_n, p_nm1
    pub pressure: History<ScalarField, PRESSURE_GENERATIONS>,
    /// 温度 T, T_n, T_nm1, T_nm2
    pub temperature: History<ScalarField, TEMPERATURE_GENERATIONS>,
}

impl FieldHistories {
    /// 以初始场填充所有代
    pub fn new(velocity: &VectorField, pressure: &ScalarField, temperature: &ScalarField) -> Self {
        Self {
            velocity: History::filled(velocity),
            pressure: History::filled(pressure),
            temperature: History::filled(temperature),
        }
    }

    /// 时间步结束时平移全部缓冲
    pub fn rotate(&mut self) {
        rotate_histories(&mut self.velocity, &mut self.pressure, &mut self.temperature);
    }
}

/// 平移速度、压力、温度历史
pub fn rotate_histories(
    velocity: &mut History<VectorField, VELOCITY_GENERATIONS>,
    pressure: &mut History<ScalarField, PRESSURE_GENERATIONS>,
    temperature: &mut History<ScalarField, TEMPERATURE_GENERATIONS>,
) {
    velocity.rotate();
    pressure.rotate();
    temperature.rotate();
}
