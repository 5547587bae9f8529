// crates/ct_runtime/src/comm.rs

//! 集合通信抽象
//!
//! 稳定性监控和自由度统计只消费四个跨进程原语：`Max`、`Sum`、
//! 进程号查询和栅栏。核心代码通过注入的 [`Collective`] 使用它们，
//! 因此单进程下用 [`SerialComm`] 即可测试，多分区行为用
//! [`LocalGroup`] 在进程内以线程模拟。
//!
//! # 同步约定
//!
//! 每个集合操作都是同步点：组内所有 rank 必须以相同顺序调用相同的操作，
//! 否则会死锁或得到错配的结果。本层不提供超时，卡住的集合操作即为挂起。
//!
//! # 使用示例
//!
//! ```
//! use ct_runtime::comm::{Collective, LocalGroup};
//!
//! let maxima = LocalGroup::run(3, |comm| comm.max_f64(comm.rank() as f64)).unwrap();
//! assert_eq!(maxima, vec![2.0, 2.0, 2.0]);
//! ```

use ct_foundation::{CtError, CtResult};
use parking_lot::Mutex;
use std::sync::{Arc, Barrier};

/// 跨进程集合操作接口
pub trait Collective: Send + Sync {
    /// 当前进程号
    fn rank(&self) -> usize;

    /// 组内进程数
    fn size(&self) -> usize;

    /// 栅栏：所有进程到达前任何进程都不能越过
    fn barrier(&self);

    /// 全局最大值归约
    fn max_f64(&self, local: f64) -> f64;

    /// 全局求和归约
    fn sum_f64(&self, local: f64) -> f64;

    /// 全局计数求和
    fn sum_usize(&self, local: usize) -> usize;

    /// 逐元素全局最大值归约（原地）
    ///
    /// 所有 rank 传入的切片长度必须相同。
    fn max_f64_slice(&self, values: &mut [f64]) {
        for v in values.iter_mut() {
            *v = self.max_f64(*v);
        }
    }

    /// 是否为主进程（rank 0）
    fn is_root(&self) -> bool {
        self.rank() == 0
    }
}

// ============================================================
// 单进程实现
// ============================================================

/// 单进程直通实现
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialComm;

impl Collective for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) {}

    fn max_f64(&self, local: f64) -> f64 {
        local
    }

    fn sum_f64(&self, local: f64) -> f64 {
        local
    }

    fn sum_usize(&self, local: usize) -> usize {
        local
    }
}

// ============================================================
// 进程内多 rank 实现
// ============================================================

/// 组内共享状态
struct GroupShared {
    size: usize,
    barrier: Barrier,
    /// 每个 rank 一个槽位，归约时按 rank 顺序折叠
    slots: Mutex<Vec<f64>>,
    counts: Mutex<Vec<u64>>,
}

/// 进程内通信组中的一个 rank
///
/// 归约采用"写槽位 → 栅栏 → 按 rank 顺序折叠 → 栅栏"的两阶段协议，
/// 所有 rank 得到逐位相同的结果。
#[derive(Clone)]
pub struct LocalComm {
    rank: usize,
    shared: Arc<GroupShared>,
}

impl LocalComm {
    fn all_reduce_f64(&self, local: f64, init: f64, op: fn(f64, f64) -> f64) -> f64 {
        self.shared.slots.lock()[self.rank] = local;
        self.shared.barrier.wait();
        let result = self.shared.slots.lock().iter().copied().fold(init, op);
        // 第二道栅栏保证槽位在所有 rank 读完前不会被下一次归约覆盖
        self.shared.barrier.wait();
        result
    }
}

impl std::fmt::Debug for LocalComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalComm")
            .field("rank", &self.rank)
            .field("size", &self.shared.size)
            .finish()
    }
}

impl Collective for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn barrier(&self) {
        self.shared.barrier.wait();
    }

    fn max_f64(&self, local: f64) -> f64 {
        self.all_reduce_f64(local, f64::NEG_INFINITY, f64::max)
    }

    fn sum_f64(&self, local: f64) -> f64 {
        self.all_reduce_f64(local, 0.0, |a, b| a + b)
    }

    fn sum_usize(&self, local: usize) -> usize {
        self.shared.counts.lock()[self.rank] = local as u64;
        self.shared.barrier.wait();
        let total: u64 = self.shared.counts.lock().iter().sum();
        self.shared.barrier.wait();
        total as usize
    }
}

/// 进程内通信组
///
/// 每个 rank 在独立线程上运行同一个闭包，返回值按 rank 顺序收集。
pub struct LocalGroup;

impl LocalGroup {
    /// 创建 `size` 个互相连接的 rank 句柄
    pub fn create(size: usize) -> CtResult<Vec<LocalComm>> {
        if size == 0 {
            return Err(CtError::invalid_input("通信组至少需要一个 rank"));
        }
        let shared = Arc::new(GroupShared {
            size,
            barrier: Barrier::new(size),
            slots: Mutex::new(vec![0.0; size]),
            counts: Mutex::new(vec![0; size]),
        });
        Ok((0..size)
            .map(|rank| LocalComm {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect())
    }

    /// 在 `size` 个线程上运行 `f`，返回各 rank 的结果
    ///
    /// 任一 rank 的 panic 会在汇合时重新抛出。
    pub fn run<T, F>(size: usize, f: F) -> CtResult<Vec<T>>
    where
        T: Send,
        F: Fn(LocalComm) -> T + Sync,
    {
        let comms = Self::create(size)?;
        tracing::debug!("启动进程内通信组: {} ranks", size);

        let results = std::thread::scope(|scope| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|comm| {
                    let f = &f;
                    scope.spawn(move || f(comm))
                })
                .collect();

            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(value) => value,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        });
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_passthrough() {
        let comm = SerialComm;
        assert_eq!(comm.rank(), 0);
        assert_eq!(comm.size(), 1);
        assert!(comm.is_root());
        assert_eq!(comm.max_f64(3.5), 3.5);
        assert_eq!(comm.sum_f64(-1.25), -1.25);
        assert_eq!(comm.sum_usize(17), 17);
    }

    #[test]
    fn test_local_group_max() {
        let results = LocalGroup::run(4, |comm| comm.max_f64((comm.rank() * 10) as f64)).unwrap();
        assert_eq!(results, vec![30.0; 4]);
    }

    #[test]
    fn test_local_group_sum() {
        let results = LocalGroup::run(3, |comm| {
            let s = comm.sum_f64(1.5);
            let c = comm.sum_usize(comm.rank() + 1);
            (s, c)
        })
        .unwrap();
        for (s, c) in results {
            assert!((s - 4.5).abs() < 1e-12);
            assert_eq!(c, 6);
        }
    }

    #[test]
    fn test_local_group_repeated_reductions() {
        // 连续归约不能互相覆盖槽位
        let results = LocalGroup::run(3, |comm| {
            let mut acc = Vec::new();
            for step in 0..20 {
                acc.push(comm.max_f64((comm.rank() + step) as f64));
            }
            acc
        })
        .unwrap();
        for r in &results {
            for (step, v) in r.iter().enumerate() {
                assert_eq!(*v, (2 + step) as f64);
            }
        }
    }

    #[test]
    fn test_local_group_max_slice() {
        let results = LocalGroup::run(3, |comm| {
            let r = comm.rank() as f64;
            let mut v = [r, -r, 1.0];
            comm.max_f64_slice(&mut v);
            v
        })
        .unwrap();
        assert!(results.iter().all(|v| *v == [2.0, 0.0, 1.0]));
    }

    #[test]
    fn test_local_group_root() {
        let roots = LocalGroup::run(2, |comm| {
            comm.barrier();
            comm.is_root()
        })
        .unwrap();
        assert_eq!(roots, vec![true, false]);
    }

    #[test]
    fn test_empty_group_rejected() {
        assert!(LocalGroup::create(0).is_err());
    }
}
