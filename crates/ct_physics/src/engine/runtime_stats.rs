// crates/ct_physics/src/engine/runtime_stats.rs

//! 每步运行统计与诊断日志
//!
//! [`StabilityControl::advance`] 在每个时间步结束时调用，顺序固定：
//!
//! 1. 全局稳定性统计（两次 max 归约）
//! 2. 实际 Courant 数 `C = max_courant · tsp`，局部 Reynolds 数 `Re_l = max_flow_scale · Re`
//! 3. 全局屏障，然后仅 0 号进程向诊断日志追加一行；写入结果随后以一次
//!    max 归约广播，写失败时所有进程一起返回错误
//! 4. 按控制参数更新时间步长
//!
//! 诊断日志是纯文本，每行四列：`t    tsp     C     Re_l`。数值按 `{:?}`
//! 输出（最短往返表示，整数值带 `.0`）。

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use ct_foundation::{CtError, CtResult};
use ct_runtime::Collective;
use serde::{Deserialize, Serialize};

use super::clock::ClockSnapshot;
use super::stability::{StabilityMonitor, StabilityStats};
use super::timestep::TimestepController;
use crate::fields::nodal::VectorField;
use crate::mesh::length_scale::VertexLengthScale;

/// 单步运行报告
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// 当前时间
    pub time: f64,
    /// 当前心动周期编号
    pub cycle: u64,
    /// 本步使用的时间步长
    pub tsp_used: f64,
    /// 下一步的时间步长
    pub tsp_next: f64,
    /// 实际 Courant 数
    pub courant: f64,
    /// 局部 Reynolds 数
    pub local_reynolds: f64,
    /// 全局稳定性统计
    pub stats: StabilityStats,
}

/// 诊断日志写入器
#[derive(Debug)]
pub struct DiagnosticLog<W: Write> {
    writer: W,
    lines: usize,
}

impl DiagnosticLog<BufWriter<File>> {
    /// 创建（覆盖）日志文件
    pub fn create(path: impl AsRef<Path>) -> CtResult<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| CtError::io(format!("无法创建诊断日志 {}", path.display()), e))?;
        Ok(Self::new(BufWriter::new(file)))
    }

    /// 以追加方式打开日志文件（续算）
    pub fn append(path: impl AsRef<Path>) -> CtResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| CtError::io(format!("无法打开诊断日志 {}", path.display()), e))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> DiagnosticLog<W> {
    /// 包装任意写入器
    pub fn new(writer: W) -> Self {
        Self { writer, lines: 0 }
    }

    /// 已写入行数
    #[inline]
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// 追加一行 `t    tsp     C     Re_l`
    pub fn write_line(&mut self, time: f64, tsp: f64, courant: f64, local_reynolds: f64) -> CtResult<()> {
        writeln!(
            self.writer,
            "{:?}    {:?}     {:?}     {:?}",
            time, tsp, courant, local_reynolds
        )?;
        self.lines += 1;
        Ok(())
    }

    /// 刷新缓冲
    pub fn flush(&mut self) -> CtResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// 取回底层写入器
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// 稳定性控制：统计、诊断输出与步长更新
#[derive(Debug)]
pub struct StabilityControl<W: Write = BufWriter<File>> {
    monitor: StabilityMonitor,
    controller: TimestepController,
    reynolds: f64,
    log: Option<DiagnosticLog<W>>,
}

impl StabilityControl {
    /// 创建不带诊断日志的控制器
    pub fn new(controller: TimestepController, reynolds: f64) -> Self {
        Self {
            monitor: StabilityMonitor::new(),
            controller,
            reynolds,
            log: None,
        }
    }
}

impl<W: Write> StabilityControl<W> {
    /// 设置诊断日志（只在 0 号进程写入）
    pub fn with_log<V: Write>(self, log: DiagnosticLog<V>) -> StabilityControl<V> {
        StabilityControl {
            monitor: self.monitor,
            controller: self.controller,
            reynolds: self.reynolds,
            log: Some(log),
        }
    }

    /// 替换稳定性监控器
    pub fn with_monitor(mut self, monitor: StabilityMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    /// 时间步长控制器
    #[inline]
    pub fn controller(&self) -> &TimestepController {
        &self.controller
    }

    /// Reynolds 数
    #[inline]
    pub fn reynolds(&self) -> f64 {
        self.reynolds
    }

    /// 诊断日志
    pub fn log(&self) -> Option<&DiagnosticLog<W>> {
        self.log.as_ref()
    }

    /// 取走诊断日志
    pub fn take_log(&mut self) -> Option<DiagnosticLog<W>> {
        self.log.take()
    }

    /// 刷新诊断日志
    pub fn flush(&mut self) -> CtResult<()> {
        match self.log.as_mut() {
            Some(log) => log.flush(),
            None => Ok(()),
        }
    }

    /// 完成一步的稳定性控制，返回报告（含下一步步长）
    ///
    /// 所有进程必须在同一步调用。0 号进程写日志失败时，所有进程都返回错误。
    pub fn advance(
        &mut self,
        clock: ClockSnapshot,
        tsp: f64,
        velocity: &VectorField,
        h: &VertexLengthScale,
        comm: &dyn Collective,
    ) -> CtResult<StepReport> {
        let stats = self.monitor.compute(velocity, h, comm)?;
        let courant = stats.max_courant * tsp;
        let local_reynolds = stats.max_flow_scale * self.reynolds;

        comm.barrier();
        let written = match self.log.as_mut() {
            Some(log) if comm.is_root() => log.write_line(clock.time, tsp, courant, local_reynolds),
            _ => Ok(()),
        };
        let failed = comm.max_f64(if written.is_err() { 1.0 } else { 0.0 });
        written?;
        if failed > 0.0 {
            return Err(CtError::io(
                format!("0 号进程写诊断日志失败 (rank {})", comm.rank()),
                io::Error::new(io::ErrorKind::Other, "诊断日志写入失败"),
            ));
        }

        let tsp_next = self.controller.update(tsp, stats.max_courant)?;
        if tsp_next != tsp {
            tracing::debug!("时间步长更新: {} -> {} (C = {:.4})", tsp, tsp_next, courant);
        }

        Ok(StepReport {
            time: clock.time,
            cycle: clock.cycle,
            tsp_used: tsp,
            tsp_next,
            courant,
            local_reynolds,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::timestep::TimeControl;
    use ct_runtime::SerialComm;

    fn uniform_flow(n: usize, speed: f64) -> (VectorField, VertexLengthScale) {
        let u = VectorField::from_fn("u", n, |_| [speed, 0.0, 0.0]);
        let h = VertexLengthScale::new(vec![0.5; n]).unwrap();
        (u, h)
    }

    #[test]
    fn test_advance_report() {
        let controller = TimestepController::new(TimeControl {
            variable_timestep: true,
            target_courant: 0.5,
        })
        .unwrap();
        let mut control = StabilityControl::new(controller, 100.0);
        let (u, h) = uniform_flow(4, 1.0);

        let report = control
            .advance(ClockSnapshot::new(0.1, 0), 0.01, &u, &h, &SerialComm)
            .unwrap();
        // max |u_x|/h = 2
        assert!((report.stats.max_courant - 2.0).abs() < 1e-12);
        assert!((report.courant - 0.02).abs() < 1e-12);
        assert!((report.local_reynolds - 50.0).abs() < 1e-12);
        assert!((report.tsp_next - 0.25).abs() < 1e-15);
        assert_eq!(report.tsp_used, 0.01);
    }

    #[test]
    fn test_diagnostic_line_format() {
        let mut control = StabilityControl::new(TimestepController::fixed(), 10.0)
            .with_log(DiagnosticLog::new(Vec::new()));
        let (u, h) = uniform_flow(2, 1.0);

        control
            .advance(ClockSnapshot::new(0.5, 0), 0.25, &u, &h, &SerialComm)
            .unwrap();
        control
            .advance(ClockSnapshot::new(0.75, 0), 0.25, &u, &h, &SerialComm)
            .unwrap();

        let log = control.take_log().unwrap();
        assert_eq!(log.lines(), 2);
        let text = String::from_utf8(log.into_inner()).unwrap();
        assert_eq!(text, "0.5    0.25     0.5     5.0\n0.75    0.25     0.5     5.0\n");
    }

    /// 总是写失败的写入器
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_log_write_error_propagates() {
        let mut control = StabilityControl::new(TimestepController::fixed(), 1.0)
            .with_log(DiagnosticLog::new(BrokenPipe));
        let (u, h) = uniform_flow(2, 1.0);
        let err = control
            .advance(ClockSnapshot::default(), 0.01, &u, &h, &SerialComm)
            .unwrap_err();
        assert!(matches!(err, CtError::Io { .. }));
        assert_eq!(control.log().unwrap().lines(), 0);
    }

    #[test]
    fn test_non_finite_values_in_log() {
        let mut log = DiagnosticLog::new(Vec::new());
        log.write_line(1.0, 0.5, f64::INFINITY, f64::NAN).unwrap();
        let text = String::from_utf8(log.into_inner()).unwrap();
        assert_eq!(text, "1.0    0.5     inf     NaN\n");
    }

    #[test]
    fn test_fixed_step_unchanged() {
        let mut control = StabilityControl::new(TimestepController::fixed(), 1.0);
        let (u, h) = uniform_flow(3, 10.0);
        let report = control
            .advance(ClockSnapshot::default(), 0.003, &u, &h, &SerialComm)
            .unwrap();
        assert_eq!(report.tsp_next, 0.003);
    }

    #[test]
    fn test_create_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime_stats.txt");
        {
            let mut log = DiagnosticLog::create(&path).unwrap();
            log.write_line(0.0, 0.001, 0.1, 2.0).unwrap();
            log.flush().unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "0.0    0.001     0.1     2.0\n");

        let mut log = DiagnosticLog::append(&path).unwrap();
        log.write_line(0.001, 0.001, 0.1, 2.0).unwrap();
        drop(log);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
