// crates/ct_physics/src/numerics/csr.rs

//! 压缩稀疏行（CSR）矩阵
//!
//! 压力算子的最小存储形式。组装由外部引擎完成，这里只需要：
//! - 通过 [`CsrBuilder`] 按 (行, 列) 累加构建
//! - 矩阵-向量乘法（用于检验零空间）
//!
//! # 格式说明
//!
//! - `row_ptr`: 长度 n_rows + 1，row_ptr[i] 是第 i 行第一个非零元的位置
//! - `col_idx`: 列索引，每行内升序
//! - `values`: 非零元值

use std::collections::BTreeMap;

use ct_foundation::{CtError, CtResult};

/// CSR 格式稀疏矩阵
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// 非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// 是否为方阵
    #[inline]
    pub fn is_square(&self) -> bool {
        self.n_rows == self.n_cols
    }

    /// 读取 (row, col)，不存在时返回 0
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        match self.col_idx[start..end].binary_search(&col) {
            Ok(k) => self.values[start + k],
            Err(_) => 0.0,
        }
    }

    /// y = A x
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) -> CtResult<()> {
        CtError::check_size("x", self.n_cols, x.len())?;
        CtError::check_size("y", self.n_rows, y.len())?;
        for (row, yi) in y.iter_mut().enumerate() {
            let start = self.row_ptr[row];
            let end = self.row_ptr[row + 1];
            *yi = self.col_idx[start..end]
                .iter()
                .zip(&self.values[start..end])
                .map(|(&c, &v)| v * x[c])
                .sum();
        }
        Ok(())
    }

    /// 各行元素之和
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.n_rows)
            .map(|row| self.values[self.row_ptr[row]..self.row_ptr[row + 1]].iter().sum())
            .collect()
    }
}

/// CSR 构建器，重复位置的值累加
#[derive(Debug, Clone)]
pub struct CsrBuilder {
    n_cols: usize,
    rows: Vec<BTreeMap<usize, f64>>,
}

impl CsrBuilder {
    /// 创建 n×n 构建器
    pub fn new_square(n: usize) -> Self {
        Self::new(n, n)
    }

    /// 创建 n_rows×n_cols 构建器
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_cols,
            rows: vec![BTreeMap::new(); n_rows],
        }
    }

    /// 累加 (row, col) 处的值
    pub fn add(&mut self, row: usize, col: usize, value: f64) -> CtResult<()> {
        if row >= self.rows.len() || col >= self.n_cols {
            return Err(CtError::invalid_input(format!(
                "矩阵位置 ({}, {}) 超出 {}x{}",
                row,
                col,
                self.rows.len(),
                self.n_cols
            )));
        }
        *self.rows[row].entry(col).or_insert(0.0) += value;
        Ok(())
    }

    /// 构建 CSR 矩阵
    pub fn build(self) -> CsrMatrix {
        let n_rows = self.rows.len();
        let nnz = self.rows.iter().map(|r| r.len()).sum();
        let mut row_ptr = Vec::with_capacity(n_rows + 1);
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        row_ptr.push(0);
        for row in self.rows {
            for (c, v) in row {
                col_idx.push(c);
                values.push(v);
            }
            row_ptr.push(col_idx.len());
        }

        CsrMatrix {
            n_rows,
            n_cols: self.n_cols,
            row_ptr,
            col_idx,
            values,
        }
    }
}
