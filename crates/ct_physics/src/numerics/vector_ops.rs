// crates/ct_physics/src/numerics/vector_ops.rs

//! 本地向量运算
//!
//! 仅作用于本进程持有的分量；需要全局结果时由调用方再做集合归约。

/// 点积 x·y
#[inline]
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y.iter()).map(|(a, b)| a * b).sum()
}

/// 平方和 ||x||²
#[inline]
pub fn norm2_squared(x: &[f64]) -> f64 {
    x.iter().map(|v| v * v).sum()
}

/// y = alpha * x + y
#[inline]
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, xi) in y.iter_mut().zip(x.iter()) {
        *yi += alpha * xi;
    }
}

/// x = alpha * x
#[inline]
pub fn scale(alpha: f64, x: &mut [f64]) {
    for xi in x.iter_mut() {
        *xi *= alpha;
    }
}
