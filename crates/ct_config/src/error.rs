// crates/ct_config/src/error.rs

//! 配置层错误类型

use ct_foundation::CtError;

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 不支持的文件格式
    #[error("不支持的配置格式: {0}（仅支持 .json / .yaml / .yml）")]
    UnsupportedFormat(String),

    /// 无效值
    #[error("无效值 '{key}': {value} - {reason}")]
    InvalidValue {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },

    /// 由配置构建物理对象失败
    #[error("构建 '{what}' 失败: {source}")]
    Build {
        /// 构建对象
        what: String,
        /// 底层错误
        #[source]
        source: CtError,
    },
}

impl ConfigError {
    /// 构造无效值错误
    pub fn invalid(key: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// 包装构建错误
    pub fn build(what: impl Into<String>, source: CtError) -> Self {
        Self::Build {
            what: what.into(),
            source,
        }
    }
}
