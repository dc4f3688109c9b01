//! 错误类型（检测本身不会失败，仅配置加载与整文件解码会用到）
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{path} is not valid {encoding}")]
    Undecodable { path: PathBuf, encoding: String },
}
