//! 检测选项、批量扫描选项与统计信息（模块）
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DetectError;
use crate::sampler::{effective_sample_size, DEFAULT_SAMPLE_SIZE};

/// 默认置信阈值：得分须严格大于该值
pub const DEFAULT_THRESHOLD: u32 = 30;
/// 默认回退编码
pub const DEFAULT_ENCODING: &str = "utf-8";

/// 检测选项（可由 TOML 加载，缺省字段取默认值）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectOptions {
    /// 采样预算（字节）；0 表示使用默认 8192
    pub sample_size: usize,
    /// 空样本 / 纯 ASCII 时返回的编码
    pub default_encoding: String,
    /// 候选得分须严格大于该阈值才直接采用
    pub threshold: u32,
    /// 命中 BOM 时跳过其余流程
    pub bom_fast_path: bool,
    /// 首轮没有可信候选时，用更大的预算再采样一次；None 表示不重试
    pub retry_size: Option<usize>,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            default_encoding: DEFAULT_ENCODING.to_string(),
            threshold: DEFAULT_THRESHOLD,
            bom_fast_path: true,
            retry_size: None,
        }
    }
}

impl DetectOptions {
    /// 从 TOML 文件加载
    pub fn from_toml_file(path: &Path) -> Result<Self, DetectError> {
        let txt = std::fs::read_to_string(path).map_err(|source| DetectError::Io { path: path.to_path_buf(), source })?;
        toml::from_str(&txt).map_err(|source| DetectError::Config { path: path.to_path_buf(), source })
    }

    /// 归一化后的采样预算
    pub fn sample_size(&self) -> usize {
        effective_sample_size(self.sample_size)
    }
}

/// 批量扫描选项
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub detect: DetectOptions,
    /// 最大文件大小（字节）；超过则跳过
    pub max_file_size: Option<u64>,
    /// 目录遍历深度：None 表示不限
    pub max_depth: Option<usize>,
    /// 线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
}

/// 扫描统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone)]
pub struct ScanStats {
    pub files_seen: usize,
    pub files_detected: usize,
    pub outputs_written: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_toml_keeps_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "sample_size = 4096\ndefault_encoding = \"gbk\"").unwrap();
        let opts = DetectOptions::from_toml_file(f.path()).unwrap();
        assert_eq!(opts.sample_size, 4096);
        assert_eq!(opts.default_encoding, "gbk");
        assert_eq!(opts.threshold, DEFAULT_THRESHOLD);
        assert!(opts.bom_fast_path);
        assert_eq!(opts.retry_size, None);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "threshold = \"high\"").unwrap();
        assert!(matches!(DetectOptions::from_toml_file(f.path()), Err(DetectError::Config { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = DetectOptions::from_toml_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, DetectError::Io { .. }));
    }

    #[test]
    fn zero_sample_size_means_default() {
        let opts = DetectOptions { sample_size: 0, ..Default::default() };
        assert_eq!(opts.sample_size(), DEFAULT_SAMPLE_SIZE);
    }
}
