//! 启发式文本编码检测库
//!
//! 设计要点：
//! - 只看有界样本（默认 8192 字节；大文件按 头 / 中 / 尾 三段采样），内存与 I/O 与文件大小无关。
//! - BOM 命中即返回；否则对注册表中每个编码做严格解码，按文字特征判定并打分，取最高分。
//! - 最高分未超过阈值时走回退链；纯 ASCII 直接返回调用方给定的默认值。
//! - 注册表进程内只构建一次且只读，检测函数无共享可变状态，可并发调用。

mod bom;
mod codec;
mod detector;
mod error;
mod heuristics;
mod options;
mod registry;
mod sampler;
mod scan;

pub use bom::detect_bom;
pub use codec::{decode, is_known};
pub use detector::{detect_encoding, read_to_string, Detection, Detector, Method};
pub use error::DetectError;
pub use options::{DetectOptions, ScanOptions, ScanStats, DEFAULT_ENCODING, DEFAULT_THRESHOLD};
pub use registry::{canonical_name, registry};
pub use sampler::{sample, Source, DEFAULT_SAMPLE_SIZE};
pub use scan::{detect_tree_and_write, ScanRecord};
