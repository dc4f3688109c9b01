//! 检测主流程：采样 → BOM → 候选评估 → 择优 → 回退
use std::path::Path;

use serde::Serialize;
use tracing::{debug, trace};

use crate::bom::detect_bom;
use crate::codec::{self, Decoded};
use crate::error::DetectError;
use crate::heuristics::{Rule, ScriptStats};
use crate::options::DetectOptions;
use crate::registry::{canonical_name, passes_bom_gate, registry};
use crate::sampler::{sample, Source};

/// 回退链：依次尝试，latin_1 可解码任意字节，因此链条必然终止
const FALLBACK_CHAIN: &[&str] = &["utf_8", "latin_1", "cp1252", "gbk", "big5"];

/// 结果来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// BOM 快速通道
    Bom,
    /// 候选得分超过阈值
    Candidate,
    /// 回退链
    Fallback,
    /// 调用方给定的默认值
    Default,
}

/// 一次检测的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub encoding: String,
    pub method: Method,
    /// 仅 `Method::Candidate` 时有值。Shift_JIS 从 GB 候选手中接管时为其自身得分，可能不超过阈值
    pub score: Option<u32>,
    pub sample_len: usize,
}

impl Detection {
    fn is_confident(&self) -> bool {
        matches!(self.method, Method::Bom | Method::Candidate)
    }
}

/// 单次调用内的候选（不跨调用保留）
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub(crate) name: &'static str,
    pub(crate) stats: ScriptStats,
    pub(crate) score: u32,
}

/// 对注册表中每个编码尝试解码、判定并打分；解码失败或判定不通过的直接跳过
pub(crate) fn evaluate_candidates(sample: &[u8]) -> Vec<Candidate> {
    registry().iter().filter_map(|name| evaluate(name.as_str(), sample)).collect()
}

fn evaluate(name: &'static str, sample: &[u8]) -> Option<Candidate> {
    if !passes_bom_gate(name, sample) {
        return None;
    }
    let text = match codec::resolve(name)?.decode(sample) {
        Decoded::Text(text) => text,
        Decoded::Failed => return None,
    };
    let rule = Rule::for_encoding(name);
    let stats = ScriptStats::collect(&text, rule);
    if !rule.admits(&stats) {
        return None;
    }
    let score = rule.score(&stats, sample);
    trace!(encoding = name, score, han = stats.han_count, kana = stats.kana_count, "candidate");
    Some(Candidate { name, stats, score })
}

/// 取最高分；同分时注册表中靠前者胜出。得分须严格大于阈值
pub(crate) fn select(candidates: &[Candidate], threshold: u32) -> Option<&Candidate> {
    let mut best: Option<&Candidate> = None;
    for c in candidates {
        if best.map_or(true, |b| c.score > b.score) {
            best = Some(c);
        }
    }
    let best = best.filter(|c| c.score > threshold)?;
    Some(shift_jis_over_gb(candidates, best).unwrap_or(best))
}

/// Shift_JIS 的假名字节对按 GBK 也能解码（得到生僻汉字），GB 族的字节加分会压过 Shift_JIS。
/// GB 候选胜出、其文本含假名字节对，且 Shift_JIS 解码干净（有假名、无半角片假名）时改选 Shift_JIS
fn shift_jis_over_gb<'a>(candidates: &'a [Candidate], best: &Candidate) -> Option<&'a Candidate> {
    if !matches!(Rule::for_encoding(best.name), Rule::Gb { .. }) || best.stats.kana_pair_count == 0 {
        return None;
    }
    candidates
        .iter()
        .find(|c| Rule::for_encoding(c.name) == Rule::ShiftJis && c.stats.halfwidth_kana_count == 0)
}

/// 回退：纯 ASCII 直接返回默认值，否则取回退链中第一个能解码的编码
fn fallback(sample: &[u8], default: &str) -> (String, Method) {
    if sample.is_ascii() {
        return (default.to_string(), Method::Default);
    }
    FALLBACK_CHAIN
        .iter()
        .find(|name| codec::resolve(name).is_some_and(|c| c.decode(sample).is_text()))
        .map(|name| (canonical_name(name).to_string(), Method::Fallback))
        .unwrap_or_else(|| (default.to_string(), Method::Default))
}

/// 编码检测器：持有选项，本身无可变状态，可跨线程共享
#[derive(Debug, Clone, Default)]
pub struct Detector {
    options: DetectOptions,
}

impl Detector {
    pub fn new(options: DetectOptions) -> Self {
        Self { options }
    }

    /// 检测字节或文件的编码
    pub fn detect<'a>(&self, source: impl Into<Source<'a>>) -> Detection {
        let source = source.into();
        let sample_size = self.options.sample_size();
        let first = self.detect_sample(&sample(source, sample_size));
        match self.options.retry_size {
            Some(retry) if retry > sample_size && first.sample_len > 0 && !first.is_confident() => {
                let second = self.detect_sample(&sample(source, retry));
                debug!(retry, encoding = %second.encoding, method = ?second.method, "retried with larger sample");
                if second.is_confident() { second } else { first }
            }
            _ => first,
        }
    }

    /// 在已取得的样本上检测
    pub fn detect_sample(&self, sample: &[u8]) -> Detection {
        let default = self.options.default_encoding.as_str();
        let sample_len = sample.len();
        if sample.is_empty() {
            return Detection { encoding: default.to_string(), method: Method::Default, score: None, sample_len };
        }
        if self.options.bom_fast_path {
            if let Some(name) = detect_bom(sample) {
                debug!(encoding = name, "bom matched");
                return Detection { encoding: name.to_string(), method: Method::Bom, score: None, sample_len };
            }
        }

        let candidates = evaluate_candidates(sample);
        if let Some(best) = select(&candidates, self.options.threshold) {
            debug!(
                encoding = best.name,
                score = best.score,
                han = best.stats.han_count,
                candidates = candidates.len(),
                "candidate accepted"
            );
            return Detection {
                encoding: canonical_name(best.name).to_string(),
                method: Method::Candidate,
                score: Some(best.score),
                sample_len,
            };
        }

        let (encoding, method) = fallback(sample, default);
        debug!(%encoding, ?method, candidates = candidates.len(), "no candidate above threshold");
        Detection { encoding, method, score: None, sample_len }
    }

    /// 检测文件编码并将整个文件解码为 UTF-8 字符串
    pub fn read_to_string(&self, path: &Path) -> Result<(String, Detection), DetectError> {
        let bytes = std::fs::read(path).map_err(|source| DetectError::Io { path: path.to_path_buf(), source })?;
        let detection = self.detect(path);
        let text = codec::decode(&bytes, &detection.encoding).ok_or_else(|| DetectError::Undecodable {
            path: path.to_path_buf(),
            encoding: detection.encoding.clone(),
        })?;
        let text = if text.starts_with('\u{FEFF}') { text['\u{FEFF}'.len_utf8()..].to_string() } else { text };
        Ok((text, detection))
    }
}

/// 检测入口：`sample_size` 为 0 时使用默认预算；总会返回一个编码名
pub fn detect_encoding<'a>(source: impl Into<Source<'a>>, sample_size: usize, default: &str) -> String {
    let options = DetectOptions { sample_size, default_encoding: default.to_string(), ..DetectOptions::default() };
    Detector::new(options).detect(source).encoding
}

/// 以默认选项检测并解码整个文件
pub fn read_to_string(path: &Path, options: &DetectOptions) -> Result<(String, Detection), DetectError> {
    Detector::new(options.clone()).read_to_string(path)
}
