//! 有界采样
//!
//! - 内存缓冲：取前 `sample_size` 字节。
//! - 文件：不超过预算则整读；否则按 头部 / 中部 / 尾部 三段拼接，总长不超过预算。
//! - 任何读取失败都退化为空样本，不向上抛错。
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::bom::has_wide_bom;

/// 默认采样预算（字节）
pub const DEFAULT_SAMPLE_SIZE: usize = 8192;
/// 头部与中部的上限（字节）
const HEAD_MAX: usize = 4096;
const MIDDLE_MAX: usize = 2048;

/// 检测输入：内存字节或文件路径
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    Bytes(&'a [u8]),
    Path(&'a Path),
}

impl<'a> From<&'a [u8]> for Source<'a> {
    fn from(b: &'a [u8]) -> Self {
        Source::Bytes(b)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Source<'a> {
    fn from(b: &'a [u8; N]) -> Self {
        Source::Bytes(b)
    }
}

impl<'a> From<&'a Vec<u8>> for Source<'a> {
    fn from(b: &'a Vec<u8>) -> Self {
        Source::Bytes(b)
    }
}

impl<'a> From<&'a Path> for Source<'a> {
    fn from(p: &'a Path) -> Self {
        Source::Path(p)
    }
}

impl<'a> From<&'a PathBuf> for Source<'a> {
    fn from(p: &'a PathBuf) -> Self {
        Source::Path(p)
    }
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(p: &'a str) -> Self {
        Source::Path(Path::new(p))
    }
}

impl<'a> From<&'a String> for Source<'a> {
    fn from(p: &'a String) -> Self {
        Source::Path(Path::new(p))
    }
}

/// 0 视为“使用默认预算”
pub(crate) fn effective_sample_size(sample_size: usize) -> usize {
    if sample_size == 0 { DEFAULT_SAMPLE_SIZE } else { sample_size }
}

/// 取得有界样本；不可读的路径返回空样本
pub fn sample(source: Source<'_>, sample_size: usize) -> Cow<'_, [u8]> {
    let sample_size = effective_sample_size(sample_size);
    match source {
        Source::Bytes(b) => Cow::Borrowed(&b[..b.len().min(sample_size)]),
        Source::Path(path) => match sample_file(path, sample_size) {
            Ok(buf) => Cow::Owned(buf),
            Err(err) => {
                debug!(?path, %err, "sample unreadable, treating as empty");
                Cow::Owned(Vec::new())
            }
        },
    }
}

/// 三段采样计划：各段长度与起始偏移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Zones {
    head: usize,
    middle: usize,
    middle_offset: u64,
    tail: usize,
    tail_offset: u64,
}

impl Zones {
    /// 各段长度与偏移取偶数，纯双字节文本的字节对不会被切开
    fn plan(file_size: u64, sample_size: usize) -> Self {
        let head = (sample_size / 2).min(HEAD_MAX) & !1;
        let middle = (sample_size * 3 / 10).min(MIDDLE_MAX) & !1;
        let mut tail = sample_size.saturating_sub(head + middle);
        let mut tail_offset = file_size.saturating_sub(tail as u64);
        if tail_offset % 2 == 1 && tail > 0 {
            tail_offset += 1;
            tail -= 1;
        }
        Self {
            head,
            middle,
            // 中部以文件中点为中心
            middle_offset: (file_size.saturating_sub(middle as u64) / 2) & !1,
            tail,
            tail_offset,
        }
    }
}

fn sample_file(path: &Path, sample_size: usize) -> io::Result<Vec<u8>> {
    if !fs::metadata(path)?.is_file() {
        return Ok(Vec::new());
    }
    let mut file = File::open(path)?;
    let file_size = file.seek(SeekFrom::End(0))?;
    if file_size <= sample_size as u64 {
        file.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::with_capacity(file_size as usize);
        file.read_to_end(&mut buf)?;
        return Ok(buf);
    }

    let zones = Zones::plan(file_size, sample_size);
    let head = read_at(&mut file, 0, zones.head)?;
    let middle = read_at(&mut file, zones.middle_offset, zones.middle)?;
    let tail = read_at(&mut file, zones.tail_offset, zones.tail)?;
    debug!(?path, file_size, ?zones, "sampled head/middle/tail");
    Ok(stitch(&head, &middle, &tail, sample_size))
}

fn read_at(file: &mut File, offset: u64, len: usize) -> io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::with_capacity(len);
    file.by_ref().take(len as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// 拼接三段。头部不带宽字符 BOM 时对齐各段接缝，避免切断多字节字符。
fn stitch(head: &[u8], middle: &[u8], tail: &[u8], sample_size: usize) -> Vec<u8> {
    let (head, middle, tail) = if has_wide_bom(head) {
        (head, middle, tail)
    } else {
        (align_end(head), align_end(align_start(middle)), align_start(tail))
    };
    let mut out = Vec::with_capacity(head.len() + middle.len() + tail.len());
    out.extend_from_slice(head);
    out.extend_from_slice(middle);
    out.extend_from_slice(tail);
    out.truncate(sample_size);
    out
}

/// 0x30 以下的 ASCII 字节在所有 ASCII 兼容的多字节编码里都不会是后续字节
/// （GB18030 四字节形式的第二字节占用 0x30–0x39）
fn is_delimiter(b: u8) -> bool {
    b < 0x30
}

fn is_continuation(b: u8) -> bool {
    (0x80..=0xBF).contains(&b)
}

/// 段首对齐：换行之后 > 分隔字节处 > UTF-8 字符起点；都不适用时保持原样，靠偶数偏移保住双字节对
fn align_start(b: &[u8]) -> &[u8] {
    if let Some(i) = b.iter().position(|&x| x == b'\n') {
        return &b[i + 1..];
    }
    if let Some(i) = b.iter().position(|&x| is_delimiter(x)) {
        return &b[i..];
    }
    let skip = b.iter().take(3).take_while(|&&x| is_continuation(x)).count();
    match std::str::from_utf8(&b[skip..]) {
        Ok(_) => &b[skip..],
        Err(e) if e.error_len().is_none() => &b[skip..],
        Err(_) => b,
    }
}

/// 段尾对齐：到最后一个换行 > 最后一个分隔字节 > 去掉不完整的 UTF-8 尾部序列
fn align_end(b: &[u8]) -> &[u8] {
    if let Some(i) = b.iter().rposition(|&x| x == b'\n') {
        return &b[..=i];
    }
    if let Some(i) = b.iter().rposition(|&x| is_delimiter(x)) {
        return &b[..=i];
    }
    match std::str::from_utf8(b) {
        Err(e) if e.error_len().is_none() => &b[..e.valid_up_to()],
        _ => b,
    }
}
