//! 编码名解析与严格解码
//!
//! - 主体解码交给 `encoding_rs`（WHATWG 编码表），一律使用“无替换”模式：任一非法序列即判失败。
//! - `encoding_rs` 缺少的编码（ascii / latin_1 / utf_32 / utf_8_sig / 带 BOM 嗅探的 utf_16）由本模块原生实现。
//! - 传统双字节编码在解码前先按其历史字节范围做结构校验，避免 WHATWG 超集接受经典编解码器会拒绝的字节。
use std::borrow::Cow;

use encoding_rs::{
    Encoding, BIG5, EUC_JP, EUC_KR, GB18030, GBK, ISO_2022_JP, KOI8_R, KOI8_U, MACINTOSH, REPLACEMENT, SHIFT_JIS,
    UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252,
};

/// 一次解码尝试的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded<'a> {
    Text(Cow<'a, str>),
    Failed,
}

impl<'a> Decoded<'a> {
    pub fn is_text(&self) -> bool {
        matches!(self, Decoded::Text(_))
    }

    pub fn into_text(self) -> Option<Cow<'a, str>> {
        match self {
            Decoded::Text(t) => Some(t),
            Decoded::Failed => None,
        }
    }
}

impl<'a> From<Option<Cow<'a, str>>> for Decoded<'a> {
    fn from(v: Option<Cow<'a, str>>) -> Self {
        v.map_or(Decoded::Failed, Decoded::Text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endian {
    Little,
    Big,
}

/// 多字节编码的字节结构：ASCII 之外允许的单字节、前导字节与后续字节范围（闭区间）
#[derive(Debug)]
pub(crate) struct ByteProfile {
    single: &'static [(u8, u8)],
    lead: &'static [(u8, u8)],
    trail: &'static [(u8, u8)],
}

impl ByteProfile {
    fn admits(&self, bytes: &[u8]) -> bool {
        let mut i = 0usize;
        while i < bytes.len() {
            let b = bytes[i];
            if b < 0x80 || in_ranges(self.single, b) {
                i += 1;
                continue;
            }
            if !in_ranges(self.lead, b) {
                return false;
            }
            match bytes.get(i + 1) {
                Some(&t) if in_ranges(self.trail, t) => i += 2,
                _ => return false,
            }
        }
        true
    }
}

fn in_ranges(ranges: &[(u8, u8)], b: u8) -> bool {
    ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(&b))
}

// GB2312（EUC-CN）：仅 A1–F7 区
static GB2312_BYTES: ByteProfile = ByteProfile { single: &[], lead: &[(0xA1, 0xF7)], trail: &[(0xA1, 0xFE)] };
// GBK：仅双字节，排除 GB18030 四字节形式（后续字节 0x30–0x39）
static GBK_BYTES: ByteProfile = ByteProfile { single: &[], lead: &[(0x81, 0xFE)], trail: &[(0x40, 0x7E), (0x80, 0xFE)] };
// Big5：不含 HKSCS 扩展的 0x81–0xA0 前导区
static BIG5_BYTES: ByteProfile = ByteProfile { single: &[], lead: &[(0xA1, 0xF9)], trail: &[(0x40, 0x7E), (0xA1, 0xFE)] };
// EUC-KR：KS X 1001 本体，不含 UHC 扩展
static EUC_KR_BYTES: ByteProfile = ByteProfile { single: &[], lead: &[(0xA1, 0xFE)], trail: &[(0xA1, 0xFE)] };
// Shift_JIS：JIS X 0208 + 半角片假名，不含 F0–FC 用户区
static SHIFT_JIS_BYTES: ByteProfile = ByteProfile {
    single: &[(0xA1, 0xDF)],
    lead: &[(0x81, 0x9F), (0xE0, 0xEF)],
    trail: &[(0x40, 0x7E), (0x80, 0xFC)],
};
// cp1252：0x81/0x8D/0x8F/0x90/0x9D 未定义
static CP1252_BYTES: ByteProfile = ByteProfile {
    single: &[(0x80, 0x80), (0x82, 0x8C), (0x8E, 0x8E), (0x91, 0x9C), (0x9E, 0xFF)],
    lead: &[],
    trail: &[],
};

/// 已解析的编解码器
#[derive(Debug, Clone, Copy)]
pub(crate) enum Codec {
    Table { encoding: &'static Encoding, profile: Option<&'static ByteProfile> },
    Utf8Sig,
    Utf16Sniff,
    /// None 表示按 BOM 判断字节序
    Utf32(Option<Endian>),
    Ascii,
    Latin1,
}

impl Codec {
    fn table(encoding: &'static Encoding) -> Self {
        Codec::Table { encoding, profile: None }
    }

    fn narrowed(encoding: &'static Encoding, profile: &'static ByteProfile) -> Self {
        Codec::Table { encoding, profile: Some(profile) }
    }

    /// 底层 `encoding_rs` 编码（原生解码器返回 None）
    pub(crate) fn encoding(&self) -> Option<&'static Encoding> {
        match *self {
            Codec::Table { encoding, .. } => Some(encoding),
            _ => None,
        }
    }

    /// 对整段样本做严格解码
    pub(crate) fn decode<'a>(&self, bytes: &'a [u8]) -> Decoded<'a> {
        let text = match *self {
            Codec::Table { encoding, profile } => {
                if profile.is_some_and(|p| !p.admits(bytes)) {
                    return Decoded::Failed;
                }
                encoding.decode_without_bom_handling_and_without_replacement(bytes)
            }
            Codec::Utf8Sig => {
                let body = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(bytes);
                UTF_8.decode_without_bom_handling_and_without_replacement(body)
            }
            Codec::Utf16Sniff => match bytes {
                [0xFF, 0xFE, rest @ ..] => UTF_16LE.decode_without_bom_handling_and_without_replacement(rest),
                [0xFE, 0xFF, rest @ ..] => UTF_16BE.decode_without_bom_handling_and_without_replacement(rest),
                _ => UTF_16LE.decode_without_bom_handling_and_without_replacement(bytes),
            },
            Codec::Utf32(endian) => decode_utf32(bytes, endian),
            Codec::Ascii => {
                if bytes.is_ascii() {
                    UTF_8.decode_without_bom_handling_and_without_replacement(bytes)
                } else {
                    None
                }
            }
            Codec::Latin1 => Some(encoding_rs::mem::decode_latin1(bytes)),
        };
        Decoded::from(text)
    }
}

fn decode_utf32(bytes: &[u8], endian: Option<Endian>) -> Option<Cow<'_, str>> {
    let (endian, body) = match endian {
        Some(e) => (e, bytes),
        None => match bytes {
            [0xFF, 0xFE, 0x00, 0x00, rest @ ..] => (Endian::Little, rest),
            [0x00, 0x00, 0xFE, 0xFF, rest @ ..] => (Endian::Big, rest),
            _ => (Endian::Little, bytes),
        },
    };
    if body.len() % 4 != 0 {
        return None;
    }
    body.chunks_exact(4)
        .map(|unit| {
            let unit: [u8; 4] = unit.try_into().ok()?;
            let scalar = match endian {
                Endian::Little => u32::from_le_bytes(unit),
                Endian::Big => u32::from_be_bytes(unit),
            };
            char::from_u32(scalar)
        })
        .collect::<Option<String>>()
        .map(Cow::Owned)
}

/// 按名称解析编解码器：大小写不敏感，`-` 与 `_` 等价，其余交给 `encoding_rs` 标签表
pub(crate) fn resolve(name: &str) -> Option<Codec> {
    let name = name.trim();
    let key = name.to_ascii_lowercase().replace('-', "_");
    let codec = match key.as_str() {
        "utf_8" | "utf8" | "u8" => Codec::table(UTF_8),
        "utf_8_sig" | "utf8_sig" => Codec::Utf8Sig,
        "utf_16" | "utf16" => Codec::Utf16Sniff,
        "utf_16_le" | "utf_16le" | "utf16le" => Codec::table(UTF_16LE),
        "utf_16_be" | "utf_16be" | "utf16be" => Codec::table(UTF_16BE),
        "utf_32" | "utf32" => Codec::Utf32(None),
        "utf_32_le" | "utf_32le" | "utf32le" => Codec::Utf32(Some(Endian::Little)),
        "utf_32_be" | "utf_32be" | "utf32be" => Codec::Utf32(Some(Endian::Big)),
        "gbk" | "cp936" => Codec::narrowed(GBK, &GBK_BYTES),
        "gb18030" => Codec::table(GB18030),
        "gb2312" | "euc_cn" => Codec::narrowed(GBK, &GB2312_BYTES),
        "big5" | "big5_tw" => Codec::narrowed(BIG5, &BIG5_BYTES),
        "ascii" | "us_ascii" => Codec::Ascii,
        "latin_1" | "latin1" | "iso_8859_1" | "iso8859_1" | "l1" => Codec::Latin1,
        "cp1252" | "windows_1252" => Codec::narrowed(WINDOWS_1252, &CP1252_BYTES),
        "mac_roman" | "macroman" | "macintosh" => Codec::table(MACINTOSH),
        "euc_jp" => Codec::table(EUC_JP),
        "shift_jis" | "shiftjis" | "sjis" => Codec::narrowed(SHIFT_JIS, &SHIFT_JIS_BYTES),
        "iso2022_jp" | "iso_2022_jp" => Codec::table(ISO_2022_JP),
        "euc_kr" => Codec::narrowed(EUC_KR, &EUC_KR_BYTES),
        "cp949" | "uhc" => Codec::table(EUC_KR),
        "koi8_r" => Codec::table(KOI8_R),
        "koi8_u" => Codec::table(KOI8_U),
        _ => {
            let label = key.replace('_', "-");
            return Encoding::for_label(name.as_bytes())
                .or_else(|| Encoding::for_label(label.as_bytes()))
                .filter(|enc| *enc != REPLACEMENT)
                .map(Codec::table);
        }
    };
    Some(codec)
}

/// 名称是否可被 [`decode`] 识别
pub fn is_known(name: &str) -> bool {
    resolve(name).is_some()
}

/// 用给定编码名严格解码整段字节；名称未知或字节非法时返回 None
pub fn decode(bytes: &[u8], name: &str) -> Option<String> {
    resolve(name)?.decode(bytes).into_text().map(Cow::into_owned)
}
