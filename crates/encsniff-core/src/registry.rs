//! 候选编码注册表
//!
//! 顺序：先是手工挑选的常用编码，再追加 `encoding_rs` 中尚未被常用项覆盖的其余编码。
//! 进程内只构建一次，之后只读；先出现者优先，名称不重复。
use std::collections::HashSet;

use encoding_rs::Encoding;
use once_cell::sync::Lazy;

use crate::bom::{UTF16_BE_BOM, UTF16_LE_BOM, UTF32_BE_BOM, UTF32_LE_BOM, UTF8_BOM};
use crate::codec;

/// 常用编码（下划线风格名称）
pub(crate) const COMMON_ENCODINGS: &[&str] = &[
    "utf_8",
    "utf_8_sig",
    "utf_16",
    "utf_16_le",
    "utf_16_be",
    "utf_32",
    "utf_32_le",
    "utf_32_be",
    "gbk",
    "gb18030",
    "gb2312",
    "big5",
    "ascii",
    "latin_1",
    "cp1252",
    "mac_roman",
    "euc_jp",
    "shift_jis",
    "iso2022_jp",
    "euc_kr",
    "cp949",
    "koi8_r",
    "koi8_u",
];

static REGISTRY: Lazy<Vec<String>> = Lazy::new(build_registry);

/// `encoding_rs` 的全部真实编码（不含 replacement / x-user-defined），按声明顺序
fn platform_encodings() -> [&'static Encoding; 38] {
    use encoding_rs::*;
    [
        UTF_8, UTF_16LE, UTF_16BE, GBK, GB18030, BIG5, EUC_JP, ISO_2022_JP, SHIFT_JIS, EUC_KR, IBM866, ISO_8859_2,
        ISO_8859_3, ISO_8859_4, ISO_8859_5, ISO_8859_6, ISO_8859_7, ISO_8859_8, ISO_8859_8_I, ISO_8859_10,
        ISO_8859_13, ISO_8859_14, ISO_8859_15, ISO_8859_16, KOI8_R, KOI8_U, MACINTOSH, WINDOWS_874, WINDOWS_1250,
        WINDOWS_1251, WINDOWS_1252, WINDOWS_1253, WINDOWS_1254, WINDOWS_1255, WINDOWS_1256, WINDOWS_1257,
        WINDOWS_1258, X_MAC_CYRILLIC,
    ]
}

fn build_registry() -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut covered: Vec<&'static Encoding> = Vec::new();
    let mut names: Vec<String> = Vec::new();

    for &name in COMMON_ENCODINGS {
        if !seen.insert(name.to_string()) {
            continue;
        }
        if let Some(enc) = codec::resolve(name).and_then(|c| c.encoding()) {
            covered.push(enc);
        }
        names.push(name.to_string());
    }
    // 其余编码：底层解码器已被常用项覆盖的跳过
    for enc in platform_encodings() {
        if covered.contains(&enc) {
            continue;
        }
        let name = enc.name().to_ascii_lowercase();
        if seen.insert(name.clone()) {
            covered.push(enc);
            names.push(name);
        }
    }
    names
}

/// 只读注册表
pub fn registry() -> &'static [String] {
    &REGISTRY
}

/// 受 BOM 约束的编码：仅当样本开头与其 BOM 完全一致时才参与评估
fn bom_gate(name: &str) -> Option<&'static [&'static [u8]]> {
    match name {
        "utf_8_sig" => Some(&[UTF8_BOM]),
        "utf_16" => Some(&[UTF16_LE_BOM, UTF16_BE_BOM]),
        "utf_16_le" => Some(&[UTF16_LE_BOM]),
        "utf_16_be" => Some(&[UTF16_BE_BOM]),
        "utf_32" => Some(&[UTF32_LE_BOM, UTF32_BE_BOM]),
        "utf_32_le" => Some(&[UTF32_LE_BOM]),
        "utf_32_be" => Some(&[UTF32_BE_BOM]),
        _ => None,
    }
}

pub(crate) fn passes_bom_gate(name: &str, sample: &[u8]) -> bool {
    bom_gate(name).map_or(true, |sigs| sigs.iter().any(|sig| sample.starts_with(sig)))
}

/// 内部下划线名称 → 编解码查找常用的连字符形式；表外名称原样返回
pub fn canonical_name(name: &str) -> &str {
    match name {
        "utf_8" => "utf-8",
        "utf_8_sig" => "utf-8-sig",
        "utf_16" => "utf-16",
        "utf_16_le" => "utf-16-le",
        "utf_16_be" => "utf-16-be",
        "utf_32" => "utf-32",
        "utf_32_le" => "utf-32-le",
        "utf_32_be" => "utf-32-be",
        "latin_1" => "latin-1",
        "euc_jp" => "euc-jp",
        "iso2022_jp" => "iso-2022-jp",
        "euc_kr" => "euc-kr",
        "koi8_r" => "koi8-r",
        "koi8_u" => "koi8-u",
        other => other,
    }
}
