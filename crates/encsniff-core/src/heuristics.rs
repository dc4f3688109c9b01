//! 文字统计与各编码族的判定 / 打分规则
use std::collections::{BTreeSet, HashSet};

use encoding_rs::GBK;
use once_cell::sync::Lazy;

use crate::bom::UTF8_BOM;

/// 常见中文标点
const CJK_SYMBOLS: &[char] = &['，', '。', '？', '！', '、', '；', '：', '“', '”', '（', '）', '【', '】', '《', '》'];
/// GB 族加分的中文符号：间隔号、破折号、省略号
const GB_PUNCTUATION: &[char] = &['·', '—', '…'];
/// UTF-8 字节被当成 GB 解码时常见的乱码字符
const GB_MOJIBAKE: &[char] = &['脗', '脙', '脛', '驴', '脌', 'Ã', 'Â', 'Å', '˜'];
/// 非 GB 字节（UTF-8 等）被当成 GB 系读出时的乱码信号
const UTF8_MOJIBAKE: &[char] = &['ï', '¿', '»', 'â', '¬', '©', '®'];

/// Shift_JIS 假名字节对（82 9F–82 F1、83 40–83 96）按 GBK 解码得到的字符。
/// 其中不少是真实的繁体字（價、備、億……），只能作为冲突信号，不能当乱码
static SHIFT_JIS_KANA_AS_GBK: Lazy<HashSet<char>> = Lazy::new(|| {
    let hiragana = (0x9F..=0xF1u8).map(|t| [0x82, t]);
    let katakana = (0x40..=0x96u8).filter(|&t| t != 0x7F).map(|t| [0x83, t]);
    hiragana
        .chain(katakana)
        .filter_map(|pair| {
            GBK.decode_without_bom_handling_and_without_replacement(&pair)
                .and_then(|text| text.chars().next())
        })
        .collect()
});

pub(crate) fn is_han(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0x20000..=0x2A6DF | 0x2A700..=0x2B739 | 0x2B740..=0x2B81D)
}

pub(crate) fn is_kana(c: char) -> bool {
    ('\u{3040}'..='\u{30FF}').contains(&c)
}

pub(crate) fn is_hangul(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// 半角片假名：GB 字节被当成 Shift_JIS 读出时的典型产物
fn is_halfwidth_kana(c: char) -> bool {
    ('\u{FF61}'..='\u{FF9F}').contains(&c)
}

/// 符号 / emoji 宽带（通用标点到杂项符号与箭头）
fn is_wide_symbol(c: char) -> bool {
    ('\u{2000}'..='\u{2BFF}').contains(&c)
}

/// 每个编码族的规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rule {
    Utf8,
    Gb { is_gbk: bool },
    ShiftJis,
    /// 仅以韩文音节作为依据，刻意从严
    Utf16Hangul,
    EucKr,
    Generic,
}

impl Rule {
    pub(crate) fn for_encoding(name: &str) -> Rule {
        match name {
            "utf_8" => Rule::Utf8,
            "gbk" => Rule::Gb { is_gbk: true },
            "gb18030" | "gb2312" => Rule::Gb { is_gbk: false },
            "shift_jis" => Rule::ShiftJis,
            "utf_16" => Rule::Utf16Hangul,
            "euc_kr" => Rule::EucKr,
            _ => Rule::Generic,
        }
    }

    fn is_marker(self, c: char) -> bool {
        match self {
            Rule::Utf8 => GB_MOJIBAKE.contains(&c),
            Rule::Gb { .. } => UTF8_MOJIBAKE.contains(&c),
            _ => false,
        }
    }

    /// 有效性判定：不通过的候选直接丢弃
    pub(crate) fn admits(self, stats: &ScriptStats) -> bool {
        let has_cjk = stats.han_count > 0 || stats.symbol_count > 0;
        match self {
            Rule::Utf8 | Rule::Gb { .. } => has_cjk && stats.corruption_markers.is_empty(),
            Rule::ShiftJis => stats.kana_count > 0,
            Rule::Utf16Hangul => stats.hangul_count > 0,
            Rule::EucKr | Rule::Generic => has_cjk || stats.char_count > 0,
        }
    }

    /// 置信分，下限为 0
    pub(crate) fn score(self, stats: &ScriptStats, sample: &[u8]) -> u32 {
        let mut score = (stats.char_count / 10).min(20) as i64;
        score += (stats.han_count * 2).min(30) as i64;
        score += stats.symbol_count as i64 * 3;
        score += match self {
            Rule::Utf8 => {
                let lead3 = count_bytes(sample, 0xE0, 0xEF);
                let bom = if sample.starts_with(UTF8_BOM) { 50 } else { 0 };
                20 + stats.wide_symbol_count as i64 * 15 + lead3 as i64 * 10 + bom
            }
            Rule::Gb { is_gbk } => {
                let flat = if is_gbk { 10 } else { 0 };
                flat + stats.gb_punctuation_count as i64 * 8 + count_bytes(sample, 0x81, 0xFE) as i64 * 3
            }
            Rule::ShiftJis => stats.kana_count as i64 * 3,
            Rule::EucKr => stats.hangul_count as i64 * 3,
            Rule::Utf16Hangul | Rule::Generic => 0,
        };
        score -= stats.corruption_markers.len() as i64 * 20;
        u32::try_from(score.max(0)).unwrap_or(u32::MAX)
    }
}

fn count_bytes(sample: &[u8], lo: u8, hi: u8) -> usize {
    sample.iter().filter(|&&b| (lo..=hi).contains(&b)).count()
}

/// 一次成功解码后的文字统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ScriptStats {
    pub(crate) char_count: usize,
    pub(crate) han_count: usize,
    /// 出现过的不同中文标点个数
    pub(crate) symbol_count: usize,
    pub(crate) kana_count: usize,
    pub(crate) hangul_count: usize,
    pub(crate) wide_symbol_count: usize,
    pub(crate) gb_punctuation_count: usize,
    pub(crate) halfwidth_kana_count: usize,
    /// 仅 GB 规则统计：来自 Shift_JIS 假名字节对的字符数
    pub(crate) kana_pair_count: usize,
    /// 与规则相关的乱码字符（去重）
    pub(crate) corruption_markers: BTreeSet<char>,
}

impl ScriptStats {
    pub(crate) fn collect(text: &str, rule: Rule) -> Self {
        let mut stats = ScriptStats::default();
        let mut symbols: BTreeSet<char> = BTreeSet::new();
        for c in text.chars() {
            stats.char_count += 1;
            if is_han(c) {
                stats.han_count += 1;
            } else if is_kana(c) {
                stats.kana_count += 1;
            } else if is_hangul(c) {
                stats.hangul_count += 1;
            } else if CJK_SYMBOLS.contains(&c) {
                symbols.insert(c);
            }
            if is_wide_symbol(c) {
                stats.wide_symbol_count += 1;
            }
            if GB_PUNCTUATION.contains(&c) {
                stats.gb_punctuation_count += 1;
            }
            if is_halfwidth_kana(c) {
                stats.halfwidth_kana_count += 1;
            }
            if matches!(rule, Rule::Gb { .. }) && SHIFT_JIS_KANA_AS_GBK.contains(&c) {
                stats.kana_pair_count += 1;
            }
            if rule.is_marker(c) {
                stats.corruption_markers.insert(c);
            }
        }
        stats.symbol_count = symbols.len();
        stats
    }
}
