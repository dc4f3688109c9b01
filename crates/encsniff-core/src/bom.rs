//! BOM 快速通道
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
pub const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
pub const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];
pub const UTF32_LE_BOM: &[u8] = &[0xFF, 0xFE, 0x00, 0x00];
pub const UTF32_BE_BOM: &[u8] = &[0x00, 0x00, 0xFE, 0xFF];

/// 签名按长度降序排列：UTF-32 LE 与 UTF-16 LE 共享前缀，较长者优先
const BOM_TABLE: &[(&[u8], &str)] = &[
    (UTF32_LE_BOM, "utf-32-le"),
    (UTF32_BE_BOM, "utf-32-be"),
    (UTF8_BOM, "utf-8-sig"),
    (UTF16_LE_BOM, "utf-16-le"),
    (UTF16_BE_BOM, "utf-16-be"),
];

/// 检查样本开头的 BOM，命中即返回对应编码名
pub fn detect_bom(sample: &[u8]) -> Option<&'static str> {
    BOM_TABLE
        .iter()
        .find(|(sig, _)| sample.starts_with(sig))
        .map(|&(_, name)| name)
}

/// 样本开头是否带有宽字符（UTF-16/32）BOM
pub(crate) fn has_wide_bom(sample: &[u8]) -> bool {
    matches!(detect_bom(sample), Some(name) if name.starts_with("utf-16") || name.starts_with("utf-32"))
}
