// encsniff-core/tests/detect_tests.rs
use std::fs;
use std::io::Write;

use encoding_rs::{Encoding, GB18030, GBK, SHIFT_JIS};
use encsniff_core::{decode, detect_encoding, read_to_string, DetectOptions, Detector, Method};

const CHINESE: &str = "这是一个中文编码检测的测试文本，用于验证结果。";
const JAPANESE: &str = "日本語のテキストです。こんにちは、世界。";
const GB_FAMILY: &[&str] = &["gbk", "gb18030", "gb2312"];

fn encode(enc: &'static Encoding, text: &str) -> Vec<u8> {
    let (bytes, _, unmappable) = enc.encode(text);
    assert!(!unmappable, "{text} not representable in {}", enc.name());
    bytes.into_owned()
}

#[test]
fn empty_input_returns_default() {
    for default in ["utf-8", "ascii", "gbk", "anything-at-all"] {
        assert_eq!(detect_encoding(b"", 8192, default), default);
        assert_eq!(detect_encoding(b"", 0, default), default);
    }
}

#[test]
fn missing_path_and_directory_return_default() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(detect_encoding(dir.path(), 8192, "cp1252"), "cp1252");
    let missing = dir.path().join("missing.txt");
    assert_eq!(detect_encoding(&missing, 8192, "cp1252"), "cp1252");
    assert_eq!(detect_encoding("/no/such/file/anywhere.txt", 8192, "utf-8"), "utf-8");
}

#[test]
fn detection_is_deterministic() {
    let inputs = [encode(GBK, CHINESE), encode(SHIFT_JIS, JAPANESE), CHINESE.as_bytes().to_vec(), b"caf\xE9".to_vec()];
    for input in &inputs {
        for size in [0, 16, 8192] {
            let a = detect_encoding(input, size, "utf-8");
            let b = detect_encoding(input, size, "utf-8");
            assert_eq!(a, b);
        }
    }
}

#[test]
fn utf8_bom_yields_sig_variant() {
    let mut data = vec![0xEF, 0xBB, 0xBF];
    data.extend_from_slice("任意的 UTF-8 文本 with ascii".as_bytes());
    assert_eq!(detect_encoding(&data, 8192, "utf-8"), "utf-8-sig");
    data.truncate(3);
    assert_eq!(detect_encoding(&data, 8192, "utf-8"), "utf-8-sig");
}

#[test]
fn utf16_and_utf32_boms() {
    let mut le = vec![0xFF, 0xFE];
    le.extend("hello".encode_utf16().flat_map(u16::to_le_bytes));
    assert_eq!(detect_encoding(&le, 8192, "utf-8"), "utf-16-le");

    let be = [0xFEu8, 0xFF, 0x00, 0x68, 0x00, 0x69];
    assert_eq!(detect_encoding(&be, 8192, "utf-8"), "utf-16-be");

    let utf32 = [0xFFu8, 0xFE, 0x00, 0x00, 0x68, 0x00, 0x00, 0x00];
    assert_eq!(detect_encoding(&utf32, 8192, "utf-8"), "utf-32-le");
    assert_eq!(decode(&utf32, "utf-32-le").as_deref(), Some("\u{FEFF}h"));
}

#[test]
fn gb18030_chinese_is_gb_family_above_threshold() {
    let data = encode(GB18030, CHINESE);
    let detection = Detector::default().detect(&data);
    assert!(GB_FAMILY.contains(&detection.encoding.as_str()), "{detection:?}");
    assert_eq!(detection.method, Method::Candidate);
    assert!(detection.score.unwrap() > 30);
}

#[test]
fn shift_jis_with_kana_is_shift_jis() {
    let data = encode(SHIFT_JIS, JAPANESE);
    let detection = Detector::default().detect(&data);
    assert_eq!(detection.encoding, "shift_jis", "{detection:?}");
    assert_eq!(detection.method, Method::Candidate);
}

#[test]
fn traditional_chinese_gbk_is_gbk() {
    // 價、備 的 GBK 字节对与 Shift_JIS 假名字节对重合
    for text in ["這些價格很便宜，我們都買了。", "他們準備了很多禮物，價值不菲。"] {
        let detection = Detector::default().detect(&encode(GBK, text));
        assert_eq!(detection.encoding, "gbk", "{text}: {detection:?}");
        assert_eq!(detection.method, Method::Candidate);
    }
}

#[test]
fn single_kana_among_kanji_is_shift_jis() {
    assert_eq!(detect_encoding(&encode(SHIFT_JIS, "東京大学の研究者"), 8192, "x"), "shift_jis");
}

#[test]
fn lone_kana_below_signal_density_falls_back() {
    let d = Detector::default().detect(&encode(SHIFT_JIS, "の"));
    assert_eq!((d.encoding.as_str(), d.method), ("latin-1", Method::Fallback));
}

#[test]
fn utf8_chinese_is_utf8() {
    assert_eq!(detect_encoding(CHINESE.as_bytes(), 8192, "gbk"), "utf-8");
}

#[test]
fn ascii_only_returns_default_for_any_sample_size() {
    let text = "The quick brown fox jumps over the lazy dog. 0123456789 {}[]\n".repeat(400);
    for size in [0, 1, 5, 64, 8192, 1 << 20] {
        assert_eq!(detect_encoding(text.as_bytes(), size, "my-default"), "my-default");
    }
    let all_ascii: Vec<u8> = (0u8..0x80).collect();
    assert_eq!(detect_encoding(&all_ascii, 8192, "ascii"), "ascii");
}

#[test]
fn non_ascii_without_signal_falls_back() {
    let d = Detector::default().detect(b"caf\xE9 cr\xE8me br\xFBl\xE9e");
    assert_eq!((d.encoding.as_str(), d.method), ("latin-1", Method::Fallback));
    assert_eq!(detect_encoding("naïve façade".as_bytes(), 8192, "x"), "utf-8");
}

fn repeated_file(line: &[u8], total: usize) -> tempfile::NamedTempFile {
    repeated_with(line, b"\n", total)
}

fn repeated_with(chunk: &[u8], separator: &[u8], total: usize) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    let mut written = 0;
    while written < total {
        f.write_all(chunk).unwrap();
        f.write_all(separator).unwrap();
        written += chunk.len() + separator.len();
    }
    f.flush().unwrap();
    f
}

#[test]
fn large_file_sampling_keeps_signal() {
    for (enc, text) in [(GBK, CHINESE), (SHIFT_JIS, JAPANESE), (encoding_rs::UTF_8, CHINESE)] {
        let line = encode(enc, text);
        let expected = detect_encoding(&line, 8192, "utf-8");

        let big = repeated_file(&line, 200_000);
        assert!(fs::metadata(big.path()).unwrap().len() > 8192);
        assert_eq!(detect_encoding(big.path(), 8192, "utf-8"), expected, "{}", enc.name());
        assert_eq!(detect_encoding(big.path(), 1000, "utf-8"), expected, "{}", enc.name());

        let small = repeated_file(&line, 1);
        assert_eq!(detect_encoding(small.path(), 8192, "utf-8"), expected);
    }
}

#[test]
fn large_file_without_newlines_keeps_signal() {
    for (enc, text) in [(encoding_rs::UTF_8, CHINESE), (GBK, CHINESE), (SHIFT_JIS, JAPANESE)] {
        let content = encode(enc, text);
        let expected = detect_encoding(&content, 8192, "utf-8");

        let big = repeated_with(&content, b"", 200_000);
        for size in [8192, 1000, 999] {
            assert_eq!(detect_encoding(big.path(), size, "utf-8"), expected, "{} at {size}", enc.name());
        }
    }
}

#[test]
fn round_trip_at_minimum_signal_density() {
    // UTF-8：一个汉字或一个中文标点即可
    assert_eq!(detect_encoding("中".as_bytes(), 8192, "x"), "utf-8");
    assert_eq!(detect_encoding("，".as_bytes(), 8192, "x"), "utf-8");
    // GBK：三个汉字，或两个汉字加一个中文标点
    assert_eq!(detect_encoding(&encode(GBK, "中文字"), 8192, "x"), "gbk");
    assert_eq!(detect_encoding(&encode(GBK, "中文，"), 8192, "x"), "gbk");
    // Shift_JIS：十个假名
    assert_eq!(detect_encoding(&encode(SHIFT_JIS, "ひらがなカタカナです"), 8192, "x"), "shift_jis");
}

#[test]
fn below_signal_density_uses_fallback_chain() {
    let d = Detector::default().detect(&encode(GBK, "中"));
    assert_eq!(d.method, Method::Fallback);
    assert_eq!(d.encoding, "latin-1");
}

#[test]
fn every_returned_name_decodes_the_input() {
    let inputs = [encode(GBK, CHINESE), encode(SHIFT_JIS, JAPANESE), CHINESE.as_bytes().to_vec(), b"caf\xE9".to_vec()];
    for input in &inputs {
        let name = detect_encoding(input, 8192, "utf-8");
        assert!(decode(input, &name).is_some(), "{name}");
    }
}

#[test]
fn read_to_string_transcodes_whole_file() {
    let big = repeated_file(&encode(GBK, CHINESE), 50_000);
    let (text, detection) = read_to_string(big.path(), &DetectOptions::default()).unwrap();
    assert_eq!(detection.encoding, "gbk");
    assert!(text.starts_with(CHINESE));
    assert_eq!(text.lines().count(), text.matches(CHINESE).count());

    let mut bom = tempfile::NamedTempFile::new().unwrap();
    bom.write_all(b"\xEF\xBB\xBFhello").unwrap();
    let (text, detection) = read_to_string(bom.path(), &DetectOptions::default()).unwrap();
    assert_eq!((text.as_str(), detection.encoding.as_str()), ("hello", "utf-8-sig"));

    assert!(read_to_string(std::path::Path::new("/no/such/file"), &DetectOptions::default()).is_err());
}
