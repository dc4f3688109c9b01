//! 批量检测：遍历目录、并行检测、按路径顺序流式写出 JSON
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

use crate::detector::{Detection, Detector, Method};
use crate::options::{ScanOptions, ScanStats};

/// 输出项结构（JSON 数组的单个元素）
#[derive(Debug, Clone, Serialize)]
pub struct ScanRecord<'a> {
    pub path: &'a str,
    pub encoding: &'a str,
    pub method: Method,
    pub score: Option<u32>,
}

/// 遍历 `input` 下的文件并将检测结果以 JSON 数组流式写入 `out`
/// 稳定性保证：文件按路径排序，并行时由写线程按索引重排后输出
pub fn detect_tree_and_write(input: &Path, out: &mut dyn Write, opts: &ScanOptions) -> Result<ScanStats> {
    let detector = Arc::new(Detector::new(opts.detect.clone()));
    let mut stats = ScanStats::default();

    let files = collect_files(input, opts);
    stats.files_seen = files.len();

    let threads = opts.threads.unwrap_or_else(num_cpus::get);
    if threads > 1 && files.len() > 1 {
        detect_and_write_parallel(&files, out, &detector, &mut stats, threads)?;
        return Ok(stats);
    }

    // 串行路径
    write!(out, "[")?;
    let mut first = true;
    for path in &files {
        let detection = detector.detect(path.as_path());
        stats.files_detected += 1;
        write_record(out, &mut first, path, &detection)?;
        stats.outputs_written += 1;
    }
    write!(out, "]")?;
    Ok(stats)
}

/// 收集文件列表：只取常规文件，按大小过滤，按路径排序
fn collect_files(input: &Path, opts: &ScanOptions) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(input);
    if let Some(depth) = opts.max_depth {
        walker = walker.max_depth(depth);
    }
    let mut files: Vec<PathBuf> = vec![];
    for entry in walker {
        let entry = match entry { Ok(e) => e, Err(err) => { debug!(%err, "skip unreadable entry"); continue } };
        if !entry.file_type().is_file() { continue; }
        if let Some(max) = opts.max_file_size {
            match entry.metadata() {
                Ok(md) if md.len() > max => continue,
                Ok(_) => {}
                Err(_) => continue,
            }
        }
        files.push(entry.into_path());
    }
    files.sort();
    files
}

fn write_record(out: &mut dyn Write, first: &mut bool, path: &Path, detection: &Detection) -> Result<()> {
    if !*first { write!(out, ",")?; } else { *first = false; }
    let path = path.to_string_lossy();
    let record = ScanRecord { path: &path, encoding: &detection.encoding, method: detection.method, score: detection.score };
    serde_json::to_writer(&mut *out, &record)?;
    Ok(())
}

/// 并行调度：
/// - Rayon 线程池并行检测
/// - 单线程 Writer 按 idx 重排并流式写 JSON，保证稳定顺序
fn detect_and_write_parallel(
    files: &[PathBuf],
    out: &mut dyn Write,
    detector: &Arc<Detector>,
    stats: &mut ScanStats,
    threads: usize,
) -> Result<()> {
    use crossbeam_channel as channel;
    use rayon::prelude::*;
    use std::collections::BTreeMap;

    write!(out, "[")?;
    let mut first = true;

    type Msg = (usize /*idx*/, Detection);
    let (tx, rx) = channel::bounded::<Msg>(256);

    let detector = Arc::clone(detector);
    let indexed: Vec<(usize, PathBuf)> = files.iter().cloned().enumerate().collect();

    // Writer 留在当前线程，检测在后台线程的 Rayon 池中执行
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    let scan_thread = std::thread::spawn(move || {
        pool.install(|| {
            indexed.par_iter().for_each_with(tx, |tx, (idx, path)| {
                let _ = tx.send((*idx, detector.detect(path.as_path())));
            });
        });
        // 结束后 Sender 全部被丢弃，Receiver 将收到关闭信号
    });

    let mut next_idx: usize = 0;
    let mut buffer: BTreeMap<usize, Detection> = BTreeMap::new();
    while let Ok((idx, detection)) = rx.recv() {
        buffer.insert(idx, detection);
        while let Some(detection) = buffer.remove(&next_idx) {
            stats.files_detected += 1;
            write_record(out, &mut first, &files[next_idx], &detection)?;
            stats.outputs_written += 1;
            next_idx += 1;
        }
    }

    if scan_thread.join().is_err() {
        anyhow::bail!("detection worker panicked");
    }
    write!(out, "]")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"plain ascii text").unwrap();
        fs::write(dir.path().join("b.txt"), "中文编码检测，测试。".as_bytes()).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let gbk = encoding_rs::GBK.encode("这是一个中文编码检测的测试文本，用于验证结果。").0.into_owned();
        fs::write(dir.path().join("sub").join("c.txt"), gbk).unwrap();
        dir
    }

    fn run(opts: &ScanOptions, dir: &Path) -> (ScanStats, serde_json::Value) {
        let mut out = Vec::new();
        let stats = detect_tree_and_write(dir, &mut out, opts).unwrap();
        (stats, serde_json::from_slice(&out).unwrap())
    }

    #[test]
    fn serial_and_parallel_agree() {
        let dir = fixture();
        let serial = run(&ScanOptions { threads: Some(1), ..Default::default() }, dir.path());
        let parallel = run(&ScanOptions { threads: Some(4), ..Default::default() }, dir.path());
        assert_eq!(serial.1, parallel.1);
        assert_eq!(serial.0.outputs_written, 3);
        assert_eq!(parallel.0.files_detected, 3);

        let records = serial.1.as_array().unwrap();
        let encodings: Vec<&str> = records.iter().map(|r| r["encoding"].as_str().unwrap()).collect();
        assert_eq!(encodings, vec!["utf-8", "utf-8", "gbk"]);
        assert_eq!(records[0]["method"], "default");
        assert_eq!(records[2]["method"], "candidate");
        assert!(records[0]["path"].as_str().unwrap().ends_with("a.txt"));
    }

    #[test]
    fn depth_and_size_filters() {
        let dir = fixture();
        let (stats, v) = run(&ScanOptions { threads: Some(1), max_depth: Some(1), ..Default::default() }, dir.path());
        assert_eq!(stats.files_seen, 2);
        assert_eq!(v.as_array().unwrap().len(), 2);

        let (stats, _) = run(&ScanOptions { threads: Some(1), max_file_size: Some(20), ..Default::default() }, dir.path());
        assert_eq!(stats.files_seen, 1);
    }

    #[test]
    fn empty_directory_writes_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let (stats, v) = run(&ScanOptions::default(), dir.path());
        assert_eq!(stats.files_seen, 0);
        assert_eq!(v, serde_json::json!([]));
    }
}
