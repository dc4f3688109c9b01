use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use encsniff_core::{detect_tree_and_write, DetectOptions, Detector, ScanOptions};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "encsniff", version, about = "启发式文本编码检测")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// 各子命令共用的检测参数；未给出时取配置文件或内置默认值
#[derive(Args, Debug, Clone)]
struct DetectArgs {
    /// 采样预算（字节），0 表示默认 8192
    #[arg(long)]
    sample_size: Option<usize>,

    /// 无法判断时返回的编码
    #[arg(long = "default")]
    default_encoding: Option<String>,

    /// 置信阈值（得分须严格大于该值）
    #[arg(long)]
    threshold: Option<u32>,

    /// 检测配置文件路径（TOML）
    #[arg(long)]
    config: Option<PathBuf>,
}

impl DetectArgs {
    /// 先加载配置文件，再用命令行参数覆盖
    fn into_options(self) -> Result<DetectOptions> {
        let mut opts = match &self.config {
            Some(path) => DetectOptions::from_toml_file(path).context("load config")?,
            None => DetectOptions::default(),
        };
        if let Some(n) = self.sample_size {
            opts.sample_size = n;
        }
        if let Some(enc) = self.default_encoding {
            opts.default_encoding = enc;
        }
        if let Some(t) = self.threshold {
            opts.threshold = t;
        }
        Ok(opts)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 检测一个或多个文件的编码
    Detect {
        /// 待检测文件
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// 以 JSON 输出（含判定方式与得分）
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        detect: DetectArgs,
    },

    /// 扫描目录并生成 result.json
    Scan {
        /// 输入目录
        #[arg(long)]
        input: PathBuf,

        /// 输出文件（JSON 数组）
        #[arg(long, default_value = "./result.json")]
        output: PathBuf,

        /// 线程数（"auto"=CPU 核心数）
        #[arg(long, default_value = "auto")]
        threads: String,

        /// 目录遍历深度
        #[arg(long)]
        max_depth: Option<usize>,

        /// 最大文件大小（单位字节，例如 5242880 代表 5MB）
        #[arg(long)]
        max_file_size: Option<u64>,

        #[command(flatten)]
        detect: DetectArgs,
    },

    /// 检测编码并把文件转成 UTF-8 输出到标准输出
    Decode {
        path: PathBuf,

        #[command(flatten)]
        detect: DetectArgs,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect { paths, json, detect } => {
            let detector = Detector::new(detect.into_options()?);
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            for path in &paths {
                let detection = detector.detect(path);
                if json {
                    let line = serde_json::json!({ "path": path.to_string_lossy(), "detection": detection });
                    writeln!(out, "{line}")?;
                } else {
                    writeln!(out, "{}\t{}", path.display(), detection.encoding)?;
                }
            }
            out.flush()?;
        }
        Commands::Scan { input, output, threads, max_depth, max_file_size, detect } => {
            info!(?input, ?output, "starting scan");

            // 以缓冲方式打开输出文件，按 JSON 数组流式写入
            let mut out = BufWriter::new(File::create(&output).context("create output file")?);

            // "auto" 表示自动（等于 CPU 核数）；其他为具体数值
            let threads = parse_threads(&threads);
            let opts = ScanOptions { detect: detect.into_options()?, max_file_size, max_depth, threads };
            let stats = detect_tree_and_write(&input, &mut out, &opts).context("scan and write failed")?;
            out.flush().context("flush output")?;

            info!(
                files_seen = stats.files_seen,
                files_detected = stats.files_detected,
                outputs_written = stats.outputs_written,
                "scan finished"
            );
        }
        Commands::Decode { path, detect } => {
            let detector = Detector::new(detect.into_options()?);
            let (text, detection) = detector.read_to_string(&path).with_context(|| format!("decode {}", path.display()))?;
            info!(encoding = %detection.encoding, method = ?detection.method, "decoded");
            let stdout = io::stdout();
            let mut out = stdout.lock();
            out.write_all(text.as_bytes())?;
            out.flush()?;
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 日志写到 stderr，stdout 留给检测结果
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).with_writer(io::stderr).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 解析线程参数
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") {
        return None;
    }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threads_argument() {
        assert_eq!(parse_threads("auto"), None);
        assert_eq!(parse_threads("AUTO"), None);
        assert_eq!(parse_threads("4"), Some(4));
        assert_eq!(parse_threads("0"), None);
        assert_eq!(parse_threads("x"), None);
    }

    #[test]
    fn flags_override_config_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "threshold = 10\ndefault_encoding = \"gbk\"").unwrap();
        let args = DetectArgs {
            sample_size: Some(1024),
            default_encoding: None,
            threshold: Some(50),
            config: Some(f.path().to_path_buf()),
        };
        let opts = args.into_options().unwrap();
        assert_eq!(opts.threshold, 50);
        assert_eq!(opts.default_encoding, "gbk");
        assert_eq!(opts.sample_size, 1024);
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["encsniff", "scan", "--input", "data", "--threads", "2", "--max-depth", "3"]).unwrap();
        match cli.command {
            Commands::Scan { input, threads, max_depth, .. } => {
                assert_eq!(input, PathBuf::from("data"));
                assert_eq!(threads, "2");
                assert_eq!(max_depth, Some(3));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(Cli::try_parse_from(["encsniff", "detect"]).is_err());
    }
}
