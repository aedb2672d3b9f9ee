//! Tunefetch CLI
//!
//! 命令行客户端：检查环境、启动 gamdl 下载并实时显示进度和彩色输出。

mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use tunefetch_core::{
    AppSettings, Codec, DownloadRequest, JobError, JobEvent, ProcessResult, RuntimePaths,
    Supervisor, check_environment, resolve_executable,
};

#[derive(Parser)]
#[command(name = "tunefetch", version, about = "gamdl 前端 - Apple Music 下载工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 下载链接
    Download {
        /// Apple Music 链接
        url: String,
        /// 歌曲编码 (aac-legacy | mp3)
        #[arg(short, long, alias = "codec")]
        format: Option<Codec>,
        /// 下载目录 (默认: ~/Downloads/Apple Music Download)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// cookies 文件 (默认: 自动查找)
        #[arg(short, long)]
        cookies: Option<PathBuf>,
        /// gamdl 可执行文件 (默认: 在 PATH 中查找)
        #[arg(long)]
        gamdl: Option<PathBuf>,
        /// 以 JSON 行输出事件
        #[arg(long)]
        json: bool,
    },
    /// 检查 gamdl 及依赖
    Check {
        /// gamdl 可执行文件
        #[arg(long)]
        gamdl: Option<PathBuf>,
    },
    /// 查看或修改默认设置
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// 显示当前设置
    Show,
    /// 修改设置
    Set {
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        cookies: Option<PathBuf>,
        #[arg(long)]
        format: Option<Codec>,
        #[arg(long)]
        gamdl: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();
    let paths = RuntimePaths::discover();
    let settings = AppSettings::load();

    match cli.command {
        Commands::Download {
            url,
            format,
            output,
            cookies,
            gamdl,
            json,
        } => {
            let request = DownloadRequest {
                url,
                output_dir: output.or_else(|| settings.output_dir.clone()),
                cookies_path: cookies
                    .or_else(|| settings.cookies_path.clone())
                    .or_else(|| paths.find_cookies()),
                codec: format.unwrap_or(settings.codec),
            };
            let executable = resolve_executable(gamdl.or(settings.executable).as_deref());
            let result = download(request, executable, paths, json).await?;
            Ok(exit_code(&result))
        }
        Commands::Check { gamdl } => {
            let report = check_environment(&paths, gamdl.or(settings.executable).as_deref());
            for entry in report.entries() {
                println!("{}", output::render(&entry));
            }
            Ok(if report.executable.is_some() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Config { action } => {
            config(settings, action.unwrap_or(ConfigAction::Show))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// 初始化日志：输出到 stderr，默认只显示警告
fn init_logging() {
    let _ = tracing_log::LogTracer::init();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init();
}

async fn download(
    request: DownloadRequest,
    executable: Option<PathBuf>,
    paths: RuntimePaths,
    json: bool,
) -> Result<ProcessResult> {
    let job = request
        .validate(&paths, executable.as_deref())
        .map_err(|e| match e {
            JobError::ExecutableNotFound => {
                anyhow::anyhow!("Gamdl not found in PATH! Install it via pip.")
            }
            e => e.into(),
        })?;
    let executable = executable.context("gamdl executable not found")?;
    tracing::info!("Starting job {} for {}", job.id, job.url);

    let (tx, mut rx) = mpsc::channel(1024);
    let handle = Supervisor::new(executable, paths).spawn(job, tx);

    let pb = (!json).then(output::progress_bar);
    while let Some(event) = rx.recv().await {
        if json {
            println!("{}", serde_json::to_string(&event)?);
            continue;
        }
        let Some(pb) = &pb else { continue };
        match event {
            JobEvent::Progress { percent } => pb.set_position(output::position(percent)),
            JobEvent::Log { entry } => pb.println(output::render(&entry)),
            JobEvent::Finished { result } => {
                if result.is_success() {
                    pb.set_position(100);
                }
                pb.finish_and_clear();
                println!("{}", output::render(&result.summary()));
            }
        }
    }

    handle.await.context("download worker panicked")
}

fn exit_code(result: &ProcessResult) -> ExitCode {
    match result {
        ProcessResult::Success => ExitCode::SUCCESS,
        ProcessResult::Failed { code: Some(code) } => {
            u8::try_from(*code).map_or(ExitCode::FAILURE, ExitCode::from)
        }
        _ => ExitCode::FAILURE,
    }
}

fn config(mut settings: AppSettings, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", AppSettings::config_path().display());
            println!("{settings:#?}");
        }
        ConfigAction::Set {
            output,
            cookies,
            format,
            gamdl,
        } => {
            if let Some(output) = output {
                settings.output_dir = Some(output);
            }
            if let Some(cookies) = cookies {
                settings.cookies_path = Some(cookies);
            }
            if let Some(format) = format {
                settings.codec = format;
            }
            if let Some(gamdl) = gamdl {
                settings.executable = Some(gamdl);
            }
            settings.save()?;
            println!("设置已保存到 {}", AppSettings::config_path().display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_download() {
        let cli = Cli::try_parse_from([
            "tunefetch",
            "download",
            "https://music.apple.com/album/1",
            "--format",
            "mp3",
            "-o",
            "/tmp/music",
        ])
        .unwrap();
        let Commands::Download {
            url, format, output, json, ..
        } = cli.command
        else {
            panic!("expected download");
        };
        assert_eq!(url, "https://music.apple.com/album/1");
        assert_eq!(format, Some(Codec::Mp3));
        assert_eq!(output, Some(PathBuf::from("/tmp/music")));
        assert!(!json);
    }

    #[test]
    fn test_parse_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["tunefetch", "download", "u", "--format", "flac"]).is_err());
    }

    #[test]
    fn test_exit_code_mirrors_child() {
        assert_eq!(exit_code(&ProcessResult::Success), ExitCode::SUCCESS);
        assert_eq!(
            exit_code(&ProcessResult::Failed { code: Some(3) }),
            ExitCode::from(3)
        );
        assert_eq!(
            exit_code(&ProcessResult::Failed { code: None }),
            ExitCode::FAILURE
        );
        assert_eq!(
            exit_code(&ProcessResult::launch_failed("boom")),
            ExitCode::FAILURE
        );
    }
}
