//! 子进程监督
//!
//! 为一次 [`DownloadJob`] 生成配置文件、启动 gamdl，
//! 并把输出逐行分类后以 [`JobEvent`] 的形式发送出去：
//!
//! 1. 写入临时配置文件，截断输出日志
//! 2. 启动子进程，stdout 和 stderr 写入同一个管道
//! 3. 读取任务按写入顺序把输出行放入队列
//! 4. 工作任务按顺序消费：写入日志文件 → 分类 → 发送事件
//! 5. 管道 EOF 后等待退出码，发送 `Finished`
//!
//! 同一时刻只允许一个任务运行，由调用方（UI 的忙碌状态）保证。

mod events;
mod stream;

pub use events::{JobEvent, ProcessResult};

use crate::classify::classify;
use crate::job::DownloadJob;
use crate::logging::LogEntry;
use crate::paths::RuntimePaths;
use crate::tool_config;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// 传给子进程的环境变量，关闭颜色和缓冲
const CHILD_ENV: &[(&str, &str)] = &[
    ("PYTHONUNBUFFERED", "1"),
    ("TERM", "dumb"),
    ("NO_COLOR", "1"),
];

const RULE: &str = "=========================================";

#[derive(Debug, Clone)]
pub struct Supervisor {
    executable: PathBuf,
    paths: RuntimePaths,
}

impl Supervisor {
    pub fn new(executable: impl Into<PathBuf>, paths: RuntimePaths) -> Self {
        Self {
            executable: executable.into(),
            paths,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn paths(&self) -> &RuntimePaths {
        &self.paths
    }

    /// 在后台任务中运行
    pub fn spawn(&self, job: DownloadJob, events: mpsc::Sender<JobEvent>) -> JoinHandle<ProcessResult> {
        let supervisor = self.clone();
        tokio::spawn(async move { supervisor.run(job, &events).await })
    }

    /// 运行一个任务直到子进程退出
    ///
    /// 最后一个事件总是 `Finished`，返回值与之相同。
    pub async fn run(&self, job: DownloadJob, events: &mpsc::Sender<JobEvent>) -> ProcessResult {
        log::info!("Starting job {} for {}", job.id, job.url);

        for entry in job_header(&job.url) {
            emit(events, JobEvent::log(entry)).await;
        }

        let result = self.execute(&job, events).await;

        match &result {
            ProcessResult::Success => log::info!("Job {} finished successfully", job.id),
            other => log::warn!("Job {} failed: {:?}", job.id, other),
        }
        emit(
            events,
            JobEvent::Finished {
                result: result.clone(),
            },
        )
        .await;
        result
    }

    async fn execute(&self, job: &DownloadJob, events: &mpsc::Sender<JobEvent>) -> ProcessResult {
        if let Err(e) = tool_config::write(&self.paths.temp_config_file, job).await {
            return ProcessResult::launch_failed(format!(
                "cannot write {}: {e}",
                self.paths.temp_config_file.display()
            ));
        }

        let transcript = match tokio::fs::File::create(&self.paths.transcript_file).await {
            Ok(file) => file,
            Err(e) => {
                return ProcessResult::launch_failed(format!(
                    "cannot create {}: {e}",
                    self.paths.transcript_file.display()
                ));
            }
        };
        let mut transcript = BufWriter::new(transcript);

        let (output, output_writer) = match std::io::pipe() {
            Ok(pipe) => pipe,
            Err(e) => return ProcessResult::launch_failed(format!("cannot create pipe: {e}")),
        };
        let mut command = self.build_command(job);
        let spawned = attach_output(&mut command, output_writer).and_then(|()| command.spawn());
        // Command 仍持有写端，不关闭的话读取端永远等不到 EOF
        drop(command);
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => return ProcessResult::launch_failed(e),
        };
        log::debug!("Spawned {:?} (pid {:?})", self.executable, child.id());

        let (line_tx, mut line_rx) = mpsc::channel::<String>(256);
        let reader = stream::spawn_line_reader(output, line_tx);

        let mut transcript_ok = true;
        while let Some(line) = line_rx.recv().await {
            if transcript_ok {
                if let Err(e) = write_line(&mut transcript, &line).await {
                    log::warn!("Transcript write failed, disabling: {e}");
                    transcript_ok = false;
                }
            }

            let Some(classified) = classify(&line) else {
                continue;
            };
            if let Some(percent) = classified.progress {
                emit(events, JobEvent::Progress { percent }).await;
            }
            if let Some(entry) = classified.entry() {
                emit(events, JobEvent::log(entry)).await;
            }
        }
        if let Err(e) = transcript.flush().await {
            log::warn!("Transcript flush failed: {e}");
        }
        if let Err(e) = reader.await {
            log::warn!("Output reader panicked: {e}");
        }

        match child.wait().await {
            Ok(status) => ProcessResult::from_status(status),
            Err(e) => ProcessResult::launch_failed(format!("wait failed: {e}")),
        }
    }

    /// 构造 gamdl 命令行
    fn build_command(&self, job: &DownloadJob) -> Command {
        let mut cmd = background_command(&self.executable);
        cmd.arg("--config-path")
            .arg(&self.paths.temp_config_file)
            .arg("--cookies-path")
            .arg(job.cookies_posix())
            .arg("--output-path")
            .arg(&job.output_dir)
            .arg(&job.url)
            .envs(CHILD_ENV.iter().copied())
            .stdin(Stdio::null())
            .kill_on_drop(false);
        if self.paths.base_dir.is_dir() {
            cmd.current_dir(&self.paths.base_dir);
        }
        cmd
    }
}

/// 任务开始时的标题：前两行空行，后一行空行
fn job_header(url: &str) -> Vec<LogEntry> {
    vec![
        LogEntry::plain(""),
        LogEntry::plain(""),
        LogEntry::header(RULE),
        LogEntry::header(format!(" Starting: {url}")),
        LogEntry::plain(RULE),
        LogEntry::plain(""),
    ]
}

/// stdout 和 stderr 共用同一个写端
fn attach_output(cmd: &mut Command, writer: std::io::PipeWriter) -> std::io::Result<()> {
    let stderr = writer.try_clone()?;
    cmd.stdout(writer).stderr(stderr);
    Ok(())
}

async fn write_line(writer: &mut BufWriter<tokio::fs::File>, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await
}

/// 接收端关闭时静默丢弃事件
async fn emit(events: &mpsc::Sender<JobEvent>, event: JobEvent) {
    let _ = events.send(event).await;
}

fn background_command(program: impl AsRef<OsStr>) -> Command {
    let mut cmd = Command::new(program);
    configure_for_background(&mut cmd);
    cmd
}

#[cfg(windows)]
fn configure_for_background(cmd: &mut Command) {
    // 避免在 Windows 上弹出控制台窗口
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn configure_for_background(_cmd: &mut Command) {}
