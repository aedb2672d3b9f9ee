//! Application state

use std::collections::VecDeque;
use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tunefetch_core::{
    AppSettings, Codec, DownloadJob, DownloadRequest, JobError, JobEvent, LogEntry,
    RuntimePaths, Supervisor, ThemeMode, check_environment,
};

/// 日志面板最多保留的行数
const MAX_LOG_LINES: usize = 5000;

/// PageUp/PageDown 滚动的行数
const SCROLL_STEP: usize = 10;

/// 应用事件（来自 tracing 日志层）
#[derive(Debug)]
pub enum AppEvent {
    Log(LogEntry),
}

/// 表单字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Url,
    Codec,
    Folder,
    Cookies,
}

impl Field {
    pub fn next(self) -> Self {
        match self {
            Field::Url => Field::Codec,
            Field::Codec => Field::Folder,
            Field::Folder => Field::Cookies,
            Field::Cookies => Field::Url,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Field::Url => Field::Cookies,
            Field::Codec => Field::Url,
            Field::Folder => Field::Codec,
            Field::Cookies => Field::Folder,
        }
    }
}

pub struct App {
    pub paths: RuntimePaths,
    pub settings: AppSettings,
    /// 设置文件路径，为 `None` 时不持久化
    settings_path: Option<PathBuf>,
    pub executable: Option<PathBuf>,

    pub focus: Field,
    pub url: String,
    pub codec: Codec,
    pub folder: String,
    pub cookies: String,

    pub logs: VecDeque<LogEntry>,
    /// 距离底部的滚动行数，0 表示跟随最新日志
    pub log_scroll: usize,
    pub progress: f64,
    pub status: String,
    /// 任务进行中，禁止再次提交
    pub busy: bool,
    pub theme: ThemeMode,
    /// 提示弹窗，任意键关闭
    pub notice: Option<String>,

    pub event_tx: mpsc::Sender<AppEvent>,
    event_rx: mpsc::Receiver<AppEvent>,
    job_rx: Option<mpsc::Receiver<JobEvent>>,
}

impl App {
    pub fn new(paths: RuntimePaths, settings: AppSettings, settings_path: Option<PathBuf>) -> Self {
        let (event_tx, event_rx) = mpsc::channel(1024);
        let folder = settings
            .output_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let mut logs = VecDeque::new();
        logs.push_back(LogEntry::plain("Tunefetch TUI 启动"));
        logs.push_back(LogEntry::plain(
            "Tab 切换字段, Enter 下载, F2 切换主题, Ctrl-L 清空日志, Esc 退出",
        ));

        Self {
            paths,
            codec: settings.codec,
            theme: settings.theme,
            settings,
            settings_path,
            executable: None,
            focus: Field::Url,
            url: String::new(),
            folder,
            cookies: String::new(),
            logs,
            log_scroll: 0,
            progress: 0.0,
            status: "Ready".to_string(),
            busy: false,
            notice: None,
            event_tx,
            event_rx,
            job_rx: None,
        }
    }

    /// 启动时的环境检查，同时填充 cookies 字段
    pub fn check_environment(&mut self) {
        let report = check_environment(&self.paths, self.settings.executable.as_deref());
        self.executable = report.executable.clone();

        let configured = self
            .settings
            .cookies_path
            .clone()
            .filter(|p| p.is_file());
        if let Some(path) = configured.or_else(|| report.cookies.clone()) {
            self.cookies = path.display().to_string();
        }

        for entry in report.entries() {
            self.add_log(entry);
        }
    }

    pub fn add_log(&mut self, entry: LogEntry) {
        if self.logs.len() >= MAX_LOG_LINES {
            self.logs.pop_front();
        }
        self.logs.push_back(entry);
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
        self.log_scroll = 0;
    }

    pub fn scroll_up(&mut self) {
        self.log_scroll = (self.log_scroll + SCROLL_STEP).min(self.logs.len());
    }

    pub fn scroll_down(&mut self) {
        self.log_scroll = self.log_scroll.saturating_sub(SCROLL_STEP);
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
        self.settings.theme = self.theme;
        self.persist_settings();
    }

    pub fn next_field(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn previous_field(&mut self) {
        self.focus = self.focus.previous();
    }

    pub fn cycle_codec(&mut self) {
        self.codec = self.codec.next();
    }

    /// 当前聚焦的文本字段
    fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Url => Some(&mut self.url),
            Field::Folder => Some(&mut self.folder),
            Field::Cookies => Some(&mut self.cookies),
            Field::Codec => None,
        }
    }

    pub fn input_char(&mut self, c: char) {
        match self.focused_text() {
            Some(text) => text.push(c),
            None if c == ' ' => self.cycle_codec(),
            None => {}
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.focused_text() {
            text.pop();
        }
    }

    /// 当前表单对应的下载请求
    pub fn request(&self) -> DownloadRequest {
        DownloadRequest {
            url: self.url.clone(),
            output_dir: non_empty_path(&self.folder),
            cookies_path: non_empty_path(&self.cookies),
            codec: self.codec,
        }
    }

    /// 校验表单，失败时把错误写入日志或提示弹窗
    pub fn prepare_job(&mut self) -> Option<DownloadJob> {
        if self.busy {
            tracing::debug!("Submission ignored: a job is already running");
            return None;
        }

        match self.request().validate(&self.paths, self.executable.as_deref()) {
            Ok(job) => Some(job),
            Err(e) if e.is_notice() => {
                self.notice = Some(e.to_string());
                None
            }
            Err(JobError::ExecutableNotFound) => {
                self.add_log(LogEntry::error(
                    "[ERROR] Gamdl not found in PATH! Install it via pip.",
                ));
                None
            }
            Err(e) => {
                self.add_log(LogEntry::error(format!("[ERROR] {e}")));
                None
            }
        }
    }

    /// 进入忙碌状态，返回工作任务使用的事件发送端
    pub fn begin_job(&mut self) -> mpsc::Sender<JobEvent> {
        let (tx, rx) = mpsc::channel(1024);
        self.job_rx = Some(rx);
        self.busy = true;
        self.progress = 0.0;
        self.status = "Downloading...".to_string();
        self.url.clear();
        self.log_scroll = 0;

        self.settings.output_dir = non_empty_path(&self.folder);
        self.settings.codec = self.codec;
        self.persist_settings();
        tx
    }

    /// 提交下载（Enter）
    pub fn submit(&mut self) -> bool {
        let Some(job) = self.prepare_job() else {
            return false;
        };
        let Some(executable) = self.executable.clone() else {
            return false;
        };

        let tx = self.begin_job();
        Supervisor::new(executable, self.paths.clone()).spawn(job, tx);
        true
    }

    /// 处理工作任务发来的事件
    pub fn apply_job_event(&mut self, event: JobEvent) {
        match event {
            JobEvent::Progress { percent } => self.progress = percent,
            JobEvent::Log { entry } => self.add_log(entry),
            JobEvent::Finished { result } => {
                if result.is_success() {
                    self.progress = 100.0;
                    self.notice = Some("Download complete!".to_string());
                }
                self.status = result.status_text().to_string();
                self.add_log(result.summary());
                self.finish_job();
            }
        }
    }

    fn finish_job(&mut self) {
        self.busy = false;
        self.job_rx = None;
    }

    /// 每个 UI tick 调用：按顺序消费所有待处理事件
    pub fn tick(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                AppEvent::Log(entry) => self.add_log(entry),
            }
        }

        loop {
            let event = match self.job_rx.as_mut().map(mpsc::Receiver::try_recv) {
                Some(Ok(event)) => event,
                Some(Err(TryRecvError::Disconnected)) => {
                    // 工作任务在发送 Finished 之前退出（panic）
                    self.status = "Error".to_string();
                    self.add_log(LogEntry::error("Worker exited unexpectedly"));
                    self.finish_job();
                    break;
                }
                Some(Err(TryRecvError::Empty)) | None => break,
            };
            self.apply_job_event(event);
        }
    }

    fn persist_settings(&self) {
        if let Some(path) = &self.settings_path
            && let Err(e) = self.settings.save_to(path)
        {
            tracing::warn!("Failed to save settings: {e}");
        }
    }
}

fn non_empty_path(text: &str) -> Option<PathBuf> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tunefetch_core::{Category, ProcessResult};

    fn app(dir: &TempDir) -> App {
        let paths = RuntimePaths::with_base_dir(dir.path());
        let mut app = App::new(paths, AppSettings::default(), None);
        app.executable = Some(PathBuf::from("/usr/bin/gamdl"));
        app
    }

    fn ready_app(dir: &TempDir) -> App {
        let mut app = app(dir);
        let cookies = dir.path().join("cookies.txt");
        std::fs::write(&cookies, "x").unwrap();
        app.url = "https://music.apple.com/album/1".to_string();
        app.cookies = cookies.display().to_string();
        app.folder = dir.path().join("music").display().to_string();
        app
    }

    #[test]
    fn test_field_cycle() {
        let mut field = Field::Url;
        for _ in 0..4 {
            field = field.next();
        }
        assert_eq!(field, Field::Url);
        assert_eq!(Field::Url.previous(), Field::Cookies);
    }

    #[test]
    fn test_input_goes_to_focused_field() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.input_char('a');
        app.next_field();
        app.input_char(' ');
        assert_eq!(app.codec, Codec::Mp3);
        app.next_field();
        app.input_char('/');
        app.backspace();
        app.input_char('m');
        assert_eq!(app.url, "a");
        assert_eq!(app.folder, "m");
    }

    #[test]
    fn test_empty_url_shows_notice() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        assert!(app.prepare_job().is_none());
        assert_eq!(app.notice.as_deref(), Some("Enter a link"));
        assert!(!app.busy);
    }

    #[test]
    fn test_missing_cookies_logged() {
        let dir = TempDir::new().unwrap();
        let mut app = ready_app(&dir);
        app.cookies.clear();
        assert!(app.prepare_job().is_none());
        let last = app.logs.back().unwrap();
        assert_eq!(last.message, "[ERROR] Cookies file not found!");
        assert_eq!(last.category, Some(Category::Error));
    }

    #[test]
    fn test_second_submission_rejected_while_busy() {
        let dir = TempDir::new().unwrap();
        let mut app = ready_app(&dir);
        assert!(app.prepare_job().is_some());

        let _tx = app.begin_job();
        assert!(app.busy);
        assert_eq!(app.status, "Downloading...");
        assert!(app.url.is_empty());

        app.url = "https://music.apple.com/album/2".to_string();
        assert!(app.prepare_job().is_none());
        assert!(!app.submit());
        assert!(app.busy);
    }

    #[test]
    fn test_success_forces_full_progress() {
        let dir = TempDir::new().unwrap();
        let mut app = ready_app(&dir);
        let tx = app.begin_job();

        tx.try_send(JobEvent::Progress { percent: 42.5 }).unwrap();
        tx.try_send(JobEvent::Finished {
            result: ProcessResult::Success,
        })
        .unwrap();
        drop(tx);
        app.tick();

        assert_eq!(app.progress, 100.0);
        assert_eq!(app.status, "Done");
        assert!(!app.busy);
        assert_eq!(app.logs.back().unwrap().message, "Download complete!");
        assert_eq!(app.notice.as_deref(), Some("Download complete!"));
    }

    #[test]
    fn test_failure_keeps_progress() {
        let dir = TempDir::new().unwrap();
        let mut app = ready_app(&dir);
        let tx = app.begin_job();

        tx.try_send(JobEvent::Progress { percent: 42.5 }).unwrap();
        tx.try_send(JobEvent::Finished {
            result: ProcessResult::Failed { code: Some(1) },
        })
        .unwrap();
        app.tick();

        assert_eq!(app.progress, 42.5);
        assert_eq!(app.status, "Error");
        assert!(!app.busy);
        assert_eq!(app.logs.back().unwrap().message, "Code: 1");
        assert!(app.notice.is_none());

        // 任务结束后可以再次提交
        app.url = "https://music.apple.com/album/2".to_string();
        assert!(app.prepare_job().is_some());
    }

    #[test]
    fn test_events_applied_in_order() {
        let dir = TempDir::new().unwrap();
        let mut app = ready_app(&dir);
        let tx = app.begin_job();
        for i in 0..5 {
            tx.try_send(JobEvent::log(LogEntry::plain(format!("line {i}"))))
                .unwrap();
        }
        app.tick();
        let tail: Vec<_> = app.logs.iter().rev().take(5).rev().collect();
        for (i, entry) in tail.iter().enumerate() {
            assert_eq!(entry.message, format!("line {i}"));
        }
        // 尚未收到 Finished，仍然忙碌
        assert!(app.busy);
    }

    #[test]
    fn test_worker_disconnect_reenables_submission() {
        let dir = TempDir::new().unwrap();
        let mut app = ready_app(&dir);
        drop(app.begin_job());
        app.tick();
        assert!(!app.busy);
        assert_eq!(app.status, "Error");
    }

    #[test]
    fn test_log_buffer_capped() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        for i in 0..(MAX_LOG_LINES + 10) {
            app.add_log(LogEntry::plain(i.to_string()));
        }
        assert_eq!(app.logs.len(), MAX_LOG_LINES);
        assert_eq!(
            app.logs.back().unwrap().message,
            (MAX_LOG_LINES + 9).to_string()
        );
    }

    #[test]
    fn test_theme_toggle_persists() {
        let dir = TempDir::new().unwrap();
        let settings_path = dir.path().join("settings.toml");
        let paths = RuntimePaths::with_base_dir(dir.path());
        let mut app = App::new(paths, AppSettings::default(), Some(settings_path.clone()));
        app.toggle_theme();
        assert_eq!(app.theme, ThemeMode::Dark);
        assert_eq!(AppSettings::load_from(&settings_path).theme, ThemeMode::Dark);
    }
}
