//! gamdl 配置文件生成
//!
//! 只有 `codec_song` 和 `cookies_path` 随任务变化，其余均为固定默认值。

use crate::job::DownloadJob;
use std::path::Path;

const CONFIG_TEMPLATE: &str = "[gamdl]
save_cover = true
no_synced_lyrics = true
log_level = INFO
log_file = null
no_exceptions = false
language = en-US
wvd_path = null
overwrite = false
save_playlist = false
nm3u8dlre_path = N_m3u8DL-RE
mp4decrypt_path = mp4decrypt
ffmpeg_path = ffmpeg
mp4box_path = MP4Box
download_mode = ytdlp
remux_mode = ffmpeg
cover_format = jpg
album_folder_template = {album_artist}/{album}
compilation_folder_template = Compilations/{album}
single_disc_file_template = {track:02d} {title}
multi_disc_file_template = {disc}-{track:02d} {title}
no_album_folder_template = {artist}/Unknown Album
no_album_file_template = {title}
playlist_file_template = Playlists/{playlist_artist}/{playlist_title}
date_tag_template = %Y-%m-%dT%H:%M:%SZ
exclude_tags = null
cover_size = 1200
truncate = null
synced_lyrics_format = lrc
synced_lyrics_only = false
music_video_codec_priority = h264,h265
music_video_remux_format = m4v
music_video_resolution = 1080p
uploaded_video_quality = best
codec_song = @CODEC@
cookies_path = @COOKIES@
";

/// 渲染配置文件内容
pub fn render(job: &DownloadJob) -> String {
    CONFIG_TEMPLATE
        .replace("@CODEC@", job.codec.id())
        .replace("@COOKIES@", &job.cookies_posix())
}

/// 写入（覆盖）配置文件
pub async fn write(path: &Path, job: &DownloadJob) -> std::io::Result<()> {
    tokio::fs::write(path, render(job)).await?;
    log::debug!("Wrote gamdl config to {:?}", path);
    Ok(())
}
