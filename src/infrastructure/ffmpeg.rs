//! ffprobe / ffmpeg 进程封装 - 基础设施层
//!
//! 持有对外部 ffmpeg 二进制的唯一调用入口，只暴露两种能力：
//! - 探测视频元信息（时长 / 帧率 / 分辨率）
//! - 按采样帧率抽帧为 JPEG 序列（带最长边缩放）
//!
//! 聊天 API 不接受视频流，视频以抽出的帧序列形式送入 VLM。

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// ffmpeg / ffprobe 操作错误
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("找不到 ffprobe/ffmpeg 可执行文件: {0}")]
    NotFound(std::io::Error),

    #[error("ffprobe/ffmpeg 执行失败 (退出码 {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("解析 ffprobe 输出失败: {0}")]
    ParseError(String),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("视频文件不存在: {0}")]
    VideoNotFound(String),
}

// ---------------------------------------------------------------------------
// ffprobe JSON 输出结构
// ---------------------------------------------------------------------------

/// ffprobe 顶层 JSON 输出（`-print_format json -show_format -show_streams`）
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    pub streams: Vec<FfprobeStream>,
    pub format: FfprobeFormat,
}

/// ffprobe 输出中的单个流
#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    pub codec_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// 形如 "30/1" 或 "24000/1001" 的分数
    pub r_frame_rate: Option<String>,
    pub duration: Option<String>,
}

/// ffprobe 的格式级元信息
#[derive(Debug, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
}

// ---------------------------------------------------------------------------
// 公开 API
// ---------------------------------------------------------------------------

/// 对视频文件运行 ffprobe，返回解析后的元信息
pub async fn probe_video(path: &Path) -> Result<FfprobeOutput, FfmpegError> {
    if !path.exists() {
        return Err(FfmpegError::VideoNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let output = tokio::process::Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str::<FfprobeOutput>(&stdout)
        .map_err(|e| FfmpegError::ParseError(format!("{e}: {stdout}")))
}

/// 按采样帧率抽帧为 JPEG 序列
///
/// 帧文件命名为 `frame_{序号:06}.jpg`，超过 `longest_edge` 的帧会等比缩小。
/// 返回按时间顺序排列的帧路径列表。
pub async fn extract_frames(
    video_path: &Path,
    output_dir: &Path,
    fps: f64,
    longest_edge: u32,
) -> Result<Vec<PathBuf>, FfmpegError> {
    if !video_path.exists() {
        return Err(FfmpegError::VideoNotFound(
            video_path.to_string_lossy().to_string(),
        ));
    }

    tokio::fs::create_dir_all(output_dir).await?;

    // -2 让 ffmpeg 自动取偶数边长
    let filter = format!(
        "fps={fps},scale='if(gt(iw,ih),min({e},iw),-2)':'if(gt(iw,ih),-2,min({e},ih))'",
        e = longest_edge
    );
    let pattern = output_dir.join("frame_%06d.jpg");

    let output = tokio::process::Command::new("ffmpeg")
        .args(["-y", "-i"])
        .arg(video_path)
        .args(["-vf", &filter, "-q:v", "2"])
        .arg(&pattern)
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let mut frames = Vec::new();
    let mut entries = tokio::fs::read_dir(output_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("jpg") {
            frames.push(path);
        }
    }
    frames.sort();

    Ok(frames)
}

/// 将帧序列均匀降采样到不超过 `max_frames` 帧
///
/// 保留首尾帧，中间帧等间隔选取，顺序不变。
pub fn cap_frames(frames: Vec<PathBuf>, max_frames: usize) -> Vec<PathBuf> {
    if max_frames == 0 || frames.len() <= max_frames {
        return frames;
    }
    if max_frames == 1 {
        return vec![frames[0].clone()];
    }

    let last = frames.len() - 1;
    let mut selected = Vec::with_capacity(max_frames);
    let mut prev_idx = usize::MAX;
    for i in 0..max_frames {
        let idx = i * last / (max_frames - 1);
        if idx != prev_idx {
            selected.push(frames[idx].clone());
            prev_idx = idx;
        }
    }
    selected
}

// ---------------------------------------------------------------------------
// 解析辅助函数
// ---------------------------------------------------------------------------

/// 找到 ffprobe 输出中的第一个视频流
fn first_video_stream(probe: &FfprobeOutput) -> Option<&FfprobeStream> {
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

/// 从 ffprobe 输出解析视频时长（秒）
pub fn parse_duration(probe: &FfprobeOutput) -> f64 {
    // 优先使用格式级时长
    if let Some(d) = &probe.format.duration {
        if let Ok(secs) = d.parse::<f64>() {
            return secs;
        }
    }
    // 回退到第一个视频流的时长
    if let Some(stream) = first_video_stream(probe) {
        if let Some(d) = &stream.duration {
            if let Ok(secs) = d.parse::<f64>() {
                return secs;
            }
        }
    }
    0.0
}

/// 从 ffprobe 输出解析帧率
///
/// `r_frame_rate` 是形如 `"30/1"` 或 `"24000/1001"` 的分数
pub fn parse_framerate(probe: &FfprobeOutput) -> f64 {
    first_video_stream(probe)
        .and_then(|s| s.r_frame_rate.as_deref())
        .map(parse_fraction)
        .unwrap_or(0.0)
}

/// 从 ffprobe 输出解析分辨率
pub fn parse_resolution(probe: &FfprobeOutput) -> (i32, i32) {
    first_video_stream(probe)
        .map(|s| (s.width.unwrap_or(0), s.height.unwrap_or(0)))
        .unwrap_or((0, 0))
}

/// 解析 `"30/1"` 形式的分数字符串
fn parse_fraction(s: &str) -> f64 {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() == 2 {
        let num = parts[0].parse::<f64>().unwrap_or(0.0);
        let den = parts[1].parse::<f64>().unwrap_or(1.0);
        if den > 0.0 {
            return num / den;
        }
    }
    s.parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_stream(r_frame_rate: &str, duration: Option<&str>) -> FfprobeStream {
        FfprobeStream {
            codec_type: Some("video".into()),
            width: Some(1920),
            height: Some(1080),
            r_frame_rate: Some(r_frame_rate.into()),
            duration: duration.map(|d| d.into()),
        }
    }

    #[test]
    fn test_parse_fraction_standard() {
        assert!((parse_fraction("30/1") - 30.0).abs() < 0.001);
    }

    #[test]
    fn test_parse_fraction_ntsc() {
        let fps = parse_fraction("24000/1001");
        assert!((fps - 23.976).abs() < 0.01);
    }

    #[test]
    fn test_parse_fraction_plain_number() {
        assert!((parse_fraction("25") - 25.0).abs() < 0.001);
    }

    #[test]
    fn test_parse_fraction_zero_denominator() {
        assert!((parse_fraction("30/0") - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_parse_duration_from_format() {
        let probe = FfprobeOutput {
            streams: vec![],
            format: FfprobeFormat {
                duration: Some("120.5".to_string()),
            },
        };
        assert!((parse_duration(&probe) - 120.5).abs() < 0.001);
    }

    #[test]
    fn test_parse_duration_falls_back_to_stream() {
        let probe = FfprobeOutput {
            streams: vec![video_stream("30/1", Some("60.0"))],
            format: FfprobeFormat { duration: None },
        };
        assert!((parse_duration(&probe) - 60.0).abs() < 0.001);
    }

    #[test]
    fn test_parse_framerate() {
        let probe = FfprobeOutput {
            streams: vec![video_stream("24000/1001", None)],
            format: FfprobeFormat { duration: None },
        };
        assert!((parse_framerate(&probe) - 23.976).abs() < 0.01);
    }

    #[test]
    fn test_parse_resolution() {
        let probe = FfprobeOutput {
            streams: vec![video_stream("30/1", None)],
            format: FfprobeFormat { duration: None },
        };
        assert_eq!(parse_resolution(&probe), (1920, 1080));
    }

    fn fake_frames(n: usize) -> Vec<PathBuf> {
        (0..n)
            .map(|i| PathBuf::from(format!("frame_{i:06}.jpg")))
            .collect()
    }

    #[test]
    fn test_cap_frames_under_limit_unchanged() {
        let frames = fake_frames(8);
        assert_eq!(cap_frames(frames.clone(), 16), frames);
    }

    #[test]
    fn test_cap_frames_keeps_first_and_last() {
        let capped = cap_frames(fake_frames(100), 10);
        assert_eq!(capped.len(), 10);
        assert_eq!(capped[0], PathBuf::from("frame_000000.jpg"));
        assert_eq!(capped[9], PathBuf::from("frame_000099.jpg"));
    }

    #[test]
    fn test_cap_frames_never_exceeds_limit() {
        for n in [1usize, 2, 5, 17, 33, 100] {
            assert!(cap_frames(fake_frames(n), 16).len() <= 16);
        }
    }

    #[test]
    fn test_cap_frames_single() {
        let capped = cap_frames(fake_frames(50), 1);
        assert_eq!(capped, vec![PathBuf::from("frame_000000.jpg")]);
    }
}
