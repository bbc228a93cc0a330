//! 视频处理上下文
//!
//! 封装"我正在处理这一批的第几个视频"这一信息

use std::fmt::Display;
use std::path::PathBuf;

/// 视频处理上下文
///
/// 包含处理单个视频所需的所有上下文信息
#[derive(Debug, Clone)]
pub struct VideoCtx {
    /// 视频文件完整路径
    pub video_path: PathBuf,

    /// 视频文件名（用于结果命名与 metadata）
    pub video_name: String,

    /// 视频在批次中的序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 批次总数
    pub total: usize,
}

impl VideoCtx {
    /// 创建新的视频上下文
    pub fn new(video_path: PathBuf, index: usize, total: usize) -> Self {
        let video_name = video_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            video_path,
            video_name,
            index,
            total,
        }
    }
}

impl Display for VideoCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[视频 {}/{} {}]",
            self.index, self.total, self.video_name
        )
    }
}
