//! 视频处理流程 - 流程层
//!
//! 核心职责：定义"一个视频"的完整处理流程
//!
//! 流程顺序：
//! 1. 构建提示词（注册表查找 + 词表合并）
//! 2. ffprobe 探测 → ffmpeg 抽帧
//! 3. VLM 帧序列分析
//! 4. 保存结果（JSON 提取 + txt 兜底）
//! 5. 清理临时帧目录

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::infrastructure::ffmpeg;
use crate::models::registry::{ObjectRegistry, PromptRegistry};
use crate::services::{PromptBuilder, ResultWriter, VlmService};
use crate::utils::logging::truncate_text;
use crate::workflow::video_ctx::VideoCtx;

/// 视频处理流程
///
/// - 编排完整的视频分析流程
/// - 决定何时抽帧、何时推理、何时兜底
/// - 不持有批次状态
/// - 只依赖业务能力（services）
pub struct VideoFlow {
    prompt_builder: PromptBuilder,
    vlm_service: VlmService,
    result_writer: ResultWriter,
    prompt_key: String,
    operation_type: String,
    custom_objects: Vec<String>,
    sample_fps: f64,
    frame_longest_edge: u32,
}

impl VideoFlow {
    /// 创建新的视频处理流程
    ///
    /// VlmService 在此创建一次，整个批次复用，避免重复建连
    pub fn new(config: &Config, prompts: PromptRegistry, objects: ObjectRegistry) -> Self {
        Self {
            prompt_builder: PromptBuilder::new(prompts, objects),
            vlm_service: VlmService::new(config),
            result_writer: ResultWriter::new(config.results_dir.clone()),
            prompt_key: config.prompt_key.clone(),
            operation_type: config.operation_type.clone(),
            custom_objects: config.custom_objects.clone(),
            sample_fps: config.sample_fps,
            frame_longest_edge: config.frame_longest_edge,
        }
    }

    /// 复用的 VLM 服务（供编排层做启动连通性检查）
    pub fn vlm(&self) -> &VlmService {
        &self.vlm_service
    }

    /// 处理单个视频，返回模型的原始分析文本
    pub async fn run(&self, ctx: &VideoCtx) -> Result<String> {
        // 提示词每个视频单独构建，与词表改动保持同步
        let prompt =
            self.prompt_builder
                .build(&self.prompt_key, &self.operation_type, &self.custom_objects)?;
        debug!("{} 提示词预览: {}", ctx, truncate_text(&prompt, 120));

        // 探测视频元信息
        let probe = ffmpeg::probe_video(&ctx.video_path).await?;
        let (width, height) = ffmpeg::parse_resolution(&probe);
        info!(
            "{} 时长 {:.1}s, 帧率 {:.2}, 分辨率 {}x{}",
            ctx,
            ffmpeg::parse_duration(&probe),
            ffmpeg::parse_framerate(&probe),
            width,
            height
        );

        // 抽帧到临时目录，结束后清理
        let frames_dir = temp_frames_dir(&ctx.video_path);
        let outcome = self.analyze_with_frames(ctx, &prompt, &frames_dir).await;

        if let Err(e) = tokio::fs::remove_dir_all(&frames_dir).await {
            warn!("{} 清理临时帧目录失败: {}", ctx, e);
        }
        let result = outcome?;

        // 保存结果
        let saved_path = self
            .result_writer
            .save_phase_results(&result, &ctx.video_name)
            .await?;
        info!("{} ✓ 结果已保存: {}", ctx, saved_path.display());

        Ok(result)
    }

    /// 抽帧并调用 VLM 分析
    async fn analyze_with_frames(
        &self,
        ctx: &VideoCtx,
        prompt: &str,
        frames_dir: &Path,
    ) -> Result<String> {
        let frames = ffmpeg::extract_frames(
            &ctx.video_path,
            frames_dir,
            self.sample_fps,
            self.frame_longest_edge,
        )
        .await?;

        info!(
            "{} 抽取 {} 帧 (采样帧率 {})",
            ctx,
            frames.len(),
            self.sample_fps
        );

        self.vlm_service.analyze_frames(&frames, prompt).await
    }
}

/// 为单个视频生成唯一的临时帧目录
fn temp_frames_dir(video_path: &Path) -> PathBuf {
    let stem = video_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());

    std::env::temp_dir().join(format!(
        "robot_phase_frames_{}_{}",
        stem,
        Local::now().format("%Y%m%d_%H%M%S%.3f")
    ))
}
