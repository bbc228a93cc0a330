//! 批量视频处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量视频的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：加载注册表、创建 VideoFlow、检查推理服务连通性
//! 2. **批量扫描**：按扩展名过滤视频文件夹（大小写不敏感，跳过子目录）
//! 3. **顺序处理**：同一时刻只有一个在途请求，VlmService 整批复用
//! 4. **错误隔离**：单个视频失败记录为 `Error: {e}`，整批继续
//! 5. **全局统计**：汇总所有视频的处理结果

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::loaders::{load_object_registry, load_prompt_registry};
use crate::workflow::{VideoCtx, VideoFlow};

/// 应用主结构
pub struct App {
    config: Config,
    flow: VideoFlow,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        // 加载两个配置注册表
        let prompts = load_prompt_registry(&config.prompts_file).await?;
        let objects = load_object_registry(&config.objects_file).await?;

        // 创建流程（VlmService 在此建立，整批复用）
        let flow = VideoFlow::new(&config, prompts, objects);

        // 启动时先确认推理服务可达
        flow.vlm().check_server().await?;

        Ok(Self { config, flow })
    }

    /// 运行应用主逻辑
    ///
    /// 返回 `视频文件名 → 模型分析文本或错误字符串` 的映射
    pub async fn run(&self) -> Result<HashMap<String, String>> {
        // 扫描视频文件夹
        let video_files = self.scan_video_folder().await?;

        if video_files.is_empty() {
            warn!(
                "⚠️ 在文件夹 '{}' 中未找到支持的视频文件",
                self.config.video_folder
            );
            return Ok(HashMap::new());
        }

        let total = video_files.len();
        info!("找到 {} 个视频文件:", total);
        for video_file in &video_files {
            info!(
                "  - {}",
                video_file.file_name().unwrap_or_default().to_string_lossy()
            );
        }

        // 顺序处理所有视频
        let mut results = HashMap::new();
        let mut stats = ProcessingStats {
            total,
            ..Default::default()
        };

        for (i, video_path) in video_files.into_iter().enumerate() {
            let ctx = VideoCtx::new(video_path, i + 1, total);
            log_video_start(&ctx);

            let outcome = self.flow.run(&ctx).await;
            match &outcome {
                Ok(_) => {
                    info!("✓ 完成: {}", ctx.video_name);
                    stats.success += 1;
                }
                Err(e) => {
                    error!("✗ 处理失败 {}: {}", ctx.video_name, e);
                    stats.failed += 1;
                }
            }
            record_outcome(&mut results, ctx.video_name, outcome);
        }

        // 输出最终统计
        print_final_stats(&stats);

        Ok(results)
    }

    /// 扫描视频文件夹，按扩展名过滤
    async fn scan_video_folder(&self) -> Result<Vec<PathBuf>> {
        let folder = PathBuf::from(&self.config.video_folder);

        if !folder.exists() {
            anyhow::bail!("文件夹不存在: {}", self.config.video_folder);
        }

        info!("\n📁 正在扫描待处理的视频...");

        let mut video_files = Vec::new();
        let mut entries = tokio::fs::read_dir(&folder).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_file() && is_supported_video(&path, &self.config.supported_formats) {
                video_files.push(path);
            }
        }
        // 固定处理顺序
        video_files.sort();

        Ok(video_files)
    }
}

/// 判断文件扩展名是否在支持列表中（大小写不敏感）
fn is_supported_video(path: &Path, supported_formats: &[String]) -> bool {
    let ext = match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!(".{}", ext.to_ascii_lowercase()),
        None => return false,
    };
    supported_formats.iter().any(|f| f.to_ascii_lowercase() == ext)
}

/// 把单个视频的处理结果记入映射
///
/// 成功存模型原文，失败存 `Error: {e}` 字符串，保证整批可以继续
fn record_outcome(
    results: &mut HashMap<String, String>,
    video_name: String,
    outcome: Result<String>,
) {
    let value = match outcome {
        Ok(text) => text,
        Err(e) => format!("Error: {e}"),
    };
    results.insert(video_name, value);
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    total: usize,
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量机器人操作阶段分析");
    info!("📊 模型: {}", config.vlm_model_name);
    info!("📊 采样帧率: {} / 帧预算: {}", config.sample_fps, config.max_frames_per_request);
    info!("{}", "=".repeat(60));
}

fn log_video_start(ctx: &VideoCtx) {
    info!("\n{}", "=".repeat(60));
    info!("处理进度: {}/{} - {}", ctx.index, ctx.total, ctx.video_name);
    info!("{}", "=".repeat(60));
}

fn print_final_stats(stats: &ProcessingStats) {
    info!("\n{}", "=".repeat(60));
    info!("📊 批量处理完成！共处理 {} 个视频", stats.total);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 成功: {}/{}", stats.success, stats.total);
    info!("❌ 失败: {}", stats.failed);
    info!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formats() -> Vec<String> {
        vec![
            ".mp4".to_string(),
            ".avi".to_string(),
            ".mov".to_string(),
            ".mkv".to_string(),
            ".webm".to_string(),
        ]
    }

    #[test]
    fn test_is_supported_video_case_insensitive() {
        assert!(is_supported_video(Path::new("a.mp4"), &formats()));
        assert!(is_supported_video(Path::new("b.MOV"), &formats()));
        assert!(is_supported_video(Path::new("c.WebM"), &formats()));
    }

    #[test]
    fn test_is_supported_video_rejects_others() {
        assert!(!is_supported_video(Path::new("readme.txt"), &formats()));
        assert!(!is_supported_video(Path::new("noext"), &formats()));
        assert!(!is_supported_video(Path::new("frame.jpg"), &formats()));
    }

    #[test]
    fn test_record_outcome_keeps_batch_going() {
        let mut results = HashMap::new();

        record_outcome(&mut results, "a.mp4".to_string(), Ok("phases".to_string()));
        record_outcome(&mut results, "b.mp4".to_string(), Ok("phases".to_string()));
        record_outcome(
            &mut results,
            "broken.mp4".to_string(),
            Err(anyhow::anyhow!("ffmpeg 执行失败")),
        );

        assert_eq!(results.len(), 3);
        assert_eq!(results["a.mp4"], "phases");
        assert!(results["broken.mp4"].starts_with("Error: "));
        assert!(results["broken.mp4"].contains("ffmpeg"));
    }

    #[test]
    fn test_scan_filters_extensions_and_skips_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("b.MKV"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub.mp4")).unwrap();

        let config = Config {
            video_folder: dir.path().to_string_lossy().to_string(),
            ..Config::default()
        };
        // 只测扫描，不初始化完整 App
        let app = App {
            flow: VideoFlow::new(&config, HashMap::new(), HashMap::new()),
            config,
        };

        let files = tokio_test::block_on(app.scan_video_folder()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.mp4", "b.MKV"]);
    }
}
