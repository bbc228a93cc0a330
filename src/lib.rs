//! # Robot Phase Label
//!
//! 一个调用多模态视觉语言模型（VLM）标注机器人操作视频阶段的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/ffmpeg` - 封装 ffprobe / ffmpeg 进程调用，提供视频探测与抽帧能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个视频 / 图片
//! - `PromptBuilder` - 从配置注册表构建提示词能力
//! - `VlmService` - VLM 推理能力（图片描述 / 帧序列分析）
//! - `ResultWriter` - 写结果文件能力（JSON 提取 + txt 兜底）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个视频"的完整处理流程
//! - `VideoCtx` - 上下文封装（视频路径 + 批次进度）
//! - `VideoFlow` - 流程编排（prompt → 抽帧 → VLM → 保存）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量视频处理器，管理 VLM 资源复用与统计
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::registry::{ObjectRegistry, PromptEntry, PromptRegistry};
pub use orchestrator::App;
pub use services::{PromptBuilder, ResultWriter, VlmService};
pub use workflow::{VideoCtx, VideoFlow};
