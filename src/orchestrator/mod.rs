//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ### `batch_processor` - 批量视频处理器
//! - 管理应用生命周期（初始化、运行、统计）
//! - 扫描视频文件夹并过滤支持的格式
//! - 顺序处理每个视频，单个失败不影响整批
//! - 复用同一个 VideoFlow（及其持有的 VlmService）
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Video>)
//!     ↓
//! workflow::VideoFlow (处理单个 Video)
//!     ↓
//! services (能力层：prompt / vlm / result)
//!     ↓
//! infrastructure (基础设施：ffmpeg)
//! ```

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::App;
