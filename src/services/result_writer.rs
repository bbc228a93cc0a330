//! 结果写入服务 - 业务能力层
//!
//! 只负责"保存分析结果"能力，不关心流程
//!
//! 模型返回的文本可能被 ```json 围栏、普通 ``` 围栏包裹或完全裸露；
//! 先做尽力而为的 JSON 提取，解析成功写入带 metadata 的 .json 文件，
//! 解析失败则把原始文本兜底写入 .txt 文件。

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use regex::Regex;
use serde_json::{json, Value as JsonValue};
use tracing::{info, warn};

use crate::error::AppError;

/// 结果写入服务
///
/// 职责：
/// - 将单次分析结果持久化为时间戳命名的文件
/// - 只处理单个结果
/// - 不出现 Vec<Video>
/// - 不关心流程顺序
pub struct ResultWriter {
    results_dir: String,
}

impl ResultWriter {
    /// 创建新的结果写入服务
    pub fn new(results_dir: impl Into<String>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    /// 保存阶段分析结果
    ///
    /// # 参数
    /// - `result_text`: 模型返回的原始文本
    /// - `video_name`: 视频文件名（用于命名与 metadata）
    ///
    /// # 返回
    /// 返回实际写入的文件路径（.json 或兜底的 .txt）
    pub async fn save_phase_results(
        &self,
        result_text: &str,
        video_name: &str,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.results_dir)
            .await
            .map_err(|e| AppError::file_write_failed(&self.results_dir, e))?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let json_path =
            PathBuf::from(&self.results_dir).join(format!("{video_name}_phases_{timestamp}.json"));

        let payload = extract_json_payload(result_text)?;

        match serde_json::from_str::<JsonValue>(&payload) {
            Ok(mut phase_data) => {
                let metadata = json!({
                    "video_file": video_name,
                    "analysis_time": Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                });

                // 模型偶尔返回 JSON 数组，包一层以便仍能附加 metadata
                if let Some(obj) = phase_data.as_object_mut() {
                    obj.insert("metadata".to_string(), metadata);
                } else {
                    phase_data = json!({ "result": phase_data, "metadata": metadata });
                }

                let pretty = serde_json::to_string_pretty(&phase_data)?;
                tokio::fs::write(&json_path, pretty)
                    .await
                    .map_err(|e| AppError::file_write_failed(json_path.display().to_string(), e))?;

                info!("Analysis results saved to: {}", json_path.display());
                Ok(json_path)
            }
            Err(e) => {
                // JSON 解析失败，把原始文本兜底写入 .txt
                warn!("JSON parsing failed, saving as text: {}", e);

                let txt_path = json_path.with_extension("txt");
                let separator = "=".repeat(50);
                let content = format!(
                    "Robot Operation Phase Analysis Results\n{separator}\nVideo File: {video_name}\nAnalysis Time: {}\n{separator}\n\n{result_text}",
                    Local::now().format("%Y-%m-%d %H:%M:%S"),
                );

                tokio::fs::write(&txt_path, content)
                    .await
                    .map_err(|e| AppError::file_write_failed(txt_path.display().to_string(), e))?;

                info!("Analysis results saved to: {}", txt_path.display());
                Ok(txt_path)
            }
        }
    }
}

impl Default for ResultWriter {
    fn default() -> Self {
        Self::new("phase_results")
    }
}

/// 从模型输出中提取 JSON 负载
///
/// 优先取 ```json 围栏内的内容，其次取普通 ``` 围栏内的内容，
/// 两者都没有时返回去除首尾空白的原文。
pub fn extract_json_payload(text: &str) -> Result<String> {
    let trimmed = text.trim();

    if trimmed.contains("```json") {
        let re = Regex::new(r"(?s)```json\s*(.*?)\s*(?:```|\z)")?;
        if let Some(cap) = re.captures(trimmed) {
            if let Some(m) = cap.get(1) {
                return Ok(m.as_str().trim().to_string());
            }
        }
    } else if trimmed.contains("```") {
        let re = Regex::new(r"(?s)```\s*(.*?)\s*(?:```|\z)")?;
        if let Some(cap) = re.captures(trimmed) {
            if let Some(m) = cap.get(1) {
                return Ok(m.as_str().trim().to_string());
            }
        }
    }

    Ok(trimmed.to_string())
}
