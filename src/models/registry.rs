//! 配置注册表数据模型
//!
//! 对应两个 JSON 配置文件：
//! - `prompts.json`: 按名字索引的提示词模板
//! - `objects_list.json`: 按操作类型索引的物体名词表

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 单条提示词模板
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptEntry {
    /// 显示名称（用于日志）
    pub name: String,
    /// 模板正文，包含 `{objects_text}` 占位符
    pub prompt: String,
}

/// 提示词注册表，key 为提示词名称（如 `phase_analysis`）
pub type PromptRegistry = HashMap<String, PromptEntry>;

/// 物体名词注册表，key 为操作类型（如 `overall`、`grasping`）
pub type ObjectRegistry = HashMap<String, Vec<String>>;
