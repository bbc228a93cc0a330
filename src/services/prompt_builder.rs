//! 提示词构建服务 - 业务能力层
//!
//! 只负责"从注册表构建提示词"能力，不关心流程
//!
//! 词表查找规则：
//! 1. 按操作类型查找物体名词表，不存在则回退到 `overall` 类别
//! 2. `overall` 也不存在时使用空列表并打告警
//! 3. 自定义物体追加在类别词表之后

use anyhow::Result;
use tracing::{info, warn};

use crate::error::{AppError, PromptError};
use crate::models::registry::{ObjectRegistry, PromptRegistry};

/// 模板中物体列表的占位符
const OBJECTS_PLACEHOLDER: &str = "{objects_text}";

/// 提示词构建服务
///
/// 职责：
/// - 从两个注册表构建完整提示词
/// - 只处理单次构建
/// - 不关心流程顺序
pub struct PromptBuilder {
    prompts: PromptRegistry,
    objects: ObjectRegistry,
}

impl PromptBuilder {
    /// 创建新的提示词构建服务
    pub fn new(prompts: PromptRegistry, objects: ObjectRegistry) -> Self {
        Self { prompts, objects }
    }

    /// 构建提示词
    ///
    /// # 参数
    /// - `prompt_key`: 提示词模板名称
    /// - `operation_type`: 操作类型（物体词表类别）
    /// - `custom_objects`: 追加的自定义物体名词
    ///
    /// # 返回
    /// 返回填充了物体列表的完整提示词
    pub fn build(
        &self,
        prompt_key: &str,
        operation_type: &str,
        custom_objects: &[String],
    ) -> Result<String> {
        let entry = self.prompts.get(prompt_key).ok_or_else(|| {
            let mut available: Vec<String> = self.prompts.keys().cloned().collect();
            available.sort();
            AppError::Prompt(PromptError::UnknownKey {
                key: prompt_key.to_string(),
                available,
            })
        })?;

        let objects_list = self.resolve_objects(operation_type, custom_objects);
        let objects_text = objects_list.join(", ");

        let prompt = entry.prompt.replace(OBJECTS_PLACEHOLDER, &objects_text);

        info!("使用prompt: {}", entry.name);
        info!("操作类型: {}", operation_type);
        info!("物体数量: {}", objects_list.len());

        Ok(prompt)
    }

    /// 按操作类型解析物体名词列表
    ///
    /// 查找顺序：操作类型 → `overall` 类别 → 空列表（告警）
    fn resolve_objects(&self, operation_type: &str, custom_objects: &[String]) -> Vec<String> {
        let base_objects = self
            .objects
            .get(operation_type)
            .or_else(|| self.objects.get("overall"))
            .cloned()
            .unwrap_or_default();

        if base_objects.is_empty() {
            warn!("警告: 配置文件中未找到物体列表");
        }

        let mut objects_list = base_objects;
        objects_list.extend(custom_objects.iter().cloned());
        objects_list
    }
}
