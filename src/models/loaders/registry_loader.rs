use crate::models::registry::{ObjectRegistry, PromptRegistry};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 JSON 文件加载提示词注册表
pub async fn load_prompt_registry(path: impl AsRef<Path>) -> Result<PromptRegistry> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取提示词配置文件: {}", path.display()))?;

    let registry: PromptRegistry = serde_json::from_str(&content)
        .with_context(|| format!("无法解析提示词配置文件: {}", path.display()))?;

    tracing::info!("成功加载 {} 个提示词模板", registry.len());

    Ok(registry)
}

/// 从 JSON 文件加载物体名词注册表
pub async fn load_object_registry(path: impl AsRef<Path>) -> Result<ObjectRegistry> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取物体名词配置文件: {}", path.display()))?;

    let registry: ObjectRegistry = serde_json::from_str(&content)
        .with_context(|| format!("无法解析物体名词配置文件: {}", path.display()))?;

    tracing::info!("成功加载 {} 个物体类别", registry.len());

    Ok(registry)
}
