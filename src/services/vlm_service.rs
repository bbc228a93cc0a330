//! VLM 服务 - 业务能力层
//!
//! 只负责"VLM 推理"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的推理服务（如 vLLM、DashScope 等）
//!
//! 本地图片 / 视频帧以 base64 data URI 形式作为消息的图片部分发送。

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use base64::Engine;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, VlmError};
use crate::infrastructure::ffmpeg;

/// VLM 服务
///
/// 职责：
/// - 调用 VLM API 进行图片 / 帧序列理解
/// - 提供通用的多模态调用接口
/// - 只处理单次推理请求
/// - 不出现 Vec<Video>
/// - 不关心流程顺序
pub struct VlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    api_base: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    max_frames: usize,
}

impl VlmService {
    /// 创建新的 VLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.vlm_api_key)
            .with_api_base(&config.vlm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.vlm_model_name.clone(),
            api_base: config.vlm_api_base_url.clone(),
            api_key: config.vlm_api_key.clone(),
            temperature: config.temperature,
            max_tokens: config.max_new_tokens,
            max_frames: config.max_frames_per_request,
        }
    }

    /// 检查推理服务是否可达
    ///
    /// 请求 `{api_base}/models`，失败时返回错误以便启动早退
    pub async fn check_server(&self) -> Result<()> {
        let url = format!("{}/models", self.api_base.trim_end_matches('/'));
        debug!("检查推理服务连通性: {}", url);

        let response = reqwest::Client::new()
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("无法连接到推理服务 ({}): {}", url, e))?;

        response
            .error_for_status()
            .map_err(|e| anyhow::anyhow!("推理服务返回错误 ({}): {}", url, e))?;

        info!("✓ 推理服务连接正常: {}", self.api_base);
        Ok(())
    }

    /// 通用的 VLM 调用函数
    ///
    /// 这是最基础的多模态调用接口，其他所有 VLM 相关功能都基于此函数。
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `image_uris`: 图片 URL / data URI 列表（可选），会按顺序追加到用户消息中
    ///
    /// # 返回
    /// 返回 VLM 的响应内容（字符串，已去除首尾空白）
    pub async fn send_to_vlm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        image_uris: &[String],
    ) -> Result<String> {
        debug!("调用 VLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());
        if !image_uris.is_empty() {
            debug!("包含 {} 张图片", image_uris.len());
        }

        // 构建消息列表
        let mut messages = Vec::new();

        // 添加系统消息（如果提供）
        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        // 构建用户消息内容（支持图片）
        let user_msg = if !image_uris.is_empty() {
            // 构建包含文本和图片的多部分内容
            let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> = Vec::new();

            // 添加文本部分
            content_parts.push(ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: user_message.to_string(),
                },
            ));

            // 添加图片部分
            for uri in image_uris.iter() {
                content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: uri.clone(),
                            detail: Some(ImageDetail::Auto), // Auto, High, Low
                        },
                    },
                ));
            }

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(
                    content_parts,
                ))
                .build()?
        } else {
            // 没有图片，只有文本
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()?
        };

        messages.push(ChatCompletionRequestMessage::User(user_msg));

        // 构建请求
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()?;

        // 调用 API
        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("VLM API 调用失败: {}", e);
            AppError::vlm_api_failed(&self.model_name, e)
        })?;

        debug!("VLM API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                AppError::Vlm(VlmError::EmptyContent {
                    model: self.model_name.clone(),
                })
            })?;

        Ok(content.trim().to_string())
    }

    /// 描述单张本地图片
    ///
    /// 图片文件不存在时直接报错早退，不产生任何 API 流量。
    pub async fn describe_image(&self, image_path: &Path, prompt: &str) -> Result<String> {
        if !image_path.exists() {
            return Err(
                AppError::file_not_found(image_path.to_string_lossy().to_string()).into(),
            );
        }

        info!("成功加载图片: {}", image_path.display());
        match image::image_dimensions(image_path) {
            Ok((w, h)) => info!("图片尺寸: {}x{}", w, h),
            Err(e) => warn!("无法读取图片尺寸: {}", e),
        }

        let data_uri = image_to_data_uri(image_path).await?;
        self.send_to_vlm(prompt, None, &[data_uri]).await
    }

    /// 分析一段视频的帧序列
    ///
    /// 帧按时间顺序作为图片部分发送，超出帧预算时均匀降采样。
    pub async fn analyze_frames(&self, frames: &[PathBuf], prompt: &str) -> Result<String> {
        if frames.is_empty() {
            return Err(AppError::Vlm(VlmError::NoFrames).into());
        }

        let capped = ffmpeg::cap_frames(frames.to_vec(), self.max_frames);
        if capped.len() < frames.len() {
            info!(
                "帧数 {} 超出预算，降采样为 {} 帧",
                frames.len(),
                capped.len()
            );
        }

        let mut image_uris = Vec::with_capacity(capped.len());
        for frame in &capped {
            image_uris.push(image_to_data_uri(frame).await?);
        }

        info!("正在分析操作阶段... ({} 帧)", image_uris.len());
        self.send_to_vlm(prompt, None, &image_uris).await
    }
}

/// 根据扩展名确定图片的 MIME 类型
fn mime_for_path(path: &Path) -> Result<&'static str, AppError> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "png" => Ok("image/png"),
        "webp" => Ok("image/webp"),
        "bmp" => Ok("image/bmp"),
        "gif" => Ok("image/gif"),
        _ => Err(AppError::Vlm(VlmError::UnsupportedImageFormat {
            path: path.to_string_lossy().to_string(),
        })),
    }
}

/// 将本地图片文件编码为 base64 data URI
pub async fn image_to_data_uri(path: &Path) -> Result<String> {
    let mime = mime_for_path(path)?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.to_string_lossy().to_string(), e))?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(format!("data:{};base64,{}", mime, encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// 创建测试用的 VlmService
    fn create_test_service() -> VlmService {
        let config = Config {
            vlm_api_key: "EMPTY".to_string(),
            vlm_api_base_url: "http://localhost:8000/v1".to_string(),
            vlm_model_name: "Qwen/Qwen3-VL-8B-Instruct".to_string(),
            ..Config::default()
        };
        VlmService::new(&config)
    }

    #[test]
    fn test_mime_for_jpg_and_png() {
        assert_eq!(mime_for_path(Path::new("a.jpg")).unwrap(), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.JPEG")).unwrap(), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("frame.png")).unwrap(), "image/png");
    }

    #[test]
    fn test_mime_unsupported_extension() {
        assert!(mime_for_path(Path::new("clip.mp4")).is_err());
        assert!(mime_for_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_image_to_data_uri_prefix() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF]).unwrap();

        let uri = tokio_test::block_on(image_to_data_uri(file.path())).unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_describe_image_missing_file_aborts_early() {
        let service = create_test_service();
        let result = tokio_test::block_on(
            service.describe_image(Path::new("./images/does_not_exist.jpg"), "描述这张图片"),
        );
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("does_not_exist.jpg"));
    }

    #[test]
    fn test_analyze_frames_rejects_empty() {
        let service = create_test_service();
        let result = tokio_test::block_on(service.analyze_frames(&[], "分析阶段"));
        assert!(result.is_err());
    }

    /// 测试通用 VLM 调用
    ///
    /// 运行方式：
    /// ```bash
    /// cargo test test_send_to_vlm_simple -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_send_to_vlm_simple() {
        let _ = tracing_subscriber::fmt::try_init();

        let service = create_test_service();

        let result = service
            .send_to_vlm(
                "请用一句话介绍一下你自己",
                Some("你是一个简洁的助手，回答要简短。"),
                &[],
            )
            .await;

        match result {
            Ok(response) => {
                println!("\n========== VLM 响应 ==========");
                println!("{}", response);
                println!("==============================\n");
                assert!(!response.is_empty());
            }
            Err(e) => {
                panic!("VLM 调用失败: {}", e);
            }
        }
    }
}
