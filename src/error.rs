use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 文件操作错误
    File(FileError),
    /// 提示词构建错误
    Prompt(PromptError),
    /// VLM 服务错误
    Vlm(VlmError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Prompt(e) => write!(f, "提示词错误: {}", e),
            AppError::Vlm(e) => write!(f, "VLM错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::File(e) => Some(e),
            AppError::Prompt(e) => Some(e),
            AppError::Vlm(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 文件不存在
    NotFound {
        path: String,
    },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// JSON 解析失败
    JsonParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 目录不存在
    DirectoryNotFound {
        path: String,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound { path } => write!(f, "文件不存在: {}", path),
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FileError::JsonParseFailed { path, source } => {
                write!(f, "JSON解析失败 ({}): {}", path, source)
            }
            FileError::DirectoryNotFound { path } => write!(f, "目录不存在: {}", path),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::WriteFailed { source, .. }
            | FileError::JsonParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 提示词构建错误
#[derive(Debug)]
pub enum PromptError {
    /// 提示词 key 不存在
    UnknownKey {
        key: String,
        available: Vec<String>,
    },
    /// 模板缺少占位符
    MissingPlaceholder {
        key: String,
        placeholder: String,
    },
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::UnknownKey { key, available } => {
                write!(
                    f,
                    "提示词 '{}' 不存在，可用的提示词: {:?}",
                    key, available
                )
            }
            PromptError::MissingPlaceholder { key, placeholder } => {
                write!(f, "提示词 '{}' 缺少占位符 {}", key, placeholder)
            }
        }
    }
}

impl std::error::Error for PromptError {}

/// VLM 服务错误
#[derive(Debug)]
pub enum VlmError {
    /// API 调用失败
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回结果为空
    EmptyResponse {
        model: String,
    },
    /// 返回内容为空
    EmptyContent {
        model: String,
    },
    /// 不支持的图片格式
    UnsupportedImageFormat {
        path: String,
    },
    /// 没有可用的帧
    NoFrames,
}

impl fmt::Display for VlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VlmError::ApiCallFailed { model, source } => {
                write!(f, "VLM API调用失败 (模型: {}): {}", model, source)
            }
            VlmError::EmptyResponse { model } => {
                write!(f, "VLM返回结果为空 (模型: {})", model)
            }
            VlmError::EmptyContent { model } => {
                write!(f, "VLM返回内容为空 (模型: {})", model)
            }
            VlmError::UnsupportedImageFormat { path } => {
                write!(f, "不支持的图片格式: {}", path)
            }
            VlmError::NoFrames => write!(f, "视频没有可用的帧"),
        }
    }
}

impl std::error::Error for VlmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VlmError::ApiCallFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::File(FileError::JsonParseFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件不存在错误
    pub fn file_not_found(path: impl Into<String>) -> Self {
        AppError::File(FileError::NotFound { path: path.into() })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建VLM API调用错误
    pub fn vlm_api_failed(model: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Vlm(VlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_prompt_key_lists_available() {
        let err = AppError::Prompt(PromptError::UnknownKey {
            key: "missing".to_string(),
            available: vec!["phase_analysis".to_string(), "scene_description".to_string()],
        });
        let msg = err.to_string();
        assert!(msg.contains("missing"));
        assert!(msg.contains("phase_analysis"));
        assert!(msg.contains("scene_description"));
    }

    #[test]
    fn test_file_not_found_display() {
        let err = AppError::file_not_found("./images/none.jpg");
        assert!(err.to_string().contains("./images/none.jpg"));
    }
}
