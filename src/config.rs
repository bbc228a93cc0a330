/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 待处理视频所在文件夹
    pub video_folder: String,
    /// 结果输出目录
    pub results_dir: String,
    /// 提示词注册表文件路径
    pub prompts_file: String,
    /// 物体名词注册表文件路径
    pub objects_file: String,
    /// 使用的提示词 key
    pub prompt_key: String,
    /// 操作类型（物体词表类别）
    pub operation_type: String,
    /// 追加的自定义物体名词
    pub custom_objects: Vec<String>,
    /// 视频采样帧率（精细操作需要更高采样率）
    pub sample_fps: f64,
    /// 单次请求允许的最大帧数（视觉 token 预算）
    pub max_frames_per_request: usize,
    /// 抽帧时的最长边像素（超出则等比缩小）
    pub frame_longest_edge: u32,
    /// 支持的视频扩展名（小写，含点）
    pub supported_formats: Vec<String>,
    // --- VLM 配置 ---
    pub vlm_api_key: String,
    pub vlm_api_base_url: String,
    pub vlm_model_name: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            video_folder: "./video".to_string(),
            results_dir: "phase_results".to_string(),
            prompts_file: "config/prompts.json".to_string(),
            objects_file: "config/objects_list.json".to_string(),
            prompt_key: "phase_analysis".to_string(),
            operation_type: "overall".to_string(),
            custom_objects: vec!["tool".to_string(), "towel".to_string()],
            sample_fps: 10.0,
            max_frames_per_request: 16,
            frame_longest_edge: 1280,
            supported_formats: vec![
                ".mp4".to_string(),
                ".avi".to_string(),
                ".mov".to_string(),
                ".mkv".to_string(),
                ".webm".to_string(),
            ],
            vlm_api_key: "EMPTY".to_string(),
            vlm_api_base_url: "http://localhost:8000/v1".to_string(),
            vlm_model_name: "Qwen/Qwen3-VL-8B-Instruct".to_string(),
            max_new_tokens: 1024,
            temperature: 0.3,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            video_folder: std::env::var("VIDEO_FOLDER").unwrap_or(default.video_folder),
            results_dir: std::env::var("RESULTS_DIR").unwrap_or(default.results_dir),
            prompts_file: std::env::var("PROMPTS_FILE").unwrap_or(default.prompts_file),
            objects_file: std::env::var("OBJECTS_FILE").unwrap_or(default.objects_file),
            prompt_key: std::env::var("PROMPT_KEY").unwrap_or(default.prompt_key),
            operation_type: std::env::var("OPERATION_TYPE").unwrap_or(default.operation_type),
            custom_objects: std::env::var("CUSTOM_OBJECTS").map(parse_list).unwrap_or(default.custom_objects),
            sample_fps: std::env::var("SAMPLE_FPS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.sample_fps),
            max_frames_per_request: std::env::var("MAX_FRAMES_PER_REQUEST").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_frames_per_request),
            frame_longest_edge: std::env::var("FRAME_LONGEST_EDGE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.frame_longest_edge),
            supported_formats: std::env::var("SUPPORTED_FORMATS").map(parse_list).unwrap_or(default.supported_formats),
            vlm_api_key: std::env::var("VLM_API_KEY").unwrap_or(default.vlm_api_key),
            vlm_api_base_url: std::env::var("VLM_API_BASE_URL").unwrap_or(default.vlm_api_base_url),
            vlm_model_name: std::env::var("VLM_MODEL_NAME").unwrap_or(default.vlm_model_name),
            max_new_tokens: std::env::var("MAX_NEW_TOKENS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_new_tokens),
            temperature: std::env::var("TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.temperature),
        }
    }
}

/// 解析逗号分隔的环境变量列表
fn parse_list(raw: String) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
