//! 单张图片描述入口
//!
//! 使用 VLM 描述一张本地图片，路径与提示词可通过环境变量覆盖：
//! - `IMAGE_PATH`（默认 `./images/grab_plate_1.jpg`）
//! - `IMAGE_PROMPT`（默认 "Describe the objects in this scenario."）

use std::path::PathBuf;

use anyhow::Result;
use tracing::{error, info};

use robot_phase_label::services::VlmService;
use robot_phase_label::utils::logging::{self, log_section};
use robot_phase_label::Config;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config = Config::from_env();

    let image_path = PathBuf::from(
        std::env::var("IMAGE_PATH").unwrap_or_else(|_| "./images/grab_plate_1.jpg".to_string()),
    );
    let prompt = std::env::var("IMAGE_PROMPT")
        .unwrap_or_else(|_| "Describe the objects in this scenario.".to_string());

    if !image_path.exists() {
        error!("错误：图片文件 '{}' 不存在", image_path.display());
        return Ok(());
    }

    let service = VlmService::new(&config);

    match service.describe_image(&image_path, &prompt).await {
        Ok(result) => {
            log_section("分析结果:");
            info!("{}", result);
        }
        Err(e) => {
            error!("处理图片时出错: {}", e);
        }
    }

    Ok(())
}
