use std::path::Path;

use robot_phase_label::models::{load_object_registry, load_prompt_registry};
use robot_phase_label::services::{PromptBuilder, VlmService};
use robot_phase_label::utils::logging;
use robot_phase_label::Config;

/// 仓库自带的两个注册表应该始终能加载并构建出提示词
#[tokio::test]
async fn test_load_bundled_registries() {
    let config = Config::default();

    let prompts = load_prompt_registry(&config.prompts_file)
        .await
        .expect("加载提示词配置失败");
    let objects = load_object_registry(&config.objects_file)
        .await
        .expect("加载物体名词配置失败");

    assert!(prompts.contains_key("phase_analysis"));
    assert!(objects.contains_key("overall"));

    let builder = PromptBuilder::new(prompts, objects);
    let prompt = builder
        .build(&config.prompt_key, &config.operation_type, &config.custom_objects)
        .expect("构建提示词失败");

    assert!(prompt.contains("tool, towel"));
    assert!(!prompt.contains("{objects_text}"));
}

#[tokio::test]
#[ignore] // 默认忽略，需要推理服务在线：cargo test -- --ignored
async fn test_server_connectivity() {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    let service = VlmService::new(&config);
    let result = service.check_server().await;

    assert!(result.is_ok(), "应该能够连接到推理服务");
}

#[tokio::test]
#[ignore]
async fn test_describe_single_image() {
    logging::init();

    let config = Config::from_env();
    let service = VlmService::new(&config);

    // 注意：请根据实际情况修改图片路径
    let image_path = Path::new("./images/grab_plate_1.jpg");

    let result = service
        .describe_image(image_path, "Describe the objects in this scenario.")
        .await
        .expect("图片描述失败");

    println!("分析结果:\n{}", result);
    assert!(!result.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_analyze_single_video() {
    logging::init();

    let config = Config::from_env();

    let prompts = load_prompt_registry(&config.prompts_file)
        .await
        .expect("加载提示词配置失败");
    let objects = load_object_registry(&config.objects_file)
        .await
        .expect("加载物体名词配置失败");

    let flow = robot_phase_label::VideoFlow::new(&config, prompts, objects);

    // 注意：请根据实际情况修改视频路径
    let ctx = robot_phase_label::VideoCtx::new(
        "./video/task_agnostic_open_drawer.mp4".into(),
        1,
        1,
    );

    let result = flow.run(&ctx).await.expect("视频分析失败");
    println!("分析结果:\n{}", result);
    assert!(!result.is_empty());
}
