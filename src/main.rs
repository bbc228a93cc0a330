use anyhow::Result;
use robot_phase_label::orchestrator::App;
use robot_phase_label::utils::logging;
use robot_phase_label::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 初始化并运行应用
    let _results = App::initialize(config).await?.run().await?;

    Ok(())
}
