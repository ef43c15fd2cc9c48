mod bootstrap;

use anyhow::Result;
use config_crate::AppConfig;
use tracing::info;
use utils::LoggerManager;

use crate::bootstrap::{setup_panic_hook, Application};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置 (日志目录和级别也来自配置)
    let config = AppConfig::load()?;

    // 初始化日志系统
    let _logger = LoggerManager::init(&config.log.dir, &config.log.level);

    // 设置 panic hook
    setup_panic_hook();

    info!("========================================");
    info!("  双池套利机器人启动");
    info!("========================================");

    // 启动应用
    let app = Application::start(config).await?;

    // 运行 API 服务器（阻塞，直到 Ctrl+C）
    if let Err(e) = app.run_server().await {
        tracing::error!("API 服务器错误: {:#}", e);
    }

    // 关闭应用
    app.shutdown().await?;

    Ok(())
}
