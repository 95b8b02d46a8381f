use anyhow::Result;
use sl24_augment::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：命令行给出 TOML 路径时读文件，否则读环境变量
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_toml_file(&path)?,
        None => Config::from_env(),
    };

    // 初始化日志
    logger::init(&config)?;

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
