//! # 第三方登录服务主程序

use clap::Parser;
use third_login::config::{AppConfig, CliArgs};
use third_login::{logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let args = CliArgs::parse();
    let mut config = if args.config.exists() {
        AppConfig::load(&args.config)?
    } else {
        tracing::warn!(path = %args.config.display(), "配置文件不存在，使用默认配置");
        let mut config = AppConfig::default();
        config.apply_env_overrides();
        config
    };
    if let Some(port) = args.port {
        config.port = port;
    }

    if let Err(e) = server::run(config).await {
        tracing::error!("服务启动失败: {e:?}");
        std::process::exit(1);
    }
    Ok(())
}
