use analyzer_core::config::{load_config_from_toml_str, AnalyzerConfig};
use anyhow::Context;

mod runner;

/// 编译时嵌入的默认配置
const EMBEDDED_CONFIG: &str = include_str!("../../configs.toml");

/// Loads `$ANALYZER_CONFIG` if set, otherwise the embedded defaults.
fn load_config() -> anyhow::Result<AnalyzerConfig> {
    match std::env::var("ANALYZER_CONFIG") {
        Ok(path) => {
            tracing::info!("Loading config from {}", path);
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path))?;
            load_config_from_toml_str(&text).with_context(|| format!("Invalid config in {}", path))
        }
        Err(_) => load_config_from_toml_str(EMBEDDED_CONFIG).context("Invalid embedded config"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 初始化日志（这是入口点的职责）
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ {:#}", e);
            std::process::exit(1);
        }
    };

    // 2. 调用库的核心逻辑
    if let Err(e) = runner::run(config).await {
        // 3. 处理顶层错误
        tracing::error!("❌ Analyzer failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
