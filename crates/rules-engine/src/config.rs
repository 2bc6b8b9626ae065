//! 配置管理模块
//!
//! 分层加载配置文件与环境变量，所有配置项都有默认值，空配置即可运行。

use crate::error::Result;
use crate::observability::ObservabilityConfig;
use crate::options::RulesEngineOptions;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 规则目录配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// 启动时载入的规则 JSON 文件，为空时以空数据源启动
    pub path: Option<PathBuf>,
}

/// 应用配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub engine: RulesEngineOptions,
    pub observability: ObservabilityConfig,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml
    /// 2. config/{environment}.toml（RULES_ENV，默认 development）
    /// 3. config/{service_name}.toml
    /// 4. 环境变量（RULES_ 前缀，`__` 分隔层级，如 RULES_ENGINE__MATCH_MODE -> engine.match_mode）
    ///
    /// 配置目录由 CONFIG_DIR 指定，默认 `config`。
    pub fn load(service_name: &str) -> Result<Self> {
        let environment =
            std::env::var("RULES_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(Path::new(&config_dir), &environment, service_name)
    }

    /// 从指定目录加载配置
    pub fn load_from(config_dir: &Path, environment: &str, service_name: &str) -> Result<Self> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", environment)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", environment))).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", service_name))).required(false))
            .add_source(
                Environment::with_prefix("RULES")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Ok(builder.build()?.try_deserialize()?)
    }
}
