//! 内容规则引擎命令行服务
//!
//! 从 stdin 逐行读取 JSON 匹配请求，每个请求在 stdout 输出一行 JSON 响应。

use anyhow::Result;
use chrono::{DateTime, Utc};
use rules_engine::config::AppConfig;
use rules_engine::{
    Condition, InMemoryRulesDataSource, OperatorDispatchTable, Rule, RuleValidator, RulesEngine,
    RulesEngineBuilder, observability,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::{error, info, warn};

type CatalogRule = Rule<String, String>;

/// 匹配请求
#[derive(Debug, Deserialize)]
struct MatchRequest {
    content_type: String,
    date: DateTime<Utc>,
    #[serde(default)]
    conditions: Vec<Condition<String>>,
    /// true 返回全部匹配规则，false 只返回胜出规则
    #[serde(default)]
    many: bool,
}

/// 匹配响应
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MatchResponse {
    Many { rules: Vec<CatalogRule> },
    One { rule: Option<CatalogRule> },
    Error { error: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load("rules-engine").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    observability::init(&config.observability)?;

    info!("Starting rules-engine...");

    let data_source = match &config.catalog.path {
        Some(path) => {
            let rules = load_catalog(path).await?;
            info!(count = rules.len(), path = %path.display(), "规则目录已载入");
            InMemoryRulesDataSource::with_rules(rules)
        }
        None => {
            warn!("未配置规则目录，以空数据源启动");
            InMemoryRulesDataSource::new()
        }
    };

    let engine = RulesEngineBuilder::new()
        .with_data_source(data_source)
        .with_options(config.engine.clone())
        .build()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        };

        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_request(&engine, &line).await;
        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        stdout.write_all(&payload).await?;
        stdout.flush().await?;
    }

    info!("Service shutdown complete");
    Ok(())
}

/// 读取规则目录（规则数组 JSON），保留文件中声明的优先级，无效规则跳过
async fn load_catalog(path: &Path) -> Result<Vec<CatalogRule>> {
    let raw = tokio::fs::read_to_string(path).await?;
    let rules: Vec<CatalogRule> = serde_json::from_str(&raw)?;
    let total = rules.len();

    let rules = RuleValidator::new(OperatorDispatchTable::shared()).retain_valid(rules);
    if rules.len() < total {
        warn!(skipped = total - rules.len(), "部分规则未通过校验");
    }

    Ok(rules)
}

async fn handle_request(engine: &RulesEngine<String, String>, line: &str) -> MatchResponse {
    let request: MatchRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "无法解析请求");
            return MatchResponse::Error {
                error: format!("无效请求: {}", e),
            };
        }
    };

    let result = if request.many {
        engine
            .match_many(&request.content_type, request.date, &request.conditions)
            .await
            .map(|rules| MatchResponse::Many { rules })
    } else {
        engine
            .match_one(&request.content_type, request.date, &request.conditions)
            .await
            .map(|rule| MatchResponse::One { rule })
    };

    result.unwrap_or_else(|e| {
        error!(error = %e, content_type = %request.content_type, "规则匹配失败");
        MatchResponse::Error {
            error: e.to_string(),
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
