//! LLM 层：消息、客户端抽象与实现（OpenAI 兼容 / Mock）

pub mod message;
pub mod mock;
pub mod openai;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;

pub use message::{Message, Role};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use traits::LlmClient;

/// 按 [llm] 配置创建客户端
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    match cfg.llm.provider.to_lowercase().as_str() {
        "mock" => {
            tracing::info!("Using mock LLM");
            Arc::new(MockLlmClient::new())
        }
        _ => {
            if std::env::var("OPENAI_API_KEY").is_err() {
                tracing::warn!("OPENAI_API_KEY is not set, requests will likely be rejected");
            }
            tracing::info!("Using OpenAI LLM ({})", cfg.llm.model);
            Arc::new(
                OpenAiClient::new(cfg.llm.base_url.as_deref(), &cfg.llm.model, None)
                    .with_timeout(Duration::from_secs(cfg.llm.request_timeout_secs)),
            )
        }
    }
}

/// 从模型输出中取出 JSON 片段：优先 ```json 围栏，其次第一个 '{' 到最后一个 '}'
pub fn extract_json(output: &str) -> Option<&str> {
    let trimmed = output.trim();
    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        return Some(rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim()));
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end > start).then(|| &trimmed[start..=end])
}
