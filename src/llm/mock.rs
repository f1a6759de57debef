//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 按顺序回放预置的回复；队列耗尽后回显最后一条 User 消息。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{LlmClient, Message, Role};

/// Mock 客户端：回放队列 + 回显兜底
#[derive(Debug, Default)]
pub struct MockLlmClient {
    replies: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置回复，按调用顺序依次返回
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// 已被调用的次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let queued = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        if let Some(reply) = queued {
            return Ok(reply);
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");
        Ok(format!("Echo from Mock: {last_user}"))
    }
}
