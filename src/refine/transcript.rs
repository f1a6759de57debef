//! 只追加的 transcript：一次循环调用独占
//!
//! 每个 cycle 依次写入 Thought、Action（或 InvalidAction）、Observation；
//! to_messages 将其还原为推理方的对话上下文。

use serde::Serialize;

use crate::llm::Message;
use crate::tools::ToolCall;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptEntry {
    /// 任务说明：度假请求、初始行程与反馈
    Task { text: String },
    Thought { step: usize, text: String },
    Action { step: usize, call: ToolCall },
    /// 无法解析为动作的原始输出
    InvalidAction { step: usize, raw: String },
    /// 工具结果；ok=false 为错误 Observation
    Observation { step: usize, tool: String, ok: bool, content: String },
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new(task: impl Into<String>) -> Self {
        Self { entries: vec![TranscriptEntry::Task { text: task.into() }] }
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 全部 Observation：(step, tool, ok, content)
    pub fn observations(&self) -> impl Iterator<Item = (usize, &str, bool, &str)> {
        self.entries.iter().filter_map(|e| match e {
            TranscriptEntry::Observation { step, tool, ok, content } => {
                Some((*step, tool.as_str(), *ok, content.as_str()))
            }
            _ => None,
        })
    }

    pub fn last_observation(&self) -> Option<(usize, &str, bool, &str)> {
        self.observations().last()
    }

    /// 转为对话消息：Task/Observation 为 user，Thought+Action 合并为一条 assistant JSON
    pub fn to_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.entries.len());
        let mut pending_thought: Option<&str> = None;
        for entry in &self.entries {
            match entry {
                TranscriptEntry::Task { text } => messages.push(Message::user(text.clone())),
                TranscriptEntry::Thought { text, .. } => pending_thought = Some(text.as_str()),
                TranscriptEntry::Action { call, .. } => {
                    let reply = serde_json::json!({
                        "thought": pending_thought.take().unwrap_or_default(),
                        "action": call,
                    });
                    messages.push(Message::assistant(reply.to_string()));
                }
                TranscriptEntry::InvalidAction { raw, .. } => {
                    pending_thought = None;
                    messages.push(Message::assistant(raw.clone()));
                }
                TranscriptEntry::Observation { tool, ok, content, .. } => {
                    let label = if *ok { "Observation" } else { "Error" };
                    messages.push(Message::user(format!("{label} from {tool}: {content}")));
                }
            }
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use serde_json::json;

    #[test]
    fn test_to_messages() {
        let mut t = Transcript::new("plan my trip");
        t.push(TranscriptEntry::Thought { step: 0, text: "check the maths".into() });
        t.push(TranscriptEntry::Action {
            step: 0,
            call: ToolCall::new("calculator", json!({"expression": "1+1"})),
        });
        t.push(TranscriptEntry::Observation {
            step: 0,
            tool: "calculator".into(),
            ok: true,
            content: "{\"result\":2.0}".into(),
        });
        t.push(TranscriptEntry::InvalidAction { step: 1, raw: "hmm".into() });
        t.push(TranscriptEntry::Observation {
            step: 1,
            tool: "(none)".into(),
            ok: false,
            content: "could not parse".into(),
        });

        let msgs = t.to_messages();
        assert_eq!(msgs.len(), 5);
        assert_eq!(msgs[0].role, Role::User);
        let reply: serde_json::Value = serde_json::from_str(&msgs[1].content).unwrap();
        assert_eq!(reply["thought"], "check the maths");
        assert_eq!(reply["action"]["tool"], "calculator");
        assert!(msgs[2].content.starts_with("Observation from calculator"));
        assert_eq!(msgs[3].content, "hmm");
        assert!(msgs[4].content.starts_with("Error from (none)"));

        assert_eq!(t.observations().count(), 2);
        assert_eq!(t.last_observation().map(|o| o.2), Some(false));
    }
}
