//! 精炼层：推理方、transcript、Thought → Action → Observation 主循环

pub mod events;
pub mod loop_;
pub mod policy;
pub mod transcript;

pub use events::RefineEvent;
pub use loop_::{refine_loop, task_prompt, RefineOutcome, RefineSession, RefineStatus};
pub use policy::{
    build_system_prompt, parse_llm_output, FnPolicy, LlmPolicy, Policy, Proposal, ScriptedPolicy,
    Step, DEFAULT_SYSTEM_PROMPT,
};
pub use transcript::{Transcript, TranscriptEntry};
