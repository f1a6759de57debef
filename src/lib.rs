//! Itinera - 行程校验与修复循环
//!
//! 模块划分：
//! - **authoring**: 初始行程生成与最终行程叙述（LLM）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误与恢复、循环状态机
//! - **domain**: 旅客、活动、天气、行程等值类型
//! - **evaluation**: 评估引擎（七项检查，天气与反馈评审可插拔）
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **observability**: tracing 日志初始化
//! - **providers**: 活动源与天气源（内存目录）
//! - **refine**: 推理方、transcript、Thought → Action → Observation 主循环
//! - **tools**: 封闭工具集（calculator、activities_by_date、run_evaluations、submit_final_answer）与执行器

pub mod authoring;
pub mod config;
pub mod core;
pub mod domain;
pub mod evaluation;
pub mod llm;
pub mod observability;
pub mod providers;
pub mod refine;
pub mod tools;

pub use crate::core::AgentError;
pub use crate::evaluation::EvaluationEngine;
pub use crate::refine::{refine_loop, RefineOutcome, RefineSession, RefineStatus};
