//! 循环两端的协作者：初始行程生成与最终行程叙述

pub mod generator;
pub mod narrative;

pub use generator::{LlmPlanGenerator, PlanGenerator};
pub use narrative::{narrate_outcome, LlmNarrator, Narrator};
