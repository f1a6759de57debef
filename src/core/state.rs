//! 精炼循环状态机
//!
//! AwaitingThought -> AwaitingAction -> AwaitingObservation -> AwaitingThought，
//! 终止态为 Succeeded（调用了 submit_final_answer）与 Exhausted（步数预算耗尽）。

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefineState {
    AwaitingThought,
    AwaitingAction,
    AwaitingObservation,
    Succeeded,
    Exhausted,
}

impl RefineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RefineState::Succeeded | RefineState::Exhausted)
    }

    /// 合法的状态迁移
    pub fn can_transition_to(&self, next: RefineState) -> bool {
        use RefineState::*;
        matches!(
            (self, next),
            (AwaitingThought, AwaitingAction)
                | (AwaitingAction, AwaitingObservation)
                | (AwaitingObservation, AwaitingThought)
                | (AwaitingObservation, Succeeded)
                | (AwaitingThought, Exhausted)
        )
    }
}
