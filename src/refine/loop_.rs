//! 精炼主循环
//!
//! Thought（Policy）-> Action（ToolExecutor 校验并分派）-> Observation（写回 transcript）-> 下一轮；
//! 只有 submit_final_answer 能让循环成功结束，步数耗尽返回 Exhausted 与最后的候选行程。
//! 可选 event_tx：向 CLI 等前端推送 StepUpdate / Thought / ToolCall / Observation / Finished。

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::core::{AgentError, RecoveryAction, RecoveryEngine, RefineState};
use crate::domain::{TravelPlan, VacationInfo};
use crate::refine::{Policy, Proposal, RefineEvent, Transcript, TranscriptEntry};
use crate::tools::ToolExecutor;

/// 默认步数上限
pub const DEFAULT_MAX_STEPS: usize = 10;
/// Observation 预览最大字符数
const OBSERVATION_PREVIEW_CHARS: usize = 200;
/// 思考内容展示最大字符数
const THOUGHT_PREVIEW_CHARS: usize = 800;
/// 无法解析出工具名时 Observation 使用的占位名
const NO_TOOL: &str = "(none)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefineStatus {
    /// 推理方调用了 submit_final_answer
    Succeeded,
    /// 步数耗尽仍未提交
    Exhausted,
}

/// 循环结果：状态、最终（或最后的候选）行程、实际步数与完整 transcript
#[derive(Debug, Clone)]
pub struct RefineOutcome {
    pub run_id: Uuid,
    pub status: RefineStatus,
    pub plan: TravelPlan,
    pub steps: usize,
    pub transcript: Transcript,
}

impl RefineOutcome {
    /// 仅在 Succeeded 时为 true；Exhausted 绝不视为成功
    pub fn converged(&self) -> bool {
        self.status == RefineStatus::Succeeded
    }
}

/// 精炼会话配置
pub struct RefineSession<'a> {
    /// 推理方（必需）
    pub policy: &'a dyn Policy,
    /// 工具执行器（必需），其注册表持有 VacationInfo 与反馈
    pub executor: &'a ToolExecutor,
    /// 恢复引擎（必需）
    pub recovery: &'a RecoveryEngine,
    pub max_steps: usize,
    /// 可选：事件推送通道
    pub event_tx: Option<&'a UnboundedSender<RefineEvent>>,
}

impl<'a> RefineSession<'a> {
    pub fn new(
        policy: &'a dyn Policy,
        executor: &'a ToolExecutor,
        recovery: &'a RecoveryEngine,
    ) -> Self {
        Self {
            policy,
            executor,
            recovery,
            max_steps: DEFAULT_MAX_STEPS,
            event_tx: None,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// 设置事件推送通道
    pub fn with_event_tx(mut self, tx: &'a UnboundedSender<RefineEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn send(&self, ev: RefineEvent) {
        if let Some(tx) = self.event_tx {
            let _ = tx.send(ev);
        }
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

fn advance(state: &mut RefineState, next: RefineState) {
    debug_assert!(state.can_transition_to(next), "{state:?} -> {next:?}");
    tracing::debug!(from = ?state, to = ?next, "refine state");
    *state = next;
}

/// 循环的第一条 transcript：度假请求、初始行程与反馈
pub fn task_prompt(vacation: &VacationInfo, plan: &TravelPlan, feedback: Option<&str>) -> String {
    let vacation_json = serde_json::to_string_pretty(vacation).unwrap_or_default();
    let plan_json = serde_json::to_string_pretty(plan).unwrap_or_default();
    let feedback = match feedback.map(str::trim) {
        Some(f) if !f.is_empty() => f,
        _ => "(none)",
    };
    format!(
        "Vacation request:\n{vacation_json}\n\nInitial itinerary:\n{plan_json}\n\nTraveler feedback: {feedback}\n\n\
        Evaluate the itinerary, repair every failing check and submit the final answer."
    )
}

/// 执行精炼循环
///
/// 每个 cycle 步数加一，包括动作格式错误、未知工具或参数不合法的 cycle（它们产生错误 Observation，不终止循环）。
/// 候选行程从 initial_plan 开始，被每次校验通过的 run_evaluations / submit_final_answer 调用中的行程整体替换。
/// 仅当推理方返回 RecoveryEngine 判定为 Abort 的错误时返回 Err。
pub async fn refine_loop(
    session: &RefineSession<'_>,
    initial_plan: TravelPlan,
) -> Result<RefineOutcome, AgentError> {
    let run_id = Uuid::new_v4();
    let registry = session.executor.registry();
    let mut transcript = Transcript::new(task_prompt(
        registry.vacation(),
        &initial_plan,
        registry.feedback(),
    ));
    let mut candidate = initial_plan;
    let mut state = RefineState::AwaitingThought;
    tracing::info!(%run_id, max_steps = session.max_steps, "refine loop started");

    let mut step = 0;
    while step < session.max_steps {
        session.send(RefineEvent::StepUpdate { step, max_steps: session.max_steps });

        let attempt = session.policy.next_step(&transcript).await;
        advance(&mut state, RefineState::AwaitingAction);

        let (tool, result) = match attempt {
            Ok(next) => {
                session.send(RefineEvent::Thought {
                    text: preview(&next.thought, THOUGHT_PREVIEW_CHARS),
                });
                transcript.push(TranscriptEntry::Thought { step, text: next.thought });
                match next.proposal {
                    Proposal::Call(call) => {
                        session.send(RefineEvent::ToolCall {
                            tool: call.tool.clone(),
                            args: call.args.clone(),
                        });
                        transcript.push(TranscriptEntry::Action { step, call: call.clone() });
                        advance(&mut state, RefineState::AwaitingObservation);
                        (call.tool.clone(), session.executor.dispatch(&call).await)
                    }
                    Proposal::Malformed { raw, reason } => {
                        transcript.push(TranscriptEntry::InvalidAction { step, raw });
                        advance(&mut state, RefineState::AwaitingObservation);
                        (NO_TOOL.to_string(), Err(AgentError::MalformedAction(reason)))
                    }
                }
            }
            Err(e) => {
                advance(&mut state, RefineState::AwaitingObservation);
                (NO_TOOL.to_string(), Err(e))
            }
        };

        match result {
            Ok(output) => {
                if let Some(plan) = output.plan() {
                    candidate = plan.clone();
                }
                let content = output.to_observation();
                session.send(RefineEvent::Observation {
                    tool: tool.clone(),
                    ok: true,
                    preview: preview(&content, OBSERVATION_PREVIEW_CHARS),
                });
                transcript.push(TranscriptEntry::Observation { step, tool, ok: true, content });

                if output.is_final() {
                    advance(&mut state, RefineState::Succeeded);
                    let steps = step + 1;
                    tracing::info!(%run_id, steps, total_cost = candidate.total_cost, "refine loop succeeded");
                    session.send(RefineEvent::Finished {
                        status: RefineStatus::Succeeded,
                        steps,
                        total_cost: candidate.total_cost,
                    });
                    return Ok(RefineOutcome {
                        run_id,
                        status: RefineStatus::Succeeded,
                        plan: candidate,
                        steps,
                        transcript,
                    });
                }
            }
            Err(e) => match session.recovery.handle(&e) {
                RecoveryAction::Observe(message) => {
                    tracing::warn!(%run_id, step, tool = %tool, error = %e, "recovered error");
                    session.send(RefineEvent::Recovery {
                        action: "Observe".to_string(),
                        detail: e.to_string(),
                    });
                    session.send(RefineEvent::Observation {
                        tool: tool.clone(),
                        ok: false,
                        preview: preview(&message, OBSERVATION_PREVIEW_CHARS),
                    });
                    transcript.push(TranscriptEntry::Observation {
                        step,
                        tool,
                        ok: false,
                        content: message,
                    });
                }
                RecoveryAction::Abort => {
                    tracing::error!(%run_id, step, error = %e, "refine loop aborted");
                    session.send(RefineEvent::Recovery {
                        action: "Abort".to_string(),
                        detail: e.to_string(),
                    });
                    return Err(e);
                }
            },
        }

        advance(&mut state, RefineState::AwaitingThought);
        step += 1;
    }

    advance(&mut state, RefineState::Exhausted);
    tracing::warn!(%run_id, steps = step, "step budget exhausted without a final answer");
    session.send(RefineEvent::Finished {
        status: RefineStatus::Exhausted,
        steps: step,
        total_cost: candidate.total_cost,
    });
    Ok(RefineOutcome {
        run_id,
        status: RefineStatus::Exhausted,
        plan: candidate,
        steps: step,
        transcript,
    })
}
