//! Itinera 命令行入口
//!
//! 加载配置、活动/天气夹具与度假请求，取得初始行程（文件或 LLM 生成），
//! 用 LlmPolicy 运行精炼循环并打印过程事件；成功时输出最终行程与叙述，步数耗尽时以非零状态退出。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use itinera::authoring::{narrate_outcome, LlmNarrator, LlmPlanGenerator, PlanGenerator};
use itinera::config::{load_config, AppConfig};
use itinera::core::RecoveryEngine;
use itinera::domain::{TravelPlan, VacationInfo};
use itinera::evaluation::{EvaluationEngine, LlmReviewer};
use itinera::llm::{create_llm_from_config, LlmClient};
use itinera::observability;
use itinera::providers::Catalog;
use itinera::refine::{
    build_system_prompt, refine_loop, LlmPolicy, RefineEvent, RefineSession, DEFAULT_SYSTEM_PROMPT,
};
use itinera::tools::{ToolExecutor, ToolRegistry};

const USAGE: &str =
    "usage: itinera <vacation.json> [--plan initial_plan.json] [--feedback \"...\"] [--config path]";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    vacation: PathBuf,
    plan: Option<PathBuf>,
    feedback: Option<String>,
    config: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut vacation = None;
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().with_context(|| format!("{flag} needs a value\n{USAGE}"));
        match arg.as_str() {
            "--plan" => cli.plan = Some(PathBuf::from(value("--plan")?)),
            "--feedback" => cli.feedback = Some(value("--feedback")?),
            "--config" => cli.config = Some(PathBuf::from(value("--config")?)),
            "-h" | "--help" => bail!("{USAGE}"),
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            path if vacation.is_none() => vacation = Some(PathBuf::from(path)),
            extra => bail!("unexpected argument {extra}\n{USAGE}"),
        }
    }
    cli.vacation = vacation.with_context(|| format!("missing vacation file\n{USAGE}"))?;
    Ok(cli)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

/// 按 [evaluation] 配置选择天气与反馈评审者
fn build_engine(cfg: &AppConfig, catalog: Arc<Catalog>, llm: Arc<dyn LlmClient>) -> EvaluationEngine {
    let mut engine = EvaluationEngine::new(catalog.clone(), catalog);
    let weather_llm = cfg.evaluation.weather_judge.eq_ignore_ascii_case("llm");
    let feedback_llm = cfg.evaluation.feedback_judge.eq_ignore_ascii_case("llm");
    if weather_llm || feedback_llm {
        let reviewer = Arc::new(LlmReviewer::new(llm));
        if weather_llm {
            engine = engine.with_weather_judge(reviewer.clone());
        }
        if feedback_llm {
            engine = engine.with_feedback_judge(reviewer);
        }
    }
    engine
}

fn print_event(ev: &RefineEvent) {
    match ev {
        RefineEvent::StepUpdate { step, max_steps } => println!("── step {}/{}", step + 1, max_steps),
        RefineEvent::Thought { text } if !text.is_empty() => println!("thought: {text}"),
        RefineEvent::Thought { .. } => {}
        RefineEvent::ToolCall { tool, .. } => println!("action: {tool}"),
        RefineEvent::Observation { tool, ok, preview } => {
            let label = if *ok { "observation" } else { "error" };
            println!("{label} ({tool}): {preview}");
        }
        RefineEvent::Recovery { action, detail } => println!("recovery [{action}]: {detail}"),
        RefineEvent::Finished { status, steps, total_cost } => {
            println!("finished: {status:?} after {steps} steps, total cost {total_cost:.2}")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let args = parse_args(std::env::args().skip(1))?;
    let cfg = load_config(args.config.clone()).context("Failed to load config")?;
    let catalog = Arc::new(
        Catalog::load(&cfg.app.data_dir)
            .with_context(|| format!("Failed to load catalog from {}", cfg.app.data_dir.display()))?,
    );
    let vacation: VacationInfo = read_json(&args.vacation)?;
    let llm = create_llm_from_config(&cfg);

    let initial_plan: TravelPlan = match &args.plan {
        Some(path) => read_json(path)?,
        None => {
            let (start, end) = (vacation.arrival_date(), vacation.departure_date());
            LlmPlanGenerator::new(llm.clone())
                .generate(
                    &vacation,
                    &catalog.weather_between(start, end),
                    &catalog.activities_between(start, end),
                )
                .await
                .context("Failed to generate initial plan")?
        }
    };

    let engine = Arc::new(build_engine(&cfg, catalog.clone(), llm.clone()));
    let registry = ToolRegistry::new(catalog, engine, vacation.clone(), args.feedback.clone());
    let base_prompt = cfg
        .system_prompt_override()
        .context("Failed to read system prompt")?
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
    let policy = LlmPolicy::new(llm.clone(), build_system_prompt(&base_prompt, &registry));
    let executor = ToolExecutor::new(registry);
    let recovery = RecoveryEngine::new();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            print_event(&ev);
        }
    });
    let result = {
        let session = RefineSession::new(&policy, &executor, &recovery)
            .with_max_steps(cfg.refine.max_steps)
            .with_event_tx(&tx);
        refine_loop(&session, initial_plan).await
    };
    drop(tx);
    let _ = printer.await;
    let outcome = result.context("Refine loop failed")?;

    let (prompt_tokens, completion_tokens, total_tokens) = llm.token_usage();
    tracing::info!(prompt_tokens, completion_tokens, total_tokens, "token usage");

    println!("{}", serde_json::to_string_pretty(&outcome.plan)?);
    if !outcome.converged() {
        bail!(
            "step budget of {} exhausted without a final answer; printed plan is the last candidate",
            cfg.refine.max_steps
        );
    }
    let narrator = LlmNarrator::new(llm);
    if let Some(text) = narrate_outcome(&narrator, &outcome, &vacation)
        .await
        .context("Failed to narrate plan")?
    {
        println!("\n{text}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_args() {
        let cli = parse_args(args(&["trip.json", "--feedback", "at least 2 activities per day", "--plan", "p.json"]))
            .unwrap();
        assert_eq!(cli.vacation, PathBuf::from("trip.json"));
        assert_eq!(cli.plan, Some(PathBuf::from("p.json")));
        assert_eq!(cli.feedback.as_deref(), Some("at least 2 activities per day"));
        assert_eq!(cli.config, None);

        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["trip.json", "--plan"])).is_err());
        assert!(parse_args(args(&["trip.json", "--verbose"])).is_err());
        assert!(parse_args(args(&["a.json", "b.json"])).is_err());
    }
}
