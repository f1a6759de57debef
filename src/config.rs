//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `ITINERA__*` 覆盖（双下划线表示嵌套，如 `ITINERA__REFINE__MAX_STEPS=5`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::AgentError;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub refine: RefineSection,
    pub evaluation: EvaluationSection,
}

/// [app] 段：应用名、夹具数据目录
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    /// activities.json / weather.json 所在目录
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for AppSection {
    fn default() -> Self {
        Self { name: None, data_dir: default_data_dir() }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：openai / mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

/// [refine] 段：步数上限与系统提示词
#[derive(Debug, Clone, Deserialize)]
pub struct RefineSection {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// 自定义系统提示词文件；未设置时使用内置提示词
    pub system_prompt_path: Option<PathBuf>,
}

impl Default for RefineSection {
    fn default() -> Self {
        Self { max_steps: default_max_steps(), system_prompt_path: None }
    }
}

fn default_max_steps() -> usize {
    10
}

/// [evaluation] 段：天气与反馈两项检查的评审者（rules / llm）
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationSection {
    #[serde(default = "default_judge")]
    pub weather_judge: String,
    #[serde(default = "default_judge")]
    pub feedback_judge: String,
}

impl Default for EvaluationSection {
    fn default() -> Self {
        Self { weather_judge: default_judge(), feedback_judge: default_judge() }
    }
}

fn default_judge() -> String {
    "rules".to_string()
}

const PROVIDERS: [&str; 2] = ["openai", "mock"];
const JUDGES: [&str; 2] = ["rules", "llm"];

impl AppConfig {
    /// 校验取值范围；加载后必须调用
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.refine.max_steps == 0 {
            return Err(AgentError::ConfigError("refine.max_steps must be at least 1".into()));
        }
        let provider = self.llm.provider.to_lowercase();
        if !PROVIDERS.contains(&provider.as_str()) {
            return Err(AgentError::ConfigError(format!(
                "unknown llm.provider '{}' (expected one of {})",
                self.llm.provider,
                PROVIDERS.join(", ")
            )));
        }
        for (key, value) in [
            ("evaluation.weather_judge", &self.evaluation.weather_judge),
            ("evaluation.feedback_judge", &self.evaluation.feedback_judge),
        ] {
            if !JUDGES.contains(&value.to_lowercase().as_str()) {
                return Err(AgentError::ConfigError(format!(
                    "unknown {key} '{value}' (expected one of {})",
                    JUDGES.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// 系统提示词：配置了文件则读取，否则为 None（调用方使用内置提示词）
    pub fn system_prompt_override(&self) -> Result<Option<String>, AgentError> {
        match &self.refine.system_prompt_path {
            Some(path) => Ok(Some(std::fs::read_to_string(path)?)),
            None => Ok(None),
        }
    }
}

/// 从 config 目录加载配置，环境变量 ITINERA__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 ITINERA__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, AgentError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("ITINERA")
            .separator("__")
            .try_parsing(true),
    );

    let cfg: AppConfig = builder
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| AgentError::ConfigError(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}
