pub mod activities;
pub mod calculator;
pub mod evaluations;
pub mod executor;
pub mod registry;
pub mod schema;
pub mod submit;

pub use activities::ActivitiesArgs;
pub use self::calculator::CalculatorArgs;
pub use evaluations::PlanArgs;
pub use executor::ToolExecutor;
pub use registry::{ToolInvocation, ToolName, ToolOutput, ToolRegistry};
pub use schema::{tool_call_schema_json, ToolCall};
