//! 领域模型：旅客、活动、天气、行程日与完整行程，以及度假请求
//!
//! 全部为不可变值类型；循环中的候选行程只会被整体替换，从不原地修改。

pub mod activity;
pub mod money;
pub mod plan;
pub mod vacation;
pub mod weather;

pub use activity::{Activity, Interest};
pub use money::{format_cents, to_cents};
pub use plan::{ItineraryDay, Recommendation, TravelPlan};
pub use vacation::{Traveler, VacationInfo};
pub use weather::{Weather, WeatherCondition};
