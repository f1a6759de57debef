//! 外部数据源：活动与天气
//!
//! 查询无结果不是错误：按日期查活动返回空列表，按 id / 日期查不到返回 None，交给推理方自行判断。

pub mod catalog;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{Activity, Weather};

pub use catalog::Catalog;

/// 活动源：按日期或按 id 查询
#[async_trait]
pub trait ActivityProvider: Send + Sync {
    /// 当天可参加的活动；无数据时为空列表
    async fn activities_on(&self, date: NaiveDate) -> Vec<Activity>;

    /// 按 id 查询单个活动
    async fn activity(&self, id: &str) -> Option<Activity>;
}

/// 天气源：按日期查询，超出预报范围返回 None
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn weather_on(&self, date: NaiveDate) -> Option<Weather>;
}
