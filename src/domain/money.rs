//! 金额换算：所有比较都在整数分上进行

/// 金额四舍五入到分；超出 i64 范围时饱和，NaN 记为 0
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// 以 "123.45" 形式展示分
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
