use std::fs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, fmt, EnvFilter, Layer};
use tracing_subscriber::filter::FilterFn;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_appender::{non_blocking, rolling};

/// 只写入专用日志文件的 target
const DEDICATED_TARGETS: [&str; 3] = ["strategy", "trade_executor", "arbitrage_opportunity"];

/// 日志管理器 - 基于target分类的日志系统
pub struct LoggerManager {
    _guards: Vec<non_blocking::WorkerGuard>,
}

impl LoggerManager {
    /// 初始化日志系统
    ///
    /// 日志分类：
    /// - app.log: 通用应用日志
    /// - strategy.log: 每轮套利检测过程 (价格、方向、模拟)
    /// - trade.log: 交易执行及余额变化
    /// - opportunity.log: 通过利润模拟的套利机会
    pub fn init(log_dir: &str, level: &str) -> Self {
        let mut guards = Vec::new();

        // 创建日志目录
        fs::create_dir_all(log_dir).ok();

        let timer = UtcTime::new(time::format_description::well_known::Rfc3339);
        let level_filter = || EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

        // 1. 控制台输出 - 所有 target
        let console_layer = fmt::layer()
            .compact()
            .with_target(true)
            .with_timer(timer.clone())
            .with_filter(level_filter());

        // 2. 通用应用日志 (app.log)
        let (app_writer, app_guard) = non_blocking(rolling::daily(log_dir, "app.log"));
        guards.push(app_guard);

        let app_layer = fmt::layer()
            .compact()
            .with_writer(app_writer)
            .with_ansi(false)
            .with_target(true)
            .with_timer(timer.clone())
            .with_filter(level_filter())
            .with_filter(FilterFn::new(|metadata| {
                !DEDICATED_TARGETS.contains(&metadata.target())
            }));

        // 3. 策略日志 (strategy.log)
        let (strategy_writer, strategy_guard) = non_blocking(rolling::daily(log_dir, "strategy.log"));
        guards.push(strategy_guard);

        let strategy_layer = fmt::layer()
            .compact()
            .with_writer(strategy_writer)
            .with_ansi(false)
            .with_target(true)
            .with_timer(timer.clone())
            .with_filter(FilterFn::new(|metadata| metadata.target() == "strategy"));

        // 4. 交易执行日志 (trade.log)
        let (trade_writer, trade_guard) = non_blocking(rolling::daily(log_dir, "trade.log"));
        guards.push(trade_guard);

        let trade_layer = fmt::layer()
            .compact()
            .with_writer(trade_writer)
            .with_ansi(false)
            .with_target(true)
            .with_timer(timer.clone())
            .with_filter(FilterFn::new(|metadata| metadata.target() == "trade_executor"));

        // 5. 套利机会日志 (opportunity.log)
        let (opportunity_writer, opportunity_guard) = non_blocking(rolling::daily(log_dir, "opportunity.log"));
        guards.push(opportunity_guard);

        let opportunity_layer = fmt::layer()
            .compact()
            .with_writer(opportunity_writer)
            .with_ansi(false)
            .with_target(true)
            .with_timer(timer)
            .with_filter(FilterFn::new(|metadata| {
                metadata.target() == "arbitrage_opportunity"
            }));

        // 初始化tracing订阅器
        tracing_subscriber::registry()
            .with(console_layer)
            .with(app_layer)
            .with(strategy_layer)
            .with(trade_layer)
            .with(opportunity_layer)
            .init();

        Self { _guards: guards }
    }
}
