//! 오프라인 백테스트 시뮬레이터.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 캔들 단위 시뮬레이션 엔진 (청산 우선, 강제 청산, 분석 캐시)
//! - 성과 지표 계산 (수익률, 샤프 비율, 최대 낙폭, 전략별 분해)
//! - 요약 리포트 생성
//!
//! # 사용 예시
//!
//! ```ignore
//! use bandwalk_backtest::BacktestEngine;
//! use bandwalk_core::{BacktestSettings, StrategySettings};
//! use bandwalk_strategy::{create_strategy, StrategyKind};
//!
//! let engine = BacktestEngine::new(BacktestSettings::default());
//! let mut strategy = create_strategy(StrategyKind::SplitEntry, &StrategySettings::default());
//! let report = engine.run(strategy.as_mut(), &candles)?;
//! println!("{}", report.summary());
//! ```

pub mod engine;
pub mod performance;
pub mod report;

pub use engine::{BacktestEngine, BacktestError, BacktestResult, MIN_CANDLES, START_INDEX};
pub use performance::{EquityPoint, PerformanceMetrics, TRADING_PERIODS_PER_YEAR};
pub use report::BacktestReport;
