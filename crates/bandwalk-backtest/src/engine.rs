//! 백테스트 엔진.
//!
//! 과거 캔들 데이터로 진입/청산 전략을 시뮬레이션합니다.
//!
//! # 실행 규약
//!
//! - 최소 100캔들이 필요하며, 처음 50캔들은 지표 웜업 구간으로
//!   신호 없이 건너뜁니다.
//! - 매 스텝 청산 판정을 진입 판정보다 먼저 수행합니다.
//! - 시장 분석 결과는 실행 단위 캐시에 보관되어 같은 인덱스를
//!   다시 계산하지 않습니다.
//! - 마지막 캔들에서 미청산 포지션은 종가로 강제 청산됩니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use bandwalk_analysis::{MarketAnalysisResult, MarketAnalyzer};
use bandwalk_core::{
    BacktestSettings, Candle, CoreError, EntryIndicators, ExitReason, ExitSignal, PositionTracker,
    Side, StrategyType, TradeResult,
};
use bandwalk_strategy::{EntryExitStrategy, StrategyContext};

use crate::performance::EquityPoint;
use crate::report::BacktestReport;

/// 백테스트에 필요한 최소 캔들 수.
pub const MIN_CANDLES: usize = 100;

/// 신호 평가를 시작하는 인덱스 (지표 웜업 구간).
pub const START_INDEX: usize = bandwalk_analysis::WARMUP_CANDLES;

/// 백테스트 오류.
#[derive(Debug, Error)]
pub enum BacktestError {
    /// 데이터 부족
    #[error("캔들 데이터가 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientData { required: usize, provided: usize },

    /// 시간순 정렬 위반
    #[error("캔들 데이터가 시간순으로 정렬되어 있지 않습니다 (인덱스 {index})")]
    UnorderedData { index: usize },

    /// 설정 오류
    #[error("백테스트 설정 오류: {0}")]
    ConfigError(String),

    /// 포지션 관리 오류
    #[error(transparent)]
    Position(#[from] CoreError),
}

/// 백테스트 결과 타입.
pub type BacktestResult<T> = Result<T, BacktestError>;

/// 진행 중인 왕복 거래 누적기.
///
/// 첫 진입부터 전량 청산까지의 분할 진입/부분 청산을 하나의
/// `TradeResult`로 합산합니다.
struct OpenTrip {
    side: Side,
    strategy_type: StrategyType,
    strategy_name: String,
    entry_time: DateTime<Utc>,
    entry_indicators: EntryIndicators,
    total_cost: Decimal,
    total_entry_qty: Decimal,
    closed_qty: Decimal,
    closed_value: Decimal,
    gross_pnl: Decimal,
    fees: Decimal,
    entry_count: u8,
}

impl OpenTrip {
    fn new(
        side: Side,
        strategy_type: StrategyType,
        strategy_name: &str,
        entry_time: DateTime<Utc>,
        entry_indicators: EntryIndicators,
    ) -> Self {
        Self {
            side,
            strategy_type,
            strategy_name: strategy_name.to_string(),
            entry_time,
            entry_indicators,
            total_cost: Decimal::ZERO,
            total_entry_qty: Decimal::ZERO,
            closed_qty: Decimal::ZERO,
            closed_value: Decimal::ZERO,
            gross_pnl: Decimal::ZERO,
            fees: Decimal::ZERO,
            entry_count: 0,
        }
    }

    fn record_entry(&mut self, price: Decimal, quantity: Decimal, fee: Decimal) {
        self.total_cost += price * quantity;
        self.total_entry_qty += quantity;
        self.fees += fee;
        self.entry_count += 1;
    }

    fn record_exit(&mut self, price: Decimal, quantity: Decimal, pnl: Decimal, fee: Decimal) {
        self.closed_qty += quantity;
        self.closed_value += price * quantity;
        self.gross_pnl += pnl;
        self.fees += fee;
    }

    fn finalize(self, exit_time: DateTime<Utc>, exit_reason: ExitReason) -> TradeResult {
        let entry_price = if self.total_entry_qty.is_zero() {
            Decimal::ZERO
        } else {
            self.total_cost / self.total_entry_qty
        };
        let exit_price = if self.closed_qty.is_zero() {
            Decimal::ZERO
        } else {
            self.closed_value / self.closed_qty
        };

        TradeResult {
            id: Uuid::new_v4(),
            side: self.side,
            strategy_type: self.strategy_type,
            strategy_name: self.strategy_name,
            entry_price,
            exit_price,
            quantity: self.closed_qty,
            gross_pnl: self.gross_pnl,
            fees: self.fees,
            net_pnl: self.gross_pnl - self.fees,
            entry_count: self.entry_count,
            entry_time: self.entry_time,
            exit_time,
            exit_reason,
            entry_indicators: self.entry_indicators,
        }
    }
}

/// 백테스트 엔진.
///
/// 캔들 데이터와 전략을 받아 전체 시뮬레이션을 수행하고
/// 거래 기록과 자산 곡선을 담은 리포트를 반환합니다.
pub struct BacktestEngine {
    settings: BacktestSettings,
    analyzer: MarketAnalyzer,
}

impl BacktestEngine {
    /// 새로운 백테스트 엔진을 생성합니다.
    pub fn new(settings: BacktestSettings) -> Self {
        Self {
            settings,
            analyzer: MarketAnalyzer::new(),
        }
    }

    /// 설정을 검증합니다.
    pub fn validate(&self) -> BacktestResult<()> {
        if self.settings.initial_capital <= Decimal::ZERO {
            return Err(BacktestError::ConfigError(
                "초기 자본은 0보다 커야 합니다".to_string(),
            ));
        }
        if self.settings.position_size_pct <= Decimal::ZERO
            || self.settings.position_size_pct > Decimal::ONE
        {
            return Err(BacktestError::ConfigError(
                "진입 비중은 (0, 1] 범위여야 합니다".to_string(),
            ));
        }
        if self.settings.taker_fee_rate < Decimal::ZERO {
            return Err(BacktestError::ConfigError(
                "수수료율은 0 이상이어야 합니다".to_string(),
            ));
        }
        if self.settings.leverage == 0 {
            return Err(BacktestError::ConfigError(
                "레버리지는 1 이상이어야 합니다".to_string(),
            ));
        }
        Ok(())
    }

    /// 백테스트를 실행합니다.
    ///
    /// # 인자
    /// * `strategy` - 테스트할 전략
    /// * `candles` - 시간 오름차순 캔들 데이터 (최소 100개)
    pub fn run(
        &self,
        strategy: &mut dyn EntryExitStrategy,
        candles: &[Candle],
    ) -> BacktestResult<BacktestReport> {
        self.validate()?;

        if candles.len() < MIN_CANDLES {
            return Err(BacktestError::InsufficientData {
                required: MIN_CANDLES,
                provided: candles.len(),
            });
        }

        for (i, window) in candles.windows(2).enumerate() {
            if window[0].open_time > window[1].open_time {
                return Err(BacktestError::UnorderedData { index: i + 1 });
            }
        }

        let span = bandwalk_core::backtest_span!("backtest", candles[0].symbol, strategy.name());
        let _guard = span.enter();

        info!(
            candles = candles.len(),
            initial_capital = %self.settings.initial_capital,
            "백테스트 시작"
        );

        let mut capital = self.settings.initial_capital;
        let mut tracker = PositionTracker::new();
        let mut open_trip: Option<OpenTrip> = None;
        let mut trades: Vec<TradeResult> = Vec::new();
        let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(candles.len() - START_INDEX);

        // 실행 단위 분석 캐시 (인덱스 → 분석 결과)
        let mut analysis_cache: HashMap<usize, MarketAnalysisResult> = HashMap::new();

        for i in START_INDEX..candles.len() {
            let candle = &candles[i];

            if !tracker.is_consistent() {
                warn!(index = i, "포지션 추적기 상태 불일치, 초기화합니다");
                tracker.reset();
                open_trip = None;
            }

            if !analysis_cache.contains_key(&i) {
                match self.analyzer.analyze(&candles[..=i]) {
                    Ok(result) => {
                        analysis_cache.insert(i, result);
                    }
                    Err(err) => {
                        debug!(index = i, error = %err, "분석 불가, 이번 스텝 신호 없음");
                        equity_curve.push(EquityPoint {
                            timestamp: candle.close_time,
                            equity: capital + tracker.unrealized_pnl(candle.close),
                        });
                        continue;
                    }
                }
            }
            // 위에서 삽입을 보장했으므로 항상 존재
            let Some(analysis) = analysis_cache.get(&i) else {
                continue;
            };

            let ctx = StrategyContext::new(candle, analysis, self.settings.leverage);

            // 청산 판정을 진입 판정보다 먼저 수행
            if let Some(exit) = strategy.check_exit_signal(&ctx, &tracker) {
                self.apply_exit(
                    &exit,
                    candle,
                    &mut tracker,
                    &mut open_trip,
                    &mut capital,
                    &mut trades,
                )?;
            }

            if let Some(entry) = strategy.check_entry_signal(&ctx, &tracker) {
                let price = candle.close;
                let quantity = capital * self.settings.position_size_pct
                    * Decimal::from(self.settings.leverage)
                    / price;

                if quantity > Decimal::ZERO {
                    if let Err(err) = tracker.add_entry(
                        entry.side,
                        entry.strategy_type,
                        price,
                        quantity,
                        candle.open_time,
                    ) {
                        // 방향 위반은 전략 버그이므로 전파, 그 외(최대 진입 초과 등)는 무시
                        if err.is_logic_defect() {
                            return Err(err.into());
                        }
                        warn!(index = i, error = %err, "진입 거부");
                        equity_curve.push(EquityPoint {
                            timestamp: candle.close_time,
                            equity: capital + tracker.unrealized_pnl(candle.close),
                        });
                        continue;
                    }

                    let entry_fee = if self.settings.entry_fee_enabled {
                        quantity * price * self.settings.taker_fee_rate
                    } else {
                        Decimal::ZERO
                    };
                    capital -= entry_fee;

                    let trip = open_trip.get_or_insert_with(|| {
                        OpenTrip::new(
                            entry.side,
                            entry.strategy_type,
                            strategy.name(),
                            candle.open_time,
                            snapshot_indicators(analysis, price),
                        )
                    });
                    trip.record_entry(price, quantity, entry_fee);

                    debug!(
                        index = i,
                        side = %entry.side,
                        price = %price,
                        quantity = %quantity,
                        reason = %entry.reason,
                        "진입"
                    );
                }
            }

            equity_curve.push(EquityPoint {
                timestamp: candle.close_time,
                equity: capital + tracker.unrealized_pnl(candle.close),
            });
        }

        // 미청산 포지션 강제 청산
        if tracker.has_position() {
            let last = &candles[candles.len() - 1];
            let exit = ExitSignal::full(ExitReason::BacktestEnd, "백테스트 종료 강제 청산");
            self.apply_exit(
                &exit,
                last,
                &mut tracker,
                &mut open_trip,
                &mut capital,
                &mut trades,
            )?;

            if let Some(point) = equity_curve.last_mut() {
                point.equity = capital;
            }
        }

        info!(
            trades = trades.len(),
            final_capital = %capital,
            "백테스트 완료"
        );

        let start_time = candles[0].open_time;
        let end_time = candles[candles.len() - 1].close_time;

        Ok(BacktestReport {
            strategy_name: strategy.name().to_string(),
            initial_capital: self.settings.initial_capital,
            final_capital: capital,
            trades,
            equity_curve,
            start_time,
            end_time,
            data_points: candles.len(),
        })
    }

    /// 청산 신호를 적용하고 전량 청산 시 거래 기록을 완결합니다.
    fn apply_exit(
        &self,
        exit: &ExitSignal,
        candle: &Candle,
        tracker: &mut PositionTracker,
        open_trip: &mut Option<OpenTrip>,
        capital: &mut Decimal,
        trades: &mut Vec<TradeResult>,
    ) -> BacktestResult<()> {
        let price = candle.close;
        let (closed_qty, pnl) = tracker.close_partial(price, exit.fraction)?;
        let fee = closed_qty * price * self.settings.taker_fee_rate;
        *capital += pnl - fee;

        if let Some(trip) = open_trip.as_mut() {
            trip.record_exit(price, closed_qty, pnl, fee);
        }

        debug!(
            reason = %exit.reason,
            detail = %exit.detail,
            price = %price,
            quantity = %closed_qty,
            pnl = %pnl,
            "청산"
        );

        if !tracker.has_position() {
            if let Some(trip) = open_trip.take() {
                trades.push(trip.finalize(candle.close_time, exit.reason));
            }
        }

        Ok(())
    }
}

/// 분석 결과에서 진입 시점 지표 스냅샷을 추출합니다.
fn snapshot_indicators(analysis: &MarketAnalysisResult, price: Decimal) -> EntryIndicators {
    let bb = &analysis.snapshot.bollinger;
    EntryIndicators {
        rsi: analysis.snapshot.rsi,
        bb_upper: bb.upper.unwrap_or(price),
        bb_middle: bb.middle.unwrap_or(price),
        bb_lower: bb.lower.unwrap_or(price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandwalk_core::{EntrySignal, Symbol, Timeframe};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn make_candles(closes: &[Decimal]) -> Vec<Candle> {
        let symbol = Symbol::new("BTC", "USDT");
        let base = Utc::now() - Duration::minutes(closes.len() as i64);

        closes
            .iter()
            .enumerate()
            .map(|(i, close)| {
                let open_time = base + Duration::minutes(i as i64);
                Candle::new(
                    symbol.clone(),
                    Timeframe::M1,
                    open_time,
                    *close,
                    *close + dec!(0.5),
                    *close - dec!(0.5),
                    *close,
                    dec!(1000),
                    open_time + Duration::minutes(1),
                )
            })
            .collect()
    }

    fn flat_candles(count: usize) -> Vec<Candle> {
        make_candles(&vec![dec!(100); count])
    }

    /// 첫 기회에 롱 진입 후 청산하지 않는 테스트 전략.
    struct EnterAndHold {
        entered: bool,
    }

    impl EnterAndHold {
        fn new() -> Self {
            Self { entered: false }
        }
    }

    impl EntryExitStrategy for EnterAndHold {
        fn name(&self) -> &'static str {
            "enter_and_hold"
        }

        fn check_exit_signal(
            &mut self,
            _ctx: &StrategyContext<'_>,
            _tracker: &PositionTracker,
        ) -> Option<ExitSignal> {
            None
        }

        fn check_entry_signal(
            &mut self,
            _ctx: &StrategyContext<'_>,
            tracker: &PositionTracker,
        ) -> Option<EntrySignal> {
            if self.entered || tracker.has_position() {
                return None;
            }
            self.entered = true;
            Some(EntrySignal::new(
                Side::Long,
                StrategyType::TrendFollowing,
                "테스트 진입",
            ))
        }
    }

    /// 아무것도 하지 않는 테스트 전략.
    struct NeverTrade;

    impl EntryExitStrategy for NeverTrade {
        fn name(&self) -> &'static str {
            "never_trade"
        }

        fn check_exit_signal(
            &mut self,
            _ctx: &StrategyContext<'_>,
            _tracker: &PositionTracker,
        ) -> Option<ExitSignal> {
            None
        }

        fn check_entry_signal(
            &mut self,
            _ctx: &StrategyContext<'_>,
            _tracker: &PositionTracker,
        ) -> Option<EntrySignal> {
            None
        }
    }

    #[test]
    fn test_minimum_candles_enforced() {
        let engine = BacktestEngine::new(BacktestSettings::default());
        let candles = flat_candles(99);
        let mut strategy = NeverTrade;

        let result = engine.run(&mut strategy, &candles);
        assert!(matches!(
            result,
            Err(BacktestError::InsufficientData {
                required: 100,
                provided: 99
            })
        ));
    }

    #[test]
    fn test_unordered_data_rejected() {
        let engine = BacktestEngine::new(BacktestSettings::default());
        let mut candles = flat_candles(100);
        candles.swap(10, 11);
        let mut strategy = NeverTrade;

        let result = engine.run(&mut strategy, &candles);
        assert!(matches!(result, Err(BacktestError::UnorderedData { .. })));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = BacktestSettings {
            initial_capital: dec!(-100),
            ..Default::default()
        };
        let engine = BacktestEngine::new(settings);
        let mut strategy = NeverTrade;

        let result = engine.run(&mut strategy, &flat_candles(100));
        assert!(matches!(result, Err(BacktestError::ConfigError(_))));
    }

    #[test]
    fn test_no_trades_preserves_capital() {
        let engine = BacktestEngine::new(BacktestSettings::default());
        let mut strategy = NeverTrade;

        let report = engine.run(&mut strategy, &flat_candles(120)).unwrap();
        assert!(report.trades.is_empty());
        assert_eq!(report.final_capital, dec!(10000));
        // 웜업 이후 매 캔들마다 자산이 샘플링됨
        assert_eq!(report.equity_curve.len(), 120 - START_INDEX);
    }

    #[test]
    fn test_forced_close_at_end() {
        let settings = BacktestSettings::default();
        let engine = BacktestEngine::new(settings.clone());
        let mut strategy = EnterAndHold::new();

        let report = engine.run(&mut strategy, &flat_candles(120)).unwrap();
        assert_eq!(report.trades.len(), 1);

        let trade = &report.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::BacktestEnd);
        assert_eq!(trade.exit_reason.to_string(), "backtest end");
        assert_eq!(trade.side, Side::Long);
        assert_eq!(trade.entry_count, 1);
    }

    #[test]
    fn test_fee_applies_to_closed_notional_only() {
        // 진입 수수료 비활성(기본값): 순손익 = 실현 손익 - 청산 명목 가치 × 수수료율
        let settings = BacktestSettings::default();
        let engine = BacktestEngine::new(settings.clone());
        let mut strategy = EnterAndHold::new();

        let report = engine.run(&mut strategy, &flat_candles(120)).unwrap();
        let trade = &report.trades[0];

        // 가격 변동이 없으므로 실현 손익 0
        assert_eq!(trade.gross_pnl, Decimal::ZERO);
        let expected_fee = trade.quantity * trade.exit_price * settings.taker_fee_rate;
        assert_eq!(trade.fees, expected_fee);
        assert_eq!(trade.net_pnl, -expected_fee);
        assert_eq!(report.final_capital, settings.initial_capital - expected_fee);
    }

    #[test]
    fn test_position_sizing_uses_leverage() {
        let settings = BacktestSettings::default();
        let engine = BacktestEngine::new(settings.clone());
        let mut strategy = EnterAndHold::new();

        let report = engine.run(&mut strategy, &flat_candles(120)).unwrap();
        let trade = &report.trades[0];

        // 10000 × 0.1 × 10 / 100 = 100
        let expected_qty = settings.initial_capital * settings.position_size_pct
            * Decimal::from(settings.leverage)
            / dec!(100);
        assert_eq!(trade.quantity, expected_qty);
    }

    #[test]
    fn test_entry_fee_when_enabled() {
        let settings = BacktestSettings {
            entry_fee_enabled: true,
            ..Default::default()
        };
        let engine = BacktestEngine::new(settings.clone());
        let mut strategy = EnterAndHold::new();

        let report = engine.run(&mut strategy, &flat_candles(120)).unwrap();
        let trade = &report.trades[0];

        let notional = trade.quantity * dec!(100);
        let expected_fees = notional * settings.taker_fee_rate * dec!(2);
        assert_eq!(trade.fees, expected_fees);
    }

    #[test]
    fn test_entry_indicators_snapshot_recorded() {
        let engine = BacktestEngine::new(BacktestSettings::default());
        let mut strategy = EnterAndHold::new();

        let report = engine.run(&mut strategy, &flat_candles(120)).unwrap();
        let indicators = &report.trades[0].entry_indicators;

        // 평탄한 시장에서는 밴드가 수렴함
        assert_eq!(indicators.bb_middle, dec!(100));
        assert_eq!(indicators.bb_upper, dec!(100));
        assert_eq!(indicators.bb_lower, dec!(100));
    }
}
