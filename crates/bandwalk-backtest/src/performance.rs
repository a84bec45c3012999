//! 성과 지표 계산.
//!
//! 백테스트 결과(거래 목록 + 자산 곡선)에서 파생 지표를 계산합니다.
//!
//! # 주요 지표
//!
//! - **총 수익률**: 순수익 / 초기 자본 × 100
//! - **샤프 비율**: 거래 수익률 기준, 연 250 거래일로 연율화
//! - **최대 낙폭**: 자산 곡선 고점 대비 최대 하락률
//! - **프로핏 팩터**: 총 수익 / 총 손실 (손실이 없으면 `Decimal::MAX`)
//! - **전략별 성과**: 전략 유형(추세추종/역추세) 기준 거래 통계 분해

use bandwalk_core::{StrategyType, TradeResult, TradeStatistics};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 연간 거래일 수 (연율화 계산용).
pub const TRADING_PERIODS_PER_YEAR: u32 = 250;

/// 자산 곡선의 한 점.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    /// 샘플링 시각 (캔들 종료 시간)
    pub timestamp: DateTime<Utc>,
    /// 자산 가치 (실현 자본 + 미실현 손익)
    pub equity: Decimal,
}

/// 백테스트 성과 지표.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// 총 수익률 (%)
    pub total_return_pct: Decimal,

    /// 샤프 비율
    ///
    /// 거래당 수익률의 평균 / 표준편차 × √250.
    /// 거래가 2건 미만이거나 변동성이 0이면 0입니다.
    pub sharpe_ratio: Decimal,

    /// 최대 낙폭 (%)
    ///
    /// 자산 곡선 고점 대비 최대 하락률입니다.
    pub max_drawdown_pct: Decimal,

    /// 프로핏 팩터 (총 수익 / 총 손실)
    ///
    /// 손실 거래가 없고 수익이 있으면 `Decimal::MAX`로 표기합니다.
    pub profit_factor: Decimal,

    /// 평균 보유 시간 (분)
    pub avg_holding_minutes: Decimal,

    /// 거래 통계 (승률, 평균 손익, 긴급 청산 수 등)
    pub stats: TradeStatistics,

    /// 전략 유형별 거래 통계
    ///
    /// 같은 전략이라도 추세추종 진입과 역추세 진입은 별도로 집계됩니다.
    pub by_strategy: HashMap<StrategyType, TradeStatistics>,
}

impl PerformanceMetrics {
    /// 거래 목록과 자산 곡선에서 성과 지표를 계산합니다.
    ///
    /// # 인자
    /// * `trades` - 완결된 왕복 거래 목록
    /// * `equity_curve` - 캔들별 자산 곡선
    /// * `initial_capital` - 초기 자본
    pub fn from_trades(
        trades: &[TradeResult],
        equity_curve: &[EquityPoint],
        initial_capital: Decimal,
    ) -> Self {
        let stats = TradeStatistics::from_trades(trades);

        let total_return_pct = if initial_capital > Decimal::ZERO {
            stats.total_pnl / initial_capital * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        let sharpe_ratio = Self::sharpe_ratio(trades);
        let max_drawdown_pct = Self::max_drawdown_pct(equity_curve);
        let profit_factor = Self::profit_factor(trades);
        let avg_holding_minutes = Self::avg_holding_minutes(trades);

        let mut by_strategy: HashMap<StrategyType, Vec<TradeResult>> = HashMap::new();
        for trade in trades {
            by_strategy
                .entry(trade.strategy_type)
                .or_default()
                .push(trade.clone());
        }
        let by_strategy = by_strategy
            .into_iter()
            .map(|(strategy_type, trades)| (strategy_type, TradeStatistics::from_trades(&trades)))
            .collect();

        Self {
            total_return_pct,
            sharpe_ratio,
            max_drawdown_pct,
            profit_factor,
            avg_holding_minutes,
            stats,
            by_strategy,
        }
    }

    /// 거래당 수익률 기준 샤프 비율을 계산합니다.
    fn sharpe_ratio(trades: &[TradeResult]) -> Decimal {
        let returns: Vec<Decimal> = trades.iter().filter_map(|t| t.return_pct()).collect();
        if returns.len() < 2 {
            return Decimal::ZERO;
        }

        let n = Decimal::from(returns.len() as u64);
        let mean = returns.iter().copied().sum::<Decimal>() / n;

        let variance = returns
            .iter()
            .map(|r| {
                let diff = *r - mean;
                diff * diff
            })
            .sum::<Decimal>()
            / n;

        let std_dev = decimal_sqrt(variance);
        if std_dev.is_zero() {
            return Decimal::ZERO;
        }

        mean / std_dev * decimal_sqrt(Decimal::from(TRADING_PERIODS_PER_YEAR))
    }

    /// 자산 곡선에서 최대 낙폭(%)을 계산합니다.
    fn max_drawdown_pct(equity_curve: &[EquityPoint]) -> Decimal {
        let mut peak = Decimal::ZERO;
        let mut max_drawdown = Decimal::ZERO;

        for point in equity_curve {
            if point.equity > peak {
                peak = point.equity;
            }
            if peak > Decimal::ZERO {
                let drawdown = (peak - point.equity) / peak * Decimal::ONE_HUNDRED;
                if drawdown > max_drawdown {
                    max_drawdown = drawdown;
                }
            }
        }

        max_drawdown
    }

    /// 프로핏 팩터를 계산합니다.
    fn profit_factor(trades: &[TradeResult]) -> Decimal {
        let gross_profit: Decimal = trades
            .iter()
            .filter(|t| t.net_pnl > Decimal::ZERO)
            .map(|t| t.net_pnl)
            .sum();
        let gross_loss: Decimal = trades
            .iter()
            .filter(|t| t.net_pnl < Decimal::ZERO)
            .map(|t| t.net_pnl.abs())
            .sum();

        if gross_loss.is_zero() {
            if gross_profit > Decimal::ZERO {
                Decimal::MAX
            } else {
                Decimal::ZERO
            }
        } else {
            gross_profit / gross_loss
        }
    }

    /// 평균 보유 시간(분)을 계산합니다.
    fn avg_holding_minutes(trades: &[TradeResult]) -> Decimal {
        if trades.is_empty() {
            return Decimal::ZERO;
        }
        let total_minutes: i64 = trades
            .iter()
            .map(|t| t.holding_duration().num_minutes())
            .sum();
        Decimal::from(total_minutes) / Decimal::from(trades.len() as u64)
    }
}

/// Newton-Raphson 방식의 Decimal 제곱근.
fn decimal_sqrt(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let mut guess = value / dec!(2);
    if guess.is_zero() {
        guess = value;
    }

    for _ in 0..10 {
        guess = (guess + value / guess) / dec!(2);
    }

    guess
}
