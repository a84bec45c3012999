//! 거래 기록 및 통계.
//!
//! 백테스트에서 생성되는 왕복 거래(round trip) 기록과
//! 거래 목록에서 파생되는 기본 통계를 제공합니다.

use crate::domain::{ExitReason, Side, StrategyType};
use crate::types::{Price, Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 첫 진입 시점의 지표 스냅샷.
///
/// 사후 분석을 위해 거래 기록에 보존됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryIndicators {
    /// RSI(14)
    pub rsi: Decimal,
    /// 볼린저 상단 밴드
    pub bb_upper: Decimal,
    /// 볼린저 중간 밴드
    pub bb_middle: Decimal,
    /// 볼린저 하단 밴드
    pub bb_lower: Decimal,
}

/// 완결된 왕복 거래 기록.
///
/// 하나의 거래는 첫 진입부터 전량 청산까지의 전체 구간을 의미합니다.
/// 분할 진입과 부분 청산은 모두 하나의 거래로 합산됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeResult {
    /// 거래 식별자
    pub id: Uuid,
    /// 포지션 방향
    pub side: Side,
    /// 사용된 전략 유형
    pub strategy_type: StrategyType,
    /// 전략 이름 (전략별 성과 분류용)
    pub strategy_name: String,
    /// 가중 평균 진입가
    pub entry_price: Price,
    /// 최종 청산가
    pub exit_price: Price,
    /// 총 거래 수량
    pub quantity: Quantity,
    /// 실현 손익 (수수료 차감 전)
    pub gross_pnl: Decimal,
    /// 총 수수료
    pub fees: Decimal,
    /// 순손익 (수수료 차감 후)
    pub net_pnl: Decimal,
    /// 분할 진입 횟수
    pub entry_count: u8,
    /// 첫 진입 시각
    pub entry_time: DateTime<Utc>,
    /// 최종 청산 시각
    pub exit_time: DateTime<Utc>,
    /// 최종 청산 사유
    pub exit_reason: ExitReason,
    /// 첫 진입 시점의 지표 스냅샷
    pub entry_indicators: EntryIndicators,
}

impl TradeResult {
    /// 수익 거래인지 확인합니다.
    pub fn is_win(&self) -> bool {
        self.net_pnl > Decimal::ZERO
    }

    /// 진입가 대비 수익률(%)을 반환합니다. 명목 가치가 0이면 `None`.
    pub fn return_pct(&self) -> Option<Decimal> {
        let notional = self.entry_price * self.quantity;
        if notional.is_zero() {
            return None;
        }
        Some(self.net_pnl / notional * Decimal::ONE_HUNDRED)
    }

    /// 보유 기간을 반환합니다.
    pub fn holding_duration(&self) -> chrono::Duration {
        self.exit_time - self.entry_time
    }
}

/// 거래 목록에서 파생되는 기본 통계.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeStatistics {
    /// 총 거래 수
    pub total_trades: usize,
    /// 수익 거래 수
    pub winning_trades: usize,
    /// 손실 거래 수
    pub losing_trades: usize,
    /// 승률 (%)
    pub win_rate: Decimal,
    /// 총 순손익
    pub total_pnl: Decimal,
    /// 총 수수료
    pub total_fees: Decimal,
    /// 평균 수익 거래 손익
    pub avg_win: Decimal,
    /// 평균 손실 거래 손익 (음수)
    pub avg_loss: Decimal,
    /// 최대 단일 수익
    pub largest_win: Decimal,
    /// 최대 단일 손실 (음수)
    pub largest_loss: Decimal,
    /// 긴급 청산 거래 수
    pub emergency_exits: usize,
}

impl TradeStatistics {
    /// 거래 목록에서 통계를 계산합니다.
    pub fn from_trades(trades: &[TradeResult]) -> Self {
        if trades.is_empty() {
            return Self::default();
        }

        let total_trades = trades.len();
        let winning: Vec<&TradeResult> = trades.iter().filter(|t| t.is_win()).collect();
        let losing: Vec<&TradeResult> =
            trades.iter().filter(|t| t.net_pnl < Decimal::ZERO).collect();

        let winning_trades = winning.len();
        let losing_trades = losing.len();

        let win_rate = Decimal::from(winning_trades as u64) / Decimal::from(total_trades as u64)
            * Decimal::ONE_HUNDRED;

        let total_pnl: Decimal = trades.iter().map(|t| t.net_pnl).sum();
        let total_fees: Decimal = trades.iter().map(|t| t.fees).sum();

        let avg_win = if winning_trades > 0 {
            winning.iter().map(|t| t.net_pnl).sum::<Decimal>()
                / Decimal::from(winning_trades as u64)
        } else {
            Decimal::ZERO
        };
        let avg_loss = if losing_trades > 0 {
            losing.iter().map(|t| t.net_pnl).sum::<Decimal>() / Decimal::from(losing_trades as u64)
        } else {
            Decimal::ZERO
        };

        let largest_win = trades
            .iter()
            .map(|t| t.net_pnl)
            .max()
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO);
        let largest_loss = trades
            .iter()
            .map(|t| t.net_pnl)
            .min()
            .unwrap_or(Decimal::ZERO)
            .min(Decimal::ZERO);

        let emergency_exits = trades.iter().filter(|t| t.exit_reason.is_emergency()).count();

        Self {
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            total_pnl,
            total_fees,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            emergency_exits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_trade(net_pnl: Decimal, exit_reason: ExitReason) -> TradeResult {
        let now = Utc::now();
        TradeResult {
            id: Uuid::new_v4(),
            side: Side::Long,
            strategy_type: StrategyType::TrendFollowing,
            strategy_name: "split_entry".to_string(),
            entry_price: dec!(100),
            exit_price: dec!(100) + net_pnl,
            quantity: dec!(1),
            gross_pnl: net_pnl,
            fees: Decimal::ZERO,
            net_pnl,
            entry_count: 1,
            entry_time: now,
            exit_time: now + chrono::Duration::minutes(10),
            exit_reason,
            entry_indicators: EntryIndicators {
                rsi: dec!(55),
                bb_upper: dec!(105),
                bb_middle: dec!(100),
                bb_lower: dec!(95),
            },
        }
    }

    #[test]
    fn test_statistics_from_trades() {
        let trades = vec![
            sample_trade(dec!(10), ExitReason::TieredTakeProfit),
            sample_trade(dec!(-5), ExitReason::StopLoss),
            sample_trade(dec!(20), ExitReason::MiddleBandReversion),
            sample_trade(dec!(-15), ExitReason::EmergencyStop),
        ];

        let stats = TradeStatistics::from_trades(&trades);
        assert_eq!(stats.total_trades, 4);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.losing_trades, 2);
        assert_eq!(stats.win_rate, dec!(50));
        assert_eq!(stats.total_pnl, dec!(10));
        assert_eq!(stats.avg_win, dec!(15));
        assert_eq!(stats.avg_loss, dec!(-10));
        assert_eq!(stats.largest_win, dec!(20));
        assert_eq!(stats.largest_loss, dec!(-15));
        assert_eq!(stats.emergency_exits, 1);
    }

    #[test]
    fn test_statistics_empty() {
        let stats = TradeStatistics::from_trades(&[]);
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.win_rate, Decimal::ZERO);
    }

    #[test]
    fn test_return_pct() {
        let trade = sample_trade(dec!(1), ExitReason::TieredTakeProfit);
        assert_eq!(trade.return_pct(), Some(dec!(1)));
    }
}
