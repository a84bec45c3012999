//! 분할 진입 포지션 추적기.
//!
//! 최대 3회 분할 진입을 FIFO 방식으로 관리합니다:
//! - 동일 방향으로만 추가 진입 가능 (반대 방향 시도는 로직 결함으로 간주)
//! - 부분 청산은 오래된 진입부터 소진 (경계 진입은 분할)
//! - 실현 손익은 청산 직전의 가중 평균 진입가 기준으로 계산
//! - `is_consistent`로 내부 상태 정합성을 검증

use crate::domain::{calculations, Side, StrategyType};
use crate::error::{CoreError, CoreResult};
use crate::types::{Price, Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 허용되는 최대 분할 진입 횟수.
pub const MAX_ENTRIES: usize = 3;

/// 개별 분할 진입 기록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEntry {
    /// 진입가
    pub price: Price,
    /// 잔여 수량 (부분 청산 시 감소)
    pub quantity: Quantity,
    /// 진입 시각
    pub entry_time: DateTime<Utc>,
    /// 진입 차수 (1부터 시작)
    pub level: u8,
}

/// 분할 진입 포지션 추적기.
///
/// 포지션이 비어 있으면 `side`와 `strategy_type`은 `None`입니다.
/// 첫 진입 시 방향과 전략 유형이 고정되며, 전량 청산 시 초기화됩니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionTracker {
    entries: Vec<PositionEntry>,
    side: Option<Side>,
    strategy_type: Option<StrategyType>,
    first_entry_time: Option<DateTime<Utc>>,
}

impl PositionTracker {
    /// 빈 추적기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 분할 진입을 추가합니다.
    ///
    /// # 인자
    /// * `side` - 진입 방향 (기존 포지션과 반대면 오류)
    /// * `strategy_type` - 전략 유형 (첫 진입 시 고정)
    /// * `price` - 진입가
    /// * `quantity` - 진입 수량
    /// * `time` - 진입 시각
    ///
    /// # 반환
    /// 이번 진입의 차수 (1~3)
    pub fn add_entry(
        &mut self,
        side: Side,
        strategy_type: StrategyType,
        price: Price,
        quantity: Quantity,
        time: DateTime<Utc>,
    ) -> CoreResult<u8> {
        if price <= Decimal::ZERO || quantity <= Decimal::ZERO {
            return Err(CoreError::InvalidInput(format!(
                "진입가/수량은 양수여야 합니다: price={}, quantity={}",
                price, quantity
            )));
        }

        if let Some(current) = self.side {
            if current != side {
                return Err(CoreError::SideViolation {
                    requested: side,
                    current,
                });
            }
        }

        if self.entries.len() >= MAX_ENTRIES {
            return Err(CoreError::MaxEntriesExceeded { max: MAX_ENTRIES });
        }

        let level = self.entries.len() as u8 + 1;
        self.entries.push(PositionEntry {
            price,
            quantity,
            entry_time: time,
            level,
        });

        if self.side.is_none() {
            self.side = Some(side);
            self.strategy_type = Some(strategy_type);
            self.first_entry_time = Some(time);
        }

        Ok(level)
    }

    /// 포지션의 일부를 FIFO 순서로 청산합니다.
    ///
    /// 청산 수량이 진입 경계에 걸치면 해당 진입을 분할합니다.
    /// 실현 손익은 청산 직전의 가중 평균 진입가를 기준으로 계산합니다.
    ///
    /// # 인자
    /// * `price` - 청산가
    /// * `fraction` - 청산 비율 (0 초과 1 이하)
    ///
    /// # 반환
    /// (청산 수량, 실현 손익)
    pub fn close_partial(
        &mut self,
        price: Price,
        fraction: Decimal,
    ) -> CoreResult<(Quantity, Decimal)> {
        if fraction <= Decimal::ZERO || fraction > Decimal::ONE {
            return Err(CoreError::InvalidFraction(fraction));
        }
        let side = self.side.ok_or(CoreError::EmptyPosition)?;

        let avg_price = self.average_price();
        let close_qty = self.total_quantity() * fraction;
        let pnl = calculations::realized_pnl(side, avg_price, price, close_qty);

        // FIFO 소진
        let mut remaining = close_qty;
        while remaining > Decimal::ZERO && !self.entries.is_empty() {
            if self.entries[0].quantity <= remaining {
                remaining -= self.entries[0].quantity;
                self.entries.remove(0);
            } else {
                self.entries[0].quantity -= remaining;
                remaining = Decimal::ZERO;
            }
        }

        if self.entries.is_empty() {
            self.reset();
        }

        Ok((close_qty, pnl))
    }

    /// 포지션 전량을 청산하고 상태를 초기화합니다.
    ///
    /// # 반환
    /// (청산 수량, 실현 손익)
    pub fn close_all(&mut self, price: Price) -> CoreResult<(Quantity, Decimal)> {
        let result = self.close_partial(price, Decimal::ONE)?;
        self.reset();
        Ok(result)
    }

    /// 가중 평균 진입가를 반환합니다. 포지션이 비어 있으면 0.
    pub fn average_price(&self) -> Price {
        let total_qty = self.total_quantity();
        if total_qty.is_zero() {
            return Decimal::ZERO;
        }
        let total_cost: Decimal = self.entries.iter().map(|e| e.price * e.quantity).sum();
        total_cost / total_qty
    }

    /// 총 보유 수량을 반환합니다.
    pub fn total_quantity(&self) -> Quantity {
        self.entries.iter().map(|e| e.quantity).sum()
    }

    /// 현재 진입 횟수를 반환합니다.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// 포지션 보유 여부를 반환합니다.
    pub fn has_position(&self) -> bool {
        !self.entries.is_empty()
    }

    /// 포지션 방향을 반환합니다.
    pub fn side(&self) -> Option<Side> {
        self.side
    }

    /// 전략 유형을 반환합니다.
    pub fn strategy_type(&self) -> Option<StrategyType> {
        self.strategy_type
    }

    /// 첫 진입 시각을 반환합니다.
    pub fn first_entry_time(&self) -> Option<DateTime<Utc>> {
        self.first_entry_time
    }

    /// 마지막 진입 기록을 반환합니다.
    pub fn last_entry(&self) -> Option<&PositionEntry> {
        self.entries.last()
    }

    /// 개별 진입 기록 목록을 반환합니다.
    pub fn entries(&self) -> &[PositionEntry] {
        &self.entries
    }

    /// 현재가 기준 미실현 손익을 반환합니다.
    pub fn unrealized_pnl(&self, current_price: Price) -> Decimal {
        match self.side {
            Some(side) => calculations::unrealized_pnl(
                side,
                self.average_price(),
                current_price,
                self.total_quantity(),
            ),
            None => Decimal::ZERO,
        }
    }

    /// 평균 진입가 대비 수익률(%)을 반환합니다.
    pub fn pnl_pct(&self, current_price: Price) -> Decimal {
        match self.side {
            Some(side) => calculations::return_pct(side, self.average_price(), current_price),
            None => Decimal::ZERO,
        }
    }

    /// 내부 상태 정합성을 검증합니다.
    ///
    /// 진입 기록과 방향/전략 유형 메타데이터가 함께 존재하거나
    /// 함께 비어 있어야 합니다.
    pub fn is_consistent(&self) -> bool {
        if self.entries.is_empty() {
            self.side.is_none() && self.strategy_type.is_none() && self.first_entry_time.is_none()
        } else {
            self.side.is_some()
                && self.strategy_type.is_some()
                && self.first_entry_time.is_some()
                && self.entries.iter().all(|e| e.quantity > Decimal::ZERO)
        }
    }

    /// 포지션 상태를 강제로 초기화합니다.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.side = None;
        self.strategy_type = None;
        self.first_entry_time = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn open_long(tracker: &mut PositionTracker, price: Decimal, qty: Decimal) -> u8 {
        tracker
            .add_entry(
                Side::Long,
                StrategyType::TrendFollowing,
                price,
                qty,
                Utc::now(),
            )
            .unwrap()
    }

    #[test]
    fn test_add_entry_levels() {
        let mut tracker = PositionTracker::new();
        assert_eq!(open_long(&mut tracker, dec!(100), dec!(1)), 1);
        assert_eq!(open_long(&mut tracker, dec!(99), dec!(1)), 2);
        assert_eq!(open_long(&mut tracker, dec!(98), dec!(1)), 3);
        assert_eq!(tracker.entry_count(), 3);

        let err = tracker.add_entry(
            Side::Long,
            StrategyType::TrendFollowing,
            dec!(97),
            dec!(1),
            Utc::now(),
        );
        assert!(matches!(err, Err(CoreError::MaxEntriesExceeded { max: 3 })));
    }

    #[test]
    fn test_side_violation_is_error() {
        let mut tracker = PositionTracker::new();
        open_long(&mut tracker, dec!(100), dec!(1));

        let err = tracker.add_entry(
            Side::Short,
            StrategyType::TrendFollowing,
            dec!(100),
            dec!(1),
            Utc::now(),
        );
        assert!(matches!(err, Err(CoreError::SideViolation { .. })));
        // 기존 포지션은 훼손되지 않아야 함
        assert_eq!(tracker.entry_count(), 1);
        assert_eq!(tracker.side(), Some(Side::Long));
    }

    #[test]
    fn test_average_price_weighted() {
        let mut tracker = PositionTracker::new();
        open_long(&mut tracker, dec!(100), dec!(1));
        open_long(&mut tracker, dec!(110), dec!(3));
        // (100*1 + 110*3) / 4 = 107.5
        assert_eq!(tracker.average_price(), dec!(107.5));
    }

    #[test]
    fn test_close_partial_fifo_boundary_split() {
        let mut tracker = PositionTracker::new();
        open_long(&mut tracker, dec!(100), dec!(2));
        open_long(&mut tracker, dec!(110), dec!(2));

        // 총 4 중 75% 청산 -> 첫 진입 전량 + 둘째 진입 1 소진
        let (qty, pnl) = tracker.close_partial(dec!(120), dec!(0.75)).unwrap();
        assert_eq!(qty, dec!(3));
        // 평균가 105 기준: (120 - 105) * 3 = 45
        assert_eq!(pnl, dec!(45));
        assert_eq!(tracker.entry_count(), 1);
        assert_eq!(tracker.total_quantity(), dec!(1));
        assert_eq!(tracker.entries()[0].price, dec!(110));
        assert!(tracker.is_consistent());
    }

    #[test]
    fn test_close_all_resets() {
        let mut tracker = PositionTracker::new();
        open_long(&mut tracker, dec!(100), dec!(2));

        let (qty, pnl) = tracker.close_all(dec!(105)).unwrap();
        assert_eq!(qty, dec!(2));
        assert_eq!(pnl, dec!(10));
        assert!(!tracker.has_position());
        assert!(tracker.side().is_none());
        assert!(tracker.is_consistent());
    }

    #[test]
    fn test_close_empty_position_is_error() {
        let mut tracker = PositionTracker::new();
        let err = tracker.close_partial(dec!(100), dec!(0.5));
        assert!(matches!(err, Err(CoreError::EmptyPosition)));
    }

    #[test]
    fn test_invalid_fraction() {
        let mut tracker = PositionTracker::new();
        open_long(&mut tracker, dec!(100), dec!(1));

        assert!(matches!(
            tracker.close_partial(dec!(100), dec!(0)),
            Err(CoreError::InvalidFraction(_))
        ));
        assert!(matches!(
            tracker.close_partial(dec!(100), dec!(1.5)),
            Err(CoreError::InvalidFraction(_))
        ));
    }

    #[test]
    fn test_short_pnl() {
        let mut tracker = PositionTracker::new();
        tracker
            .add_entry(
                Side::Short,
                StrategyType::CounterTrend,
                dec!(100),
                dec!(2),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(tracker.unrealized_pnl(dec!(95)), dec!(10));
        assert_eq!(tracker.pnl_pct(dec!(95)), dec!(5));

        let (_, pnl) = tracker.close_all(dec!(95)).unwrap();
        assert_eq!(pnl, dec!(10));
    }

    #[test]
    fn test_full_fraction_via_close_partial_resets() {
        let mut tracker = PositionTracker::new();
        open_long(&mut tracker, dec!(100), dec!(1));

        tracker.close_partial(dec!(101), dec!(1)).unwrap();
        assert!(!tracker.has_position());
        assert!(tracker.is_consistent());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// 임의의 진입/청산 가격에서 전량 청산 후 추적기는 항상 초기 상태여야 함
            #[test]
            fn close_all_always_resets(
                entry in 1u32..1_000_000,
                exit in 1u32..1_000_000,
                qty in 1u32..100_000,
            ) {
                let mut tracker = PositionTracker::new();
                open_long(&mut tracker, Decimal::from(entry), Decimal::from(qty));

                let (closed, pnl) = tracker.close_all(Decimal::from(exit)).unwrap();
                prop_assert_eq!(closed, Decimal::from(qty));
                prop_assert_eq!(
                    pnl,
                    (Decimal::from(exit) - Decimal::from(entry)) * Decimal::from(qty)
                );
                prop_assert!(!tracker.has_position());
                prop_assert!(tracker.is_consistent());
            }

            /// 부분 청산 후에도 상태 정합성이 유지되어야 함
            #[test]
            fn partial_close_keeps_consistency(
                qty1 in 1u32..10_000,
                qty2 in 1u32..10_000,
                fraction_pct in 1u32..100,
            ) {
                let mut tracker = PositionTracker::new();
                open_long(&mut tracker, dec!(100), Decimal::from(qty1));
                open_long(&mut tracker, dec!(110), Decimal::from(qty2));

                let total = tracker.total_quantity();
                let fraction = Decimal::from(fraction_pct) / Decimal::ONE_HUNDRED;
                let (closed, _) = tracker.close_partial(dec!(105), fraction).unwrap();

                prop_assert_eq!(closed, total * fraction);
                prop_assert_eq!(tracker.total_quantity(), total - closed);
                prop_assert!(tracker.is_consistent());
            }
        }
    }
}
