//! 손익 계산 함수.
//!
//! 포지션 방향에 따른 실현/미실현 손익, 수익률, 명목 가치 계산을 제공합니다.
//! 모든 계산은 `Decimal` 기반으로 수행되어 부동소수점 오차가 없습니다.

use crate::domain::Side;
use crate::types::{Price, Quantity};
use rust_decimal::Decimal;

/// 청산 시 실현 손익을 계산합니다.
///
/// # 인자
/// * `side` - 포지션 방향
/// * `entry_price` - 평균 진입가
/// * `exit_price` - 청산가
/// * `quantity` - 청산 수량
///
/// # 반환
/// 실현 손익 (호가 자산 단위, 수수료 미포함)
pub fn realized_pnl(
    side: Side,
    entry_price: Price,
    exit_price: Price,
    quantity: Quantity,
) -> Decimal {
    match side {
        Side::Long => (exit_price - entry_price) * quantity,
        Side::Short => (entry_price - exit_price) * quantity,
    }
}

/// 현재가 기준 미실현 손익을 계산합니다.
pub fn unrealized_pnl(
    side: Side,
    entry_price: Price,
    current_price: Price,
    quantity: Quantity,
) -> Decimal {
    realized_pnl(side, entry_price, current_price, quantity)
}

/// 수수료 차감 후 순손익을 계산합니다.
pub fn net_pnl(gross_pnl: Decimal, fees: Decimal) -> Decimal {
    gross_pnl - fees
}

/// 진입가 대비 수익률(%)을 계산합니다.
///
/// 진입가가 0이면 0을 반환합니다.
pub fn return_pct(side: Side, entry_price: Price, current_price: Price) -> Decimal {
    if entry_price.is_zero() {
        return Decimal::ZERO;
    }
    let raw = (current_price - entry_price) / entry_price * Decimal::ONE_HUNDRED;
    match side {
        Side::Long => raw,
        Side::Short => -raw,
    }
}

/// 명목 가치(가격 x 수량)를 계산합니다.
pub fn notional_value(price: Price, quantity: Quantity) -> Decimal {
    price * quantity
}
