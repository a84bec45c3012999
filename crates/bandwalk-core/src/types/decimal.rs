//! 정밀한 금융 계산을 위한 Decimal 유틸리티.
//!
//! 이 모듈은 금융 계산에 필요한 정밀 소수점 타입 및 유틸리티를 제공합니다.

use rust_decimal::Decimal;

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 수량을 위한 타입.
pub type Quantity = Decimal;

/// 퍼센트 타입 (1 = 1%).
pub type Percentage = Decimal;

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 값을 [min, max] 범위로 제한합니다.
    fn clamp_range(&self, min: Decimal, max: Decimal) -> Decimal;
}

impl DecimalExt for Decimal {
    fn clamp_range(&self, min: Decimal, max: Decimal) -> Decimal {
        if *self < min {
            min
        } else if *self > max {
            max
        } else {
            *self
        }
    }
}
