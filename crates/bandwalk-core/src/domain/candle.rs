//! 캔들스틱(OHLCV) 데이터 타입.
//!
//! 이 모듈은 외부 피드에서 공급되는 캔들 데이터 구조체를 정의합니다.
//! 캔들은 불변이며, 시간 오름차순으로 정렬되어 공급된다고 가정합니다.

use crate::types::{Price, Quantity, Symbol, Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// OHLCV 캔들스틱 데이터.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    /// 거래 심볼
    pub symbol: Symbol,
    /// 타임프레임
    pub timeframe: Timeframe,
    /// 캔들 시작 시간
    pub open_time: DateTime<Utc>,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량 (기준 자산 단위)
    pub volume: Quantity,
    /// 캔들 종료 시간
    pub close_time: DateTime<Utc>,
}

impl Candle {
    /// 새 캔들을 생성합니다.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: Symbol,
        timeframe: Timeframe,
        open_time: DateTime<Utc>,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Quantity,
        close_time: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol,
            timeframe,
            open_time,
            open,
            high,
            low,
            close,
            volume,
            close_time,
        }
    }

    /// 캔들 몸통 크기(절대값)를 반환합니다.
    pub fn body_size(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    /// 캔들 범위(고가 - 저가)를 반환합니다.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// 양봉(종가 > 시가)인지 확인합니다.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// 음봉(종가 < 시가)인지 확인합니다.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// 대표가(고가+저가+종가 평균)를 반환합니다.
    pub fn typical_price(&self) -> Decimal {
        (self.high + self.low + self.close) / Decimal::from(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_candle(open: Decimal, close: Decimal) -> Candle {
        let open_time = Utc::now();
        Candle::new(
            Symbol::new("XRP", "KRW"),
            Timeframe::M1,
            open_time,
            open,
            open.max(close) * dec!(1.01),
            open.min(close) * dec!(0.99),
            close,
            dec!(1000),
            open_time + chrono::Duration::minutes(1),
        )
    }

    #[test]
    fn test_candle_direction() {
        assert!(sample_candle(dec!(100), dec!(105)).is_bullish());
        assert!(sample_candle(dec!(105), dec!(100)).is_bearish());
    }

    #[test]
    fn test_candle_body_and_range() {
        let candle = sample_candle(dec!(100), dec!(105));
        assert_eq!(candle.body_size(), dec!(5));
        assert!(candle.range() > candle.body_size());
    }
}
