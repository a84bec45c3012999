//! 변동성 지표 (Volatility Indicators).
//!
//! 가격 변동성을 측정하는 지표를 제공합니다.
//! - Bollinger Bands (볼린저 밴드)

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{IndicatorError, IndicatorResult};

/// 볼린저 밴드 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BollingerBandsParams {
    /// 이동평균 기간 (기본: 20).
    pub period: usize,
    /// 표준편차 배수 (기본: 2.0).
    pub std_dev_multiplier: Decimal,
}

impl Default for BollingerBandsParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: dec!(2.0),
        }
    }
}

/// 볼린저 밴드 결과.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BollingerBandsResult {
    /// 상단 밴드 (MA + k × σ).
    pub upper: Option<Decimal>,
    /// 중간 밴드 (이동평균).
    pub middle: Option<Decimal>,
    /// 하단 밴드 (MA - k × σ).
    pub lower: Option<Decimal>,
    /// %B 지표 ((현재가 - 하단) / (상단 - 하단)).
    pub percent_b: Option<Decimal>,
    /// 밴드 폭 ((상단 - 하단) / 중간).
    pub bandwidth: Option<Decimal>,
}

/// 변동성 지표 계산기.
#[derive(Debug, Default)]
pub struct VolatilityIndicators;

impl VolatilityIndicators {
    /// 새로운 변동성 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 볼린저 밴드 계산.
    ///
    /// 상단 밴드 = MA + (k × σ)
    /// 중간 밴드 = MA (이동평균)
    /// 하단 밴드 = MA - (k × σ)
    ///
    /// σ는 윈도우의 모집단 표준편차입니다.
    ///
    /// # 인자
    /// * `prices` - 가격 데이터 (종가)
    /// * `params` - 볼린저 밴드 파라미터
    ///
    /// # 반환
    /// 상단, 중간, 하단 밴드와 %B, 밴드 폭 값들
    pub fn bollinger_bands(
        &self,
        prices: &[Decimal],
        params: BollingerBandsParams,
    ) -> IndicatorResult<Vec<BollingerBandsResult>> {
        let period = params.period;

        if period == 0 {
            return Err(IndicatorError::InvalidParameter(
                "기간은 0보다 커야 합니다".to_string(),
            ));
        }

        if prices.len() < period {
            return Err(IndicatorError::InsufficientData {
                required: period,
                provided: prices.len(),
            });
        }

        let mut result = Vec::with_capacity(prices.len());
        let period_decimal = Decimal::from(period);

        for i in 0..prices.len() {
            if i < period - 1 {
                result.push(BollingerBandsResult {
                    upper: None,
                    middle: None,
                    lower: None,
                    percent_b: None,
                    bandwidth: None,
                });
            } else {
                let window = &prices[i + 1 - period..=i];

                // 이동평균 (중간 밴드)
                let sum: Decimal = window.iter().sum();
                let ma = sum / period_decimal;

                // 모집단 표준편차 계산
                let variance: Decimal = window
                    .iter()
                    .map(|&p| {
                        let diff = p - ma;
                        diff * diff
                    })
                    .sum::<Decimal>()
                    / period_decimal;

                let std_dev = self.sqrt_decimal(variance);

                // 밴드 계산
                let deviation = params.std_dev_multiplier * std_dev;
                let upper = ma + deviation;
                let lower = ma - deviation;

                // %B 계산
                let percent_b = if upper != lower {
                    Some((prices[i] - lower) / (upper - lower))
                } else {
                    Some(dec!(0.5)) // 밴드가 수렴하면 중립값
                };

                // 밴드 폭 계산
                let bandwidth = if ma != Decimal::ZERO {
                    Some((upper - lower) / ma)
                } else {
                    None
                };

                result.push(BollingerBandsResult {
                    upper: Some(upper),
                    middle: Some(ma),
                    lower: Some(lower),
                    percent_b,
                    bandwidth,
                });
            }
        }

        Ok(result)
    }

    /// Decimal 제곱근 계산.
    fn sqrt_decimal(&self, value: Decimal) -> Decimal {
        if value <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        // Newton-Raphson 방법으로 제곱근 근사
        let mut x = value;
        let two = dec!(2);

        // 10회 반복이면 충분한 정밀도
        for _ in 0..10 {
            x = (x + value / x) / two;
        }

        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bollinger_band_ordering() {
        let volatility = VolatilityIndicators::new();
        let prices: Vec<Decimal> = (0..30)
            .map(|i| dec!(100) + Decimal::from(i % 5))
            .collect();

        let bands = volatility
            .bollinger_bands(&prices, BollingerBandsParams::default())
            .unwrap();

        for band in bands.iter().skip(19) {
            let upper = band.upper.unwrap();
            let middle = band.middle.unwrap();
            let lower = band.lower.unwrap();
            assert!(upper >= middle);
            assert!(middle >= lower);
        }
    }

    #[test]
    fn test_bollinger_constant_prices() {
        let volatility = VolatilityIndicators::new();
        let prices = vec![dec!(100); 25];

        let bands = volatility
            .bollinger_bands(&prices, BollingerBandsParams::default())
            .unwrap();

        let last = bands.last().unwrap();
        // 변동 없음: 세 밴드가 모두 같고 %B는 중립값
        assert_eq!(last.upper, Some(dec!(100)));
        assert_eq!(last.lower, Some(dec!(100)));
        assert_eq!(last.percent_b, Some(dec!(0.5)));
        assert_eq!(last.bandwidth, Some(Decimal::ZERO));
    }

    #[test]
    fn test_sqrt_decimal() {
        let volatility = VolatilityIndicators::new();
        let sqrt = volatility.sqrt_decimal(dec!(16));
        assert!((sqrt - dec!(4)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_bollinger_insufficient_data() {
        let volatility = VolatilityIndicators::new();
        let prices = vec![dec!(100); 10];

        assert!(volatility
            .bollinger_bands(&prices, BollingerBandsParams::default())
            .is_err());
    }
}
