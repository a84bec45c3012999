//! 돌파 유형 분류기.
//!
//! 최근 밴드 이탈 에피소드를 5가지 돌파 원형 중 하나로 분류합니다.
//! 내부 상태가 없는 순수 분류이며, 밴드워킹 신호의 연속 이탈 수와
//! 거래량 비율, RSI 극단성, MACD 히스토그램 크기를 사용합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::band_walking::BandWalkingSignal;

/// 돌파 원형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakoutType {
    /// 거짓 돌파 - 확인 거래량 없이 잠깐 밴드를 벗어남 (역추세 진입 안전)
    Headfake,
    /// 초기 돌파 - 방향 확정 전 (대기)
    BreakoutInitial,
    /// 돌파 후 회귀 - 밴드 안으로 복귀 예상 (역추세 진입 허용)
    BreakoutReversal,
    /// 밴드워킹 전환 중 - 역추세 진입 차단
    BreakoutToBandwalking,
    /// 밴드워킹 확정 - 추세추종 진입 허용
    BandwalkingConfirmed,
}

impl fmt::Display for BreakoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BreakoutType::Headfake => "headfake",
            BreakoutType::BreakoutInitial => "breakout_initial",
            BreakoutType::BreakoutReversal => "breakout_reversal",
            BreakoutType::BreakoutToBandwalking => "breakout_to_bandwalking",
            BreakoutType::BandwalkingConfirmed => "bandwalking_confirmed",
        };
        write!(f, "{}", s)
    }
}

/// 돌파 분류기.
#[derive(Debug, Default)]
pub struct BreakoutClassifier;

impl BreakoutClassifier {
    /// 새로운 분류기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 밴드 이탈 에피소드를 분류합니다.
    ///
    /// 가격이 밴드 안에 있으면 (연속 이탈 0) `None`을 반환합니다.
    ///
    /// # 인자
    /// * `signal` - 밴드워킹 감지 결과
    /// * `volume_ratio` - 현재 거래량 / 20기간 평균
    /// * `rsi` - 현재 RSI
    /// * `macd_histogram` - 현재 MACD 히스토그램
    ///
    /// # 반환
    /// 돌파 원형 (밴드 내부면 None)
    pub fn classify(
        &self,
        signal: &BandWalkingSignal,
        volume_ratio: Decimal,
        rsi: Decimal,
        macd_histogram: Decimal,
    ) -> Option<BreakoutType> {
        let rsi_extreme = rsi > dec!(70) || rsi < dec!(30);
        let macd_strong = macd_histogram.abs() > dec!(5);

        match signal.consecutive_outside {
            0 => None,
            1 => {
                if volume_ratio > dec!(15) {
                    Some(BreakoutType::BreakoutInitial)
                } else if volume_ratio < dec!(8) {
                    Some(BreakoutType::Headfake)
                } else {
                    Some(BreakoutType::BreakoutInitial)
                }
            }
            2 => {
                if rsi_extreme && volume_ratio > dec!(5) {
                    Some(BreakoutType::BreakoutToBandwalking)
                } else {
                    Some(BreakoutType::BreakoutReversal)
                }
            }
            _ => {
                if rsi_extreme && macd_strong && volume_ratio > dec!(3) {
                    Some(BreakoutType::BandwalkingConfirmed)
                } else {
                    Some(BreakoutType::BreakoutReversal)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band_walking::{BandDirection, BandWalkingRisk};

    fn signal(consecutive_outside: usize) -> BandWalkingSignal {
        BandWalkingSignal {
            score: 50,
            risk: BandWalkingRisk::Medium,
            direction: BandDirection::Up,
            consecutive_outside,
            reasons: vec![],
        }
    }

    #[test]
    fn test_inside_band_is_none() {
        let classifier = BreakoutClassifier::new();
        assert_eq!(
            classifier.classify(&signal(0), dec!(10), dec!(75), dec!(10)),
            None
        );
    }

    #[test]
    fn test_single_candle_episode() {
        let classifier = BreakoutClassifier::new();

        // 초고거래량 -> 초기 돌파 (대기)
        assert_eq!(
            classifier.classify(&signal(1), dec!(16), dec!(50), dec!(0)),
            Some(BreakoutType::BreakoutInitial)
        );
        // 저거래량 -> 거짓 돌파
        assert_eq!(
            classifier.classify(&signal(1), dec!(2), dec!(50), dec!(0)),
            Some(BreakoutType::Headfake)
        );
        // 중간 거래량 -> 초기 돌파
        assert_eq!(
            classifier.classify(&signal(1), dec!(10), dec!(50), dec!(0)),
            Some(BreakoutType::BreakoutInitial)
        );
    }

    #[test]
    fn test_two_candle_episode() {
        let classifier = BreakoutClassifier::new();

        // RSI 극단 + 거래량 확인 -> 밴드워킹 전환
        assert_eq!(
            classifier.classify(&signal(2), dec!(6), dec!(75), dec!(0)),
            Some(BreakoutType::BreakoutToBandwalking)
        );
        // 확인 부족 -> 회귀
        assert_eq!(
            classifier.classify(&signal(2), dec!(2), dec!(75), dec!(0)),
            Some(BreakoutType::BreakoutReversal)
        );
        assert_eq!(
            classifier.classify(&signal(2), dec!(6), dec!(55), dec!(0)),
            Some(BreakoutType::BreakoutReversal)
        );
    }

    #[test]
    fn test_sustained_episode() {
        let classifier = BreakoutClassifier::new();

        // RSI 극단 + MACD 강함 + 거래량 -> 밴드워킹 확정
        assert_eq!(
            classifier.classify(&signal(3), dec!(4), dec!(25), dec!(-6)),
            Some(BreakoutType::BandwalkingConfirmed)
        );
        // MACD 약함 -> 회귀
        assert_eq!(
            classifier.classify(&signal(4), dec!(4), dec!(75), dec!(2)),
            Some(BreakoutType::BreakoutReversal)
        );
    }
}
