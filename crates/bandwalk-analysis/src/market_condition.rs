//! 복합 시장 상태 분류기.
//!
//! 6개의 정규화된 서브 점수([-1,1])를 고정 가중치로 결합하여
//! 하나의 복합 점수와 7단계 시장 상태, 신뢰도 등급을 산출합니다.
//!
//! 가중치: RSI 25%, 거래량 20%, 프라이스 액션 20%, MA 추세 15%,
//! 볼린저 10%, MACD 10%.
//!
//! 캔들이 50개 미만이면 RSI/볼린저만 사용하는 레거시 경로로
//! 폴백합니다 (인터페이스 동일, 신뢰도 하락).

use bandwalk_core::{Candle, DecimalExt};
use rust_decimal::prelude::Signed;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::indicators::{
    BollingerBandsParams, IndicatorEngine, IndicatorResult, MacdParams, RsiParams, VolumeParams,
    WARMUP_CANDLES,
};

/// 7단계 시장 상태.
///
/// 데이터 전용 열거형입니다. 전략 라우팅은 별도의 순수 함수로 분리되어 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketCondition {
    /// 극단적 상승 (복합 점수 > 0.6)
    ExtremeBullish,
    /// 강한 상승 (0.4 < 점수 <= 0.6)
    StrongBullish,
    /// 약한 상승 (0.15 < 점수 <= 0.4)
    WeakBullish,
    /// 횡보 (-0.15 <= 점수 <= 0.15)
    Ranging,
    /// 약한 하락 (-0.4 <= 점수 < -0.15)
    WeakBearish,
    /// 강한 하락 (-0.6 <= 점수 < -0.4)
    StrongBearish,
    /// 극단적 하락 (점수 < -0.6)
    ExtremeBearish,
}

impl MarketCondition {
    /// 복합 점수를 시장 상태로 버킷팅합니다.
    ///
    /// 구간 분할은 전체 [-1,1] 범위를 빠짐없이, 겹침 없이 덮습니다.
    pub fn from_score(score: Decimal) -> Self {
        if score > dec!(0.6) {
            MarketCondition::ExtremeBullish
        } else if score > dec!(0.4) {
            MarketCondition::StrongBullish
        } else if score > dec!(0.15) {
            MarketCondition::WeakBullish
        } else if score >= dec!(-0.15) {
            MarketCondition::Ranging
        } else if score >= dec!(-0.4) {
            MarketCondition::WeakBearish
        } else if score >= dec!(-0.6) {
            MarketCondition::StrongBearish
        } else {
            MarketCondition::ExtremeBearish
        }
    }

    /// 상승 계열 상태인지 확인합니다.
    pub fn is_bullish(&self) -> bool {
        matches!(
            self,
            MarketCondition::ExtremeBullish
                | MarketCondition::StrongBullish
                | MarketCondition::WeakBullish
        )
    }

    /// 하락 계열 상태인지 확인합니다.
    pub fn is_bearish(&self) -> bool {
        matches!(
            self,
            MarketCondition::ExtremeBearish
                | MarketCondition::StrongBearish
                | MarketCondition::WeakBearish
        )
    }

    /// 극단/강한 추세 상태인지 확인합니다.
    pub fn is_strong(&self) -> bool {
        matches!(
            self,
            MarketCondition::ExtremeBullish
                | MarketCondition::StrongBullish
                | MarketCondition::StrongBearish
                | MarketCondition::ExtremeBearish
        )
    }
}

impl fmt::Display for MarketCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketCondition::ExtremeBullish => "extreme_bullish",
            MarketCondition::StrongBullish => "strong_bullish",
            MarketCondition::WeakBullish => "weak_bullish",
            MarketCondition::Ranging => "ranging",
            MarketCondition::WeakBearish => "weak_bearish",
            MarketCondition::StrongBearish => "strong_bearish",
            MarketCondition::ExtremeBearish => "extreme_bearish",
        };
        write!(f, "{}", s)
    }
}

/// 신뢰도 등급.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    /// 6개 중 5개 이상의 서브 점수가 복합 점수와 같은 방향
    High,
    /// 3~4개 일치
    Medium,
    /// 2개 이하 일치
    Low,
}

impl ConfidenceTier {
    /// 일치한 서브 점수 개수에서 등급을 결정합니다 (전체 6개 기준).
    pub fn from_agreeing(agreeing: usize) -> Self {
        match agreeing {
            n if n >= 5 => ConfidenceTier::High,
            3 | 4 => ConfidenceTier::Medium,
            _ => ConfidenceTier::Low,
        }
    }
}

/// 개별 지표의 가중 기여도.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreContribution {
    /// 지표 이름
    pub name: String,
    /// 정규화된 서브 점수 ([-1,1])
    pub score: Decimal,
    /// 가중치
    pub weight: Decimal,
    /// 가중 기여도 (score × weight)
    pub weighted: Decimal,
}

impl ScoreContribution {
    fn new(name: &str, score: Decimal, weight: Decimal) -> Self {
        Self {
            name: name.to_string(),
            score,
            weight,
            weighted: score * weight,
        }
    }
}

/// 시장 상태 분석 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionAnalysis {
    /// 복합 점수 ([-1,1])
    pub composite_score: Decimal,
    /// 7단계 시장 상태
    pub condition: MarketCondition,
    /// 수치 신뢰도 (일치 서브 점수 비율, [0,1])
    pub confidence: Decimal,
    /// 신뢰도 등급
    pub confidence_tier: ConfidenceTier,
    /// 지표별 가중 기여도
    pub contributions: Vec<ScoreContribution>,
    /// 레거시 폴백 경로 사용 여부 (50캔들 미만)
    pub fallback: bool,
}

/// 시장 상태 분류기.
#[derive(Debug, Default)]
pub struct MarketConditionClassifier {
    engine: IndicatorEngine,
}

// 서브 점수 가중치
const WEIGHT_RSI: Decimal = dec!(0.25);
const WEIGHT_VOLUME: Decimal = dec!(0.20);
const WEIGHT_PRICE_ACTION: Decimal = dec!(0.20);
const WEIGHT_MA_TREND: Decimal = dec!(0.15);
const WEIGHT_BOLLINGER: Decimal = dec!(0.10);
const WEIGHT_MACD: Decimal = dec!(0.10);

// 레거시 폴백 가중치
const LEGACY_WEIGHT_RSI: Decimal = dec!(0.6);
const LEGACY_WEIGHT_BOLLINGER: Decimal = dec!(0.4);

impl MarketConditionClassifier {
    /// 새로운 분류기 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 캔들 윈도우에서 시장 상태를 분류합니다.
    ///
    /// 50캔들 미만이면 RSI/볼린저 레거시 경로로 폴백하며,
    /// 결과의 `fallback` 플래그가 설정됩니다.
    ///
    /// # 인자
    /// * `candles` - 시간 오름차순 캔들 (마지막이 평가 시점)
    ///
    /// # 반환
    /// 복합 점수, 시장 상태, 신뢰도, 지표별 기여도
    pub fn classify(&self, candles: &[Candle]) -> IndicatorResult<ConditionAnalysis> {
        if candles.len() < WARMUP_CANDLES {
            return self.classify_legacy(candles);
        }

        let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<Decimal> = candles.iter().map(|c| c.volume).collect();
        let current = &candles[candles.len() - 1];

        let rsi = self.last_rsi(&closes)?;
        let bollinger = self
            .engine
            .bollinger_bands(&closes, BollingerBandsParams::default())?;
        let percent_b = bollinger
            .last()
            .and_then(|b| b.percent_b)
            .unwrap_or(dec!(0.5));
        let macd = self.engine.macd(&closes, MacdParams::default())?;
        let histogram = macd
            .last()
            .and_then(|m| m.histogram)
            .unwrap_or(Decimal::ZERO);
        let volume_ratio20 = self
            .engine
            .volume_ratio(&volumes, VolumeParams { period: 20 })?;

        let ema9 = self.last_ema(&closes, 9)?;
        let ema21 = self.last_ema(&closes, 21)?;
        let ema50 = self.last_ema(&closes, 50)?;

        let contributions = vec![
            ScoreContribution::new("rsi", rsi_score(rsi), WEIGHT_RSI),
            ScoreContribution::new(
                "volume",
                volume_score(current, volume_ratio20),
                WEIGHT_VOLUME,
            ),
            ScoreContribution::new("price_action", price_action_score(&closes), WEIGHT_PRICE_ACTION),
            ScoreContribution::new("ma_trend", ma_trend_score(ema9, ema21, ema50), WEIGHT_MA_TREND),
            ScoreContribution::new("bollinger", bollinger_score(percent_b), WEIGHT_BOLLINGER),
            ScoreContribution::new(
                "macd",
                macd_score(histogram, current.close),
                WEIGHT_MACD,
            ),
        ];

        Ok(self.assemble(contributions, false))
    }

    /// 레거시 분류 경로 (RSI 60% + 볼린저 40%).
    ///
    /// 전체 지표 셋을 계산할 수 없는 짧은 히스토리에서 사용됩니다.
    fn classify_legacy(&self, candles: &[Candle]) -> IndicatorResult<ConditionAnalysis> {
        let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();

        let rsi = self.last_rsi(&closes)?;
        let bollinger = self
            .engine
            .bollinger_bands(&closes, BollingerBandsParams::default())?;
        let percent_b = bollinger
            .last()
            .and_then(|b| b.percent_b)
            .unwrap_or(dec!(0.5));

        debug!(candles = candles.len(), "레거시 분류 경로 사용");

        let contributions = vec![
            ScoreContribution::new("rsi", rsi_score(rsi), LEGACY_WEIGHT_RSI),
            ScoreContribution::new("bollinger", bollinger_score(percent_b), LEGACY_WEIGHT_BOLLINGER),
        ];

        Ok(self.assemble(contributions, true))
    }

    fn assemble(&self, contributions: Vec<ScoreContribution>, fallback: bool) -> ConditionAnalysis {
        let composite_score: Decimal = contributions.iter().map(|c| c.weighted).sum();
        let condition = MarketCondition::from_score(composite_score);

        let agreeing = contributions
            .iter()
            .filter(|c| c.score.signum() == composite_score.signum())
            .count();
        let confidence =
            Decimal::from(agreeing as u64) / Decimal::from(contributions.len() as u64);
        let confidence_tier = if fallback {
            // 레거시 경로는 항상 저신뢰도로 취급
            ConfidenceTier::Low
        } else {
            ConfidenceTier::from_agreeing(agreeing)
        };

        ConditionAnalysis {
            composite_score,
            condition,
            confidence,
            confidence_tier,
            contributions,
            fallback,
        }
    }

    fn last_rsi(&self, closes: &[Decimal]) -> IndicatorResult<Decimal> {
        Ok(self
            .engine
            .rsi(closes, RsiParams::default())?
            .last()
            .copied()
            .flatten()
            .unwrap_or(dec!(50)))
    }

    fn last_ema(&self, closes: &[Decimal], period: usize) -> IndicatorResult<Decimal> {
        use crate::indicators::EmaParams;
        Ok(self
            .engine
            .ema(closes, EmaParams { period })?
            .last()
            .copied()
            .flatten()
            .unwrap_or(Decimal::ZERO))
    }
}

fn clamp_unit(value: Decimal) -> Decimal {
    value.clamp_range(Decimal::NEGATIVE_ONE, Decimal::ONE)
}

/// RSI 서브 점수: (RSI - 50) / 50.
fn rsi_score(rsi: Decimal) -> Decimal {
    clamp_unit((rsi - dec!(50)) / dec!(50))
}

/// 거래량 서브 점수: 캔들 방향 × 상대 거래량 강도.
fn volume_score(current: &Candle, volume_ratio20: Decimal) -> Decimal {
    let magnitude =
        ((volume_ratio20 - Decimal::ONE) / dec!(2)).clamp_range(Decimal::ZERO, Decimal::ONE);

    if current.is_bullish() {
        magnitude
    } else if current.is_bearish() {
        -magnitude
    } else {
        Decimal::ZERO
    }
}

/// 프라이스 액션 서브 점수: 최근 5캔들 변화율 / 2%.
fn price_action_score(closes: &[Decimal]) -> Decimal {
    if closes.len() < 6 {
        return Decimal::ZERO;
    }
    let current = closes[closes.len() - 1];
    let past = closes[closes.len() - 6];
    if past.is_zero() {
        return Decimal::ZERO;
    }
    let change = (current - past) / past;
    clamp_unit(change / dec!(0.02))
}

/// MA 추세 서브 점수: EMA9/21/50 정렬 상태.
fn ma_trend_score(ema9: Decimal, ema21: Decimal, ema50: Decimal) -> Decimal {
    if ema9 > ema21 && ema21 > ema50 {
        Decimal::ONE
    } else if ema9 < ema21 && ema21 < ema50 {
        Decimal::NEGATIVE_ONE
    } else if ema9 > ema21 {
        dec!(0.5)
    } else if ema9 < ema21 {
        dec!(-0.5)
    } else {
        Decimal::ZERO
    }
}

/// 볼린저 서브 점수: 2 × %B - 1.
fn bollinger_score(percent_b: Decimal) -> Decimal {
    clamp_unit(dec!(2) * percent_b - Decimal::ONE)
}

/// MACD 서브 점수: 히스토그램을 가격의 0.2%로 정규화.
fn macd_score(histogram: Decimal, close: Decimal) -> Decimal {
    if close.is_zero() {
        return Decimal::ZERO;
    }
    clamp_unit(histogram / (close * dec!(0.002)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandwalk_core::{Symbol, Timeframe};
    use chrono::Utc;

    fn make_candles(closes: &[Decimal], volume: Decimal) -> Vec<Candle> {
        let start = Utc::now();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                Candle::new(
                    Symbol::new("BTC", "USDT"),
                    Timeframe::M1,
                    start + chrono::Duration::minutes(i as i64),
                    open,
                    open.max(close),
                    open.min(close),
                    close,
                    volume,
                    start + chrono::Duration::minutes(i as i64 + 1),
                )
            })
            .collect()
    }

    #[test]
    fn test_bucketing_boundaries() {
        // 경계값이 정확히 어느 버킷에 속하는지 고정
        assert_eq!(
            MarketCondition::from_score(dec!(0.61)),
            MarketCondition::ExtremeBullish
        );
        assert_eq!(
            MarketCondition::from_score(dec!(0.6)),
            MarketCondition::StrongBullish
        );
        assert_eq!(
            MarketCondition::from_score(dec!(0.4)),
            MarketCondition::WeakBullish
        );
        assert_eq!(
            MarketCondition::from_score(dec!(0.15)),
            MarketCondition::Ranging
        );
        assert_eq!(
            MarketCondition::from_score(dec!(-0.15)),
            MarketCondition::Ranging
        );
        assert_eq!(
            MarketCondition::from_score(dec!(-0.4)),
            MarketCondition::WeakBearish
        );
        assert_eq!(
            MarketCondition::from_score(dec!(-0.6)),
            MarketCondition::StrongBearish
        );
        assert_eq!(
            MarketCondition::from_score(dec!(-0.61)),
            MarketCondition::ExtremeBearish
        );
    }

    #[test]
    fn test_confidence_tiers() {
        assert_eq!(ConfidenceTier::from_agreeing(6), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_agreeing(5), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_agreeing(4), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_agreeing(3), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_agreeing(2), ConfidenceTier::Low);
        assert_eq!(ConfidenceTier::from_agreeing(0), ConfidenceTier::Low);
    }

    #[test]
    fn test_sub_score_ranges() {
        assert_eq!(rsi_score(dec!(100)), Decimal::ONE);
        assert_eq!(rsi_score(dec!(0)), Decimal::NEGATIVE_ONE);
        assert_eq!(rsi_score(dec!(50)), Decimal::ZERO);

        assert_eq!(bollinger_score(dec!(0.5)), Decimal::ZERO);
        assert_eq!(bollinger_score(dec!(1.5)), Decimal::ONE);

        assert_eq!(ma_trend_score(dec!(3), dec!(2), dec!(1)), Decimal::ONE);
        assert_eq!(ma_trend_score(dec!(1), dec!(2), dec!(3)), Decimal::NEGATIVE_ONE);
        assert_eq!(ma_trend_score(dec!(3), dec!(2), dec!(5)), dec!(0.5));
    }

    #[test]
    fn test_agreement_counts_same_sign_contributions() {
        let classifier = MarketConditionClassifier::new();

        // 양수 2개 + 음수 1개 + 0점 1개, 합은 양수
        let contributions = vec![
            ScoreContribution::new("rsi", dec!(0.8), dec!(0.25)),
            ScoreContribution::new("volume", dec!(0.4), dec!(0.20)),
            ScoreContribution::new("macd", dec!(-0.2), dec!(0.10)),
            ScoreContribution::new("bollinger", Decimal::ZERO, dec!(0.10)),
        ];

        let analysis = classifier.assemble(contributions, false);
        assert!(analysis.composite_score > Decimal::ZERO);
        // 복합 점수와 같은 부호인 서브 점수는 2개
        assert_eq!(analysis.confidence, dec!(0.5));
        assert_eq!(analysis.contributions[0].name, "rsi");
    }

    #[test]
    fn test_uptrend_classifies_bullish() {
        let classifier = MarketConditionClassifier::new();
        let closes: Vec<Decimal> = (0..80)
            .map(|i| dec!(100) + Decimal::from(i as u64) * dec!(0.5))
            .collect();
        let candles = make_candles(&closes, dec!(1000));

        let analysis = classifier.classify(&candles).unwrap();
        assert!(analysis.composite_score > Decimal::ZERO);
        assert!(analysis.condition.is_bullish());
        assert!(!analysis.fallback);
        assert!(analysis.composite_score >= Decimal::NEGATIVE_ONE);
        assert!(analysis.composite_score <= Decimal::ONE);
    }

    #[test]
    fn test_short_history_uses_fallback() {
        let classifier = MarketConditionClassifier::new();
        let closes: Vec<Decimal> = (0..30).map(|i| dec!(100) + Decimal::from(i as u64)).collect();
        let candles = make_candles(&closes, dec!(1000));

        let analysis = classifier.classify(&candles).unwrap();
        assert!(analysis.fallback);
        assert_eq!(analysis.confidence_tier, ConfidenceTier::Low);
        assert_eq!(analysis.contributions.len(), 2);
    }

    #[test]
    fn test_flat_market_is_ranging() {
        let classifier = MarketConditionClassifier::new();
        let closes: Vec<Decimal> = (0..80)
            .map(|i| {
                if i % 2 == 0 {
                    dec!(100.1)
                } else {
                    dec!(99.9)
                }
            })
            .collect();
        let candles = make_candles(&closes, dec!(1000));

        let analysis = classifier.classify(&candles).unwrap();
        assert_eq!(analysis.condition, MarketCondition::Ranging);
    }
}
