//! 통합 시장 분석기.
//!
//! 지표 스냅샷, 시장 상태 분류, 밴드워킹 감지, 돌파 분류를
//! 하나의 호출로 묶습니다. 백테스트 엔진은 이 결과를 캔들 인덱스별로
//! 캐싱합니다 (진입/청산 검사가 같은 스텝에서 같은 결과를 조회).

use bandwalk_core::Candle;
use rust_decimal::Decimal;

use crate::band_walking::{BandWalkingDetector, BandWalkingSignal};
use crate::breakout::{BreakoutClassifier, BreakoutType};
use crate::indicators::{IndicatorEngine, IndicatorResult, IndicatorSnapshot};
use crate::market_condition::{ConditionAnalysis, MarketConditionClassifier};

/// 한 평가 시점의 전체 시장 분석 결과.
#[derive(Debug, Clone)]
pub struct MarketAnalysisResult {
    /// 지표 스냅샷
    pub snapshot: IndicatorSnapshot,
    /// 시장 상태 분류
    pub condition: ConditionAnalysis,
    /// 밴드워킹 신호
    pub band_walking: BandWalkingSignal,
    /// 돌파 유형 (밴드 내부면 None)
    pub breakout: Option<BreakoutType>,
}

/// 통합 시장 분석기.
#[derive(Debug, Default)]
pub struct MarketAnalyzer {
    engine: IndicatorEngine,
    classifier: MarketConditionClassifier,
    detector: BandWalkingDetector,
    breakout: BreakoutClassifier,
}

impl MarketAnalyzer {
    /// 새로운 분석기 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 캔들 윈도우를 분석합니다.
    ///
    /// 웜업(50캔들) 미만이면 `InsufficientData` 오류를 반환하며,
    /// 호출자는 이를 "이번 스텝 신호 없음"으로 처리해야 합니다.
    ///
    /// # 인자
    /// * `candles` - 시간 오름차순 캔들 (마지막이 평가 시점)
    pub fn analyze(&self, candles: &[Candle]) -> IndicatorResult<MarketAnalysisResult> {
        let snapshot = self.engine.snapshot(candles)?;
        let condition = self.classifier.classify(candles)?;
        let band_walking = self.detector.detect(candles)?;

        let histogram = snapshot.macd.histogram.unwrap_or(Decimal::ZERO);
        let breakout = self.breakout.classify(
            &band_walking,
            snapshot.volume_ratio20,
            snapshot.rsi,
            histogram,
        );

        Ok(MarketAnalysisResult {
            snapshot,
            condition,
            band_walking,
            breakout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandwalk_core::{Symbol, Timeframe};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn make_candles(count: usize) -> Vec<Candle> {
        let start = Utc::now();
        (0..count)
            .map(|i| {
                let close = dec!(100) + Decimal::from(i as u64) * dec!(0.2);
                Candle::new(
                    Symbol::new("BTC", "USDT"),
                    Timeframe::M1,
                    start + chrono::Duration::minutes(i as i64),
                    close - dec!(0.1),
                    close + dec!(0.2),
                    close - dec!(0.2),
                    close,
                    dec!(1000),
                    start + chrono::Duration::minutes(i as i64 + 1),
                )
            })
            .collect()
    }

    #[test]
    fn test_analyze_full_pipeline() {
        let analyzer = MarketAnalyzer::new();
        let candles = make_candles(80);

        let result = analyzer.analyze(&candles).unwrap();
        assert!(!result.condition.fallback);
        assert!(result.band_walking.score <= 100);
        assert!(result.condition.composite_score >= Decimal::NEGATIVE_ONE);
        assert!(result.condition.composite_score <= Decimal::ONE);
    }

    #[test]
    fn test_analyze_requires_warmup() {
        let analyzer = MarketAnalyzer::new();
        let candles = make_candles(40);

        assert!(analyzer.analyze(&candles).is_err());
    }
}
