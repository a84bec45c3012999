//! 시장 분석 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 기술적 지표 (RSI, EMA, 볼린저 밴드, MACD, 상대 거래량)
//! - 복합 시장 상태 분류기 (6개 가중 서브 점수)
//! - 밴드워킹 감지기 (0~100 점수 + 리스크 등급)
//! - 돌파 유형 분류기 (5가지 돌파 원형)
//!
//! # Re-exports
//!
//! - [`indicators`]: 지표 계산 (IndicatorEngine, IndicatorSnapshot 등)
//! - [`market_condition`]: 시장 상태 분류 (MarketCondition, ConditionAnalysis)
//! - [`band_walking`]: 밴드워킹 감지 (BandWalkingSignal, BandWalkingRisk)
//! - [`breakout`]: 돌파 분류 (BreakoutType)

pub mod analyzer;
pub mod band_walking;
pub mod breakout;
pub mod indicators;
pub mod market_condition;

// Indicators 모듈 re-exports
pub use indicators::{
    BollingerBandsParams, BollingerBandsResult, EmaParams, IndicatorEngine, IndicatorError,
    IndicatorResult, IndicatorSnapshot, MacdParams, MacdResult, MomentumCalculator, RsiParams,
    SmaParams, TrendIndicators, VolatilityIndicators, VolumeAnalyzer, VolumeParams, WARMUP_CANDLES,
};

// 시장 상태 분류 re-exports
pub use market_condition::{
    ConditionAnalysis, ConfidenceTier, MarketCondition, MarketConditionClassifier,
    ScoreContribution,
};

// 밴드워킹 감지 re-exports
pub use band_walking::{BandDirection, BandWalkingDetector, BandWalkingRisk, BandWalkingSignal};

// 돌파 분류 re-exports
pub use breakout::{BreakoutClassifier, BreakoutType};

// 통합 분석기 re-export
pub use analyzer::{MarketAnalysisResult, MarketAnalyzer};
