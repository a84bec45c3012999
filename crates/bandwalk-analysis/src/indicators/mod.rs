//! 기술적 지표 모듈.
//!
//! 이 모듈은 의사결정 파이프라인에서 사용되는 기술적 지표를 제공합니다.
//! 모든 계산은 `Decimal` 기반 커스텀 구현입니다.
//!
//! # 지원 지표
//!
//! ## 추세 지표 (Trend Indicators)
//! - **SMA**: 단순 이동평균 (Simple Moving Average)
//! - **EMA**: 지수 이동평균 (Exponential Moving Average)
//! - **MACD**: 이동평균 수렴/확산 (Moving Average Convergence Divergence)
//!
//! ## 모멘텀 지표 (Momentum Indicators)
//! - **RSI**: 상대강도지수 (Relative Strength Index)
//!
//! ## 변동성 지표 (Volatility Indicators)
//! - **Bollinger Bands**: 볼린저 밴드 (%B, 밴드 폭 포함)
//!
//! ## 거래량 지표 (Volume Indicators)
//! - **상대 거래량**: 현재 거래량 / 이동평균 거래량 비율
//!
//! # 사용 예시
//!
//! ```ignore
//! use bandwalk_analysis::indicators::{IndicatorEngine, RsiParams};
//!
//! let engine = IndicatorEngine::new();
//! let rsi = engine.rsi(&prices, RsiParams { period: 14 })?;
//! let snapshot = engine.snapshot(&candles)?;
//! ```

pub mod momentum;
pub mod trend;
pub mod volatility;
pub mod volume;

use bandwalk_core::Candle;
use rust_decimal::Decimal;
use thiserror::Error;

pub use momentum::{MomentumCalculator, RsiParams};
pub use trend::{EmaParams, MacdParams, MacdResult, SmaParams, TrendIndicators};
pub use volatility::{BollingerBandsParams, BollingerBandsResult, VolatilityIndicators};
pub use volume::{VolumeAnalyzer, VolumeParams};

/// 신호 발행 전 요구되는 최소 웜업 캔들 수.
pub const WARMUP_CANDLES: usize = 50;

/// 지표 계산 오류.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// 데이터 부족 오류
    #[error("데이터가 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientData { required: usize, provided: usize },

    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),

    /// 계산 오류
    #[error("계산 오류: {0}")]
    CalculationError(String),
}

/// 지표 계산 결과 타입.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

/// 한 평가 시점의 지표 스냅샷.
///
/// 웜업(50캔들) 이후에만 생성되며, 매 스텝 트레일링 윈도우에서 재계산됩니다.
#[derive(Debug, Clone)]
pub struct IndicatorSnapshot {
    /// RSI(14)
    pub rsi: Decimal,
    /// EMA(9)
    pub ema9: Decimal,
    /// EMA(21)
    pub ema21: Decimal,
    /// EMA(50)
    pub ema50: Decimal,
    /// EMA(200) - 데이터가 200캔들 미만이면 None
    pub ema200: Option<Decimal>,
    /// 볼린저 밴드 (20, 2.0)
    pub bollinger: BollingerBandsResult,
    /// MACD (12, 26, 9)
    pub macd: MacdResult,
    /// 현재 거래량 / 5기간 평균 거래량
    pub volume_ratio5: Decimal,
    /// 현재 거래량 / 20기간 평균 거래량
    pub volume_ratio20: Decimal,
}

/// 통합 지표 엔진.
///
/// 모든 기술적 지표 계산을 위한 통합 인터페이스를 제공합니다.
#[derive(Debug, Default)]
pub struct IndicatorEngine {
    trend: TrendIndicators,
    momentum: MomentumCalculator,
    volatility: VolatilityIndicators,
    volume: VolumeAnalyzer,
}

impl IndicatorEngine {
    /// 새로운 지표 엔진 생성.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== 추세 지표 ====================

    /// 단순 이동평균 (SMA) 계산.
    ///
    /// # 인자
    /// * `prices` - 가격 데이터 (종가)
    /// * `params` - SMA 파라미터 (기간)
    ///
    /// # 반환
    /// 계산된 SMA 값들의 벡터 (처음 period-1개는 None)
    pub fn sma(&self, prices: &[Decimal], params: SmaParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        self.trend.sma(prices, params)
    }

    /// 지수 이동평균 (EMA) 계산.
    ///
    /// # 인자
    /// * `prices` - 가격 데이터 (종가)
    /// * `params` - EMA 파라미터 (기간)
    ///
    /// # 반환
    /// 계산된 EMA 값들의 벡터
    pub fn ema(&self, prices: &[Decimal], params: EmaParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        self.trend.ema(prices, params)
    }

    /// MACD (Moving Average Convergence Divergence) 계산.
    ///
    /// # 인자
    /// * `prices` - 가격 데이터 (종가)
    /// * `params` - MACD 파라미터 (단기, 장기, 시그널 기간)
    ///
    /// # 반환
    /// 각 시점의 MACD 라인, 시그널 라인, 히스토그램
    pub fn macd(&self, prices: &[Decimal], params: MacdParams) -> IndicatorResult<Vec<MacdResult>> {
        self.trend.macd(prices, params)
    }

    // ==================== 모멘텀 지표 ====================

    /// RSI (Relative Strength Index) 계산.
    ///
    /// # 인자
    /// * `prices` - 가격 데이터 (종가)
    /// * `params` - RSI 파라미터 (기간, 기본값 14)
    ///
    /// # 반환
    /// 0-100 사이의 RSI 값들
    pub fn rsi(&self, prices: &[Decimal], params: RsiParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        self.momentum.rsi(prices, params)
    }

    // ==================== 변동성 지표 ====================

    /// 볼린저 밴드 계산.
    ///
    /// # 인자
    /// * `prices` - 가격 데이터 (종가)
    /// * `params` - 볼린저 밴드 파라미터 (기간, 표준편차 배수)
    ///
    /// # 반환
    /// 상단, 중간, 하단 밴드와 %B, 밴드 폭 값들
    pub fn bollinger_bands(
        &self,
        prices: &[Decimal],
        params: BollingerBandsParams,
    ) -> IndicatorResult<Vec<BollingerBandsResult>> {
        self.volatility.bollinger_bands(prices, params)
    }

    // ==================== 거래량 지표 ====================

    /// 상대 거래량 비율 계산.
    ///
    /// # 인자
    /// * `volumes` - 거래량 데이터
    /// * `params` - 거래량 파라미터 (평균 기간)
    ///
    /// # 반환
    /// 현재 거래량 / 평균 거래량 비율
    pub fn volume_ratio(&self, volumes: &[Decimal], params: VolumeParams) -> IndicatorResult<Decimal> {
        self.volume.ratio(volumes, params)
    }

    // ==================== 스냅샷 ====================

    /// 마지막 캔들 시점의 지표 스냅샷 생성.
    ///
    /// 웜업 기간(50캔들) 미만이면 `InsufficientData` 오류를 반환합니다.
    ///
    /// # 인자
    /// * `candles` - 시간 오름차순 캔들 데이터
    ///
    /// # 반환
    /// 마지막 캔들 기준 지표 스냅샷
    pub fn snapshot(&self, candles: &[Candle]) -> IndicatorResult<IndicatorSnapshot> {
        if candles.len() < WARMUP_CANDLES {
            return Err(IndicatorError::InsufficientData {
                required: WARMUP_CANDLES,
                provided: candles.len(),
            });
        }

        let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<Decimal> = candles.iter().map(|c| c.volume).collect();

        let rsi = self
            .rsi(&closes, RsiParams::default())?
            .last()
            .copied()
            .flatten()
            .ok_or_else(|| IndicatorError::CalculationError("RSI 값이 없습니다".to_string()))?;

        let ema9 = self.last_ema(&closes, 9)?;
        let ema21 = self.last_ema(&closes, 21)?;
        let ema50 = self.last_ema(&closes, 50)?;
        let ema200 = if closes.len() >= 200 {
            Some(self.last_ema(&closes, 200)?)
        } else {
            None
        };

        let bollinger = self
            .bollinger_bands(&closes, BollingerBandsParams::default())?
            .last()
            .copied()
            .ok_or_else(|| {
                IndicatorError::CalculationError("볼린저 밴드 값이 없습니다".to_string())
            })?;

        let macd = self
            .macd(&closes, MacdParams::default())?
            .last()
            .copied()
            .ok_or_else(|| IndicatorError::CalculationError("MACD 값이 없습니다".to_string()))?;

        let volume_ratio5 = self.volume_ratio(&volumes, VolumeParams { period: 5 })?;
        let volume_ratio20 = self.volume_ratio(&volumes, VolumeParams { period: 20 })?;

        Ok(IndicatorSnapshot {
            rsi,
            ema9,
            ema21,
            ema50,
            ema200,
            bollinger,
            macd,
            volume_ratio5,
            volume_ratio20,
        })
    }

    fn last_ema(&self, closes: &[Decimal], period: usize) -> IndicatorResult<Decimal> {
        self.ema(closes, EmaParams { period })?
            .last()
            .copied()
            .flatten()
            .ok_or_else(|| {
                IndicatorError::CalculationError(format!("EMA({}) 값이 없습니다", period))
            })
    }
}
