//! 거래량 지표 (Volume Indicators).
//!
//! 현재 거래량을 트레일링 평균과 비교하는 상대 거래량 분석을 제공합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{IndicatorError, IndicatorResult};

/// 거래량 비율 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VolumeParams {
    /// 평균 거래량 기간 (기본: 20).
    pub period: usize,
}

impl Default for VolumeParams {
    fn default() -> Self {
        Self { period: 20 }
    }
}

/// 거래량 분석기.
#[derive(Debug, Default)]
pub struct VolumeAnalyzer;

impl VolumeAnalyzer {
    /// 새로운 거래량 분석기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 상대 거래량 비율 계산.
    ///
    /// 비율 = 현재 거래량 / 최근 `period`개 거래량의 평균
    ///
    /// 평균 거래량이 0이면 중립값 1을 반환합니다.
    ///
    /// # 인자
    /// * `volumes` - 거래량 데이터 (마지막이 현재 캔들)
    /// * `params` - 거래량 파라미터
    ///
    /// # 반환
    /// 현재 거래량 / 평균 거래량 비율
    pub fn ratio(&self, volumes: &[Decimal], params: VolumeParams) -> IndicatorResult<Decimal> {
        let period = params.period;

        if period == 0 {
            return Err(IndicatorError::InvalidParameter(
                "기간은 0보다 커야 합니다".to_string(),
            ));
        }

        if volumes.len() < period {
            return Err(IndicatorError::InsufficientData {
                required: period,
                provided: volumes.len(),
            });
        }

        let current = volumes[volumes.len() - 1];
        let window = &volumes[volumes.len() - period..];
        let avg: Decimal = window.iter().sum::<Decimal>() / Decimal::from(period);

        if avg.is_zero() {
            return Ok(Decimal::ONE);
        }

        Ok(current / avg)
    }
}
