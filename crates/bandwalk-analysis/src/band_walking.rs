//! 밴드워킹 감지기.
//!
//! 가격이 볼린저 밴드 바깥을 지속적으로 타고 가는 강도를
//! 0~100점으로 채점합니다. 5개의 독립 신호가 고정 배점으로 기여합니다:
//! - 밴드 폭 확장 (최대 40점)
//! - 연속 밴드 밖 종가 (최대 10점)
//! - MACD 히스토그램 동방향 확장 (최대 20점)
//! - 상대 거래량 급증 (5점)
//! - RSI 극단 구간 지속 (최대 30점)
//!
//! 점수는 리스크 등급으로 매핑됩니다: <30 NONE, [30,50) LOW,
//! [50,70) MEDIUM, >=70 HIGH.

use bandwalk_core::Candle;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::indicators::{
    BollingerBandsParams, IndicatorEngine, IndicatorError, IndicatorResult, MacdParams, RsiParams,
    VolumeParams, WARMUP_CANDLES,
};

/// 밴드워킹 리스크 등급.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandWalkingRisk {
    /// 점수 < 30
    None,
    /// 30 <= 점수 < 50
    Low,
    /// 50 <= 점수 < 70
    Medium,
    /// 점수 >= 70
    High,
}

impl BandWalkingRisk {
    /// 점수에서 리스크 등급을 결정합니다.
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 70 => BandWalkingRisk::High,
            s if s >= 50 => BandWalkingRisk::Medium,
            s if s >= 30 => BandWalkingRisk::Low,
            _ => BandWalkingRisk::None,
        }
    }
}

/// 밴드워킹 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandDirection {
    /// 상단 밴드 밖 또는 RSI 강세
    Up,
    /// 하단 밴드 밖 또는 RSI 약세
    Down,
    /// 방향 불명
    None,
}

/// 밴드워킹 감지 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandWalkingSignal {
    /// 총점 (0~100)
    pub score: u32,
    /// 리스크 등급
    pub risk: BandWalkingRisk,
    /// 감지된 방향
    pub direction: BandDirection,
    /// 연속으로 밴드 밖에서 마감한 캔들 수
    pub consecutive_outside: usize,
    /// 기여 사유 목록 (리포트용)
    pub reasons: Vec<String>,
}

/// 밴드워킹 감지기.
#[derive(Debug, Default)]
pub struct BandWalkingDetector {
    engine: IndicatorEngine,
}

impl BandWalkingDetector {
    /// 새로운 감지기 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 캔들 윈도우에서 밴드워킹 신호를 감지합니다.
    ///
    /// # 인자
    /// * `candles` - 시간 오름차순 캔들 (마지막이 평가 시점)
    ///
    /// # 반환
    /// 점수, 리스크 등급, 방향, 연속 밴드 밖 캔들 수
    pub fn detect(&self, candles: &[Candle]) -> IndicatorResult<BandWalkingSignal> {
        if candles.len() < WARMUP_CANDLES {
            return Err(IndicatorError::InsufficientData {
                required: WARMUP_CANDLES,
                provided: candles.len(),
            });
        }

        let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<Decimal> = candles.iter().map(|c| c.volume).collect();

        let bands = self
            .engine
            .bollinger_bands(&closes, BollingerBandsParams::default())?;
        let macd = self.engine.macd(&closes, MacdParams::default())?;
        let rsi = self.engine.rsi(&closes, RsiParams::default())?;
        let volume_ratio = self
            .engine
            .volume_ratio(&volumes, VolumeParams { period: 20 })?;

        let mut score = 0u32;
        let mut reasons = Vec::new();

        // 1. 밴드 폭 확장 (최대 40점)
        if let Some(expansion_pct) = self.width_expansion_pct(&bands) {
            let pts = if expansion_pct >= dec!(50) {
                40
            } else if expansion_pct >= dec!(30) {
                30
            } else if expansion_pct >= dec!(20) {
                20
            } else if expansion_pct >= dec!(10) {
                10
            } else {
                0
            };
            if pts > 0 {
                score += pts;
                reasons.push(format!("밴드 폭 {:.1}% 확장 (+{}점)", expansion_pct, pts));
            }
        }

        // 2. 연속 밴드 밖 종가 (최대 10점)
        let (consecutive_outside, outside_direction) = self.consecutive_outside(&closes, &bands);
        let pts = match consecutive_outside {
            n if n >= 3 => 10,
            2 => 6,
            1 => 3,
            _ => 0,
        };
        if pts > 0 {
            score += pts;
            reasons.push(format!(
                "밴드 밖 연속 {}캔들 마감 (+{}점)",
                consecutive_outside, pts
            ));
        }

        // 3. MACD 히스토그램 동방향 확장 (최대 20점)
        let histograms: Vec<Decimal> = macd.iter().filter_map(|m| m.histogram).collect();
        let pts = self.macd_expansion_points(&histograms);
        if pts > 0 {
            score += pts;
            reasons.push(format!("MACD 히스토그램 동방향 확장 (+{}점)", pts));
        }

        // 4. 상대 거래량 급증 (5점)
        if volume_ratio > dec!(3) {
            score += 5;
            reasons.push(format!("거래량 평균 대비 {:.1}배 (+5점)", volume_ratio));
        }

        // 5. RSI 극단 구간 지속 (최대 30점)
        let rsi_values: Vec<Decimal> = rsi.iter().filter_map(|v| *v).collect();
        let pts = self.rsi_extreme_points(&rsi_values);
        if pts > 0 {
            score += pts;
            reasons.push(format!("RSI 극단 구간 (+{}점)", pts));
        }

        let score = score.min(100);
        let risk = BandWalkingRisk::from_score(score);
        let current_rsi = rsi_values.last().copied().unwrap_or(dec!(50));
        let direction = self.resolve_direction(outside_direction, risk, current_rsi);

        Ok(BandWalkingSignal {
            score,
            risk,
            direction,
            consecutive_outside,
            reasons,
        })
    }

    /// 현재 밴드 폭의 직전 10개 평균 대비 확장률(%).
    fn width_expansion_pct(
        &self,
        bands: &[crate::indicators::BollingerBandsResult],
    ) -> Option<Decimal> {
        let widths: Vec<Decimal> = bands.iter().filter_map(|b| b.bandwidth).collect();
        if widths.len() < 11 {
            return None;
        }

        let current = widths[widths.len() - 1];
        let prior = &widths[widths.len() - 11..widths.len() - 1];
        let prior_avg: Decimal = prior.iter().sum::<Decimal>() / Decimal::from(prior.len() as u64);

        if prior_avg.is_zero() {
            return None;
        }
        Some((current - prior_avg) / prior_avg * Decimal::ONE_HUNDRED)
    }

    /// 마지막 캔들부터 역방향으로 같은 쪽 밴드 밖 마감 연속 수를 셉니다.
    fn consecutive_outside(
        &self,
        closes: &[Decimal],
        bands: &[crate::indicators::BollingerBandsResult],
    ) -> (usize, BandDirection) {
        let last = closes.len() - 1;
        let (upper, lower) = match (bands[last].upper, bands[last].lower) {
            (Some(u), Some(l)) => (u, l),
            _ => return (0, BandDirection::None),
        };

        let direction = if closes[last] > upper {
            BandDirection::Up
        } else if closes[last] < lower {
            BandDirection::Down
        } else {
            return (0, BandDirection::None);
        };

        let mut count = 0;
        for i in (0..=last).rev() {
            let outside = match (direction, bands[i].upper, bands[i].lower) {
                (BandDirection::Up, Some(u), _) => closes[i] > u,
                (BandDirection::Down, _, Some(l)) => closes[i] < l,
                _ => false,
            };
            if outside {
                count += 1;
            } else {
                break;
            }
        }

        (count, direction)
    }

    /// MACD 히스토그램이 최근 같은 부호로 확장 중인지 채점합니다.
    fn macd_expansion_points(&self, histograms: &[Decimal]) -> u32 {
        if histograms.len() >= 3 {
            let h = &histograms[histograms.len() - 3..];
            let same_sign = h.iter().all(|v| *v > Decimal::ZERO)
                || h.iter().all(|v| *v < Decimal::ZERO);
            if same_sign && h[2].abs() > h[1].abs() && h[1].abs() > h[0].abs() {
                return 20;
            }
        }
        if histograms.len() >= 2 {
            let h = &histograms[histograms.len() - 2..];
            let same_sign = (h[0] > Decimal::ZERO && h[1] > Decimal::ZERO)
                || (h[0] < Decimal::ZERO && h[1] < Decimal::ZERO);
            if same_sign && h[1].abs() > h[0].abs() {
                return 10;
            }
        }
        0
    }

    /// RSI가 극단 구간(>70 또는 <30)에 머무는 정도를 채점합니다.
    fn rsi_extreme_points(&self, rsi_values: &[Decimal]) -> u32 {
        let is_overbought = |v: Decimal| v > dec!(70);
        let is_oversold = |v: Decimal| v < dec!(30);

        let Some(&current) = rsi_values.last() else {
            return 0;
        };
        if !is_overbought(current) && !is_oversold(current) {
            return 0;
        }

        if rsi_values.len() >= 3 {
            let recent = &rsi_values[rsi_values.len() - 3..];
            let all_extreme = recent.iter().all(|&v| is_overbought(v))
                || recent.iter().all(|&v| is_oversold(v));
            if all_extreme {
                return 30;
            }
        }
        15
    }

    fn resolve_direction(
        &self,
        outside_direction: BandDirection,
        risk: BandWalkingRisk,
        current_rsi: Decimal,
    ) -> BandDirection {
        if outside_direction != BandDirection::None {
            return outside_direction;
        }
        if matches!(risk, BandWalkingRisk::Medium | BandWalkingRisk::High) {
            if current_rsi > dec!(60) {
                return BandDirection::Up;
            }
            if current_rsi < dec!(40) {
                return BandDirection::Down;
            }
        }
        BandDirection::None
    }
}
