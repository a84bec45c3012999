//! 분할 진입 전략.
//!
//! 시장 상태에 따라 두 하위 전략 중 하나를 선택합니다:
//! - **추세추종**: 극단/강한 추세에서 돌파 방향 진입, 확인된 지속 시
//!   최대 3회 피라미딩 (시간 게이트 2분/3분), 레버리지 반영 수익률
//!   기준 단계별 부분 익절, -0.4% 손절, -0.8% 긴급 손절 + 추세 반전 감지
//! - **역추세**: 약한 추세/횡보에서 볼린저 극단을 역방향 진입,
//!   손실 구간 내 물타기 (2차 -0.2%~-0.8%, 3차 -0.6%~-1.5%),
//!   중간 밴드 회귀 또는 빠른 익절, 최종 손절 -2.0%,
//!   레버리지별 긴급 손절 (-0.8%/-1.0%)
//!
//! 긴급 청산은 매 스텝 일반 익절/손절보다 먼저 평가됩니다.

use bandwalk_core::{
    EmergencyStopTable, EntrySignal, ExitReason, ExitSignal, PositionTracker, Side, StrategyType,
    HALF,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::StrategyContext;
use crate::routing::strategy_route;
use crate::traits::EntryExitStrategy;
use bandwalk_analysis::{BandDirection, BandWalkingRisk};

/// 분할 진입 전략 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SplitEntryConfig {
    /// 추세추종 1차 익절 수익률 (레버리지 반영 %, 기본값: 0.3)
    #[serde(default = "default_tf_tp1_pct")]
    pub tf_tp1_pct: Decimal,
    /// 추세추종 2차 익절 수익률 (레버리지 반영 %, 기본값: 0.6)
    #[serde(default = "default_tf_tp2_pct")]
    pub tf_tp2_pct: Decimal,
    /// 추세추종 3차(전량) 익절 수익률 (레버리지 반영 %, 기본값: 1.0)
    #[serde(default = "default_tf_tp3_pct")]
    pub tf_tp3_pct: Decimal,
    /// 추세추종 손절 수익률 (%, 기본값: 0.4)
    #[serde(default = "default_tf_stop_loss_pct")]
    pub tf_stop_loss_pct: Decimal,
    /// 추세추종 긴급 손절 수익률 (%, 기본값: 0.8)
    #[serde(default = "default_tf_emergency_pct")]
    pub tf_emergency_pct: Decimal,
    /// 2차 피라미딩 최소 간격 (분, 기본값: 2)
    #[serde(default = "default_pyramid_gate_2nd")]
    pub pyramid_gate_2nd_mins: i64,
    /// 3차 피라미딩 최소 간격 (분, 기본값: 3)
    #[serde(default = "default_pyramid_gate_3rd")]
    pub pyramid_gate_3rd_mins: i64,

    /// 역추세 1차 익절 수익률 (레버리지 반영 %, 기본값: 0.15)
    #[serde(default = "default_ct_tp1_pct")]
    pub ct_tp1_pct: Decimal,
    /// 역추세 2차(전량) 익절 수익률 (레버리지 반영 %, 기본값: 0.3)
    #[serde(default = "default_ct_tp2_pct")]
    pub ct_tp2_pct: Decimal,
    /// 역추세 2차 진입 손실 구간 (%, 기본값: 0.2 ~ 0.8)
    #[serde(default = "default_ct_add2_min")]
    pub ct_add2_min_loss_pct: Decimal,
    #[serde(default = "default_ct_add2_max")]
    pub ct_add2_max_loss_pct: Decimal,
    /// 역추세 3차 진입 손실 구간 (%, 기본값: 0.6 ~ 1.5)
    #[serde(default = "default_ct_add3_min")]
    pub ct_add3_min_loss_pct: Decimal,
    #[serde(default = "default_ct_add3_max")]
    pub ct_add3_max_loss_pct: Decimal,
    /// 역추세 최종 손절 수익률 (%, 기본값: 2.0)
    #[serde(default = "default_ct_final_stop_pct")]
    pub ct_final_stop_pct: Decimal,
    /// 역추세 진입 %B 외곽 구간 (기본값: 0.2)
    #[serde(default = "default_ct_band_zone")]
    pub ct_band_zone: Decimal,

    /// 레버리지별 긴급 손절 임계값 테이블
    #[serde(default)]
    pub emergency_stop: EmergencyStopTable,
}

fn default_tf_tp1_pct() -> Decimal {
    dec!(0.3)
}
fn default_tf_tp2_pct() -> Decimal {
    dec!(0.6)
}
fn default_tf_tp3_pct() -> Decimal {
    dec!(1.0)
}
fn default_tf_stop_loss_pct() -> Decimal {
    dec!(0.4)
}
fn default_tf_emergency_pct() -> Decimal {
    dec!(0.8)
}
fn default_pyramid_gate_2nd() -> i64 {
    2
}
fn default_pyramid_gate_3rd() -> i64 {
    3
}
fn default_ct_tp1_pct() -> Decimal {
    dec!(0.15)
}
fn default_ct_tp2_pct() -> Decimal {
    dec!(0.3)
}
fn default_ct_add2_min() -> Decimal {
    dec!(0.2)
}
fn default_ct_add2_max() -> Decimal {
    dec!(0.8)
}
fn default_ct_add3_min() -> Decimal {
    dec!(0.6)
}
fn default_ct_add3_max() -> Decimal {
    dec!(1.5)
}
fn default_ct_final_stop_pct() -> Decimal {
    dec!(2.0)
}
fn default_ct_band_zone() -> Decimal {
    dec!(0.2)
}

impl Default for SplitEntryConfig {
    fn default() -> Self {
        Self {
            tf_tp1_pct: default_tf_tp1_pct(),
            tf_tp2_pct: default_tf_tp2_pct(),
            tf_tp3_pct: default_tf_tp3_pct(),
            tf_stop_loss_pct: default_tf_stop_loss_pct(),
            tf_emergency_pct: default_tf_emergency_pct(),
            pyramid_gate_2nd_mins: default_pyramid_gate_2nd(),
            pyramid_gate_3rd_mins: default_pyramid_gate_3rd(),
            ct_tp1_pct: default_ct_tp1_pct(),
            ct_tp2_pct: default_ct_tp2_pct(),
            ct_add2_min_loss_pct: default_ct_add2_min(),
            ct_add2_max_loss_pct: default_ct_add2_max(),
            ct_add3_min_loss_pct: default_ct_add3_min(),
            ct_add3_max_loss_pct: default_ct_add3_max(),
            ct_final_stop_pct: default_ct_final_stop_pct(),
            ct_band_zone: default_ct_band_zone(),
            emergency_stop: EmergencyStopTable::default(),
        }
    }
}

/// 분할 진입 전략.
///
/// 익절 단계(`profit_tier`)는 전략 인스턴스가 보유하며
/// 포지션이 비워지면 초기화됩니다.
#[derive(Debug, Default)]
pub struct SplitEntryStrategy {
    config: SplitEntryConfig,
    profit_tier: u8,
}

impl SplitEntryStrategy {
    pub fn new(config: SplitEntryConfig) -> Self {
        Self {
            config,
            profit_tier: 0,
        }
    }

    // ==================== 추세추종 청산 ====================

    fn check_trend_exit(
        &mut self,
        ctx: &StrategyContext<'_>,
        side: Side,
        pnl_pct: Decimal,
    ) -> Option<ExitSignal> {
        let bb = &ctx.analysis.snapshot.bollinger;
        let rsi = ctx.analysis.snapshot.rsi;
        let close = ctx.candle.close;

        // 추세 반전: 반대쪽 밴드 이탈 + RSI 확인
        let reversed = match side {
            Side::Long => bb.lower.is_some_and(|l| close < l) && rsi < dec!(40),
            Side::Short => bb.upper.is_some_and(|u| close > u) && rsi > dec!(60),
        };
        if reversed {
            return Some(ExitSignal::full(
                ExitReason::TrendReversal,
                "반대 밴드 이탈 + RSI 반전",
            ));
        }

        if pnl_pct <= -self.config.tf_emergency_pct {
            return Some(ExitSignal::full(
                ExitReason::EmergencyStop,
                format!("수익률 {:.2}% <= 긴급 임계값", pnl_pct),
            ));
        }

        if pnl_pct <= -self.config.tf_stop_loss_pct {
            return Some(ExitSignal::full(
                ExitReason::StopLoss,
                format!("수익률 {:.2}% <= 손절 임계값", pnl_pct),
            ));
        }

        // 단계별 익절 (높은 단계부터, 레버리지 반영 수익률 기준)
        let roe_pct = pnl_pct * Decimal::from(ctx.leverage);
        if roe_pct >= self.config.tf_tp3_pct {
            self.profit_tier = 3;
            return Some(ExitSignal::full(ExitReason::TieredTakeProfit, "3차 전량 익절"));
        }
        if roe_pct >= self.config.tf_tp2_pct && self.profit_tier < 2 {
            self.profit_tier = 2;
            // 잔여 수량의 60% (원 수량의 약 30%)
            return Some(ExitSignal::partial(
                dec!(0.6),
                ExitReason::TieredTakeProfit,
                "2차 부분 익절",
            ));
        }
        if roe_pct >= self.config.tf_tp1_pct && self.profit_tier < 1 {
            self.profit_tier = 1;
            return Some(ExitSignal::partial(
                HALF,
                ExitReason::TieredTakeProfit,
                "1차 부분 익절",
            ));
        }

        None
    }

    // ==================== 역추세 청산 ====================

    fn check_counter_exit(
        &mut self,
        ctx: &StrategyContext<'_>,
        side: Side,
        pnl_pct: Decimal,
    ) -> Option<ExitSignal> {
        let bb = &ctx.analysis.snapshot.bollinger;
        let band = &ctx.analysis.band_walking;
        let close = ctx.candle.close;

        // 강한 추세 반전: 포지션 역방향의 HIGH 밴드워킹
        let against = matches!(
            (side, band.direction),
            (Side::Long, BandDirection::Down) | (Side::Short, BandDirection::Up)
        );
        if band.risk == BandWalkingRisk::High && against {
            return Some(ExitSignal::full(
                ExitReason::TrendReversal,
                "역방향 밴드워킹 HIGH",
            ));
        }

        let emergency_threshold = self.config.emergency_stop.threshold_for(ctx.leverage);
        if pnl_pct <= -emergency_threshold {
            return Some(ExitSignal::full(
                ExitReason::EmergencyStop,
                format!("수익률 {:.2}% <= 레버리지 긴급 임계값", pnl_pct),
            ));
        }

        if pnl_pct <= -self.config.ct_final_stop_pct {
            return Some(ExitSignal::full(
                ExitReason::FinalStopLoss,
                format!("수익률 {:.2}% <= 최종 손절", pnl_pct),
            ));
        }

        // 중간 밴드 회귀 익절
        let reverted = match side {
            Side::Long => bb.middle.is_some_and(|m| close >= m),
            Side::Short => bb.middle.is_some_and(|m| close <= m),
        };
        if reverted && pnl_pct > Decimal::ZERO {
            return Some(ExitSignal::full(
                ExitReason::MiddleBandReversion,
                "중간 밴드 회귀",
            ));
        }

        // 빠른 익절 (레버리지 반영 수익률 기준)
        let roe_pct = pnl_pct * Decimal::from(ctx.leverage);
        if roe_pct >= self.config.ct_tp2_pct {
            self.profit_tier = 2;
            return Some(ExitSignal::full(ExitReason::TieredTakeProfit, "2차 전량 익절"));
        }
        if roe_pct >= self.config.ct_tp1_pct && self.profit_tier < 1 {
            self.profit_tier = 1;
            return Some(ExitSignal::partial(
                HALF,
                ExitReason::TieredTakeProfit,
                "1차 부분 익절",
            ));
        }

        None
    }

    // ==================== 진입 ====================

    fn check_trend_entry(&self, ctx: &StrategyContext<'_>) -> Option<EntrySignal> {
        let condition = ctx.analysis.condition.condition;
        let bb = &ctx.analysis.snapshot.bollinger;
        let band = &ctx.analysis.band_walking;
        let close = ctx.candle.close;

        let side = if condition.is_bullish() {
            Side::Long
        } else if condition.is_bearish() {
            Side::Short
        } else {
            return None;
        };

        // 돌파 확인: 밴드 밖 마감 또는 MEDIUM 이상 밴드워킹 동방향
        let broke_out = match side {
            Side::Long => bb.upper.is_some_and(|u| close > u),
            Side::Short => bb.lower.is_some_and(|l| close < l),
        };
        let walking_confirms = band.risk >= BandWalkingRisk::Medium
            && matches!(
                (side, band.direction),
                (Side::Long, BandDirection::Up) | (Side::Short, BandDirection::Down)
            );

        if !broke_out && !walking_confirms {
            return None;
        }

        debug!(%condition, ?side, "추세추종 진입 신호");
        Some(EntrySignal::new(
            side,
            StrategyType::TrendFollowing,
            format!("{} 돌파 진입", condition),
        ))
    }

    fn check_pyramid_entry(
        &self,
        ctx: &StrategyContext<'_>,
        tracker: &PositionTracker,
    ) -> Option<EntrySignal> {
        let side = tracker.side()?;
        let condition = ctx.analysis.condition.condition;
        let band = &ctx.analysis.band_walking;
        let last = tracker.last_entry()?;

        // 시장 상태가 여전히 같은 방향의 강한 추세여야 함
        let still_strong = condition.is_strong()
            && match side {
                Side::Long => condition.is_bullish(),
                Side::Short => condition.is_bearish(),
            };
        if !still_strong {
            return None;
        }

        // 시간 게이트: 2차 진입은 2분, 3차 진입은 3분 이상 경과
        let gate_mins = match tracker.entry_count() {
            1 => self.config.pyramid_gate_2nd_mins,
            2 => self.config.pyramid_gate_3rd_mins,
            _ => return None,
        };
        let elapsed = ctx.candle.open_time - last.entry_time;
        if elapsed < chrono::Duration::minutes(gate_mins) {
            return None;
        }

        // 지속 확인: 직전 진입가를 추세 방향으로 갱신 + 밴드워킹 동방향
        let continuing = match side {
            Side::Long => ctx.candle.close > last.price,
            Side::Short => ctx.candle.close < last.price,
        };
        let walking_confirms = matches!(
            (side, band.direction),
            (Side::Long, BandDirection::Up) | (Side::Short, BandDirection::Down)
        );
        if !continuing || !walking_confirms {
            return None;
        }

        Some(EntrySignal::new(
            side,
            StrategyType::TrendFollowing,
            format!("{}차 피라미딩", tracker.entry_count() + 1),
        ))
    }

    fn check_counter_entry(&self, ctx: &StrategyContext<'_>) -> Option<EntrySignal> {
        let bb = &ctx.analysis.snapshot.bollinger;
        let band = &ctx.analysis.band_walking;
        let percent_b = bb.percent_b?;

        let side = if percent_b <= self.config.ct_band_zone {
            Side::Long
        } else if percent_b >= Decimal::ONE - self.config.ct_band_zone {
            Side::Short
        } else {
            return None;
        };

        // MEDIUM 이상 밴드워킹이 역방향이면 역추세 진입 차단
        let against = matches!(
            (side, band.direction),
            (Side::Long, BandDirection::Down) | (Side::Short, BandDirection::Up)
        );
        if band.risk >= BandWalkingRisk::Medium && against {
            return None;
        }

        Some(EntrySignal::new(
            side,
            StrategyType::CounterTrend,
            format!("볼린저 극단 역추세 진입 (%B {:.2})", percent_b),
        ))
    }

    fn check_average_down_entry(
        &self,
        ctx: &StrategyContext<'_>,
        tracker: &PositionTracker,
    ) -> Option<EntrySignal> {
        let side = tracker.side()?;
        let band = &ctx.analysis.band_walking;
        let loss_pct = -tracker.pnl_pct(ctx.candle.close);

        // 역방향 HIGH 밴드워킹 시 물타기 금지
        let against = matches!(
            (side, band.direction),
            (Side::Long, BandDirection::Down) | (Side::Short, BandDirection::Up)
        );
        if band.risk == BandWalkingRisk::High && against {
            return None;
        }

        let in_band = match tracker.entry_count() {
            1 => {
                loss_pct >= self.config.ct_add2_min_loss_pct
                    && loss_pct <= self.config.ct_add2_max_loss_pct
            }
            2 => {
                loss_pct >= self.config.ct_add3_min_loss_pct
                    && loss_pct <= self.config.ct_add3_max_loss_pct
            }
            _ => false,
        };
        if !in_band {
            return None;
        }

        Some(EntrySignal::new(
            side,
            StrategyType::CounterTrend,
            format!("{}차 물타기 (손실 {:.2}%)", tracker.entry_count() + 1, loss_pct),
        ))
    }
}

impl EntryExitStrategy for SplitEntryStrategy {
    fn name(&self) -> &'static str {
        "split_entry"
    }

    fn check_exit_signal(
        &mut self,
        ctx: &StrategyContext<'_>,
        tracker: &PositionTracker,
    ) -> Option<ExitSignal> {
        if !tracker.has_position() {
            self.profit_tier = 0;
            return None;
        }

        let side = tracker.side()?;
        let strategy_type = tracker.strategy_type()?;
        let pnl_pct = tracker.pnl_pct(ctx.candle.close);

        match strategy_type {
            StrategyType::TrendFollowing => self.check_trend_exit(ctx, side, pnl_pct),
            StrategyType::CounterTrend => self.check_counter_exit(ctx, side, pnl_pct),
        }
    }

    fn check_entry_signal(
        &mut self,
        ctx: &StrategyContext<'_>,
        tracker: &PositionTracker,
    ) -> Option<EntrySignal> {
        if tracker.has_position() {
            if tracker.entry_count() >= 3 {
                return None;
            }
            // 열린 포지션은 자신의 하위 전략 규칙으로만 추가 진입
            return match tracker.strategy_type()? {
                StrategyType::TrendFollowing => self.check_pyramid_entry(ctx, tracker),
                StrategyType::CounterTrend => self.check_average_down_entry(ctx, tracker),
            };
        }

        self.profit_tier = 0;
        match strategy_route(ctx.analysis.condition.condition) {
            StrategyType::TrendFollowing => self.check_trend_entry(ctx),
            StrategyType::CounterTrend => self.check_counter_entry(ctx),
        }
    }
}
