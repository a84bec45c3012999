//! V3 4단계 전략.
//!
//! 분할 진입 전략과 달리 명시적인 대기 상태를 갖는 단일 진입 전략입니다:
//! 1. 신뢰도 게이트: 분류기 신뢰도 0.3 미만이면 아무것도 하지 않음
//! 2. 돌파 판정 위임: 초기 돌파/밴드워킹 전환 중이면 대기
//! 3. 밴드워킹 확정 시 추세추종 진입 (RSI/MACD/거래량 확인,
//!    패닉 셀 가드: RSI<25 + 거래량 20배 초과는 진입 거부)
//! 4. 그 외(거짓 돌파/회귀)에는 횡보/약한 추세에서만 볼린저 외곽
//!    20% 구간 역추세 진입 (거래량 폭발 10배 초과 제외)
//!
//! 청산: 역방향 HIGH 밴드워킹 긴급 청산, 전략별 손절
//! (추세추종 -5% / 역추세 -0.5%), 밴드 터치 익절.

use bandwalk_core::{
    EntrySignal, ExitReason, ExitSignal, PositionTracker, Side, StrategyType,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::StrategyContext;
use crate::traits::EntryExitStrategy;
use bandwalk_analysis::{BandDirection, BandWalkingRisk, BreakoutType, MarketCondition};

/// V3 전략 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct V3Config {
    /// 최소 분류기 신뢰도 (기본값: 0.3)
    #[serde(default = "default_min_confidence")]
    pub min_confidence: Decimal,
    /// 추세추종 손절 수익률 (%, 기본값: 5.0)
    #[serde(default = "default_tf_stop_loss_pct")]
    pub tf_stop_loss_pct: Decimal,
    /// 역추세 손절 수익률 (%, 기본값: 0.5)
    #[serde(default = "default_ct_stop_loss_pct")]
    pub ct_stop_loss_pct: Decimal,
    /// 역추세 진입 %B 외곽 구간 (기본값: 0.2)
    #[serde(default = "default_band_zone")]
    pub band_zone: Decimal,
    /// 역추세 진입 제외 거래량 배수 (기본값: 10)
    #[serde(default = "default_volume_explosion")]
    pub volume_explosion_ratio: Decimal,
    /// 패닉 셀 가드 RSI 임계값 (기본값: 25)
    #[serde(default = "default_panic_rsi")]
    pub panic_rsi: Decimal,
    /// 패닉 셀 가드 거래량 배수 (기본값: 20)
    #[serde(default = "default_panic_volume")]
    pub panic_volume_ratio: Decimal,
}

fn default_min_confidence() -> Decimal {
    dec!(0.3)
}
fn default_tf_stop_loss_pct() -> Decimal {
    dec!(5.0)
}
fn default_ct_stop_loss_pct() -> Decimal {
    dec!(0.5)
}
fn default_band_zone() -> Decimal {
    dec!(0.2)
}
fn default_volume_explosion() -> Decimal {
    dec!(10)
}
fn default_panic_rsi() -> Decimal {
    dec!(25)
}
fn default_panic_volume() -> Decimal {
    dec!(20)
}

impl Default for V3Config {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            tf_stop_loss_pct: default_tf_stop_loss_pct(),
            ct_stop_loss_pct: default_ct_stop_loss_pct(),
            band_zone: default_band_zone(),
            volume_explosion_ratio: default_volume_explosion(),
            panic_rsi: default_panic_rsi(),
            panic_volume_ratio: default_panic_volume(),
        }
    }
}

/// V3 4단계 전략 (단일 진입).
#[derive(Debug, Default)]
pub struct V3Strategy {
    config: V3Config,
}

impl V3Strategy {
    pub fn new(config: V3Config) -> Self {
        Self { config }
    }

    /// 밴드워킹 확정 시 추세추종 진입 판정.
    fn check_trend_entry(&self, ctx: &StrategyContext<'_>) -> Option<EntrySignal> {
        let snapshot = &ctx.analysis.snapshot;
        let band = &ctx.analysis.band_walking;

        let side = match band.direction {
            BandDirection::Up => Side::Long,
            BandDirection::Down => Side::Short,
            BandDirection::None => return None,
        };

        // 패닉 셀 가드: 급락 투매 구간에서는 진입하지 않음
        if snapshot.rsi < self.config.panic_rsi
            && snapshot.volume_ratio20 > self.config.panic_volume_ratio
        {
            debug!(
                rsi = %snapshot.rsi,
                volume_ratio = %snapshot.volume_ratio20,
                "패닉 셀 가드로 진입 거부"
            );
            return None;
        }

        // MACD 히스토그램 방향 확인
        let histogram = snapshot.macd.histogram.unwrap_or(Decimal::ZERO);
        let macd_confirms = match side {
            Side::Long => histogram > Decimal::ZERO,
            Side::Short => histogram < Decimal::ZERO,
        };
        if !macd_confirms {
            return None;
        }

        Some(EntrySignal::new(
            side,
            StrategyType::TrendFollowing,
            "밴드워킹 확정 추세추종 진입",
        ))
    }

    /// 횡보/약한 추세에서 볼린저 외곽 구간 역추세 진입 판정.
    fn check_counter_entry(&self, ctx: &StrategyContext<'_>) -> Option<EntrySignal> {
        let condition = ctx.analysis.condition.condition;
        let snapshot = &ctx.analysis.snapshot;

        let permitted = matches!(
            condition,
            MarketCondition::Ranging | MarketCondition::WeakBullish | MarketCondition::WeakBearish
        );
        if !permitted {
            return None;
        }

        // 거래량 폭발 캔들 제외
        if snapshot.volume_ratio20 > self.config.volume_explosion_ratio {
            return None;
        }

        let percent_b = snapshot.bollinger.percent_b?;
        let side = if percent_b <= self.config.band_zone {
            Side::Long
        } else if percent_b >= Decimal::ONE - self.config.band_zone {
            Side::Short
        } else {
            return None;
        };

        Some(EntrySignal::new(
            side,
            StrategyType::CounterTrend,
            format!("볼린저 외곽 역추세 진입 (%B {:.2})", percent_b),
        ))
    }
}

impl EntryExitStrategy for V3Strategy {
    fn name(&self) -> &'static str {
        "v3"
    }

    fn check_exit_signal(
        &mut self,
        ctx: &StrategyContext<'_>,
        tracker: &PositionTracker,
    ) -> Option<ExitSignal> {
        if !tracker.has_position() {
            return None;
        }

        let side = tracker.side()?;
        let strategy_type = tracker.strategy_type()?;
        let band = &ctx.analysis.band_walking;
        let bb = &ctx.analysis.snapshot.bollinger;
        let close = ctx.candle.close;
        let pnl_pct = tracker.pnl_pct(close);

        // 긴급 청산: 역방향 HIGH 밴드워킹
        let against = matches!(
            (side, band.direction),
            (Side::Long, BandDirection::Down) | (Side::Short, BandDirection::Up)
        );
        if band.risk == BandWalkingRisk::High && against {
            return Some(ExitSignal::full(
                ExitReason::EmergencyStop,
                "역방향 밴드워킹 HIGH",
            ));
        }

        // 전략별 손절 폭
        let stop_pct = match strategy_type {
            StrategyType::TrendFollowing => self.config.tf_stop_loss_pct,
            StrategyType::CounterTrend => self.config.ct_stop_loss_pct,
        };
        if pnl_pct <= -stop_pct {
            return Some(ExitSignal::full(
                ExitReason::StopLoss,
                format!("수익률 {:.2}% <= 손절 임계값", pnl_pct),
            ));
        }

        // 밴드 터치 익절
        let touched_middle = match side {
            Side::Long => bb.middle.is_some_and(|m| close >= m),
            Side::Short => bb.middle.is_some_and(|m| close <= m),
        };
        match strategy_type {
            // 추세추종: 중간 밴드 복귀는 추세 소진, 수익 중일 때만 익절
            StrategyType::TrendFollowing => {
                let retreated = match side {
                    Side::Long => bb.middle.is_some_and(|m| close <= m),
                    Side::Short => bb.middle.is_some_and(|m| close >= m),
                };
                if retreated && pnl_pct > Decimal::ZERO {
                    return Some(ExitSignal::full(
                        ExitReason::BandTouchTakeProfit,
                        "중간 밴드 복귀 익절",
                    ));
                }
            }
            // 역추세: 중간 밴드 도달 시 무조건 청산
            StrategyType::CounterTrend => {
                if touched_middle {
                    return Some(ExitSignal::full(
                        ExitReason::BandTouchTakeProfit,
                        "중간 밴드 터치 익절",
                    ));
                }
            }
        }

        None
    }

    fn check_entry_signal(
        &mut self,
        ctx: &StrategyContext<'_>,
        tracker: &PositionTracker,
    ) -> Option<EntrySignal> {
        // 단일 진입: 포지션이 있으면 추가 진입 없음
        if tracker.has_position() {
            return None;
        }

        // 1단계: 신뢰도 게이트
        if ctx.analysis.condition.confidence < self.config.min_confidence {
            return None;
        }

        // 2~4단계: 돌파 판정 위임
        match ctx.analysis.breakout {
            // 방향 확정 전: 대기
            Some(BreakoutType::BreakoutInitial) | Some(BreakoutType::BreakoutToBandwalking) => None,
            // 밴드워킹 확정: 추세추종 진입
            Some(BreakoutType::BandwalkingConfirmed) => self.check_trend_entry(ctx),
            // 거짓 돌파/회귀/밴드 내부: 역추세 진입 검토
            Some(BreakoutType::Headfake) | Some(BreakoutType::BreakoutReversal) | None => {
                self.check_counter_entry(ctx)
            }
        }
    }
}
