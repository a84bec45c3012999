//! 진입/청산 신호 타입.
//!
//! 전략이 생성하는 신호를 정의합니다:
//! - `EntrySignal` - 진입 신호 (방향, 전략 유형, 사유)
//! - `ExitSignal` - 청산 신호 (청산 비율, 사유, 긴급 여부)
//! - `ExitReason` - 청산 사유 분류

use crate::domain::{Side, StrategyType};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 청산 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// 단계별 익절 (추세추종 전략의 +0.3%/+0.6%/+1.0% 티어)
    TieredTakeProfit,
    /// 중간 밴드 회귀 익절 (역추세 전략)
    MiddleBandReversion,
    /// 밴드 터치 익절 (V3 전략)
    BandTouchTakeProfit,
    /// 손절
    StopLoss,
    /// 최종 손절 (역추세 전략의 전체 포지션 기준 손절)
    FinalStopLoss,
    /// 긴급 청산 (레버리지 기반 임계값 초과 손실)
    EmergencyStop,
    /// 추세 반전 감지에 의한 청산
    TrendReversal,
    /// 백테스트 종료에 의한 강제 청산
    BacktestEnd,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::TieredTakeProfit => write!(f, "tiered take profit"),
            ExitReason::MiddleBandReversion => write!(f, "middle band reversion"),
            ExitReason::BandTouchTakeProfit => write!(f, "band touch take profit"),
            ExitReason::StopLoss => write!(f, "stop loss"),
            ExitReason::FinalStopLoss => write!(f, "final stop loss"),
            ExitReason::EmergencyStop => write!(f, "emergency stop"),
            ExitReason::TrendReversal => write!(f, "trend reversal"),
            ExitReason::BacktestEnd => write!(f, "backtest end"),
        }
    }
}

impl ExitReason {
    /// 긴급 청산 계열 사유인지 확인합니다.
    pub fn is_emergency(&self) -> bool {
        matches!(self, ExitReason::EmergencyStop | ExitReason::TrendReversal)
    }
}

/// 전략이 생성하는 진입 신호.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySignal {
    /// 진입 방향
    pub side: Side,
    /// 전략 유형 (첫 진입 시 포지션에 고정)
    pub strategy_type: StrategyType,
    /// 진입 사유 (로깅/리포트용)
    pub reason: String,
}

impl EntrySignal {
    pub fn new(side: Side, strategy_type: StrategyType, reason: impl Into<String>) -> Self {
        Self {
            side,
            strategy_type,
            reason: reason.into(),
        }
    }
}

/// 전략이 생성하는 청산 신호.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitSignal {
    /// 청산 비율 (0 초과 1 이하, 1 = 전량 청산)
    pub fraction: Decimal,
    /// 청산 사유
    pub reason: ExitReason,
    /// 상세 설명 (로깅/리포트용)
    pub detail: String,
}

impl ExitSignal {
    /// 전량 청산 신호를 생성합니다.
    pub fn full(reason: ExitReason, detail: impl Into<String>) -> Self {
        Self {
            fraction: Decimal::ONE,
            reason,
            detail: detail.into(),
        }
    }

    /// 부분 청산 신호를 생성합니다.
    pub fn partial(fraction: Decimal, reason: ExitReason, detail: impl Into<String>) -> Self {
        Self {
            fraction,
            reason,
            detail: detail.into(),
        }
    }

    /// 긴급 전량 청산 신호를 생성합니다.
    pub fn emergency(detail: impl Into<String>) -> Self {
        Self::full(ExitReason::EmergencyStop, detail)
    }

    /// 전량 청산 신호인지 확인합니다.
    pub fn is_full(&self) -> bool {
        self.fraction >= Decimal::ONE
    }
}

/// 자주 쓰이는 청산 비율 상수.
pub const HALF: Decimal = dec!(0.5);
