//! 포지션 방향 및 전략 유형.
//!
//! 이 모듈은 포지션 방향과 분할 진입 전략 유형을 정의합니다:
//! - `Side` - 포지션 방향 (롱/숏)
//! - `StrategyType` - 추세추종/역추세 전략 구분

use serde::{Deserialize, Serialize};
use std::fmt;

/// 포지션 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// 롱 포지션 (가격 상승 시 수익)
    Long,
    /// 숏 포지션 (가격 하락 시 수익)
    Short,
}

impl Side {
    /// 반대 방향을 반환합니다.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

/// 진입/청산 의사결정에 사용된 전략 유형.
///
/// 포지션의 첫 진입 시 결정되며, 포지션이 비워질 때까지 유지됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// 추세추종 (밴드 돌파 방향 진입)
    TrendFollowing,
    /// 역추세/평균회귀 (밴드 극단 역방향 진입)
    CounterTrend,
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyType::TrendFollowing => write!(f, "trend_following"),
            StrategyType::CounterTrend => write!(f, "counter_trend"),
        }
    }
}
