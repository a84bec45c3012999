//! 시장 상태 → 전략 유형 라우팅 테이블.
//!
//! 시장 상태 열거형은 데이터 전용이며, 라우팅은 이 순수 함수로 분리되어
//! 독립적으로 테스트됩니다.

use bandwalk_analysis::MarketCondition;
use bandwalk_core::StrategyType;

/// 시장 상태에서 사용할 전략 유형을 결정합니다.
///
/// 극단/강한 추세 상태는 추세추종, 약한 추세/횡보는 역추세로 라우팅됩니다.
pub fn strategy_route(condition: MarketCondition) -> StrategyType {
    match condition {
        MarketCondition::ExtremeBullish
        | MarketCondition::StrongBullish
        | MarketCondition::StrongBearish
        | MarketCondition::ExtremeBearish => StrategyType::TrendFollowing,
        MarketCondition::WeakBullish
        | MarketCondition::Ranging
        | MarketCondition::WeakBearish => StrategyType::CounterTrend,
    }
}
