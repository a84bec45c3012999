//! 진입/청산 전략.
//!
//! 이 크레이트는 시장 분석 결과와 포지션 상태를 입력으로
//! 진입/청산 신호를 생성하는 전략 구현을 제공합니다:
//! - `SplitEntryStrategy` - 시장 상태에 따라 추세추종/역추세를 선택하는 분할 진입 전략
//! - `V3Strategy` - 돌파 분류 기반 4단계 대기 전략 (단일 진입)
//!
//! 두 구현은 동일한 [`EntryExitStrategy`] 트레이트를 공유하며
//! 설정으로 교체할 수 있습니다. 호출자는 매 스텝 반드시
//! "청산 검사 → 진입 검사" 순서를 지켜야 합니다.

pub mod context;
pub mod routing;
pub mod split_entry;
pub mod traits;
pub mod v3;

pub use context::StrategyContext;
pub use routing::strategy_route;
pub use split_entry::{SplitEntryConfig, SplitEntryStrategy};
pub use traits::{create_strategy, EntryExitStrategy, StrategyKind};
pub use v3::{V3Config, V3Strategy};
