//! 전략 트레이트 및 팩토리.

use bandwalk_core::{EntrySignal, ExitSignal, PositionTracker, StrategySettings};
use serde::{Deserialize, Serialize};

use crate::context::StrategyContext;
use crate::split_entry::{SplitEntryConfig, SplitEntryStrategy};
use crate::v3::V3Strategy;

/// 진입/청산 전략 인터페이스.
///
/// 두 구현(`SplitEntryStrategy`, `V3Strategy`)이 이 트레이트를 공유하며
/// 백테스트 실행 단위로 교체할 수 있습니다.
///
/// 호출 규약: 매 스텝 `check_exit_signal`을 먼저, `check_entry_signal`을
/// 나중에 호출해야 합니다. 같은 캔들에서 청산 후 재진입 판단이
/// 갱신 전 추적기 상태를 보지 않도록 하기 위함입니다.
pub trait EntryExitStrategy {
    /// 전략 이름 (거래 기록과 전략별 성과 분류에 사용).
    fn name(&self) -> &'static str;

    /// 청산 신호 검사.
    ///
    /// 긴급 청산 조건이 일반 익절/손절보다 먼저 평가됩니다.
    fn check_exit_signal(
        &mut self,
        ctx: &StrategyContext<'_>,
        tracker: &PositionTracker,
    ) -> Option<ExitSignal>;

    /// 진입 신호 검사.
    fn check_entry_signal(
        &mut self,
        ctx: &StrategyContext<'_>,
        tracker: &PositionTracker,
    ) -> Option<EntrySignal>;
}

/// 설정으로 선택 가능한 전략 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// 분할 진입 전략 (추세추종/역추세 자동 선택)
    SplitEntry,
    /// V3 4단계 전략 (단일 진입)
    V3,
}

impl StrategyKind {
    /// 설정 문자열에서 전략 종류를 파싱합니다.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "split_entry" => Some(StrategyKind::SplitEntry),
            "v3" => Some(StrategyKind::V3),
            _ => None,
        }
    }
}

/// 전략 인스턴스를 생성합니다.
///
/// 설정의 레버리지별 긴급 손절 테이블이 분할 진입 전략에 전달됩니다.
pub fn create_strategy(
    kind: StrategyKind,
    settings: &StrategySettings,
) -> Box<dyn EntryExitStrategy> {
    match kind {
        StrategyKind::SplitEntry => {
            let config = SplitEntryConfig {
                emergency_stop: settings.emergency_stop.clone(),
                ..SplitEntryConfig::default()
            };
            Box::new(SplitEntryStrategy::new(config))
        }
        StrategyKind::V3 => Box::new(V3Strategy::default()),
    }
}
