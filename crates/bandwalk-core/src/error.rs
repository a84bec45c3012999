//! 도메인 에러 타입.
//!
//! 이 모듈은 포지션 추적과 신호 처리에서 사용되는 에러 타입을 정의합니다.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::Side;

/// 핵심 도메인 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 포지션 방향 위반 (반대 방향 진입 시도)
    #[error("포지션 방향 위반: 요청 {requested}, 현재 {current}")]
    SideViolation { requested: Side, current: Side },

    /// 최대 분할 진입 횟수 초과
    #[error("최대 진입 횟수 초과: 최대 {max}회")]
    MaxEntriesExceeded { max: usize },

    /// 잘못된 청산 비율
    #[error("잘못된 청산 비율: {0} (0 초과 1 이하여야 합니다)")]
    InvalidFraction(Decimal),

    /// 빈 포지션에 대한 청산 시도
    #[error("청산할 포지션이 없습니다")]
    EmptyPosition,

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),
}

/// 도메인 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// 전략 로직 결함을 나타내는 에러인지 확인합니다.
    ///
    /// 방향 위반은 런타임에 복구할 수 없는 전략 버그이므로
    /// 호출자는 이를 전파해야 합니다.
    pub fn is_logic_defect(&self) -> bool {
        matches!(self, CoreError::SideViolation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_violation_is_logic_defect() {
        let err = CoreError::SideViolation {
            requested: Side::Long,
            current: Side::Short,
        };
        assert!(err.is_logic_defect());

        let err = CoreError::EmptyPosition;
        assert!(!err.is_logic_defect());
    }
}
