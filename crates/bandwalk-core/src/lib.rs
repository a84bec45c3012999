//! # Bandwalk Core
//!
//! 밴드워킹 의사결정 엔진의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 캔들(OHLCV) 데이터 구조체
//! - 분할 진입 포지션 추적
//! - 거래 기록 및 통계
//! - 진입/청산 신호 타입
//! - 심볼 및 타임프레임 정의
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
