//! 도메인 모델.
//!
//! 캔들, 포지션, 신호, 거래 기록 등 핵심 도메인 타입을 제공합니다.

pub mod calculations;
pub mod candle;
pub mod position;
pub mod side;
pub mod signal;
pub mod trade;

pub use calculations::*;
pub use candle::*;
pub use position::*;
pub use side::*;
pub use signal::*;
pub use trade::*;
