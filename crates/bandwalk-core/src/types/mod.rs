//! 공통 기본 타입.
//!
//! 심볼, 타임프레임, 금융 수치 타입을 제공합니다.

pub mod decimal;
pub mod symbol;
pub mod timeframe;

pub use decimal::*;
pub use symbol::*;
pub use timeframe::*;
