//! 전략 평가 컨텍스트.

use bandwalk_analysis::MarketAnalysisResult;
use bandwalk_core::Candle;

/// 한 스텝의 전략 평가에 필요한 읽기 전용 입력.
///
/// 매 캔들마다 새로 구성되며, 전략은 이 컨텍스트와 포지션 추적기만으로
/// 의사결정합니다.
#[derive(Debug)]
pub struct StrategyContext<'a> {
    /// 현재 캔들
    pub candle: &'a Candle,
    /// 현재 시점의 시장 분석 결과
    pub analysis: &'a MarketAnalysisResult,
    /// 레버리지 배수 (긴급 손절 임계값 결정에 사용)
    pub leverage: u32,
}

impl<'a> StrategyContext<'a> {
    pub fn new(candle: &'a Candle, analysis: &'a MarketAnalysisResult, leverage: u32) -> Self {
        Self {
            candle,
            analysis,
            leverage,
        }
    }
}
