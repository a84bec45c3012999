//! 백테스트 리포트.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bandwalk_core::TradeResult;

use crate::performance::{EquityPoint, PerformanceMetrics};

/// 백테스트 실행 리포트.
///
/// 거래 기록과 자산 곡선의 원본 데이터를 담으며,
/// 파생 지표는 [`BacktestReport::metrics`]로 계산합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// 사용한 전략 이름
    pub strategy_name: String,
    /// 초기 자본
    pub initial_capital: Decimal,
    /// 최종 자본
    pub final_capital: Decimal,
    /// 완결된 거래 목록
    pub trades: Vec<TradeResult>,
    /// 자산 곡선
    pub equity_curve: Vec<EquityPoint>,
    /// 백테스트 기간 시작
    pub start_time: DateTime<Utc>,
    /// 백테스트 기간 종료
    pub end_time: DateTime<Utc>,
    /// 데이터 포인트 수
    pub data_points: usize,
}

impl BacktestReport {
    /// 성과 지표를 계산합니다.
    pub fn metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics::from_trades(&self.trades, &self.equity_curve, self.initial_capital)
    }

    /// 요약 문자열을 반환합니다.
    pub fn summary(&self) -> String {
        let metrics = self.metrics();
        let duration_days = (self.end_time - self.start_time).num_days();

        format!(
            "백테스트 결과 요약 ({})\n\
             ═══════════════════════════════════════\n\
             기간: {} → {} ({} 일)\n\
             데이터 포인트: {}\n\
             ───────────────────────────────────────\n\
             초기 자본: {}\n\
             최종 자본: {:.2}\n\
             순손익: {:.2}\n\
             총 수익률: {:.2}%\n\
             ───────────────────────────────────────\n\
             총 거래: {}\n\
             승률: {:.1}%\n\
             프로핏 팩터: {:.2}\n\
             긴급 청산: {}\n\
             ───────────────────────────────────────\n\
             샤프 비율: {:.2}\n\
             최대 낙폭: {:.2}%\n\
             평균 보유: {:.0}분\n\
             총 수수료: {:.4}\n\
             ═══════════════════════════════════════",
            self.strategy_name,
            self.start_time.format("%Y-%m-%d"),
            self.end_time.format("%Y-%m-%d"),
            duration_days,
            self.data_points,
            self.initial_capital,
            self.final_capital,
            metrics.stats.total_pnl,
            metrics.total_return_pct,
            metrics.stats.total_trades,
            metrics.stats.win_rate,
            metrics.profit_factor,
            metrics.stats.emergency_exits,
            metrics.sharpe_ratio,
            metrics.max_drawdown_pct,
            metrics.avg_holding_minutes,
            metrics.stats.total_fees,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_report_summary() {
        let now = Utc::now();
        let report = BacktestReport {
            strategy_name: "split_entry".to_string(),
            initial_capital: dec!(10000),
            final_capital: dec!(10000),
            trades: vec![],
            equity_curve: vec![],
            start_time: now,
            end_time: now + chrono::Duration::days(1),
            data_points: 1440,
        };

        let summary = report.summary();
        assert!(summary.contains("split_entry"));
        assert!(summary.contains("총 거래: 0"));
    }

    #[test]
    fn test_report_json_round_trip() {
        let now = Utc::now();
        let report = BacktestReport {
            strategy_name: "v3".to_string(),
            initial_capital: dec!(10000),
            final_capital: dec!(10250.5),
            trades: vec![],
            equity_curve: vec![EquityPoint {
                timestamp: now,
                equity: dec!(10250.5),
            }],
            start_time: now,
            end_time: now + chrono::Duration::days(7),
            data_points: 10080,
        };

        let json = serde_json::to_string(&report).unwrap();
        let parsed: BacktestReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.strategy_name, "v3");
        assert_eq!(parsed.final_capital, dec!(10250.5));
        assert_eq!(parsed.equity_curve.len(), 1);
    }
}
