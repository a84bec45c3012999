//! 설정 관리.
//!
//! 이 모듈은 백테스트/전략 설정을 정의하고 관리합니다.
//! 파일(TOML)과 `BANDWALK__` 접두사 환경 변수에서 로드할 수 있습니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 백테스트 설정
    #[serde(default)]
    pub backtest: BacktestSettings,
    /// 전략 설정
    #[serde(default)]
    pub strategy: StrategySettings,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// 백테스트 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BacktestSettings {
    /// 초기 자본 (호가 자산 단위)
    pub initial_capital: Decimal,
    /// 회당 진입 비중 (자본 대비 비율, 0~1)
    pub position_size_pct: Decimal,
    /// 레버리지 배수
    pub leverage: u32,
    /// 테이커 수수료율 (청산 명목 가치 대비)
    pub taker_fee_rate: Decimal,
    /// 진입 시에도 수수료를 부과할지 여부
    #[serde(default)]
    pub entry_fee_enabled: bool,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            initial_capital: dec!(10000),
            position_size_pct: dec!(0.1),
            leverage: 10,
            taker_fee_rate: dec!(0.0005),
            entry_fee_enabled: false,
        }
    }
}

/// 전략 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategySettings {
    /// 사용할 전략 (split_entry, v3)
    pub name: String,
    /// 레버리지별 긴급 손절 임계값 테이블
    #[serde(default)]
    pub emergency_stop: EmergencyStopTable,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            name: "split_entry".to_string(),
            emergency_stop: EmergencyStopTable::default(),
        }
    }
}

/// 레버리지 구간별 긴급 손절 임계값.
///
/// 구간은 `min_leverage` 내림차순으로 탐색되며,
/// 현재 레버리지 이상인 첫 구간의 임계값이 적용됩니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmergencyStopTable {
    /// 구간 목록
    pub tiers: Vec<EmergencyStopTier>,
}

/// 긴급 손절 구간.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmergencyStopTier {
    /// 이 구간이 적용되는 최소 레버리지
    pub min_leverage: u32,
    /// 긴급 손절 임계값 (%, 양수로 표기)
    pub stop_loss_pct: Decimal,
}

impl Default for EmergencyStopTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                EmergencyStopTier {
                    min_leverage: 10,
                    stop_loss_pct: dec!(0.8),
                },
                EmergencyStopTier {
                    min_leverage: 1,
                    stop_loss_pct: dec!(1.0),
                },
            ],
        }
    }
}

impl EmergencyStopTable {
    /// 주어진 레버리지에 적용되는 긴급 손절 임계값(%)을 반환합니다.
    ///
    /// 일치하는 구간이 없으면 가장 보수적인(작은) 임계값을 사용합니다.
    pub fn threshold_for(&self, leverage: u32) -> Decimal {
        let mut tiers: Vec<&EmergencyStopTier> = self.tiers.iter().collect();
        tiers.sort_by(|a, b| b.min_leverage.cmp(&a.min_leverage));

        for tier in &tiers {
            if leverage >= tier.min_leverage {
                return tier.stop_loss_pct;
            }
        }
        tiers
            .iter()
            .map(|t| t.stop_loss_pct)
            .min()
            .unwrap_or(dec!(0.8))
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("BANDWALK")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}
