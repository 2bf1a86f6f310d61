use crate::adapters::{DryRunIssuanceClient, RelayerIssuanceClient};
use crate::core::engine::EngineSettings;
use crate::core::settlement::{FailurePolicy, SettlementSettings};
use crate::domain::ports::IssuanceClient;
use crate::utils::error::{FaucetError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "0.0.0.0:3010";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_AMOUNT_PER_REQUEST: u64 = 1;
/// 結算週期 (秒)
pub const DEFAULT_SETTLEMENT_INTERVAL_SECS: u64 = 20;
/// 佇列監控週期 (秒)
pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_ISSUE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TOKEN_DECIMALS: u32 = 18;
const MAX_TOKEN_DECIMALS: u32 = 36;
/// 週期與逾時的上限 (一天)
pub const MAX_SCHEDULE_SECS: u64 = 86_400;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaucetConfig {
    pub server: ServerConfig,
    pub drip: DripConfig,
    pub schedule: ScheduleConfig,
    pub issuance: IssuanceConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            allowed_origins: vec![DEFAULT_FRONTEND_ORIGIN.to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DripConfig {
    pub amount_per_request: u64,
}

impl Default for DripConfig {
    fn default() -> Self {
        Self {
            amount_per_request: DEFAULT_AMOUNT_PER_REQUEST,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub settlement_interval_seconds: u64,
    pub monitor_interval_seconds: u64,
    /// 0 表示不限時
    pub issue_timeout_seconds: u64,
    pub failure_policy: FailurePolicy,
    pub settle_on_shutdown: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            settlement_interval_seconds: DEFAULT_SETTLEMENT_INTERVAL_SECS,
            monitor_interval_seconds: DEFAULT_MONITOR_INTERVAL_SECS,
            issue_timeout_seconds: DEFAULT_ISSUE_TIMEOUT_SECS,
            failure_policy: FailurePolicy::default(),
            settle_on_shutdown: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuanceMode {
    Relayer,
    #[default]
    DryRun,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuanceConfig {
    pub mode: IssuanceMode,
    pub endpoint: Option<String>,
    pub token_contract: Option<String>,
    pub decimals: u32,
    pub api_key: Option<String>,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            mode: IssuanceMode::default(),
            endpoint: None,
            token_contract: None,
            decimals: DEFAULT_TOKEN_DECIMALS,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl FaucetConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FaucetError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FaucetError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FAUCET_API_KEY})，找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FaucetError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_socket_addr("server.bind", &self.server.bind)?;
        for origin in &self.server.allowed_origins {
            validation::validate_non_empty_string("server.allowed_origins", origin)?;
        }

        validation::validate_positive_number(
            "drip.amount_per_request",
            self.drip.amount_per_request,
            1,
        )?;
        validation::validate_range(
            "schedule.settlement_interval_seconds",
            self.schedule.settlement_interval_seconds,
            1,
            MAX_SCHEDULE_SECS,
        )?;
        validation::validate_range(
            "schedule.monitor_interval_seconds",
            self.schedule.monitor_interval_seconds,
            1,
            MAX_SCHEDULE_SECS,
        )?;
        // 0 代表不設逾時
        validation::validate_range(
            "schedule.issue_timeout_seconds",
            self.schedule.issue_timeout_seconds,
            0,
            MAX_SCHEDULE_SECS,
        )?;
        validation::validate_range(
            "issuance.decimals",
            self.issuance.decimals,
            0,
            MAX_TOKEN_DECIMALS,
        )?;

        if self.issuance.mode == IssuanceMode::Relayer {
            let endpoint =
                validation::validate_required_field("issuance.endpoint", &self.issuance.endpoint)?;
            validation::validate_url("issuance.endpoint", endpoint)?;

            let contract = validation::validate_required_field(
                "issuance.token_contract",
                &self.issuance.token_contract,
            )?;
            validation::validate_address(contract).map_err(|_| {
                FaucetError::InvalidConfigValueError {
                    field: "issuance.token_contract".to_string(),
                    value: contract.clone(),
                    reason: "expected 40 hexadecimal characters with optional 0x prefix"
                        .to_string(),
                }
            })?;

            if let Some(key) = &self.issuance.api_key {
                if key.contains("${") {
                    return Err(FaucetError::MissingConfigError {
                        field: format!("issuance.api_key ({})", key),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn settlement_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.settlement_interval_seconds)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.monitor_interval_seconds)
    }

    pub fn issue_timeout(&self) -> Option<Duration> {
        match self.schedule.issue_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            amount_per_request: self.drip.amount_per_request,
            settlement_interval: self.settlement_interval(),
            monitor_interval: self.monitor_interval(),
            monitor_enabled: self.monitoring.enabled,
            settlement: SettlementSettings {
                failure_policy: self.schedule.failure_policy,
                issue_timeout: self.issue_timeout(),
                settle_on_shutdown: self.schedule.settle_on_shutdown,
            },
        }
    }

    /// 依 `issuance.mode` 建立轉帳客戶端
    pub fn issuance_client(&self) -> Result<Arc<dyn IssuanceClient>> {
        match self.issuance.mode {
            IssuanceMode::DryRun => {
                let client: Arc<dyn IssuanceClient> = Arc::new(DryRunIssuanceClient::new());
                Ok(client)
            }
            IssuanceMode::Relayer => {
                let endpoint = validation::validate_required_field(
                    "issuance.endpoint",
                    &self.issuance.endpoint,
                )?;
                let contract = validation::validate_required_field(
                    "issuance.token_contract",
                    &self.issuance.token_contract,
                )?;
                let client: Arc<dyn IssuanceClient> = Arc::new(RelayerIssuanceClient::new(
                    endpoint,
                    contract.clone(),
                    self.issuance.decimals,
                    self.issuance.api_key.clone(),
                )?);
                Ok(client)
            }
        }
    }
}

impl Validate for FaucetConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = FaucetConfig::from_toml_str("").unwrap();

        assert_eq!(config.server.bind, DEFAULT_BIND);
        assert_eq!(config.drip.amount_per_request, 1);
        assert_eq!(config.settlement_interval(), Duration::from_secs(20));
        assert_eq!(config.monitor_interval(), Duration::from_secs(5));
        assert_eq!(config.schedule.failure_policy, FailurePolicy::AbortRemaining);
        assert_eq!(config.issuance.mode, IssuanceMode::DryRun);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[server]
bind = "127.0.0.1:8080"
allowed_origins = ["https://faucet.example.com"]

[drip]
amount_per_request = 2

[schedule]
settlement_interval_seconds = 60
monitor_interval_seconds = 10
issue_timeout_seconds = 0
failure_policy = "continue"
settle_on_shutdown = false

[issuance]
mode = "relayer"
endpoint = "https://relayer.example.com"
token_contract = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
decimals = 6

[monitoring]
enabled = false
"#;

        let config = FaucetConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_ok());

        let settings = config.engine_settings();
        assert_eq!(settings.amount_per_request, 2);
        assert_eq!(settings.settlement_interval, Duration::from_secs(60));
        assert!(!settings.monitor_enabled);
        assert_eq!(settings.settlement.failure_policy, FailurePolicy::Continue);
        assert_eq!(settings.settlement.issue_timeout, None);
        assert!(!settings.settlement.settle_on_shutdown);
        assert!(config.issuance_client().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("DRIP_TEST_RELAYER_URL", "https://relayer.test");

        let toml_content = r#"
[issuance]
mode = "relayer"
endpoint = "${DRIP_TEST_RELAYER_URL}"
token_contract = "0x0000000000000000000000000000000000000001"
"#;

        let config = FaucetConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.issuance.endpoint.as_deref(),
            Some("https://relayer.test")
        );

        std::env::remove_var("DRIP_TEST_RELAYER_URL");
    }

    #[test]
    fn test_relayer_mode_requires_endpoint() {
        let config = FaucetConfig::from_toml_str(
            r#"
[issuance]
mode = "relayer"
token_contract = "0x0000000000000000000000000000000000000001"
"#,
        )
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(FaucetError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_unresolved_api_key_is_rejected() {
        let config = FaucetConfig::from_toml_str(
            r#"
[issuance]
mode = "relayer"
endpoint = "https://relayer.example.com"
token_contract = "0x0000000000000000000000000000000000000001"
api_key = "${DRIP_TEST_SURELY_UNSET_KEY}"
"#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_zero_interval() {
        let config = FaucetConfig::from_toml_str(
            r#"
[schedule]
settlement_interval_seconds = 0
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_oversized_schedule_values() {
        for key in [
            "settlement_interval_seconds",
            "monitor_interval_seconds",
            "issue_timeout_seconds",
        ] {
            let config = FaucetConfig::from_toml_str(&format!(
                "[schedule]\n{} = 9223372036854775807\n",
                key
            ))
            .unwrap();

            match config.validate() {
                Err(FaucetError::InvalidConfigValueError { field, .. }) => {
                    assert_eq!(field, format!("schedule.{}", key));
                }
                other => panic!("expected range error for {}, got {:?}", key, other),
            }
        }

        // 命令列覆寫可以帶進 u64::MAX
        let mut config = FaucetConfig::default();
        config.schedule.monitor_interval_seconds = u64::MAX;
        assert!(config.validate().is_err());

        let config = FaucetConfig::from_toml_str(
            "[schedule]\nsettlement_interval_seconds = 86400\nissue_timeout_seconds = 0\n",
        )
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[drip]\namount_per_request = 5\n")
            .unwrap();

        let config = FaucetConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.drip.amount_per_request, 5);
    }
}
