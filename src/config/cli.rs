use crate::config::toml_config::{FaucetConfig, IssuanceMode};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "drip-faucet")]
#[command(about = "Token faucet that batches drip requests into periodic transfers")]
pub struct CliArgs {
    /// Path to TOML configuration file (defaults apply when omitted and faucet.toml is absent)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Override server.bind
    #[arg(long)]
    pub bind: Option<String>,

    /// Log transfers instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Override schedule.settlement_interval_seconds
    #[arg(long)]
    pub settlement_interval: Option<u64>,

    /// Override schedule.monitor_interval_seconds
    #[arg(long)]
    pub monitor_interval: Option<u64>,

    /// Validate the configuration and exit
    #[arg(long)]
    pub check_config: bool,
}

pub const DEFAULT_CONFIG_PATH: &str = "faucet.toml";

impl CliArgs {
    /// 命令列參數優先於設定檔
    pub fn apply_overrides(&self, config: &mut FaucetConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
            tracing::info!("🔧 server.bind overridden to: {}", bind);
        }
        if self.dry_run {
            config.issuance.mode = IssuanceMode::DryRun;
            tracing::info!("🔧 Issuance mode overridden to: dry_run");
        }
        if let Some(secs) = self.settlement_interval {
            config.schedule.settlement_interval_seconds = secs;
            tracing::info!("🔧 Settlement interval overridden to: {}s", secs);
        }
        if let Some(secs) = self.monitor_interval {
            config.schedule.monitor_interval_seconds = secs;
            tracing::info!("🔧 Monitor interval overridden to: {}s", secs);
        }
    }
}
