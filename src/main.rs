use clap::Parser;
use drip_faucet::adapters::http;
use drip_faucet::config::cli::DEFAULT_CONFIG_PATH;
use drip_faucet::core::engine::forward_shutdown_signal;
use drip_faucet::utils::error::ErrorSeverity;
use drip_faucet::utils::{logger, validation::Validate};
use drip_faucet::{CliArgs, FaucetConfig, FaucetEngine, FaucetError, TracingMonitorSink};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

fn exit_code(e: &FaucetError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(e: FaucetError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(&e).max(1));
}

fn load_config(args: &CliArgs) -> drip_faucet::Result<FaucetConfig> {
    match &args.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            FaucetConfig::from_file(path)
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            tracing::info!("📁 Loading configuration from: {}", DEFAULT_CONFIG_PATH);
            FaucetConfig::from_file(DEFAULT_CONFIG_PATH)
        }
        None => {
            tracing::info!("📁 No configuration file, using defaults");
            Ok(FaucetConfig::default())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 不存在也沒關係
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();
    logger::init_cli_logger(args.verbose, args.json_logs);

    tracing::info!("🚀 Starting drip-faucet");

    let mut config = load_config(&args).unwrap_or_else(|e| fail(e));
    args.apply_overrides(&mut config);

    if let Err(e) = config.validate() {
        fail(e);
    }
    tracing::info!("✅ Configuration loaded and validated successfully");
    if args.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    if args.check_config {
        println!("✅ Configuration is valid");
        return Ok(());
    }

    let issuer = config.issuance_client().unwrap_or_else(|e| fail(e));
    tracing::info!("💸 Issuance mode: {:?}", config.issuance.mode);

    let engine = FaucetEngine::new(
        config.engine_settings(),
        issuer,
        Arc::new(TracingMonitorSink),
    );

    let cors = http::cors_layer(&config.server.allowed_origins).unwrap_or_else(|e| fail(e));
    let app = http::router(engine.intake(), cors);
    let listener = TcpListener::bind(&config.server.bind)
        .await
        .unwrap_or_else(|e| fail(FaucetError::IoError(e)));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    let schedulers = engine.spawn(shutdown_rx.clone());

    {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            forward_shutdown_signal(tokio::signal::ctrl_c(), &shutdown_tx).await;
        });
    }

    let served = http::serve(listener, app, shutdown_rx).await;
    // 伺服器意外結束時也要停下排程器
    let _ = shutdown_tx.send(true);

    // 等排程器把最後一輪結算跑完
    schedulers.join().await;

    if let Err(e) = served {
        fail(e);
    }

    tracing::info!("👋 drip-faucet stopped");
    Ok(())
}
