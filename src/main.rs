use clap::Parser;
use std::sync::Arc;
use table_sniper::utils::error::ErrorSeverity;
use table_sniper::utils::{logger, validation::Validate};
use table_sniper::{
    BotConfig, BotError, CliArgs, Command, OpenTableClient, ReservationEngine, ShutdownSignal,
};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting table-sniper");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match BotConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Command::Run {
        max_attempts: Some(max),
        ..
    } = &args.command
    {
        config.polling.max_attempts = Some(*max);
        tracing::info!("🔧 max_attempts overridden to: {}", max);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = execute(&args, &config).await {
        tracing::error!(
            "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn execute(args: &CliArgs, config: &BotConfig) -> Result<(), BotError> {
    let client = Arc::new(OpenTableClient::new(
        config.service.clone(),
        &config.auth.token,
        config.request_timeout(),
    )?);
    let request = config.reservation_request();

    display_config_summary(config);

    match &args.command {
        Command::Run { dry_run, .. } => {
            let engine = ReservationEngine::new(
                client,
                request,
                config.poll_policy()?,
                config.service.booking_defaults.clone(),
            );

            let (shutdown_tx, mut shutdown) = ShutdownSignal::channel();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("🛑 Ctrl-C received, stopping...");
                    let _ = shutdown_tx.send(true);
                }
            });

            if *dry_run {
                tracing::info!("🔍 DRY RUN MODE - the slot will not be booked");
                let slot = engine.find_slot(&mut shutdown).await?;
                println!(
                    "🎯 Would book slot at offset {} min (hash {})",
                    slot.time_offset_minutes, slot.slot_hash
                );
                return Ok(());
            }

            let raw = engine.run(&mut shutdown).await?;
            println!("✅ Booking response ({}): {}", raw.status, raw.body);
        }
        Command::Check => {
            let engine = ReservationEngine::new(
                client,
                request,
                config.poll_policy()?,
                config.service.booking_defaults.clone(),
            );
            let snapshot = engine.check_once().await?;

            println!("📋 {} slots returned:", snapshot.entries.len());
            for entry in &snapshot.entries {
                println!(
                    "  {:>+5} min  {}",
                    entry.time_offset_minutes,
                    if entry.is_available { "available" } else { "-" }
                );
            }
            match snapshot.selected {
                Some(slot) => println!("🎯 Closest bookable slot: {:+} min", slot.time_offset_minutes),
                None => println!("⏳ No bookable slot right now"),
            }
        }
        Command::Lookup { referer } => {
            // 查詢今天中午的時段即可取得餐廳資料
            let mut today = request;
            today.date = chrono::Local::now().format("%Y-%m-%d").to_string();
            today.time = "12:00".to_string();

            tracing::info!(
                "→ Sending availability request for restaurant ID {}...",
                today.restaurant_id
            );
            let lookup = client
                .lookup_restaurant(&today, config.auth.cookie.as_deref(), referer.as_deref())
                .await?;
            println!("→ HTTP {}", lookup.status);

            let Some(node) = lookup.node else {
                println!("No 'availability' node found. Possibly invalid ID or blocked.");
                println!("{}", serde_json::to_string_pretty(&lookup.document)?);
                return Ok(());
            };

            println!("\n── Full availability node ──");
            println!("{}", serde_json::to_string_pretty(&node)?);

            match lookup.name {
                Some(name) => println!(
                    "\n✅ Restaurant name (ID {}) → {}\n",
                    today.restaurant_id, name
                ),
                None => println!("\n⚠️ Could not find a 'name' field; inspect the JSON above.\n"),
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &BotConfig) {
    println!("📋 Configuration Summary:");
    println!("  Restaurant: {}", config.reservation.restaurant_id);
    println!(
        "  Target: {} {} (party of {})",
        config.reservation.date, config.reservation.time, config.reservation.party_size
    );
    println!(
        "  Service: {} (profile {})",
        config.service.base_url, config.service.version
    );
    if let Some(start_at) = &config.polling.start_at {
        println!("  Start at: {}", start_at);
    }
    println!(
        "  Interval: {}s",
        config.polling.interval_seconds.unwrap_or(1).max(1)
    );
    if let Some(max) = config.polling.max_attempts {
        println!("  Max attempts: {}", max);
    }
    println!();
}
