use anyhow::Context;
use tracing::{error, info};

use feedback_worker::{
    app::ComponentRegistry, config::Config, observability, scheduler::daemon::spawn_hourly_daemon,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("unnamed");
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_info
                    .payload()
                    .downcast_ref::<String>()
                    .map(|s| s.as_str())
            })
            .unwrap_or("unknown panic payload");

        if let Some(location) = panic_info.location() {
            error!(
                thread = thread_name,
                file = location.file(),
                line = location.line(),
                column = location.column(),
                message,
                "panic occurred"
            );
        } else {
            error!(
                thread = thread_name,
                message, "panic occurred without location information"
            );
        }
    }));

    observability::tracing::init().context("failed to initialize tracing")?;

    let config = Config::from_env().context("failed to load configuration")?;
    let tz = config.report_tz();
    let registry = ComponentRegistry::build(config).context("failed to build component registry")?;
    let scheduler = registry.scheduler();

    if registry.config().run_once() {
        let fired_at = chrono::Utc::now().with_timezone(&tz);
        info!(fired_at = %fired_at.to_rfc3339(), "running single polling tick");
        scheduler.run_hour(fired_at).await;
        return Ok(());
    }

    let _daemon = spawn_hourly_daemon(scheduler, tz);
    info!("feedback worker started, waiting for shutdown signal");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received, exiting");

    Ok(())
}
