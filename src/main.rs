use std::process::ExitCode;
use std::sync::Arc;

use addsvc::{Config, Metrics, Server, Supervisor, health, service, supervisor, transport};
use clap::Parser;
use tracing::{info, info_span};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_telemetry(config: &Config) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init()?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = Config::parse();
    init_telemetry(&config)?;

    info!(version = env!("CARGO_PKG_VERSION"), "addsvc starting");

    let metrics = Arc::new(Metrics::default());

    let pipeline = service::pipeline(&config.identity, info_span!("endpoint"));
    let binding = service::make_http_binding(pipeline, vec![transport::basic_auth()], vec![])
        .metrics(Arc::clone(&metrics))
        .span(info_span!("binding", transport = "HTTP/JSON"));

    let mut sup = Supervisor::new(info_span!("supervisor"));
    let shutdown = sup.token();

    sup.spawn("signal", supervisor::interrupt());
    sup.spawn(
        "debug",
        Server::bind(config.debug_addr)
            .span(info_span!("server", transport = "debug"))
            .serve(health::router(metrics), shutdown.clone()),
    );
    sup.spawn(
        "http",
        Server::bind(config.http_addr)
            .span(info_span!("server", transport = "HTTP/JSON"))
            .serve(binding, shutdown),
    );

    let exit = sup.run().await;
    Ok(exit.code())
}
