use notification_request_dispatcher::environment::Environment;
use notification_request_dispatcher::request_processor::NotificationRequestProcessor;
use notification_request_dispatcher::shutdown::Shutdown;
use notification_request_dispatcher_worker::routes::Routes;
use notification_request_dispatcher_worker::state::AppState;
use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use wg::WaitGroup;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (non_blocking, _guard) = tracing_appender::non_blocking(std::io::stdout());

    let rust_log = Environment::string("RUST_LOG", "INFO,sqlx::postgres::notice=WARN,sqlx::query=WARN");
    env::set_var("RUST_LOG", rust_log);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(Box::new(tracing_subscriber::fmt::layer().with_writer(non_blocking)))
        .init();

    info!("Starting...");

    let wait_group = WaitGroup::new();

    let app_state = AppState::new().await?;

    tokio::spawn(init_http_server(app_state.http_port, wait_group.add(1)));
    tokio::spawn(init_request_processor(app_state, wait_group.add(1)));

    wait_group.wait();

    info!("Stopped!");

    Ok(())
}

async fn init_http_server(
    http_port: u16,
    wait_group: WaitGroup,
) {
    info!("Starting http server...");
    let routes = Routes::routes();

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));

    match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Running http server on {}...", addr);
            if let Err(error) = axum::serve(listener, routes).with_graceful_shutdown(Shutdown::signal("Stopping http server...")).await {
                error!("Http server failed with error: {}", error);
            }
        },
        Err(error) => error!("Failed to bind http server to {}: {}", addr, error),
    }

    wait_group.done();

    info!("Http server stopped!");
}

async fn init_request_processor(
    app_state: AppState,
    wait_group: WaitGroup,
) {
    let result = NotificationRequestProcessor::new(app_state.resources)
        .with_graceful_shutdown(Shutdown::signal("Stopping notification request processor..."))
        .init()
        .await;

    if let Err(error) = result {
        error!("Notification request processor failed with error: {}", error);
    }

    wait_group.done();
}
