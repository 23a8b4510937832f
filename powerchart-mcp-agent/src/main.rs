use anyhow::Result;
use clap::{Parser, ValueEnum};
use powerchart::{create_engine, CoordinateTable, Settings};
use powerchart_mcp_agent::{utils::init_logging, PowerChartServer};
use rmcp::{
    transport::sse_server::SseServer,
    transport::stdio,
    transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpService,
    },
    ServiceExt,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "PowerChart MCP Server - EHR navigation through Citrix via Model Context Protocol"
)]
struct Args {
    /// Transport mode to use
    #[arg(short, long, value_enum, default_value = "stdio")]
    transport: TransportMode,

    /// Port to listen on (only used for SSE and HTTP transports)
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host to bind to (only used for SSE and HTTP transports)
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Coordinates file to load before searching the default locations
    #[arg(short, long, env = "POWERCHART_COORDINATES")]
    coordinates: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum TransportMode {
    /// Standard I/O transport (default)
    Stdio,
    /// Server-Sent Events transport for web integrations
    Sse,
    /// Streamable HTTP transport for HTTP-based clients
    Http,
}

fn build_server(coordinates: Option<PathBuf>) -> PowerChartServer {
    let table = CoordinateTable::discover(coordinates.as_deref());
    tracing::info!(
        source = ?table.source(),
        sections = table.section_names().count(),
        "Coordinate table ready"
    );
    PowerChartServer::new(Arc::new(table), create_engine())
}

#[tokio::main]
async fn main() -> Result<()> {
    Settings::load_dotenv();
    let args = Args::parse();

    init_logging()?;

    tracing::info!("Initializing PowerChart MCP server...");
    tracing::info!("Transport mode: {:?}", args.transport);

    let server = build_server(args.coordinates.clone());

    match args.transport {
        TransportMode::Stdio => {
            tracing::info!("Starting stdio transport...");
            let service = server.serve(stdio()).await.inspect_err(|e| {
                tracing::error!("Serving error: {:?}", e);
            })?;

            service.waiting().await?;
        }
        TransportMode::Sse => {
            let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
            tracing::info!("Starting SSE server on http://{}", addr);

            let ct = SseServer::serve(addr)
                .await?
                .with_service(move || server.clone());

            eprintln!("SSE server running on http://{addr}");
            eprintln!("Connect your MCP client to:");
            eprintln!("  SSE endpoint: http://{addr}/sse");
            eprintln!("  Message endpoint: http://{addr}/message");
            eprintln!("Press Ctrl+C to stop");

            tokio::signal::ctrl_c().await?;
            ct.cancel();
            tracing::info!("Shutting down SSE server");
        }
        TransportMode::Http => {
            let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
            tracing::info!("Starting streamable HTTP server on http://{}", addr);

            let service = StreamableHttpService::new(
                move || Ok(server.clone()),
                LocalSessionManager::default().into(),
                Default::default(),
            );

            let router = axum::Router::new()
                .route("/health", axum::routing::get(health_check))
                .nest_service("/mcp", service);
            let tcp_listener = tokio::net::TcpListener::bind(addr).await?;

            eprintln!("Streamable HTTP server running on http://{addr}");
            eprintln!("Connect your MCP client to: http://{addr}/mcp");
            eprintln!("Health check available at: http://{addr}/health");
            eprintln!("Press Ctrl+C to stop");

            axum::serve(tcp_listener, router)
                .with_graceful_shutdown(async {
                    tokio::signal::ctrl_c().await.ok();
                })
                .await?;

            tracing::info!("Shutting down HTTP server");
        }
    }

    Ok(())
}

async fn health_check() -> impl axum::response::IntoResponse {
    (
        axum::http::StatusCode::OK,
        axum::Json(serde_json::json!({"status": "ok"})),
    )
}
