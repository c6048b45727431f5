use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use interchange_engine::config::EngineConfig;
use interchange_engine::domain::StationCode;
use interchange_engine::dto::RoutesResponse;
use interchange_engine::engine::Engine;
use interchange_engine::identity::metro_clusters;
use interchange_engine::schedule::JsonFileSource;

const USAGE: &str = "usage: interchange-engine <schedule.jsonl> <FROM> <TO>";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [path, from, to] = args.as_slice() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    let (from, to) = match (StationCode::parse(from), StationCode::parse(to)) {
        (Ok(from), Ok(to)) => (from, to),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let mut source = match JsonFileSource::open(path) {
        Ok(source) => source,
        Err(e) => {
            error!(error = %e, "Failed to open schedule");
            return ExitCode::FAILURE;
        }
    };

    let engine = Engine::new(EngineConfig::from_env(), metro_clusters());
    match engine.initialize(&mut source).await {
        Ok(report) => info!(
            services = report.services,
            stations = report.stations,
            segments = report.segments,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Loaded schedule"
        ),
        Err(e) => {
            error!(error = %e, "Failed to build schedule graph");
            return ExitCode::FAILURE;
        }
    }

    let routes = match engine.find_routes(from, to).await {
        Ok(routes) => routes,
        Err(e) => {
            error!(error = %e, "Route query failed");
            return ExitCode::FAILURE;
        }
    };

    let response = RoutesResponse::new(&from, &to, &routes);
    match serde_json::to_string_pretty(&response) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Failed to encode response");
            ExitCode::FAILURE
        }
    }
}
