//! Settlement grid simulator entry point.

use std::process;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use settlement_grid::cli::Args;
use settlement_grid::grid::kpi::KpiReport;
use settlement_grid::io::export::export_csv;
use settlement_grid::scenario::build_engine;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();

    let args = Args::parse();

    let scenario = match args.load_scenario() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("{e}");
        }
        process::exit(1);
    }

    let mut engine = match build_engine(&scenario) {
        Ok(engine) => engine,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };
    let results = engine.run();
    let kpi = KpiReport::from_results(&results);

    if !args.quiet {
        for r in &results {
            println!("{r}");
        }
    }
    println!("\n{kpi}");

    if let Some(path) = &args.telemetry_out {
        if let Err(e) = export_csv(&results, path) {
            error!("failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {}", path.display());
    }

    #[cfg(feature = "api")]
    if args.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        use settlement_grid::api::{AppState, SettlementSummary};

        let state = Arc::new(AppState {
            settlement: SettlementSummary::from(engine.settlement()),
            kpi,
            reports: results,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                error!("failed to create tokio runtime: {e}");
                process::exit(1);
            }
        };
        if let Err(e) = rt.block_on(settlement_grid::api::serve(state, addr)) {
            error!("server error: {e}");
            process::exit(1);
        }
    }
}
