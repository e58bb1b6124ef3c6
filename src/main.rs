// companylens entrypoint
//!
//! Dispatches the CLI actions; everything substantial lives in the library
//! so this file stays a thin orchestrator.

use companylens::app;
use companylens::infrastructure::config::AppConfig;
use std::env;
use std::path::PathBuf;
use std::process;

const USAGE: &str = "Usage:\n  companylens                serve the HTTP search API\n  companylens ingest <csv>   load a companies CSV into the store\n  companylens index          create lookup indexes\n  companylens query <NAME>   run a canned query";

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();
    app::init_logging();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            process::exit(1);
        }
    };

    let args: Vec<String> = env::args().skip(1).collect();
    let outcome = match args.first().map(String::as_str) {
        None => app::serve(config).await,
        Some("ingest") => match args.get(1) {
            Some(path) => app::run_ingest(config, &PathBuf::from(path)).await,
            None => Err(format!("ingest requires a CSV path\n{}", USAGE)),
        },
        Some("index") => app::run_index(config).await,
        Some("query") => match args.get(1) {
            Some(name) => app::run_canned_query(config, name).await,
            None => Err(format!("query requires a query name\n{}", USAGE)),
        },
        Some(other) => Err(format!("Unknown action '{}'\n{}", other, USAGE)),
    };

    if let Err(e) = outcome {
        eprintln!("FATAL: {}", e);
        process::exit(1);
    }
}
