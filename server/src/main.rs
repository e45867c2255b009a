use std::fs::{self, File};
use std::path::Path;

use log::info;
use simplelog::{
    CombinedLogger, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger,
};

use server::config::Config;
use server::network::{router, AppState};

fn init_logging(log_file: &str) {
    let mut config = ConfigBuilder::new();
    config.set_location_level(LevelFilter::Error);
    config.set_thread_level(LevelFilter::Error);
    config.set_time_level(LevelFilter::Error);
    if let Some(parent) = Path::new(log_file).parent() {
        let _ = fs::create_dir_all(parent);
    }
    CombinedLogger::init(vec![
        TermLogger::new(LevelFilter::Info, config.build(), TerminalMode::Stdout),
        WriteLogger::new(
            LevelFilter::Info,
            config.build(),
            File::create(log_file).expect("Failed to create log file"),
        ),
    ])
    .expect("Failed to initialise logging");
}

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Bad configuration: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&config.log_file);
    info!("Starting account records server");

    let pool = match database_handler::build_pool(&config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Failed connecting to DB: {}", e);
            std::process::exit(1);
        }
    };

    let app = router(AppState::new(pool));
    let listener = match tokio::net::TcpListener::bind(&config.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {}: {}", config.bind_address, e);
            std::process::exit(1);
        }
    };
    info!("Listening on {}", config.bind_address);
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
