mod cli;
mod config;
mod core;
mod interfaces;
mod logging;

#[tokio::main]
async fn main() {
    logging::init();
    if let Err(e) = cli::run_main().await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
