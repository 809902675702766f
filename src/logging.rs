use tracing::Level;

/// Install the global fmt subscriber. `DRAFTLOOM_LOG=debug` widens the level.
pub fn init() {
    let level = match std::env::var("DRAFTLOOM_LOG").as_deref() {
        Ok("trace") => Level::TRACE,
        Ok("debug") => Level::DEBUG,
        Ok("warn") => Level::WARN,
        Ok("error") => Level::ERROR,
        _ => Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(level).init();
}
