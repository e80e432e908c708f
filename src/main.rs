use filedrop::{logger, server, Config, Server, StartupError};

/// Config file used when none is given on the command line (extension optional)
const DEFAULT_CONFIG: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    let cfg = Config::load_from(&config_path).map_err(StartupError::from)?;
    logger::init(&cfg).map_err(StartupError::Logger)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let server = match Server::bind(cfg) {
        Ok(server) => server,
        Err(e) => {
            logger::log_error(&e.to_string());
            return Err(e.into());
        }
    };

    server::start_signal_handler(server.shutdown_handle());

    server.run().await;
    Ok(())
}
