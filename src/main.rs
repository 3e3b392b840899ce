use log::{error, info};
use lucarne::configuration::config::Config;
use lucarne::controller::controller_handler::Controller;
use std::path::Path;

#[tokio::main]
async fn main() {
    // Example how to log
    // https://docs.rs/env_logger/latest/env_logger/
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    println!(
        "
██╗     ██╗   ██╗ ██████╗ █████╗ ██████╗ ███╗   ██╗███████╗
██║     ██║   ██║██╔════╝██╔══██╗██╔══██╗████╗  ██║██╔════╝
██║     ██║   ██║██║     ███████║██████╔╝██╔██╗ ██║█████╗
██║     ██║   ██║██║     ██╔══██║██╔══██╗██║╚██╗██║██╔══╝
███████╗╚██████╔╝╚██████╗██║  ██║██║  ██║██║ ╚████║███████╗
╚══════╝ ╚═════╝  ╚═════╝╚═╝  ╚═╝╚═╝  ╚═╝╚═╝  ╚═══╝╚══════╝
============================================================
        A real-time device screenshot collector v0.0.1
============================================================
"
    );

    info!("Importing configuration");

    // A config file selected through the environment wins; otherwise the
    // command line (with its env-overridable defaults) is the source.
    let config = match std::env::var("LUCARNE_CONFIG") {
        Ok(path) => match Config::from_file(Path::new(path.as_str())) {
            Ok(config) => config,
            Err(e) => {
                error!("Unable to import configuration from {}: {:?}", path, e);
                std::process::exit(1);
            }
        },
        Err(_) => Config::from_args(),
    };

    info!("Configuration imported successfully");

    println!("Server running at:");
    println!("- Local: http://localhost:{}", config.web_port);
    println!("- Network: http://{}:{}", local_ip(), config.web_port);
    println!(
        "\nDevice agents connect to {}:{}\n",
        local_ip(),
        config.channel_port
    );

    let mut controller = Controller::new(config)
        .map_err(|e| {
            error!(
                "Unable to create a controller instance: {:?}, exiting...",
                e
            );
            std::process::exit(1);
        })
        .unwrap();

    let result = tokio::spawn(async move {
        info!("Spawning the controller");
        controller
            .run()
            .await
            .map_err(|e| {
                error!(
                    "Error occurred in the controller process: {:?}, exiting...",
                    e
                )
            })
            .unwrap();
    });

    let _ = result.await.map_err(|e| {
        error!("Error joining at the end of execution: {:?}", e);
        std::process::exit(1);
    });
}

/// Best-effort LAN address for the startup hint; no traffic is sent.
fn local_ip() -> String {
    std::net::UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "localhost".to_string())
}
