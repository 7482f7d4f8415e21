// SPDX-License-Identifier: GPL-2.0-or-later
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use clipshare::{cli, db::SqliteStore, service::ClipService, Error};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = cli::Clipshare::parse();

    if !opts.config.data_directory.exists() {
        if let Err(e) = std::fs::DirBuilder::new()
            .recursive(true)
            .create(&opts.config.data_directory)
        {
            error!("Unable to create the data directory: {}", e);
            return;
        }
    }

    debug!("Starting database connection to perform the database migration");
    let store = match SqliteStore::connect(&opts.config).await {
        Ok(store) => store,
        Err(e) => {
            error!("Unable to set up the database: {}", e);
            return;
        }
    };

    match process_command(opts, store).await {
        Ok(_) => {}
        Err(e) => eprintln!("Error: {e}"),
    }
}

async fn process_command(opts: cli::Clipshare, store: SqliteStore) -> Result<(), Error> {
    let service = ClipService::from_config(store, &opts.config)?;

    match opts.command {
        cli::Command::Run {} => {
            let http_handle = axum_server::Handle::new();
            let handle = http_handle.clone();
            tokio::spawn(async move {
                let _shutdown_signal = tokio::signal::ctrl_c().await;
                info!("Shutdown signal received; beginning graceful shutdown.");
                handle.graceful_shutdown(Some(Duration::from_secs(15)));
            });

            let purge_interval = opts.config.clips.purge_interval_secs;
            if purge_interval > 0 {
                let sweeper = service.clone();
                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(Duration::from_secs(purge_interval));
                    loop {
                        interval.tick().await;
                        if let Err(e) = sweeper.purge_expired(Utc::now()).await {
                            error!("Failed to purge expired clips: {}", e);
                        }
                    }
                });
            }

            let http_api = opts.config.http_api.clone();
            let router =
                clipshare::web::create_router(service, opts.config.clips.max_content_bytes);
            match (http_api.tls_certificate, http_api.tls_key) {
                (None, None) => {
                    info!("Starting HTTP server on {:?}", &http_api.url);
                    tokio::spawn(async move {
                        axum_server::bind(http_api.url)
                            .handle(http_handle)
                            .serve(router.into_make_service())
                            .await
                            .map_err(Error::Server)
                    })
                }
                (Some(cert), Some(key)) => tokio::spawn(async move {
                    info!("Starting HTTPS server on {:?}", &http_api.url);
                    let tls_config =
                        axum_server::tls_openssl::OpenSSLConfig::from_pem_file(cert, key)
                            .map_err(|e| Error::Server(std::io::Error::other(e)))?;
                    axum_server::bind_openssl(http_api.url, tls_config)
                        .handle(http_handle)
                        .serve(router.into_make_service())
                        .await
                        .map_err(Error::Server)
                }),
                _ => return Err(Error::ConfigValueError(
                    "'tls_certificate' and 'tls_key' must both be set or neither should be set."
                        .into(),
                )),
            }
            .await??;

            Ok(())
        }
        cli::Command::Purge {} => {
            let purged = service.purge_expired(Utc::now()).await?;
            println!("Removed {purged} expired clips");
            Ok(())
        }
    }
}
