//! Session server: session store, `/sync` backup and `/storage` files over REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT, DATA_DIR,
//! SESSION_TTL_SECS, CLEANUP_INTERVAL_SECS.

use actix_web::{web::Data, App, HttpServer};
use chrono::Utc;
use pour_party::{api, LocalStore, ServerConfig, SessionStore};
use std::io;
use std::sync::RwLock;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    let storage = LocalStore::open(&config.data_dir)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    log::info!("Data directory: {}", storage.dir().display());

    let sessions = Data::new(RwLock::new(SessionStore::new()));
    let storage = Data::new(storage);

    let ttl = chrono::Duration::from_std(config.session_ttl).unwrap_or_else(|_| chrono::Duration::hours(6));
    // Background task: remove sessions not updated within the TTL
    let sessions_cleanup = sessions.clone();
    let cleanup_interval = config.cleanup_interval;
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            let mut g = match sessions_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let removed = g.evict_expired(Utc::now(), ttl);
            if removed > 0 {
                log::info!("Cleaned up {} inactive session(s)", removed);
            }
        }
    });

    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(sessions.clone())
            .app_data(storage.clone())
            .configure(api::configure)
    })
    .bind(bind)?
    .run()
    .await
}
