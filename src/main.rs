//! Application entry point: loads the store snapshot, registers the
//! Handlebars templates, and serves the router with Axum.

mod appointments;
mod backend;
mod blog;
mod consts;
mod db;
mod earnings;
mod identity;
mod models;
mod pharmacy;
mod prescriptions;
mod utils;

use std::{net::SocketAddr, sync::Arc};

use axum::Extension;
use dotenv::dotenv;
use handlebars::Handlebars;
use log::{error, info};
use once_cell::sync::Lazy;

use crate::consts::HTTP_PORT;

static HBS: Lazy<Handlebars<'static>> = Lazy::new(|| {
    let mut hbs = Handlebars::new();
    hbs.register_templates_directory(".hbs", "templates/")
        .expect("Could not register template directory");
    hbs
});

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(e) = db::load() {
        error!("Failed to load store snapshot: {e}");
    }

    let hbs = Arc::new(HBS.clone());
    let app = backend::router::get_router().layer(Extension(hbs));

    // Final snapshot on ctrl-c before the process goes down.
    tokio::spawn(async {
        tokio::signal::ctrl_c().await.ok();
        match db::read() {
            Ok(db) => {
                if let Err(e) = db::save(&db) {
                    error!("Failed to save store snapshot: {e}");
                }
            }
            Err(e) => error!("Failed to read store for final snapshot: {e}"),
        }
        std::process::exit(0);
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], HTTP_PORT));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to open web server listener");

    axum::serve(listener, app)
        .await
        .expect("Failed to bind Axum to listener");
}
