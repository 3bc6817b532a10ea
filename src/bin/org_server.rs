//! Actix Web server exposing the organization query endpoint.
//!
//! `GET /api/organizations?bounds=south,west,north,east` returns the organizations
//! inside the box. Missing or malformed bounds return the whole collection.

use actix_web::{web, App, HttpResponse, HttpServer};
use clap::Parser;
use orgmap::utils::logger;
use orgmap::InMemoryStore;
use serde::Deserialize;

#[derive(Debug, Parser)]
#[command(name = "org_server")]
#[command(about = "Serves organizations for the orgmap viewport sync")]
struct ServerArgs {
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: String,

    #[arg(long, help = "JSON file with organizations (defaults to the bundled dataset)")]
    data: Option<String>,
}

#[derive(Deserialize)]
struct OrganizationsQuery {
    bounds: Option<String>,
}

async fn organizations_route(
    store: web::Data<InMemoryStore>,
    query: web::Query<OrganizationsQuery>,
) -> HttpResponse {
    let organizations = store.query_raw(query.bounds.as_deref());
    tracing::info!(
        bounds = query.bounds.as_deref().unwrap_or("-"),
        count = organizations.len(),
        "organizations query"
    );
    HttpResponse::Ok().json(organizations)
}

fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/organizations", web::get().to(organizations_route));
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    logger::init_server_logger();

    let store = match &args.data {
        Some(path) => InMemoryStore::from_file(path)?,
        None => InMemoryStore::bundled()?,
    };
    tracing::info!(
        organizations = store.len(),
        bind = %args.bind,
        "starting organization server"
    );

    let data = web::Data::new(store);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .bind(&args.bind)?
        .run()
        .await?;

    Ok(())
}
