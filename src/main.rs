//! Connector - REST backend for developer profiles and posts

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use connector::{
    auth::JwtValidator,
    config::Args,
    db::MongoClient,
    logging, server,
    store::{MemoryStore, MongoStore, Store},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init_tracing(&args);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Connector");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} (db: {})", args.mongodb_uri, args.mongodb_db);
    info!("Max body: {} bytes", args.max_body_bytes);
    info!("======================================");

    let jwt = JwtValidator::new(args.jwt_secret()?, args.jwt_expiry_seconds)?;

    // MongoDB is optional in dev mode
    let store: Arc<dyn Store> = match connect_mongo(&args).await {
        Ok(store) => {
            info!("MongoDB connected successfully");
            Arc::new(store)
        }
        Err(e) if args.dev_mode => {
            warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
            Arc::new(MemoryStore::new())
        }
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState::new(args, store, jwt));
    server::run(state).await?;

    Ok(())
}

async fn connect_mongo(args: &Args) -> connector::Result<MongoStore> {
    let client = MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await?;
    MongoStore::new(client).await
}
