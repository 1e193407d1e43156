use dotenvy::dotenv;
use marketplace_orders::{build_server, build_services, create_pool, run_migrations, AppConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().unwrap_or_else(|e| panic!("Invalid configuration: {e}"));

    let pool = create_pool(&config.database_url, config.db_pool_size)
        .expect("Failed to create database pool");
    run_migrations(&pool);

    log::info!(
        "Starting server at http://{}:{} (swagger at /swagger-ui/)",
        config.host,
        config.port
    );

    build_server(build_services(pool), &config.host, config.port)?.await
}
