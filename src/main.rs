use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatepass::config::Config;
use gatepass::middleware::{ApiKeyAuth, RateLimiter, RequestId};
use gatepass::modules::checkout::controllers::checkout_controller;
use gatepass::modules::checkout::repositories::{DiscountRepository, ReservationRepository};
use gatepass::modules::checkout::services::{CheckoutService, ReservationSweeper};
use gatepass::modules::events::controllers::event_controller;
use gatepass::modules::events::repositories::EventRepository;
use gatepass::modules::events::services::EventService;
use gatepass::modules::gateways::services::{PaymentGateway, PaystackClient};
use gatepass::modules::health::controllers::health_controller;
use gatepass::modules::organizers::controllers::organizer_controller;
use gatepass::modules::organizers::repositories::OrganizerRepository;
use gatepass::modules::organizers::services::OrganizerService;
use gatepass::modules::payouts::controllers::payout_controller;
use gatepass::modules::payouts::repositories::PayoutRepository;
use gatepass::modules::payouts::services::PayoutService;
use gatepass::modules::transactions::controllers::{transaction_controller, webhook_controller};
use gatepass::modules::transactions::repositories::TransactionRepository;
use gatepass::modules::transactions::services::TransactionService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatepass=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Configuration validation failed");

    tracing::info!("Starting GatePass ticketing platform");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!(
        "Default rates: platform {} / processor {}",
        config.fees.platform_fee_percent,
        config.fees.processor_fee_percent
    );

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .expect("Failed to create database pool");

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    // Repositories
    let organizer_repo = Arc::new(OrganizerRepository::new(db_pool.clone()));
    let event_repo = Arc::new(EventRepository::new(db_pool.clone()));
    let reservation_repo = Arc::new(ReservationRepository::new(db_pool.clone()));
    let discount_repo = Arc::new(DiscountRepository::new(db_pool.clone()));
    let transaction_repo = Arc::new(TransactionRepository::new(db_pool.clone()));
    let payout_repo = Arc::new(PayoutRepository::new(db_pool.clone()));

    // Gateway
    let gateway: Arc<dyn PaymentGateway> = Arc::new(PaystackClient::new(
        config.paystack.secret_key.clone(),
        Some(config.paystack.base_url.clone()),
    ));

    // Services
    let fee_defaults = config
        .fees
        .default_rates()
        .expect("Invalid default fee rates");

    let organizer_service = Arc::new(OrganizerService::new(organizer_repo.clone()));
    let event_service = Arc::new(EventService::new(
        event_repo.clone(),
        transaction_repo.clone(),
        discount_repo.clone(),
    ));
    let checkout_service = Arc::new(CheckoutService::new(
        event_repo.clone(),
        organizer_repo.clone(),
        reservation_repo.clone(),
        discount_repo.clone(),
        gateway.clone(),
        fee_defaults,
        config.checkout.hold_minutes,
        config.paystack.callback_url.clone(),
    ));
    let transaction_service = Arc::new(TransactionService::new(
        transaction_repo.clone(),
        reservation_repo.clone(),
        event_repo.clone(),
        discount_repo.clone(),
        gateway.clone(),
    ));
    let payout_service = Arc::new(PayoutService::new(
        payout_repo,
        transaction_repo,
        organizer_repo,
        gateway,
    ));

    // Background jobs: lapsed-hold sweeping and webhook-miss polling
    let sweeper = Arc::new(ReservationSweeper::new(
        reservation_repo,
        event_repo,
        config.checkout.sweep_interval_secs,
    ));
    tokio::spawn(sweeper.start());

    let verifier = transaction_service.clone();
    let verify_after_minutes = config.checkout.verify_after_minutes;
    let verify_interval = config.checkout.sweep_interval_secs.max(60);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(verify_interval));
        loop {
            ticker.tick().await;
            match verifier.verify_pending(verify_after_minutes).await {
                Ok(settled) => {
                    if settled > 0 {
                        tracing::info!(settled, "Recovered payments via verify polling");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Verify polling failed");
                }
            }
        }
    });

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let workers = config.server.workers;
    let rate_limit = config.security.rate_limit_per_minute;
    let auth_pool = db_pool.clone();

    let server = HttpServer::new(move || {
        // The checkout widget embeds on organizer sites, so the public
        // surface is cross-origin by design
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(ApiKeyAuth::new(auth_pool.clone()))
            .wrap(RateLimiter::new(rate_limit))
            .wrap(RequestId)
            .wrap(cors)
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(organizer_service.clone()))
            .app_data(web::Data::new(event_service.clone()))
            .app_data(web::Data::new(checkout_service.clone()))
            .app_data(web::Data::new(transaction_service.clone()))
            .app_data(web::Data::new(payout_service.clone()))
            .configure(health_controller::configure)
            .configure(organizer_controller::configure)
            .configure(event_controller::configure)
            .configure(checkout_controller::configure)
            .configure(transaction_controller::configure)
            .configure(webhook_controller::configure)
            .configure(payout_controller::configure)
            .route("/", web::get().to(index))
    })
    .workers(workers)
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "GatePass Ticketing Platform",
        "version": "0.1.0",
        "status": "running"
    }))
}
