//! Planshift server entry point.

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use planshift::adapters::collaborators::{
    CollaboratorClient, HttpBillingService, HttpNotificationService, HttpUsageService,
    LoggingNotificationService,
};
use planshift::adapters::http::{plan_change_router, PlanChangeAppState};
use planshift::adapters::memory::{
    InMemoryBillingService, InMemoryImpactReportRepository, InMemoryMigrationPlanRepository,
    InMemoryPlanVersionStore, InMemorySubscriptionStore, InMemoryUsageService,
};
use planshift::adapters::postgres::{
    run_migrations, PostgresImpactReportRepository, PostgresMigrationPlanRepository,
    PostgresPlanVersionStore, PostgresSubscriptionStore,
};
use planshift::application::ExecutionRegistry;
use planshift::config::AppConfig;
use planshift::domain::foundation::DomainError;
use planshift::ports::{
    BillingService, ImpactReportRepository, MigrationPlanRepository, NotificationService,
    PlanVersionStore, SubscriptionReader, SubscriptionRepository, UsageService,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let state = build_state(&config).await?;

    let app = plan_change_router()
        .with_state(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(cors_layer(&config))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        "Planshift listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

struct Storage {
    plan_store: Arc<dyn PlanVersionStore>,
    subscription_reader: Arc<dyn SubscriptionReader>,
    subscription_repository: Arc<dyn SubscriptionRepository>,
    impact_reports: Arc<dyn ImpactReportRepository>,
    migration_plans: Arc<dyn MigrationPlanRepository>,
}

async fn build_state(config: &AppConfig) -> Result<PlanChangeAppState, BoxError> {
    let storage = build_storage(config).await?;

    let collaborators = &config.collaborators;
    let client = |service: &'static str, url: &str| {
        CollaboratorClient::new(
            service,
            url,
            collaborators.api_token.clone(),
            collaborators.request_timeout(),
        )
    };

    let usage: Arc<dyn UsageService> = match &collaborators.usage_url {
        Some(url) => Arc::new(HttpUsageService::new(client("usage", url)?)),
        None => {
            tracing::warn!("No usage service configured; every subscription reports no usage");
            Arc::new(InMemoryUsageService::new())
        }
    };
    let billing: Arc<dyn BillingService> = match &collaborators.billing_url {
        Some(url) => Arc::new(HttpBillingService::new(client("billing", url)?)),
        None => {
            tracing::warn!("No billing service configured; repricing is recorded in memory only");
            Arc::new(InMemoryBillingService::new())
        }
    };
    let notifier: Arc<dyn NotificationService> = match &collaborators.notification_url {
        Some(url) => Arc::new(HttpNotificationService::new(client("notification", url)?)),
        None => Arc::new(LoggingNotificationService::new()),
    };

    Ok(PlanChangeAppState {
        plan_store: storage.plan_store,
        subscription_reader: storage.subscription_reader,
        subscription_repository: storage.subscription_repository,
        impact_reports: storage.impact_reports,
        migration_plans: storage.migration_plans,
        usage,
        billing,
        notifier,
        registry: Arc::new(ExecutionRegistry::new()),
        policy: config.migration.policy(),
    })
}

async fn build_storage(config: &AppConfig) -> Result<Storage, DomainError> {
    let Some(database) = &config.database else {
        tracing::warn!("No database configured; state is kept in memory");
        let subscriptions = Arc::new(InMemorySubscriptionStore::new());
        return Ok(Storage {
            plan_store: Arc::new(InMemoryPlanVersionStore::new()),
            subscription_reader: subscriptions.clone(),
            subscription_repository: subscriptions,
            impact_reports: Arc::new(InMemoryImpactReportRepository::new()),
            migration_plans: Arc::new(InMemoryMigrationPlanRepository::new()),
        });
    };

    let pool = database
        .pool_options()
        .connect(&database.url)
        .await
        .map_err(|e| DomainError::database(format!("Failed to connect to database: {}", e)))?;
    if database.run_migrations {
        run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let subscriptions = Arc::new(PostgresSubscriptionStore::new(pool.clone()));
    Ok(Storage {
        plan_store: Arc::new(PostgresPlanVersionStore::new(pool.clone())),
        subscription_reader: subscriptions.clone(),
        subscription_repository: subscriptions,
        impact_reports: Arc::new(PostgresImpactReportRepository::new(pool.clone())),
        migration_plans: Arc::new(PostgresMigrationPlanRepository::new(pool)),
    })
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        if config.is_production() {
            return CorsLayer::new();
        }
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
