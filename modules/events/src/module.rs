use std::sync::Arc;

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::EventsConfig;
use crate::contract::client::EventsApi;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::EventsLocalClient;
use crate::infra::media::MediaUrlResolver;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::SeaOrmRepository;
use crate::infra::storage::tag_registry::TagRegistry;

/// Events module: owns the domain service and hands out its REST router and
/// in-process client once initialized.
#[derive(Default)]
pub struct Events {
    // Keep the domain service behind ArcSwap for cheap read-mostly access.
    service: arc_swap::ArcSwapOption<Service>,
}

impl Clone for Events {
    fn clone(&self) -> Self {
        Self {
            service: arc_swap::ArcSwapOption::new(self.service.load_full()),
        }
    }
}

impl Events {
    pub const NAME: &'static str = "events";

    /// Wire repositories and the photo resolver into the domain service.
    pub fn init(&self, db: DatabaseConnection, cfg: EventsConfig) -> anyhow::Result<()> {
        info!("Initializing events module");
        debug!(
            "Loaded events config: media_base_url={}, default_price={:?}, empty_tag_policy={:?}",
            cfg.media_base_url, cfg.default_price, cfg.empty_tag_policy
        );

        let default_price = cfg.checked_default_price()?;
        let photos = MediaUrlResolver::new(&cfg.media_base_url)?;
        let repo = Arc::new(SeaOrmRepository::new(db.clone()));
        let tags = Arc::new(TagRegistry::new(db));

        let service = Service::new(
            repo.clone(),
            repo,
            tags,
            Arc::new(photos),
            ServiceConfig {
                default_price,
                empty_tag_policy: cfg.empty_tag_policy,
            },
        );
        self.service.store(Some(Arc::new(service)));
        Ok(())
    }

    /// Apply pending schema migrations.
    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running events database migrations");
        Migrator::up(db, None).await?;
        info!("Events database migrations completed successfully");
        Ok(())
    }

    pub fn service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))
    }

    /// In-process client for other subsystems (profile hooks live here).
    pub fn client(&self) -> anyhow::Result<Arc<dyn EventsApi>> {
        Ok(Arc::new(EventsLocalClient::new(self.service()?)))
    }

    pub fn register_rest(&self, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering events REST routes");
        let router = routes::register_routes(router, self.service()?);
        info!("Events REST routes registered successfully");
        Ok(router)
    }

    pub fn openapi() -> utoipa::openapi::OpenApi {
        routes::openapi()
    }
}
