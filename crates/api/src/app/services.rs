use std::sync::Arc;

use tapline_auth::AuthorizationTier;
use tapline_availability::{AvailabilityResult, ProductImpact};
use tapline_catalog::{Package, PackageComponent, PackageId, Product, ProductId};
use tapline_core::VenueId;
use tapline_infra::{
    AvailabilityCache, AvailabilityService, InMemoryInventoryStore, InventoryStore, LedgerError,
    MovementFilter, StockLedger, StoreError,
};
use tapline_stock::{ApprovalPolicy, MovementDraft, StockMovement};

#[cfg(feature = "postgres")]
use sqlx::PgPool;
#[cfg(feature = "postgres")]
use tapline_infra::PostgresInventoryStore;

/// Wired services behind the HTTP handlers.
///
/// The store trait is synchronous, so the persistent variant runs every
/// store-touching call on the blocking pool (the Postgres store bridges to
/// async internally and must not run on a runtime worker thread). The
/// in-memory variant is lock-bound and cheap enough to call inline.
#[derive(Clone)]
pub enum AppServices {
    InMemory {
        ledger: Arc<StockLedger<Arc<InMemoryInventoryStore>>>,
        availability: Arc<AvailabilityService<Arc<InMemoryInventoryStore>>>,
        store: Arc<InMemoryInventoryStore>,
    },
    #[cfg(feature = "postgres")]
    Persistent {
        ledger: Arc<StockLedger<Arc<PostgresInventoryStore>>>,
        availability: Arc<AvailabilityService<Arc<PostgresInventoryStore>>>,
        store: Arc<PostgresInventoryStore>,
    },
}

pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        #[cfg(feature = "postgres")]
        {
            return build_persistent_services().await;
        }
        #[cfg(not(feature = "postgres"))]
        {
            tracing::warn!(
                "USE_PERSISTENT_STORES=true but postgres feature not enabled, falling back to in-memory"
            );
            return build_in_memory_services();
        }
    }

    build_in_memory_services()
}

fn approval_policy_from_env() -> ApprovalPolicy {
    match std::env::var("APPROVAL_THRESHOLD_PCT") {
        Ok(raw) => match raw.parse::<rust_decimal::Decimal>() {
            Ok(pct) if pct > rust_decimal::Decimal::ZERO => ApprovalPolicy { threshold_pct: pct },
            _ => {
                tracing::warn!("ignoring invalid APPROVAL_THRESHOLD_PCT {raw:?}");
                ApprovalPolicy::default()
            }
        },
        Err(_) => ApprovalPolicy::default(),
    }
}

fn build_in_memory_services() -> AppServices {
    // In-memory wiring (dev/test): store + ledger + availability cache.
    let store = Arc::new(InMemoryInventoryStore::new());
    let ledger = Arc::new(StockLedger::new(
        Arc::clone(&store),
        approval_policy_from_env(),
    ));
    let availability = Arc::new(AvailabilityService::new(
        Arc::clone(&store),
        AvailabilityCache::default(),
    ));

    AppServices::InMemory {
        ledger,
        availability,
        store,
    }
}

#[cfg(feature = "postgres")]
async fn build_persistent_services() -> AppServices {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to Postgres");

    let store = Arc::new(PostgresInventoryStore::new(pool));
    let ledger = Arc::new(StockLedger::new(
        Arc::clone(&store),
        approval_policy_from_env(),
    ));
    let availability = Arc::new(AvailabilityService::new(
        Arc::clone(&store),
        AvailabilityCache::default(),
    ));

    AppServices::Persistent {
        ledger,
        availability,
        store,
    }
}

#[cfg(feature = "postgres")]
async fn run_blocking<T, E, F>(f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<StoreError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => Err(E::from(StoreError::Backend(format!(
            "blocking task failed: {e}"
        )))),
    }
}

fn apply_and_invalidate<S: InventoryStore>(
    ledger: &StockLedger<S>,
    availability: &AvailabilityService<S>,
    tier: AuthorizationTier,
    manager_approved: bool,
    draft: &MovementDraft,
) -> Result<StockMovement, LedgerError> {
    let movement = ledger.apply(draft.venue_id, tier, manager_approved, draft)?;

    // Cached availability for affected packages is stale now. Invalidation
    // failure only delays freshness until the TTL, so log and move on.
    if let Err(e) = availability.invalidate_for_product(movement.venue_id, movement.product_id) {
        tracing::warn!("availability cache invalidation failed: {e:?}");
    }

    Ok(movement)
}

impl AppServices {
    pub async fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        match self {
            AppServices::InMemory { store, .. } => store.insert_product(product),
            #[cfg(feature = "postgres")]
            AppServices::Persistent { store, .. } => {
                let store = Arc::clone(store);
                run_blocking(move || store.insert_product(product)).await
            }
        }
    }

    pub async fn get_product(
        &self,
        venue_id: VenueId,
        product_id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        match self {
            AppServices::InMemory { store, .. } => store.get_product(venue_id, product_id),
            #[cfg(feature = "postgres")]
            AppServices::Persistent { store, .. } => {
                let store = Arc::clone(store);
                run_blocking(move || store.get_product(venue_id, product_id)).await
            }
        }
    }

    pub async fn insert_package(
        &self,
        package: Package,
        components: Vec<PackageComponent>,
    ) -> Result<(), StoreError> {
        match self {
            AppServices::InMemory { store, .. } => store.insert_package(package, components),
            #[cfg(feature = "postgres")]
            AppServices::Persistent { store, .. } => {
                let store = Arc::clone(store);
                run_blocking(move || store.insert_package(package, components)).await
            }
        }
    }

    pub async fn get_package(
        &self,
        venue_id: VenueId,
        package_id: PackageId,
    ) -> Result<Option<Package>, StoreError> {
        match self {
            AppServices::InMemory { store, .. } => store.get_package(venue_id, package_id),
            #[cfg(feature = "postgres")]
            AppServices::Persistent { store, .. } => {
                let store = Arc::clone(store);
                run_blocking(move || store.get_package(venue_id, package_id)).await
            }
        }
    }

    /// Recipe rows for one package, in insertion order.
    pub async fn package_components(
        &self,
        venue_id: VenueId,
        package_id: PackageId,
    ) -> Result<Vec<PackageComponent>, StoreError> {
        let mut components = match self {
            AppServices::InMemory { store, .. } => store.list_components(venue_id)?,
            #[cfg(feature = "postgres")]
            AppServices::Persistent { store, .. } => {
                let store = Arc::clone(store);
                run_blocking(move || store.list_components(venue_id)).await?
            }
        };
        components.retain(|c| c.package_id == package_id);
        Ok(components)
    }

    /// Run one movement through the full ledger pipeline, then drop stale
    /// availability cache entries for every package the product feeds.
    pub async fn apply_movement(
        &self,
        tier: AuthorizationTier,
        manager_approved: bool,
        draft: MovementDraft,
    ) -> Result<StockMovement, LedgerError> {
        match self {
            AppServices::InMemory {
                ledger,
                availability,
                ..
            } => apply_and_invalidate(ledger, availability, tier, manager_approved, &draft),
            #[cfg(feature = "postgres")]
            AppServices::Persistent {
                ledger,
                availability,
                ..
            } => {
                let ledger = Arc::clone(ledger);
                let availability = Arc::clone(availability);
                run_blocking(move || {
                    apply_and_invalidate(&ledger, &availability, tier, manager_approved, &draft)
                })
                .await
            }
        }
    }

    pub async fn movements(
        &self,
        venue_id: VenueId,
        product_id: ProductId,
        filter: MovementFilter,
    ) -> Result<Vec<StockMovement>, LedgerError> {
        match self {
            AppServices::InMemory { ledger, .. } => ledger.movements(venue_id, product_id, &filter),
            #[cfg(feature = "postgres")]
            AppServices::Persistent { ledger, .. } => {
                let ledger = Arc::clone(ledger);
                run_blocking(move || ledger.movements(venue_id, product_id, &filter)).await
            }
        }
    }

    pub async fn package_availability(
        &self,
        venue_id: VenueId,
        package_id: PackageId,
    ) -> Result<AvailabilityResult, LedgerError> {
        match self {
            AppServices::InMemory { availability, .. } => {
                availability.package_availability(venue_id, package_id)
            }
            #[cfg(feature = "postgres")]
            AppServices::Persistent { availability, .. } => {
                let availability = Arc::clone(availability);
                run_blocking(move || availability.package_availability(venue_id, package_id)).await
            }
        }
    }

    pub async fn packages_availability(
        &self,
        venue_id: VenueId,
        package_ids: Vec<PackageId>,
    ) -> Result<Vec<AvailabilityResult>, LedgerError> {
        match self {
            AppServices::InMemory { availability, .. } => {
                availability.packages_availability(venue_id, &package_ids)
            }
            #[cfg(feature = "postgres")]
            AppServices::Persistent { availability, .. } => {
                let availability = Arc::clone(availability);
                run_blocking(move || availability.packages_availability(venue_id, &package_ids))
                    .await
            }
        }
    }

    pub async fn product_impact(
        &self,
        venue_id: VenueId,
        product_id: ProductId,
    ) -> Result<ProductImpact, LedgerError> {
        match self {
            AppServices::InMemory { availability, .. } => {
                availability.product_impact(venue_id, product_id)
            }
            #[cfg(feature = "postgres")]
            AppServices::Persistent { availability, .. } => {
                let availability = Arc::clone(availability);
                run_blocking(move || availability.product_impact(venue_id, product_id)).await
            }
        }
    }
}
