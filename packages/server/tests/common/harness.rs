//! Test harnesses for integration testing.
//!
//! `MatchingHarness` runs activities against the in-memory store and spy
//! notifier. `PgHarness` uses a shared Postgres container; the container and
//! migrations are initialized once on first use, then reused.

use anyhow::{Context, Result};
use sqlx::PgPool;
use swap_core::kernel::{ServerDeps, TestDependencies};
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use super::Scenario;

fn init_tracing() {
    // Run tests with: RUST_LOG=debug cargo test -- --nocapture
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// In-memory harness
// =============================================================================

/// # Example using test-context
///
/// ```ignore
/// #[test_context(MatchingHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &mut MatchingHarness) {
///     let (a, b) = ctx.scenario.mutual_pair();
///     ctx.test_deps.store.add_request(a);
///     // ...
/// }
/// ```
pub struct MatchingHarness {
    pub test_deps: TestDependencies,
    pub scenario: Scenario,
}

impl AsyncTestContext for MatchingHarness {
    async fn setup() -> Self {
        init_tracing();
        Self {
            test_deps: TestDependencies::new(),
            scenario: Scenario::new(),
        }
    }

    async fn teardown(self) {}
}

impl MatchingHarness {
    pub fn deps(&self) -> ServerDeps {
        self.test_deps.server_deps()
    }
}

// =============================================================================
// Postgres harness
// =============================================================================

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

/// Global shared infrastructure - initialized once, reused by all tests.
static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        init_tracing();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        // Run migrations once on the shared database
        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Each test gets a fresh pool on the shared database. Tests create their own
/// rows with fresh ids, so they do not step on each other.
pub struct PgHarness {
    pub db_pool: PgPool,
}

impl AsyncTestContext for PgHarness {
    async fn setup() -> Self {
        let infra = SharedTestInfra::get().await;
        let db_pool = PgPool::connect(&infra.db_url)
            .await
            .expect("Failed to connect to test database");
        Self { db_pool }
    }

    async fn teardown(self) {}
}
