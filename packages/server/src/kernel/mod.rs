//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod notifier;
pub mod pg_store;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use notifier::PushMatchNotifier;
pub use pg_store::PgMatchStore;
pub use scheduled_tasks::start_scheduler;
pub use test_dependencies::TestDependencies;
pub use traits::*;
