mod pg_pool;
mod repositories;

pub use repositories::{InMemoryConversationRepository, PgConversationRepository};

pub use pg_pool::{create_pool, run_migrations};
