mod db_types;
pub mod user_repository;
pub mod in_memory_user_repository;

pub use user_repository::PostgresUserRepository;
pub use in_memory_user_repository::InMemoryUserRepository;
