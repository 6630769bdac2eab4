pub mod cart_repository;
pub mod inventory_store;
pub mod order_repository;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),

    /// The cart was modified by another session between read and write.
    #[error("cart version conflict for owner {0}")]
    VersionConflict(uuid::Uuid),
}
