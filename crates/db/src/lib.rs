//! Per-guild persistence for wishlist entries and reply style.

pub mod repositories;

pub use repositories::{
    InMemoryStyleRepository, InMemoryWishlistRepository, JsonStyleRepository,
    JsonWishlistRepository, RepositoryError, StyleRepository, WishlistRepository,
};
