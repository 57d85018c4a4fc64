//! Storage Adapters
//!
//! Implementations of the UserRepository port.
//!
//! ## Available Adapters
//!
//! - **JsonDocumentStore** - Whole-document JSON file, loaded at startup
//! - **InMemoryUserRepository** - Stores users in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{InMemoryUserRepository, JsonDocumentStore};
//!
//! // Production: file-backed document
//! let repository = JsonDocumentStore::open("./data/local_db.json").await?;
//!
//! // Testing: in-memory storage
//! let repository = InMemoryUserRepository::new();
//! ```

mod in_memory_user_repository;
mod json_document_store;

pub use in_memory_user_repository::InMemoryUserRepository;
pub use json_document_store::JsonDocumentStore;
