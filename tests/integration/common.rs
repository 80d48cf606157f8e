//! Shared fixtures

#![allow(dead_code)]

use std::sync::Arc;

use uuid::Uuid;

use bookshelf_server::{
    config::AuthConfig,
    models::{
        book::CreateBook,
        load_report::BookSeed,
        user::{Identity, Role},
    },
    repository::{MemoryStore, Repository},
    services::Services,
};

pub fn memory_services() -> Services {
    let repository: Repository = Arc::new(MemoryStore::new());
    Services::new(repository, test_auth_config())
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-test-secret".to_string(),
        jwt_expiration_hours: 1,
    }
}

pub fn dune() -> CreateBook {
    CreateBook {
        external_id: Some("b1".to_string()),
        title: "Dune".to_string(),
        author: "Frank Herbert".to_string(),
        synopsis: "A desert planet and the spice that binds an empire.".to_string(),
    }
}

pub fn book_seed(external_id: &str, title: &str) -> BookSeed {
    BookSeed {
        external_id: external_id.to_string(),
        title: title.to_string(),
        author: "Frank Herbert".to_string(),
        synopsis: format!("Synopsis of {}", title),
    }
}

pub fn admin() -> Identity {
    Identity {
        user_id: Uuid::new_v4(),
        email: "admin@example.com".to_string(),
        role: Role::Admin,
    }
}

/// A fresh non-admin caller
pub fn reader() -> Identity {
    Identity {
        user_id: Uuid::new_v4(),
        email: "reader@example.com".to_string(),
        role: Role::User,
    }
}
