//! User accounts: the entity, its storage, and the registration/login flows.

pub mod model;
pub mod repository;
pub mod service;

pub use model::{
    LoginRequest, RegisterRequest, UpdateUserRequest, User, UserChanges, UserResponse,
};
pub use repository::{InMemoryUserRepository, UserError, UserRepository};
pub use service::UserService;
