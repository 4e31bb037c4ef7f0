// Life of a login:
// 1. JSON body comes in on /api/v1/auth/login
// 2. Look up the user, verify the password on the hashing pool
// 3. Issue a signed token and return it
//
// Life of a protected request:
// 1. require_auth pulls the bearer token and validates it
// 2. The Principal is attached to the request extensions
// 3. require_role (admin routes only) checks the role
// 4. The handler runs
//
// System components:
//  - TokenManager (signing/validation)
//  - CredentialHasher + HashingPool (argon2 off the request threads)
//  - Authorization gate (axum middleware)
//  - User service over an injected repository

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod time;
pub mod users;


pub use server::{AppState, build_router};
