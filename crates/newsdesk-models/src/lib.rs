//! # Newsdesk Models
//!
//! Domain models and DTOs for the Newsdesk API.
//!
//! # Modules
//!
//! - [`auth`]: login request/response bodies
//! - [`ids`]: the [`UserId`] newtype
//! - [`roles`]: roles, [`Grants`] and the loaded [`Principal`]
//! - [`users`]: user records and account status

pub mod auth;
pub mod ids;
pub mod roles;
pub mod users;

pub use auth::{LoginRequest, LoginResponse, MeResponse, MessageResponse};
pub use ids::UserId;
pub use roles::{Grants, Principal, Role, RolePermissionsResponse, UpdateRolePermissionsDto};
pub use users::{AccountStatus, NewUser, User, UserCredentials};
