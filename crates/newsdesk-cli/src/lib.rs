//! # Newsdesk CLI
//!
//! Administrative operations used by the `newsdesk-cli` binary.
//!
//! The functions work against the store traits, so they run the same way
//! against Postgres and against the in-memory store.
//!
//! ```ignore
//! use newsdesk_cli::commands::create_admin;
//!
//! let user = create_admin(&store, "Ada", "ada@example.com", "s3cret-pass").await?;
//! ```

pub mod commands;
