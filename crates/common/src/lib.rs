//! Common utilities and shared types for inkwell.
//!
//! This crate provides foundational components used across all inkwell crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Status messages**: One-shot [`Flash`] messages attached to responses
//! - **Tokens**: Salted, signed, timestamped tokens via [`TokenSigner`]
//! - **Storage**: Local file storage for uploads
//!
//! # Example
//!
//! ```no_run
//! use inkwell_common::{AppResult, Config, TokenSigner, token::SESSION_SALT};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let signer = TokenSigner::new(&config.auth.secret_key, SESSION_SALT);
//!     let token = signer.issue(&42, config.auth.session_ttl_secs)?;
//!     println!("Session token: {token}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod flash;
pub mod storage;
pub mod token;

pub use config::Config;
pub use error::{AppError, AppResult, DuplicateField, FieldErrors};
pub use flash::{Flash, FlashCategory};
pub use storage::{LocalStorage, generate_storage_key};
pub use token::{TokenError, TokenSigner};
