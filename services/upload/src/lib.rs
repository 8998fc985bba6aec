//! Selfie Upload Service
//!
//! Accepts a multipart form carrying a person's name and a captured selfie,
//! encodes the image as base64 and stores both as one document in MongoDB.
//!
//! ## Endpoints
//!
//! - `POST /api/upload`: `name` text field plus a single `image` file part.
//!   Answers `{ success, message, id }` on success and
//!   `{ success: false, message }` on rejection or storage failure.
//! - `GET /health`, `GET /ready`: liveness and database reachability.
//!
//! ## Architecture
//!
//! ```text
//! Capture Client            Upload API                 MongoDB
//! ┌──────────────┐  POST   ┌──────────────┐ insertOne ┌──────────────┐
//! │ name + image │────────▶│ validate     │──────────▶│ selfies      │
//! └──────────────┘         │ base64 encode│           └──────────────┘
//!        ▲                 └──────────────┘
//!        └──────── { success, id } ─┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod selfie_store;

pub use api::{create_router, start_api_server, AppState};
pub use config::Config;
pub use error::{RequiredField, UploadError, UploadResponse};
pub use selfie_store::{MongoSelfieStore, NewSelfie, SelfieRecord, SelfieRepository, StoreError};
