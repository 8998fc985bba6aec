//! Selfie Capture Client
//!
//! Models the capture flow of the selfie kiosk as one explicit state value
//! (`Idle`, `Capturing`, `Captured`, `Uploading`) and submits finished
//! captures to the upload service as a multipart form.
//!
//! Camera access and transport sit behind the [`FrameSource`] and
//! [`UploadClient`] traits so the flow can be driven by a webcam, a file on
//! disk or a test double.

pub mod client;
pub mod config;
pub mod error;
pub mod frame;
pub mod session;

pub use client::{HttpUploadClient, UploadClient, UploadRequest};
pub use config::CaptureConfig;
pub use error::CaptureError;
pub use frame::{Frame, FrameSource, StillImageSource};
pub use session::{CaptureSession, CaptureState, UploadReceipt};
