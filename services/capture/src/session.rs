//! Capture session state machine.
//!
//! ```text
//!            start_capture             capture
//!   Idle ───────────────▶ Capturing ───────────▶ Captured ◀──┐
//!    ▲  ◀──── cancel ──────┘  ▲                  │  │       │ failure
//!    │                        └─ start_capture ──┘  │ upload │
//!    │◀────────────── cancel ───────────────────────┘  ▼     │
//!    └──────────────── success ───────────────────── Uploading
//! ```

use crate::client::{UploadClient, UploadRequest};
use crate::error::{CaptureError, IMAGE_REQUIRED, NAME_REQUIRED, UPLOAD_FAILED, UPLOAD_SUCCEEDED};
use crate::frame::{Frame, FrameSource};
use std::mem;
use tracing::{debug, info, warn};

/// Where the capture flow currently is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CaptureState {
    /// Nothing pending
    #[default]
    Idle,
    /// Camera open, waiting for a capture
    Capturing { name: String },
    /// A frame is pending, waiting for a name and upload
    Captured {
        frame: Frame,
        name: String,
        error: Option<String>,
    },
    /// Request in flight
    Uploading { frame: Frame, name: String },
}

impl CaptureState {
    fn label(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::Capturing { .. } => "capturing",
            CaptureState::Captured { .. } => "captured",
            CaptureState::Uploading { .. } => "uploading",
        }
    }

    /// Pending frame, if any
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            CaptureState::Captured { frame, .. } | CaptureState::Uploading { frame, .. } => {
                Some(frame)
            }
            _ => None,
        }
    }

    /// Current name input; empty when none is held
    pub fn name(&self) -> &str {
        match self {
            CaptureState::Idle => "",
            CaptureState::Capturing { name }
            | CaptureState::Captured { name, .. }
            | CaptureState::Uploading { name, .. } => name,
        }
    }

    /// Message to show the user, if any
    pub fn error(&self) -> Option<&str> {
        match self {
            CaptureState::Captured { error, .. } => error.as_deref(),
            _ => None,
        }
    }
}

/// Acknowledgement of a stored selfie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub id: String,
    pub message: &'static str,
}

/// Drives one user's capture flow
#[derive(Debug, Default)]
pub struct CaptureSession {
    state: CaptureState,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    fn invalid(&self, event: &'static str) -> CaptureError {
        CaptureError::InvalidTransition {
            event,
            state: self.state.label(),
        }
    }

    /// Open the camera, dropping any previous frame and error
    pub fn start_capture(&mut self) -> Result<(), CaptureError> {
        let name = match &mut self.state {
            CaptureState::Idle => String::new(),
            CaptureState::Captured { name, .. } => mem::take(name),
            _ => return Err(self.invalid("start capture")),
        };

        debug!("Camera started");
        self.state = CaptureState::Capturing { name };
        Ok(())
    }

    /// Take one still frame from `source`
    pub fn capture(&mut self, source: &mut dyn FrameSource) -> Result<(), CaptureError> {
        let CaptureState::Capturing { name } = &mut self.state else {
            return Err(self.invalid("capture"));
        };

        let frame = source.grab_frame()?;
        debug!(bytes = frame.data.len(), "Frame captured");

        self.state = CaptureState::Captured {
            frame,
            name: mem::take(name),
            error: None,
        };
        Ok(())
    }

    /// Discard the pending frame, name and error
    pub fn cancel(&mut self) -> Result<(), CaptureError> {
        match self.state {
            CaptureState::Capturing { .. } | CaptureState::Captured { .. } => {
                debug!("Capture cancelled");
                self.state = CaptureState::Idle;
                Ok(())
            }
            _ => Err(self.invalid("cancel")),
        }
    }

    /// Edit the name input of a captured selfie
    pub fn set_name(&mut self, value: impl Into<String>) -> Result<(), CaptureError> {
        match &mut self.state {
            CaptureState::Captured { name, .. } => {
                *name = value.into();
                Ok(())
            }
            _ => Err(self.invalid("set name")),
        }
    }

    /// Check the pending capture and move to `Uploading`.
    ///
    /// On a validation failure the state is left in place and the message is
    /// recorded for display; nothing is sent.
    pub fn begin_upload(&mut self) -> Result<UploadRequest, CaptureError> {
        let (frame, name, error) = match &mut self.state {
            CaptureState::Idle | CaptureState::Capturing { .. } => {
                return Err(CaptureError::Validation(IMAGE_REQUIRED));
            }
            CaptureState::Uploading { .. } => return Err(self.invalid("upload")),
            CaptureState::Captured { frame, name, error } => (frame, name, error),
        };

        let trimmed = name.trim();
        if trimmed.is_empty() {
            *error = Some(NAME_REQUIRED.to_string());
            return Err(CaptureError::Validation(NAME_REQUIRED));
        }

        let request = UploadRequest {
            name: trimmed.to_string(),
            frame: frame.clone(),
        };

        self.state = CaptureState::Uploading {
            frame: request.frame.clone(),
            name: mem::take(name),
        };
        Ok(request)
    }

    /// Apply the outcome of the request started by [`begin_upload`](Self::begin_upload)
    pub fn finish_upload(
        &mut self,
        outcome: Result<String, CaptureError>,
    ) -> Result<UploadReceipt, CaptureError> {
        let (frame, name) = match mem::take(&mut self.state) {
            CaptureState::Uploading { frame, name } => (frame, name),
            other => {
                self.state = other;
                return Err(self.invalid("finish upload"));
            }
        };

        match outcome {
            Ok(id) => {
                info!(id = %id, "{}", UPLOAD_SUCCEEDED);
                Ok(UploadReceipt {
                    id,
                    message: UPLOAD_SUCCEEDED,
                })
            }
            Err(e) => {
                warn!(error = %e, "{}", UPLOAD_FAILED);
                self.state = CaptureState::Captured {
                    frame,
                    name,
                    error: Some(UPLOAD_FAILED.to_string()),
                };
                Err(e)
            }
        }
    }

    /// Validate, send and settle one upload
    pub async fn upload<C>(&mut self, client: &C) -> Result<UploadReceipt, CaptureError>
    where
        C: UploadClient + ?Sized,
    {
        let request = self.begin_upload()?;
        let outcome = client.upload(request).await;
        self.finish_upload(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockUploadClient;

    struct FixedFrame(Vec<u8>);

    impl FrameSource for FixedFrame {
        fn grab_frame(&mut self) -> Result<Frame, CaptureError> {
            Ok(Frame::jpeg(self.0.clone()))
        }
    }

    struct BrokenCamera;

    impl FrameSource for BrokenCamera {
        fn grab_frame(&mut self) -> Result<Frame, CaptureError> {
            Err(CaptureError::Camera("no device".to_string()))
        }
    }

    fn captured_session(name: &str) -> CaptureSession {
        let mut session = CaptureSession::new();
        session.start_capture().unwrap();
        session.capture(&mut FixedFrame(vec![1, 2, 3])).unwrap();
        session.set_name(name).unwrap();
        session
    }

    #[test]
    fn test_capture_flow_reaches_captured() {
        let session = captured_session("Alice");

        assert_eq!(session.state().frame(), Some(&Frame::jpeg(vec![1, 2, 3])));
        assert_eq!(session.state().name(), "Alice");
        assert_eq!(session.state().error(), None);
    }

    #[tokio::test]
    async fn test_capture_then_cancel_resets_without_request() {
        let mut client = MockUploadClient::new();
        client.expect_upload().never();

        let mut session = captured_session("Alice");
        session.cancel().unwrap();

        assert_eq!(session.state(), &CaptureState::Idle);
        assert_eq!(session.state().name(), "");
        assert!(session.state().frame().is_none());
        assert!(matches!(
            session.upload(&client).await,
            Err(CaptureError::Validation(IMAGE_REQUIRED))
        ));
    }

    #[test]
    fn test_cancel_while_capturing() {
        let mut session = CaptureSession::new();
        session.start_capture().unwrap();
        session.cancel().unwrap();

        assert_eq!(session.state(), &CaptureState::Idle);
    }

    #[test]
    fn test_restart_clears_frame_and_error_but_keeps_name() {
        let mut session = captured_session("   ");
        assert!(session.begin_upload().is_err());
        session.set_name("Bob").unwrap();

        session.start_capture().unwrap();

        assert_eq!(
            session.state(),
            &CaptureState::Capturing {
                name: "Bob".to_string()
            }
        );
        session.capture(&mut FixedFrame(vec![9])).unwrap();
        assert_eq!(session.state().name(), "Bob");
        assert_eq!(session.state().error(), None);
    }

    #[test]
    fn test_camera_failure_keeps_capturing() {
        let mut session = CaptureSession::new();
        session.start_capture().unwrap();

        assert!(matches!(
            session.capture(&mut BrokenCamera),
            Err(CaptureError::Camera(_))
        ));
        assert!(matches!(session.state(), CaptureState::Capturing { .. }));
    }

    #[tokio::test]
    async fn test_blank_name_blocks_upload() {
        let mut client = MockUploadClient::new();
        client.expect_upload().never();

        let mut session = captured_session(" \t ");
        let result = session.upload(&client).await;

        assert!(matches!(result, Err(CaptureError::Validation(NAME_REQUIRED))));
        assert_eq!(session.state().error(), Some(NAME_REQUIRED));
        assert!(session.state().frame().is_some());
    }

    #[tokio::test]
    async fn test_successful_upload_sends_trimmed_name_and_resets() {
        let mut client = MockUploadClient::new();
        client
            .expect_upload()
            .times(1)
            .withf(|request| request.name == "Alice" && request.frame.data[..] == [1, 2, 3])
            .returning(|_| Ok("65f1c0ffee0000000000abcd".to_string()));

        let mut session = captured_session("  Alice ");
        let receipt = session.upload(&client).await.unwrap();

        assert_eq!(receipt.id, "65f1c0ffee0000000000abcd");
        assert_eq!(receipt.message, UPLOAD_SUCCEEDED);
        assert_eq!(session.state(), &CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_capture_for_retry() {
        let mut client = MockUploadClient::new();
        client
            .expect_upload()
            .times(1)
            .returning(|_| Err(CaptureError::Transport("connection refused".to_string())));

        let mut session = captured_session("Alice");
        let result = session.upload(&client).await;

        assert!(matches!(result, Err(CaptureError::Transport(_))));
        assert_eq!(session.state().frame(), Some(&Frame::jpeg(vec![1, 2, 3])));
        assert_eq!(session.state().name(), "Alice");
        assert_eq!(session.state().error(), Some(UPLOAD_FAILED));

        // Retry without recapturing
        let mut client = MockUploadClient::new();
        client
            .expect_upload()
            .times(1)
            .returning(|_| Ok("65f1c0ffee0000000000abce".to_string()));
        assert!(session.upload(&client).await.is_ok());
        assert_eq!(session.state(), &CaptureState::Idle);
    }

    #[test]
    fn test_begin_upload_moves_to_uploading() {
        let mut session = captured_session("Alice");
        let request = session.begin_upload().unwrap();

        assert_eq!(request.name, "Alice");
        assert!(matches!(session.state(), CaptureState::Uploading { .. }));
        assert!(matches!(
            session.begin_upload(),
            Err(CaptureError::InvalidTransition { state: "uploading", .. })
        ));
        assert!(matches!(
            session.cancel(),
            Err(CaptureError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_out_of_order_events_leave_state_untouched() {
        let mut session = CaptureSession::new();

        assert!(session.capture(&mut FixedFrame(vec![1])).is_err());
        assert!(session.set_name("Alice").is_err());
        assert!(session.cancel().is_err());
        assert!(session.finish_upload(Ok("id".to_string())).is_err());
        assert_eq!(session.state(), &CaptureState::Idle);

        session.start_capture().unwrap();
        assert!(matches!(
            session.start_capture(),
            Err(CaptureError::InvalidTransition { event: "start capture", state: "capturing" })
        ));
    }
}
