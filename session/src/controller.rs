//! Async session controller.
//!
//! Drives a [`Session`] against the backend gateway from a single task:
//! commands arrive over a channel and at most one submission future is
//! polled alongside them. Work is strictly event-driven; suspension points
//! are the network call and nothing else. Switching mode while a request
//! is in flight drops the submission future (aborting the HTTP call) and
//! bumps the session generation so a late completion cannot clobber newer
//! state.

use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};
use voiceid_gateway::Client;

use crate::asset::AudioAsset;
use crate::directory::Directory;
use crate::error::SessionError;
use crate::session::{Mode, Outcome, Session, SessionSnapshot, SubmitRequest};

type SubmitReply = oneshot::Sender<Result<Option<Outcome>, SessionError>>;
type SubmissionFuture = BoxFuture<'static, Result<Outcome, voiceid_gateway::Error>>;

enum Command {
    Stage {
        asset: AudioAsset,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    SetSubject {
        name: String,
        reply: oneshot::Sender<()>,
    },
    SwitchMode {
        mode: Mode,
        reply: oneshot::Sender<bool>,
    },
    Submit {
        reply: SubmitReply,
    },
    ReloadDirectory {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Users {
        reply: oneshot::Sender<Vec<String>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

struct InFlight {
    generation: u64,
    name: String,
    task: SubmissionFuture,
    reply: SubmitReply,
}

/// Session controller: owns the session, the user directory, and the
/// backend client.
pub struct SessionController {
    session: Session,
    directory: Directory,
    client: Client,
}

impl SessionController {
    /// Creates a controller with a fresh session and empty directory.
    pub fn new(client: Client) -> Self {
        Self {
            session: Session::new(),
            directory: Directory::new(),
            client,
        }
    }

    /// Spawns the controller event loop and returns a handle to it.
    ///
    /// The loop runs until every handle is dropped.
    pub fn spawn(self) -> ControllerHandle {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(self.run(rx));
        ControllerHandle { tx }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        enum Step {
            Cmd(Option<Command>),
            Done(Result<Outcome, voiceid_gateway::Error>),
        }

        let mut inflight: Option<InFlight> = None;

        loop {
            let step = tokio::select! {
                cmd = rx.recv() => Step::Cmd(cmd),
                result = async {
                    match inflight.as_mut() {
                        Some(pending) => pending.task.as_mut().await,
                        None => std::future::pending().await,
                    }
                } => Step::Done(result),
            };

            match step {
                Step::Cmd(None) => break,
                Step::Cmd(Some(cmd)) => self.handle(cmd, &mut inflight).await,
                Step::Done(result) => {
                    // The completion branch only fires while a request is
                    // in flight.
                    if let Some(pending) = inflight.take() {
                        self.complete(pending.generation, pending.name, result, pending.reply);
                    }
                }
            }
        }
        tracing::debug!("session controller stopped");
    }

    async fn handle(&mut self, cmd: Command, inflight: &mut Option<InFlight>) {
        match cmd {
            Command::Stage { asset, reply } => {
                let _ = reply.send(self.session.stage(asset));
            }
            Command::SetSubject { name, reply } => {
                self.session.set_subject(name);
                let _ = reply.send(());
            }
            Command::SwitchMode { mode, reply } => {
                let cancelled = self.session.switch_mode(mode);
                if cancelled && let Some(pending) = inflight.take() {
                    // Dropping the future aborts the HTTP call; the waiter
                    // learns the submission produced no outcome.
                    let _ = pending.reply.send(Ok(None));
                }
                let _ = reply.send(cancelled);
            }
            Command::Submit { reply } => match self.session.begin_submit(&self.directory) {
                Err(e) => {
                    let _ = reply.send(Err(e.into()));
                }
                Ok(None) => {
                    let _ = reply.send(Ok(None));
                }
                Ok(Some(req)) => {
                    let generation = req.generation;
                    let name = req.name.clone();
                    let client = self.client.clone();
                    let task: SubmissionFuture = Box::pin(perform(client, req));
                    *inflight = Some(InFlight {
                        generation,
                        name,
                        task,
                        reply,
                    });
                }
            },
            Command::ReloadDirectory { reply } => {
                let _ = reply.send(self.directory.load(&self.client).await);
            }
            Command::Users { reply } => {
                let _ = reply.send(self.directory.names());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.session.snapshot());
            }
        }
    }

    fn complete(
        &mut self,
        generation: u64,
        name: String,
        result: Result<Outcome, voiceid_gateway::Error>,
        reply: SubmitReply,
    ) {
        let machine_result = match &result {
            Ok(outcome) => Ok(outcome.clone()),
            Err(e) => Err(e.to_string()),
        };

        let applied = self.session.resolve(generation, machine_result);
        if !applied {
            let _ = reply.send(Ok(None));
            return;
        }

        match result {
            Ok(outcome) => {
                if matches!(outcome, Outcome::Enrolled { .. }) {
                    self.directory.record_enrollment(&name);
                }
                let _ = reply.send(Ok(Some(outcome)));
            }
            Err(e) => {
                let _ = reply.send(Err(SessionError::Request(e)));
            }
        }
    }
}

/// Performs the network call described by a submit request.
async fn perform(client: Client, req: SubmitRequest) -> Result<Outcome, voiceid_gateway::Error> {
    match req.mode {
        Mode::Enroll => {
            let enrollment = client.train(&req.name, req.audio, &req.filename).await?;
            Ok(Outcome::Enrolled {
                message: enrollment.message,
            })
        }
        Mode::Verify => {
            let verdict = client.predict(&req.name, req.audio, &req.filename).await?;
            Ok(if verdict.is_match() {
                Outcome::Matched
            } else {
                Outcome::NotMatched
            })
        }
    }
}

/// Cloneable handle to a spawned [`SessionController`].
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<Command>,
}

impl ControllerHandle {
    async fn send<R>(
        &self,
        cmd: Command,
        rx: oneshot::Receiver<R>,
    ) -> Result<R, SessionError> {
        self.tx.send(cmd).await.map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Stages a validated asset, replacing any previous one.
    pub async fn stage(&self, asset: AudioAsset) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stage { asset, reply }, rx).await?
    }

    /// Sets the subject name.
    pub async fn set_subject(&self, name: impl Into<String>) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(
            Command::SetSubject {
                name: name.into(),
                reply,
            },
            rx,
        )
        .await
    }

    /// Switches the operating mode. Returns true if an in-flight request
    /// was cancelled.
    pub async fn switch_mode(&self, mode: Mode) -> Result<bool, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SwitchMode { mode, reply }, rx).await
    }

    /// Submits the staged asset.
    ///
    /// Returns `Ok(None)` when the submit was a no-op (a request was
    /// already in flight) or the request was cancelled by a mode switch
    /// before completing.
    pub async fn submit(&self) -> Result<Option<Outcome>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Submit { reply }, rx).await?
    }

    /// Fetches the user directory from the backend, replacing the cache.
    /// A failure is non-fatal; the previous cache content is kept.
    pub async fn reload_directory(&self) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ReloadDirectory { reply }, rx).await?
    }

    /// Returns the cached enrolled names.
    pub async fn users(&self) -> Result<Vec<String>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Users { reply }, rx).await
    }

    /// Returns a snapshot of the current session state.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }, rx).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        extract::State,
        response::Json,
        routing::{get, post},
        Router,
    };
    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::asset;
    use crate::error::ValidationError;
    use crate::session::SessionState;

    #[derive(Clone)]
    struct Backend {
        users: Vec<&'static str>,
        train_calls: Arc<AtomicUsize>,
        predict_calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    async fn spawn_backend(users: Vec<&'static str>, delay: Duration) -> (String, Backend) {
        let backend = Backend {
            users,
            train_calls: Arc::new(AtomicUsize::new(0)),
            predict_calls: Arc::new(AtomicUsize::new(0)),
            delay,
        };

        let app = Router::new()
            .route(
                "/users",
                get(|State(b): State<Backend>| async move { Json(json!({ "users": b.users })) }),
            )
            .route(
                "/train-model",
                post(|State(b): State<Backend>| async move {
                    b.train_calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(b.delay).await;
                    Json(json!({ "message": "model trained" }))
                }),
            )
            .route(
                "/predict",
                post(|State(b): State<Backend>| async move {
                    b.predict_calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(b.delay).await;
                    Json(json!({ "prediction": false }))
                }),
            )
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), backend)
    }

    fn spawn_controller(base_url: &str) -> ControllerHandle {
        let client = Client::builder(base_url).max_retries(0).build().unwrap();
        SessionController::new(client).spawn()
    }

    fn wav_asset(name: &str) -> AudioAsset {
        let bytes = Bytes::from(voiceid_capture::wav::encode_wav(&[0i16; 160], 16_000, 1).unwrap());
        asset::acquire_picked(bytes, "audio/wav", name).unwrap()
    }

    #[tokio::test]
    async fn enroll_end_to_end() {
        let (base, backend) = spawn_backend(vec![], Duration::ZERO).await;
        let handle = spawn_controller(&base);
        handle.reload_directory().await.unwrap();

        handle.stage(wav_asset("bob.wav")).await.unwrap();
        handle.set_subject("bob").await.unwrap();

        let outcome = handle.submit().await.unwrap();
        assert!(matches!(outcome, Some(Outcome::Enrolled { .. })));

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, SessionState::Idle);
        assert!(snapshot.staged.is_none());
        assert_eq!(handle.users().await.unwrap(), vec!["bob".to_string()]);
        assert_eq!(backend.train_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn enrollment_never_duplicates_directory_entries() {
        let (base, _) = spawn_backend(vec!["alice"], Duration::ZERO).await;
        let handle = spawn_controller(&base);
        handle.reload_directory().await.unwrap();

        handle.stage(wav_asset("alice.wav")).await.unwrap();
        handle.set_subject("alice").await.unwrap();
        handle.submit().await.unwrap();

        assert_eq!(handle.users().await.unwrap(), vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn verify_unknown_subject_issues_no_request() {
        let (base, backend) = spawn_backend(vec!["bob"], Duration::ZERO).await;
        let handle = spawn_controller(&base);
        handle.reload_directory().await.unwrap();
        handle.switch_mode(Mode::Verify).await.unwrap();

        handle.stage(wav_asset("carol.wav")).await.unwrap();
        handle.set_subject("carol").await.unwrap();

        let err = handle.submit().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Validation(ValidationError::UnknownSubject { .. })
        ));
        assert_eq!(backend.predict_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn negative_verdict_completes_successfully() {
        let (base, _) = spawn_backend(vec!["bob"], Duration::ZERO).await;
        let handle = spawn_controller(&base);
        handle.reload_directory().await.unwrap();
        handle.switch_mode(Mode::Verify).await.unwrap();

        handle.stage(wav_asset("sample.wav")).await.unwrap();
        handle.set_subject("bob").await.unwrap();

        let outcome = handle.submit().await.unwrap();
        assert_eq!(outcome, Some(Outcome::NotMatched));

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, SessionState::Succeeded);
        assert!(snapshot.error_message.is_none());
    }

    #[tokio::test]
    async fn mode_switch_cancels_in_flight_request() {
        let (base, _) = spawn_backend(vec![], Duration::from_secs(10)).await;
        let handle = spawn_controller(&base);

        handle.stage(wav_asset("bob.wav")).await.unwrap();
        handle.set_subject("bob").await.unwrap();

        let submitter = handle.clone();
        let pending = tokio::spawn(async move { submitter.submit().await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let cancelled = handle.switch_mode(Mode::Verify).await.unwrap();
        assert!(cancelled);

        // The cancelled submission resolves to no outcome.
        assert_eq!(pending.await.unwrap().unwrap(), None);

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.mode, Mode::Verify);
        assert_eq!(snapshot.state, SessionState::Idle);
        assert!(snapshot.last_result.is_none());
        assert!(snapshot.error_message.is_none());
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_a_noop() {
        let (base, backend) = spawn_backend(vec![], Duration::from_secs(10)).await;
        let handle = spawn_controller(&base);

        handle.stage(wav_asset("bob.wav")).await.unwrap();
        handle.set_subject("bob").await.unwrap();

        let submitter = handle.clone();
        let pending = tokio::spawn(async move { submitter.submit().await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Second submit resolves immediately without queuing a request.
        assert_eq!(handle.submit().await.unwrap(), None);
        assert_eq!(backend.train_calls.load(Ordering::SeqCst), 1);

        handle.switch_mode(Mode::Verify).await.unwrap();
        let _ = pending.await.unwrap();
    }

    #[tokio::test]
    async fn request_failure_permits_retry() {
        // Backend that fails the first train call, then succeeds.
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_handler = calls.clone();
        let app = Router::new()
            .route(
                "/train-model",
                post(move || {
                    let calls = calls_handler.clone();
                    async move {
                        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                            (
                                axum::http::StatusCode::BAD_GATEWAY,
                                Json(json!({ "error": "backend starting" })),
                            )
                        } else {
                            (
                                axum::http::StatusCode::OK,
                                Json(json!({ "message": "model trained" })),
                            )
                        }
                    }
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let handle = spawn_controller(&format!("http://{addr}"));
        handle.stage(wav_asset("bob.wav")).await.unwrap();
        handle.set_subject("bob").await.unwrap();

        let err = handle.submit().await.unwrap_err();
        assert!(matches!(err, SessionError::Request(_)));
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, SessionState::Failed);
        assert!(snapshot.staged.is_some());

        // Retry without re-staging.
        let outcome = handle.submit().await.unwrap();
        assert!(matches!(outcome, Some(Outcome::Enrolled { .. })));
    }

    #[tokio::test]
    async fn directory_failure_degrades_to_empty_set() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let handle = spawn_controller(&format!("http://{addr}"));
        let err = handle.reload_directory().await.unwrap_err();
        assert!(matches!(err, SessionError::DirectoryUnavailable(_)));

        // Verify mode degrades: every subject is unknown.
        handle.switch_mode(Mode::Verify).await.unwrap();
        handle.stage(wav_asset("sample.wav")).await.unwrap();
        handle.set_subject("bob").await.unwrap();
        assert!(handle.submit().await.unwrap_err().is_validation());
        assert!(handle.users().await.unwrap().is_empty());
    }
}
