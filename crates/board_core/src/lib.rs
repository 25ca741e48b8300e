use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use shared::{
    domain::{ColumnId, DashboardId, UserId},
    protocol::{CardPayload, CreateCardRequest, ImageUploadResponse},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod comments;
pub mod draft;
pub mod gateway;

pub use comments::{CommentEditSession, CommentMode, CommentStore, CommentThread};
pub use draft::{CardDraft, DraftField, DraftValidationError, TagCollector};
pub use gateway::HttpRemoteDataGateway;

/// A locally selected file, ready to be pushed to the server. Mirrors what
/// a file input hands over: raw bytes plus name and declared MIME type.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Network collaborator behind the card-creation surface. The server side
/// is out of scope; this is the whole contract the core consumes.
#[async_trait]
pub trait RemoteDataGateway: Send + Sync {
    async fn create_card(&self, request: CreateCardRequest) -> Result<CardPayload>;
    async fn upload_card_image(
        &self,
        column_id: ColumnId,
        image: ImageUpload,
    ) -> Result<ImageUploadResponse>;
}

pub struct MissingRemoteDataGateway;

#[async_trait]
impl RemoteDataGateway for MissingRemoteDataGateway {
    async fn create_card(&self, request: CreateCardRequest) -> Result<CardPayload> {
        Err(anyhow!(
            "remote data gateway unavailable for dashboard {}",
            request.dashboard_id
        ))
    }

    async fn upload_card_image(
        &self,
        column_id: ColumnId,
        _image: ImageUpload,
    ) -> Result<ImageUploadResponse> {
        Err(anyhow!(
            "remote data gateway unavailable for column {}",
            column_id.0
        ))
    }
}

/// Key of a cached query. List views subscribe to `cards(dashboard_id)`
/// and refetch when it is invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub scope: &'static str,
    pub dashboard_id: DashboardId,
}

impl QueryKey {
    pub fn cards(dashboard_id: DashboardId) -> Self {
        Self {
            scope: "cards",
            dashboard_id,
        }
    }
}

/// Invalidation is a pure signal, not a value write; concurrent
/// invalidations of the same key are idempotent by construction.
pub trait CardListCache: Send + Sync {
    fn invalidate(&self, key: &QueryKey);
}

pub struct NoopCardListCache;

impl CardListCache for NoopCardListCache {
    fn invalidate(&self, _key: &QueryKey) {}
}

#[derive(Debug, Error)]
pub enum CardModalError {
    #[error("{0}")]
    Validation(#[from] DraftValidationError),
    #[error("an image upload for this draft is still in flight")]
    UploadInFlight,
    #[error("a submission for this draft is already in flight")]
    SubmissionInFlight,
    #[error("image upload failed: {source}")]
    Upload { source: anyhow::Error },
    #[error("card creation failed: {source}")]
    Create { source: anyhow::Error },
}

#[derive(Debug, Clone)]
pub enum ModalEvent {
    ImageAttached { image_url: String },
    SubmissionSucceeded { card: CardPayload },
    SubmissionFailed { message: String },
    CloseRequested,
    Error(String),
}

struct ModalState {
    draft: CardDraft,
    tag_collector: TagCollector,
    upload_in_flight: bool,
    submit_in_flight: bool,
    // Bumped on close; async completions compare it before touching state
    // so a late response cannot mutate a discarded surface.
    epoch: u64,
}

/// Interaction core of the card-creation modal: binds the draft fields,
/// the tag collector and the upload pipeline, and turns them into exactly
/// one create request per user intent.
pub struct CardModalController {
    gateway: Arc<dyn RemoteDataGateway>,
    cache: Arc<dyn CardListCache>,
    dashboard_id: DashboardId,
    column_id: ColumnId,
    inner: Mutex<ModalState>,
    events: broadcast::Sender<ModalEvent>,
}

impl CardModalController {
    pub fn new(
        gateway: Arc<dyn RemoteDataGateway>,
        cache: Arc<dyn CardListCache>,
        dashboard_id: DashboardId,
        column_id: ColumnId,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            gateway,
            cache,
            dashboard_id,
            column_id,
            inner: Mutex::new(ModalState {
                draft: CardDraft::default(),
                tag_collector: TagCollector::new(),
                upload_in_flight: false,
                submit_in_flight: false,
                epoch: 0,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ModalEvent> {
        self.events.subscribe()
    }

    pub async fn set_assignee(&self, user_id: UserId) {
        self.inner.lock().await.draft.assignee_user_id = Some(user_id);
    }

    pub async fn set_title(&self, title: impl Into<String>) {
        self.inner.lock().await.draft.title = title.into();
    }

    pub async fn set_description(&self, description: impl Into<String>) {
        self.inner.lock().await.draft.description = description.into();
    }

    pub async fn set_due_date(&self, due_date: Option<NaiveDateTime>) {
        self.inner.lock().await.draft.due_date = due_date;
    }

    pub async fn tag_input_changed(&self, value: impl Into<String>) {
        self.inner.lock().await.tag_collector.input_changed(value);
    }

    pub async fn tag_key_pressed(&self, key: &str) {
        self.inner.lock().await.tag_collector.key_pressed(key);
    }

    /// Uploads a selected file to the owning column and stores the
    /// returned URL on the draft, replacing any prior image. Uploads are
    /// serialized per draft: a second selection while one is outstanding
    /// is rejected instead of racing last-writer-wins.
    pub async fn attach_image(&self, image: ImageUpload) -> Result<(), CardModalError> {
        let epoch = {
            let mut state = self.inner.lock().await;
            if state.upload_in_flight {
                return Err(CardModalError::UploadInFlight);
            }
            state.upload_in_flight = true;
            state.epoch
        };

        let result = self.gateway.upload_card_image(self.column_id, image).await;

        let mut state = self.inner.lock().await;
        if state.epoch != epoch {
            warn!(
                column_id = self.column_id.0,
                "card: dropping image upload completion for a closed modal"
            );
            return Ok(());
        }
        state.upload_in_flight = false;

        match result {
            Ok(response) => {
                state.draft.image_url = response.image_url.clone();
                drop(state);
                info!(column_id = self.column_id.0, "card: image attached to draft");
                let _ = self.events.send(ModalEvent::ImageAttached {
                    image_url: response.image_url,
                });
                Ok(())
            }
            Err(source) => {
                drop(state);
                warn!(column_id = self.column_id.0, "card: image upload failed: {source}");
                let _ = self
                    .events
                    .send(ModalEvent::Error(format!("image upload failed: {source}")));
                Err(CardModalError::Upload { source })
            }
        }
    }

    /// Composes and issues the create request. Refuses while a prior
    /// submission or an image upload is outstanding, and issues nothing
    /// when required fields are missing. On success: one cache
    /// invalidation for the dashboard's card list, then one close signal.
    /// On failure the draft is left intact so the user can retry.
    pub async fn submit(&self) -> Result<CardPayload, CardModalError> {
        let (request, epoch) = {
            let mut state = self.inner.lock().await;
            if state.submit_in_flight {
                return Err(CardModalError::SubmissionInFlight);
            }
            if state.upload_in_flight {
                return Err(CardModalError::UploadInFlight);
            }
            state.draft.validate()?;
            let request = state.draft.to_create_request(
                self.dashboard_id,
                self.column_id,
                state.tag_collector.tags().to_vec(),
            );
            state.submit_in_flight = true;
            (request, state.epoch)
        };

        info!(
            dashboard_id = self.dashboard_id.0,
            column_id = self.column_id.0,
            "card: submitting create request"
        );
        let result = self.gateway.create_card(request).await;

        let mut state = self.inner.lock().await;
        if state.epoch != epoch {
            warn!(
                dashboard_id = self.dashboard_id.0,
                "card: dropping create completion for a closed modal"
            );
            return result.map_err(|source| CardModalError::Create { source });
        }
        state.submit_in_flight = false;

        match result {
            Ok(card) => {
                drop(state);
                self.cache.invalidate(&QueryKey::cards(self.dashboard_id));
                info!(
                    dashboard_id = self.dashboard_id.0,
                    card_id = card.card_id.0,
                    "card: created; card list invalidated"
                );
                let _ = self
                    .events
                    .send(ModalEvent::SubmissionSucceeded { card: card.clone() });
                let _ = self.events.send(ModalEvent::CloseRequested);
                Ok(card)
            }
            Err(source) => {
                drop(state);
                warn!(
                    dashboard_id = self.dashboard_id.0,
                    "card: create request failed: {source}"
                );
                let _ = self.events.send(ModalEvent::SubmissionFailed {
                    message: source.to_string(),
                });
                Err(CardModalError::Create { source })
            }
        }
    }

    /// Teardown on dismissal or unmount. Resets every draft field and the
    /// tag list, and advances the epoch so in-flight completions apply
    /// nothing. The underlying requests are not aborted.
    pub async fn close(&self) {
        let mut state = self.inner.lock().await;
        state.epoch += 1;
        state.draft.reset();
        state.tag_collector.reset();
        state.upload_in_flight = false;
        state.submit_in_flight = false;
        info!(
            dashboard_id = self.dashboard_id.0,
            column_id = self.column_id.0,
            "card: modal closed; draft discarded"
        );
    }

    pub async fn draft(&self) -> CardDraft {
        self.inner.lock().await.draft.clone()
    }

    pub async fn tags(&self) -> Vec<String> {
        self.inner.lock().await.tag_collector.tags().to_vec()
    }

    pub async fn pending_tag_input(&self) -> String {
        self.inner.lock().await.tag_collector.current_input().to_string()
    }

    pub async fn image_url(&self) -> String {
        self.inner.lock().await.draft.image_url.clone()
    }

    pub async fn is_uploading(&self) -> bool {
        self.inner.lock().await.upload_in_flight
    }

    pub async fn is_submitting(&self) -> bool {
        self.inner.lock().await.submit_in_flight
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
