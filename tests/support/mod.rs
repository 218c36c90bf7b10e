//! In-process stub of the image service
//!
//! Serves the `/v1/images/` REST resource, both event streams and a tiny
//! object bucket on an ephemeral port. Tests push events explicitly and can
//! count the requests that reached the server.

#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use henkan_client::{
    ClientConfig, CreateImageRequest, CreateImageResponse, Image, ImageApiClient, ImageMetadata,
    ImageStatus, ListImagesResponse, MessageResponse, ObjectStorage, UpdateImageRequest,
};

type EventSender = mpsc::Sender<Result<Event, Infallible>>;

struct Subscriber {
    /// `None` for the global stream
    image_id: Option<String>,
    tx: EventSender,
}

#[derive(Default)]
pub struct StubState {
    images: Mutex<Vec<Image>>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    subscribers: Mutex<Vec<Subscriber>>,
    requests: AtomicUsize,
}

impl StubState {
    fn hit(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    fn find(&self, id: &str) -> Option<Image> {
        self.images.lock().unwrap().iter().find(|i| i.id == id).cloned()
    }
}

pub struct StubServer {
    pub base_url: String,
    state: Arc<StubState>,
}

impl StubServer {
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        let app = Router::new()
            .route("/v1/images/", get(list_images).post(create_image).put(update_image))
            .route("/v1/images/sse", get(stream_all))
            .route("/v1/images/{id}", get(get_image).delete(delete_image))
            .route("/v1/images/{id}/metadata", get(get_metadata))
            .route("/v1/images/{id}/sse", get(stream_one))
            .route("/images/{*key}", get(get_object))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url, &format!("{}/images", self.base_url)).unwrap()
    }

    pub fn client(&self) -> ImageApiClient {
        ImageApiClient::new(&self.config()).unwrap()
    }

    pub fn storage(&self) -> ObjectStorage {
        ObjectStorage::new(&self.config()).unwrap()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    pub fn insert_image(&self, image: Image) {
        self.state.images.lock().unwrap().push(image);
    }

    pub fn insert_object(&self, key: &str, bytes: &[u8]) {
        self.state
            .objects
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
    }

    pub fn set_status(&self, id: &str, status: ImageStatus) -> Image {
        let mut images = self.state.images.lock().unwrap();
        let image = images.iter_mut().find(|i| i.id == id).unwrap();
        image.status = status;
        if status.is_done() {
            image.transformed_image_key = Some(format!("transformed/{}.png", id));
        }
        image.updated_at = Utc::now();
        image.clone()
    }

    /// Mark an image failed, returning the updated record.
    pub fn fail_image(&self, id: &str, reason: &str) -> Image {
        let mut images = self.state.images.lock().unwrap();
        let image = images.iter_mut().find(|i| i.id == id).unwrap();
        image.status = ImageStatus::Failed;
        image.error_message = Some(reason.to_string());
        image.updated_at = Utc::now();
        image.clone()
    }

    pub fn image_ids(&self) -> Vec<String> {
        self.state
            .images
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.id.clone())
            .collect()
    }

    /// Wait until `count` streams are connected.
    pub async fn wait_for_subscribers(&self, count: usize) {
        for _ in 0..200 {
            if self.state.subscribers.lock().unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {} subscriber(s)", count);
    }

    /// Push an image to the global stream and to its own stream.
    pub async fn push(&self, image: &Image) {
        let data = serde_json::to_string(image).unwrap();
        self.send_where(|s| s.image_id.as_deref().is_none_or(|id| id == image.id), || {
            Event::default().data(data.clone())
        })
        .await;
    }

    /// Push an arbitrary `data:` payload to every subscriber.
    pub async fn push_raw(&self, data: &str) {
        self.send_where(|_| true, || Event::default().data(data)).await;
    }

    pub async fn push_named(&self, name: &str, data: &str) {
        self.send_where(|_| true, || Event::default().event(name).data(data))
            .await;
    }

    pub async fn push_comment(&self, text: &str) {
        self.send_where(|_| true, || Event::default().comment(text)).await;
    }

    /// End every open stream from the server side.
    pub fn disconnect_all(&self) {
        self.state.subscribers.lock().unwrap().clear();
    }

    async fn send_where<P, E>(&self, predicate: P, event: E)
    where
        P: Fn(&Subscriber) -> bool,
        E: Fn() -> Event,
    {
        let targets: Vec<EventSender> = self
            .state
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .filter(|s| predicate(s))
            .map(|s| s.tx.clone())
            .collect();
        for tx in targets {
            let _ = tx.send(Ok(event())).await;
        }
    }
}

pub fn new_image(id: &str, url: &str) -> Image {
    let now = Utc::now();
    Image {
        id: id.to_string(),
        original_image_url: url.to_string(),
        object_storage_image_key: format!("originals/{}.png", id),
        transformed_image_key: None,
        mime_type: "image/png".to_string(),
        checksum: String::new(),
        status: ImageStatus::Pending,
        error_message: None,
        transformations: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

#[derive(Deserialize)]
struct ListParams {
    page: Option<u32>,
    limit: Option<u32>,
}

async fn list_images(
    State(state): State<Arc<StubState>>,
    Query(params): Query<ListParams>,
) -> Json<ListImagesResponse> {
    state.hit();
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let images = state.images.lock().unwrap();
    let data = images
        .iter()
        .skip(((page - 1) * limit) as usize)
        .take(limit as usize)
        .cloned()
        .collect();
    Json(ListImagesResponse {
        page,
        limit,
        count: images.len() as u64,
        data,
    })
}

async fn create_image(
    State(state): State<Arc<StubState>>,
    Json(request): Json<CreateImageRequest>,
) -> Json<CreateImageResponse> {
    state.hit();
    let id = uuid::Uuid::new_v4().to_string();
    let mut image = new_image(&id, &request.image_url);
    image.transformations = request.transformations;
    state.images.lock().unwrap().push(image);
    Json(CreateImageResponse { id })
}

async fn update_image(
    State(state): State<Arc<StubState>>,
    Json(request): Json<UpdateImageRequest>,
) -> Result<Json<MessageResponse>, StatusCode> {
    state.hit();
    let mut images = state.images.lock().unwrap();
    let image = images
        .iter_mut()
        .find(|i| i.id == request.id)
        .ok_or(StatusCode::NOT_FOUND)?;
    image.transformations = request.transformations;
    image.status = ImageStatus::Pending;
    image.updated_at = Utc::now();
    Ok(Json(MessageResponse {
        message: "Image updated successfully".to_string(),
    }))
}

async fn get_image(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
) -> Result<Json<Image>, StatusCode> {
    state.hit();
    state.find(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn get_metadata(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
) -> Result<Json<ImageMetadata>, StatusCode> {
    state.hit();
    let image = state.find(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(ImageMetadata {
        id: image.id,
        original_image_url: image.original_image_url,
        object_storage_image_key: image.object_storage_image_key,
        transformed_image_key: image.transformed_image_key,
        mime_type: image.mime_type,
        status: image.status,
        checksum: image.checksum,
        error_message: image.error_message,
        transformation_count: image.transformations.len(),
        updated_at: image.updated_at,
        created_at: image.created_at,
    }))
}

async fn delete_image(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, StatusCode> {
    state.hit();
    let mut images = state.images.lock().unwrap();
    let before = images.len();
    images.retain(|i| i.id != id);
    if images.len() == before {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(MessageResponse {
        message: "Image deleted successfully".to_string(),
    }))
}

fn subscribe(state: &StubState, image_id: Option<String>) -> Sse<ReceiverStream<Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel(100);
    state.subscribers.lock().unwrap().push(Subscriber { image_id, tx });
    Sse::new(ReceiverStream::new(rx))
}

async fn stream_all(
    State(state): State<Arc<StubState>>,
) -> Sse<ReceiverStream<Result<Event, Infallible>>> {
    state.hit();
    subscribe(&state, None)
}

async fn stream_one(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
) -> Response {
    state.hit();
    if state.find(&id).is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }
    subscribe(&state, Some(id)).into_response()
}

async fn get_object(
    State(state): State<Arc<StubState>>,
    Path(key): Path<String>,
) -> Response {
    state.hit();
    match state.objects.lock().unwrap().get(&key) {
        Some(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
