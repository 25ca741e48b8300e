use super::*;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response as AxumResponse},
    routing::post,
    Json, Router,
};
use shared::{
    domain::{CardId, DashboardId},
    error::ErrorCode,
};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    create_requests: Arc<Mutex<Vec<CreateCardRequest>>>,
    upload_parts: Arc<Mutex<Vec<(String, Option<String>, Option<String>, usize)>>>,
    fail_create: Arc<Mutex<bool>>,
    reject_validation: Arc<Mutex<bool>>,
}

async fn handle_create_card(
    State(state): State<ServerState>,
    Json(request): Json<CreateCardRequest>,
) -> Result<Json<CardPayload>, AxumResponse> {
    if *state.fail_create.lock().await {
        // Plain status, no decodable body.
        return Err((StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response());
    }
    if *state.reject_validation.lock().await {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(ErrorCode::Validation, "title must not be empty")),
        )
            .into_response());
    }
    state.create_requests.lock().await.push(request.clone());
    Ok(Json(CardPayload {
        card_id: CardId(314),
        assignee_user_id: request.assignee_user_id,
        dashboard_id: DashboardId(request.dashboard_id),
        column_id: request.column_id,
        title: request.title,
        description: request.description,
        due_date: request.due_date,
        tags: request.tags,
        image_url: request.image_url,
    }))
}

async fn handle_upload_image(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> Result<Json<ImageUploadResponse>, StatusCode> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(|value| value.to_string());
        let content_type = field.content_type().map(|value| value.to_string());
        let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        state
            .upload_parts
            .lock()
            .await
            .push((name, file_name, content_type, bytes.len()));
    }
    Ok(Json(ImageUploadResponse {
        image_url: "https://img.example/hosted.png".to_string(),
    }))
}

async fn spawn_board_server() -> Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/cards", post(handle_create_card))
        .route("/columns/:column_id/card-image", post(handle_upload_image))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn sample_request() -> CreateCardRequest {
    CreateCardRequest {
        assignee_user_id: 3222,
        dashboard_id: 7,
        column_id: ColumnId(3),
        title: "ship the board".to_string(),
        description: "cards must land in the right column".to_string(),
        due_date: "2024-05-01 13:45".to_string(),
        tags: vec!["urgent".to_string(), "design".to_string()],
        image_url: String::new(),
    }
}

#[tokio::test]
async fn create_card_posts_json_body_and_parses_the_created_card() {
    let (server_url, state) = spawn_board_server().await.expect("spawn server");
    let gateway = HttpRemoteDataGateway::new(server_url);

    let card = gateway.create_card(sample_request()).await.expect("create");

    assert_eq!(card.card_id, CardId(314));
    assert_eq!(card.title, "ship the board");

    let requests = state.create_requests.lock().await.clone();
    assert_eq!(requests, vec![sample_request()]);
}

#[tokio::test]
async fn upload_sends_exactly_one_part_under_the_image_field() {
    let (server_url, state) = spawn_board_server().await.expect("spawn server");
    let gateway = HttpRemoteDataGateway::new(server_url);

    let response = gateway
        .upload_card_image(
            ColumnId(3),
            ImageUpload {
                filename: "cover.png".to_string(),
                mime_type: Some("image/png".to_string()),
                bytes: vec![1, 2, 3, 4, 5],
            },
        )
        .await
        .expect("upload");

    assert_eq!(response.image_url, "https://img.example/hosted.png");

    let parts = state.upload_parts.lock().await.clone();
    assert_eq!(parts.len(), 1);
    let (name, file_name, content_type, len) = &parts[0];
    assert_eq!(name, "image");
    assert_eq!(file_name.as_deref(), Some("cover.png"));
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(*len, 5);
}

#[tokio::test]
async fn upload_without_declared_mime_type_still_carries_the_file() {
    let (server_url, state) = spawn_board_server().await.expect("spawn server");
    let gateway = HttpRemoteDataGateway::new(server_url);

    gateway
        .upload_card_image(
            ColumnId(3),
            ImageUpload {
                filename: "cover".to_string(),
                mime_type: None,
                bytes: vec![1, 2, 3],
            },
        )
        .await
        .expect("upload");

    let parts = state.upload_parts.lock().await.clone();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].0, "image");
    assert_eq!(parts[0].3, 3);
}

#[tokio::test]
async fn create_card_surfaces_http_error_statuses() {
    let (server_url, state) = spawn_board_server().await.expect("spawn server");
    *state.fail_create.lock().await = true;
    let gateway = HttpRemoteDataGateway::new(server_url);

    let err = gateway
        .create_card(sample_request())
        .await
        .expect_err("must fail");

    assert!(err.to_string().contains("500"));
    assert!(state.create_requests.lock().await.is_empty());
}

#[tokio::test]
async fn create_card_decodes_structured_error_bodies() {
    let (server_url, state) = spawn_board_server().await.expect("spawn server");
    *state.reject_validation.lock().await = true;
    let gateway = HttpRemoteDataGateway::new(server_url);

    let err = gateway
        .create_card(sample_request())
        .await
        .expect_err("must fail");

    let message = err.to_string();
    assert!(message.contains("Validation"), "got: {message}");
    assert!(message.contains("title must not be empty"), "got: {message}");
}
