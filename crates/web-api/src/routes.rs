use axum::{
    extract::{ws::WebSocketUpgrade, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use application::{
    LoginRequest, MessageDto, SendMessageRequest, SidebarUserDto, SignupRequest,
    UpdateProfileRequest, UserDto,
};
use domain::{MessageId, User, UserId};

use crate::{
    auth::{bearer_token, AuthUser, TokenError},
    error::ApiError,
    state::AppState,
    ws_connection::WebSocketConnection,
};

#[derive(Debug, Deserialize)]
struct SignupPayload {
    full_name: String,
    email: String,
    password: String,
    bio: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct UpdateProfilePayload {
    full_name: Option<String>,
    bio: Option<String>,
    profile_pic: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendMessagePayload {
    text: Option<String>,
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    user: UserDto,
    token: String,
}

#[derive(Debug, Serialize)]
struct UserResponse {
    user: UserDto,
}

#[derive(Debug, Serialize)]
struct SidebarResponse {
    users: Vec<SidebarUserDto>,
}

#[derive(Debug, Serialize)]
struct MessagesResponse {
    messages: Vec<MessageDto>,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: MessageDto,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .nest("/api/auth", auth_routes())
        .nest("/api/messages", message_routes())
        .route("/ws", get(websocket_upgrade))
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/check", get(check_auth))
        .route("/update-profile", put(update_profile))
}

fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(sidebar_users))
        .route("/{user_id}", get(conversation))
        .route("/mark/{message_id}", put(mark_seen))
        .route("/send/{user_id}", post(send_message))
        .route("/delete/{message_id}", delete(delete_message))
}

async fn status() -> &'static str {
    "Server is live"
}

fn auth_response(state: &AppState, user: &User) -> Result<AuthResponse, ApiError> {
    let token = state.jwt_service.generate_token(user.id).map_err(|err| {
        tracing::error!(error = %err, user_id = %user.id, "token 生成失败");
        ApiError::internal_server_error("token generation failed")
    })?;
    Ok(AuthResponse {
        user: UserDto::from(user),
        token,
    })
}

async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupPayload>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let user = state
        .user_service
        .signup(SignupRequest {
            full_name: payload.full_name,
            email: payload.email,
            password: payload.password,
            bio: payload.bio,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(auth_response(&state, &user)?)))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .user_service
        .login(LoginRequest {
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok(Json(auth_response(&state, &user)?))
}

async fn check_auth(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.user_service.get_user(user_id).await?;
    Ok(Json(UserResponse {
        user: UserDto::from(&user),
    }))
}

async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_service
        .update_profile(
            user_id,
            UpdateProfileRequest {
                full_name: payload.full_name,
                bio: payload.bio,
                profile_pic: payload.profile_pic,
            },
        )
        .await?;

    Ok(Json(UserResponse {
        user: UserDto::from(&user),
    }))
}

async fn sidebar_users(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SidebarResponse>, ApiError> {
    let users = state.message_service.sidebar_users(user_id).await?;
    Ok(Json(SidebarResponse { users }))
}

async fn conversation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(peer_id): Path<Uuid>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let messages = state
        .message_service
        .conversation(user_id, UserId::from(peer_id))
        .await?;

    Ok(Json(MessagesResponse {
        messages: messages.iter().map(MessageDto::from).collect(),
    }))
}

async fn mark_seen(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(message_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state
        .message_service
        .mark_seen(user_id, MessageId::from(message_id))
        .await?;

    Ok(Json(MessageResponse {
        message: MessageDto::from(&message),
    }))
}

async fn send_message(
    State(state): State<AppState>,
    AuthUser(sender_id): AuthUser,
    Path(receiver_id): Path<Uuid>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let message = state
        .message_service
        .send(
            sender_id,
            UserId::from(receiver_id),
            SendMessageRequest {
                text: payload.text,
                image_url: payload.image,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: MessageDto::from(&message),
        }),
    ))
}

async fn delete_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(message_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state
        .message_service
        .delete(user_id, MessageId::from(message_id))
        .await?;

    Ok(Json(MessageResponse {
        message: MessageDto::from(&message),
    }))
}

/// 握手前完成身份验证，token 可放在查询参数或 Authorization 头中
async fn websocket_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let token = match query.token.as_deref() {
        Some(token) => token,
        None => bearer_token(&headers)?.ok_or(TokenError::Missing)?,
    };
    let user_id = state.jwt_service.verify_token(token)?;

    Ok(ws.on_upgrade(move |socket| async move {
        WebSocketConnection::new(socket, state, user_id).run().await;
    }))
}
