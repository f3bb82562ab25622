use crate::{
    auth::{
        auth_dto::{
            AckResponse, AuthResponse, ChangePasswordRequest, LoginRequest, RefreshResponse,
            RegisterRequest,
        },
        auth_handlers,
    },
    chatbot::{
        chatbot_dto::{ChatRequest, ChatResponse, ChatbotHealthResponse, SuggestionsResponse},
        chatbot_handlers,
    },
    interview::{
        interview_dto::{
            GenerateInterviewRequest, GeneratedInterviewResponse, InterviewDetail,
            InterviewStatsResponse, InterviewSummary, InterviewView, QuestionDetail,
            QuestionResult, QuestionView, SubmissionResponse, SubmissionResults,
            SubmitInterviewRequest,
        },
        interview_handlers, Difficulty, InterviewStatus,
    },
    message::{
        message_dto::{
            ConversationEntry, DeleteMessageResponse, MarkConversationReadResponse,
            SendMessageRequest, UnreadCountResponse,
        },
        message_handlers, MessageResponse, MessageType,
    },
    middleware::auth_middleware,
    pagination::{InterviewPage, MessagePage},
    state::AppState,
    upload::{upload_handlers, UploadResponse, MAX_UPLOAD_BYTES},
    user::{
        user_dto::{FollowResponse, ProfileUpdatedResponse, UpdateProfileRequest},
        user_handlers, UserResponse, UserRole, UserSummary,
    },
    websocket::{
        types::{ErrorPayload, RegisteredPayload},
        ClientMessage, WsMessage,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::auth::auth_handlers::register,
        crate::auth::auth_handlers::login,
        crate::auth::auth_handlers::me,
        crate::auth::auth_handlers::refresh,
        crate::auth::auth_handlers::logout,
        crate::auth::auth_handlers::change_password,
        crate::user::user_handlers::get_user,
        crate::user::user_handlers::search_users,
        crate::user::user_handlers::update_profile,
        crate::user::user_handlers::toggle_follow,
        crate::user::user_handlers::get_followers,
        crate::user::user_handlers::get_following,
        crate::user::user_handlers::get_suggestions,
        crate::message::message_handlers::send_message,
        crate::message::message_handlers::get_conversation,
        crate::message::message_handlers::get_conversations,
        crate::message::message_handlers::mark_message_read,
        crate::message::message_handlers::mark_conversation_read,
        crate::message::message_handlers::delete_message,
        crate::message::message_handlers::search_messages,
        crate::message::message_handlers::unread_count,
        crate::upload::upload_handlers::upload_file,
        crate::chatbot::chatbot_handlers::chat,
        crate::chatbot::chatbot_handlers::suggestions,
        crate::chatbot::chatbot_handlers::health,
        crate::interview::interview_handlers::generate_interview,
        crate::interview::interview_handlers::submit_interview,
        crate::interview::interview_handlers::interview_history,
        crate::interview::interview_handlers::interview_stats,
        crate::interview::interview_handlers::get_interview,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            RefreshResponse,
            ChangePasswordRequest,
            AckResponse,
            UserRole,
            UserResponse,
            UserSummary,
            UpdateProfileRequest,
            ProfileUpdatedResponse,
            FollowResponse,
            MessageType,
            MessageResponse,
            SendMessageRequest,
            ConversationEntry,
            UnreadCountResponse,
            MarkConversationReadResponse,
            DeleteMessageResponse,
            MessagePage,
            UploadResponse,
            WsMessage,
            ClientMessage,
            RegisteredPayload,
            ErrorPayload,
            ChatRequest,
            ChatResponse,
            SuggestionsResponse,
            ChatbotHealthResponse,
            Difficulty,
            InterviewStatus,
            GenerateInterviewRequest,
            GeneratedInterviewResponse,
            InterviewView,
            QuestionView,
            SubmitInterviewRequest,
            SubmissionResponse,
            SubmissionResults,
            QuestionResult,
            InterviewSummary,
            InterviewPage,
            InterviewStatsResponse,
            InterviewDetail,
            QuestionDetail,
        )
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "Profiles, user search and follows"),
        (name = "messages", description = "Student and alumni messaging endpoints"),
        (name = "chatbot", description = "AI career assistant endpoints"),
        (name = "interviews", description = "AI mock interview endpoints")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            )
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    // Public routes (no auth required)
    let auth_routes = Router::new()
        .route("/register", post(auth_handlers::register))
        .route("/login", post(auth_handlers::login))
        .merge(
            Router::new()
                .route("/me", get(auth_handlers::me))
                .route("/refresh", post(auth_handlers::refresh))
                .route("/logout", post(auth_handlers::logout))
                .route("/change-password", post(auth_handlers::change_password))
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    // Protected routes (auth required)
    let user_routes = Router::new()
        .route("/search", get(user_handlers::search_users))
        .route("/suggestions", get(user_handlers::get_suggestions))
        .route("/profile", put(user_handlers::update_profile))
        .route("/:id", get(user_handlers::get_user))
        .route("/:id/follow", post(user_handlers::toggle_follow))
        .route("/:id/followers", get(user_handlers::get_followers))
        .route("/:id/following", get(user_handlers::get_following))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let message_routes = Router::new()
        .route("/", post(message_handlers::send_message))
        .route(
            "/upload",
            post(upload_handlers::upload_file)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        )
        .route("/conversations", get(message_handlers::get_conversations))
        .route("/unread-count", get(message_handlers::unread_count))
        .route("/search", get(message_handlers::search_messages))
        .route("/conversation/:user_id", get(message_handlers::get_conversation))
        .route(
            "/conversation/:user_id/read",
            put(message_handlers::mark_conversation_read),
        )
        .route("/:id/read", put(message_handlers::mark_message_read))
        .route("/:id", axum::routing::delete(message_handlers::delete_message))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let chatbot_routes = Router::new()
        .route("/chat", post(chatbot_handlers::chat))
        .route("/suggestions", get(chatbot_handlers::suggestions))
        .route("/health", get(chatbot_handlers::health))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let interview_routes = Router::new()
        .route("/generate", post(interview_handlers::generate_interview))
        .route("/history", get(interview_handlers::interview_history))
        .route("/stats", get(interview_handlers::interview_stats))
        .route("/:id", get(interview_handlers::get_interview))
        .route("/:id/submit", post(interview_handlers::submit_interview))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // WebSocket route
    let ws_routes = Router::new()
        .route("/ws", get(crate::websocket::ws_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/messages", message_routes)
        .nest("/chatbot", chatbot_routes)
        .nest("/interviews", interview_routes)
        .merge(ws_routes);

    let uploads = ServeDir::new(state.upload_service.dir());

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
