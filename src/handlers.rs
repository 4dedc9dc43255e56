// region:    --- Imports
use crate::bidding::commands::{handle_place_bid as command_place_bid, BidError, PlaceBidCommand};
use crate::database::DatabaseManager;
use crate::listing::{
    self, CreateItemCommand, ListingError, PostQuestionCommand, RegisterUserCommand,
    ReplyQuestionCommand, UpdateItemCommand,
};
use crate::query;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Session

/// 인증된 사용자 식별
/// 세션 계층은 범위 밖이므로 게이트웨이가 주입하는 x-user-id 헤더를 신뢰한다.
/// 헤더가 없거나 파싱할 수 없으면 미인증 호출자로 취급한다.
fn session_user(headers: &HeaderMap) -> Option<i64> {
    headers.get("x-user-id")?.to_str().ok()?.parse().ok()
}

/// 미인증 호출자 거절 응답
fn forbidden_response() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(serde_json::json!({
            "error": "Authentication required.",
            "code": "UNAUTHENTICATED"
        })),
    )
        .into_response()
}

// endregion: --- Session

// region:    --- Error Mapping

/// 상품/질문 오류를 HTTP 응답으로 변환
fn listing_error_response(e: ListingError) -> Response {
    match e {
        ListingError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": e.to_string(), "code": "NOT_FOUND"})),
        )
            .into_response(),
        ListingError::Forbidden => (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"error": e.to_string(), "code": "FORBIDDEN"})),
        )
            .into_response(),
        ListingError::AlreadyReplied => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": e.to_string(), "code": "ALREADY_REPLIED"})),
        )
            .into_response(),
        ListingError::Store(e) => {
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

// endregion: --- Error Mapping

// region:    --- Command Handlers

/// 사용자 등록 요청 처리
pub async fn handle_register_user(
    State(db_manager): State<Arc<DatabaseManager>>,
    Json(cmd): Json<RegisterUserCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> 사용자 등록 요청: {:?}", "Command", cmd);
    match listing::register_user(cmd, &db_manager).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => listing_error_response(e),
    }
}

/// 상품 등록 요청 처리
pub async fn handle_create_item(
    State(db_manager): State<Arc<DatabaseManager>>,
    headers: HeaderMap,
    Json(cmd): Json<CreateItemCommand>,
) -> impl IntoResponse {
    let Some(user_id) = session_user(&headers) else {
        return forbidden_response();
    };
    info!("{:<12} --> 상품 등록 요청: {:?}", "Command", cmd);
    match listing::create_item(cmd, user_id, &db_manager).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => listing_error_response(e),
    }
}

/// 상품 수정 요청 처리
pub async fn handle_update_item(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(item_id): Path<i64>,
    headers: HeaderMap,
    Json(cmd): Json<UpdateItemCommand>,
) -> impl IntoResponse {
    let Some(user_id) = session_user(&headers) else {
        return forbidden_response();
    };
    info!("{:<12} --> 상품 수정 요청 id: {}", "Command", item_id);
    match listing::update_item(cmd, item_id, user_id, &db_manager).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => listing_error_response(e),
    }
}

/// 상품 마감 요청 처리 (소유자에 의한 수동 마감)
pub async fn handle_close_item(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(item_id): Path<i64>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(user_id) = session_user(&headers) else {
        return forbidden_response();
    };
    info!("{:<12} --> 상품 마감 요청 id: {}", "Command", item_id);
    match listing::close_item(item_id, user_id, &db_manager).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => listing_error_response(e),
    }
}

/// 입찰 요청 본문
#[derive(Debug, Deserialize)]
pub struct PlaceBidPayload {
    pub amount: Decimal,
}

/// 입찰 요청 처리
pub async fn handle_bid(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(item_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<PlaceBidPayload>,
) -> impl IntoResponse {
    // 미인증 호출자는 검증기에 도달하기 전에 거절된다
    let Some(bidder_id) = session_user(&headers) else {
        return forbidden_response();
    };

    // 금액 자체에 대한 전제 조건: 0 이하의 입찰은 검증기에 전달하지 않는다
    if payload.amount <= Decimal::ZERO {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Bid amount must be positive.",
                "code": "INVALID_AMOUNT"
            })),
        )
            .into_response();
    }

    let cmd = PlaceBidCommand {
        item_id,
        bidder_id,
        amount: payload.amount,
    };
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    match command_place_bid(cmd, &db_manager, Utc::now()).await {
        Ok(bid) => (StatusCode::CREATED, Json(bid)).into_response(),
        Err(BidError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Item not found.", "code": "NOT_FOUND"})),
        )
            .into_response(),
        Err(BidError::Rejected(rejection)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": rejection.reason(),
                "code": rejection.code()
            })),
        )
            .into_response(),
        Err(BidError::Store(e)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// 질문 등록 요청 처리
pub async fn handle_post_question(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(item_id): Path<i64>,
    headers: HeaderMap,
    Json(cmd): Json<PostQuestionCommand>,
) -> impl IntoResponse {
    let Some(author_id) = session_user(&headers) else {
        return forbidden_response();
    };
    info!("{:<12} --> 질문 등록 요청 item_id: {}", "Command", item_id);
    match listing::post_question(cmd, item_id, author_id, &db_manager).await {
        Ok(question) => (StatusCode::CREATED, Json(question)).into_response(),
        Err(e) => listing_error_response(e),
    }
}

/// 질문 답변 요청 처리
pub async fn handle_reply_question(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(question_id): Path<i64>,
    headers: HeaderMap,
    Json(cmd): Json<ReplyQuestionCommand>,
) -> impl IntoResponse {
    let Some(user_id) = session_user(&headers) else {
        return forbidden_response();
    };
    info!("{:<12} --> 질문 답변 요청 id: {}", "Command", question_id);
    match listing::reply_question(cmd, question_id, user_id, Utc::now(), &db_manager).await {
        Ok(question) => Json(question).into_response(),
        Err(e) => listing_error_response(e),
    }
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 상품 목록 검색 파라미터
#[derive(Debug, Deserialize)]
pub struct ItemListParams {
    pub search: Option<String>,
}

/// 활성 상품 목록 조회
pub async fn handle_get_items(
    State(db_manager): State<Arc<DatabaseManager>>,
    Query(params): Query<ItemListParams>,
) -> impl IntoResponse {
    info!("{:<12} --> 상품 목록 조회", "HandlerQuery");
    match query::handlers::get_active_items(&db_manager, params.search).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// 경매 상태 조회 (상품 + 최고 입찰가 + 입찰/질문 목록)
pub async fn handle_get_item(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(item_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 경매 상태 조회 id: {}", "HandlerQuery", item_id);
    match query::handlers::get_auction_state(&db_manager, item_id).await {
        Ok(Some(state)) => Json(state).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Item not found.", "code": "NOT_FOUND"})),
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// 최고 입찰가 조회
pub async fn handle_get_highest_bid(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(item_id): Path<i64>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 최고 입찰가 조회 id: {}",
        "HandlerQuery", item_id
    );
    match query::handlers::get_highest_bid(&db_manager, item_id).await {
        Ok(amount) => Json(serde_json::json!({ "highest_bid": amount })).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// 상품 입찰 이력 조회
pub async fn handle_get_item_bids(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(item_id): Path<i64>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 상품 입찰 이력 조회 id: {}",
        "HandlerQuery", item_id
    );
    match query::handlers::get_item_bids(&db_manager, item_id).await {
        Ok(bids) => Json(bids).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// 상품 질문 목록 조회
pub async fn handle_get_item_questions(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(item_id): Path<i64>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 상품 질문 목록 조회 id: {}",
        "HandlerQuery", item_id
    );
    match query::handlers::get_item_questions(&db_manager, item_id).await {
        Ok(questions) => Json(questions).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

// endregion: --- Query Handlers
