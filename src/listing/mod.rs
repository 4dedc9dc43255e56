/// 상품/질문 커맨드 처리
/// 1. 사용자 등록
/// 2. 상품 등록/수정/마감 (소유자 전용)
/// 3. 질문 등록 및 답변 (답변은 소유자 전용, 최초 1회)
// region:    --- Imports
use crate::bidding::model::{Item, Question, User};
use crate::database::DatabaseManager;
use crate::permissions::{check_owner, Access};
use crate::query::queries;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
// endregion: --- Imports

// region:    --- Commands
/// 사용자 등록 명령
#[derive(Debug, Deserialize)]
pub struct RegisterUserCommand {
    pub username: String,
    pub email: String,
}

/// 상품 등록 명령
#[derive(Debug, Deserialize)]
pub struct CreateItemCommand {
    pub title: String,
    pub description: String,
    pub starting_price: Decimal,
    pub end_date: DateTime<Utc>,
}

/// 상품 수정 명령
#[derive(Debug, Deserialize)]
pub struct UpdateItemCommand {
    pub title: String,
    pub description: String,
    pub starting_price: Decimal,
    pub end_date: DateTime<Utc>,
}

/// 질문 등록 명령
#[derive(Debug, Deserialize)]
pub struct PostQuestionCommand {
    pub question_text: String,
}

/// 질문 답변 명령
#[derive(Debug, Deserialize)]
pub struct ReplyQuestionCommand {
    pub reply_text: String,
}

/// 상품/질문 처리 오류
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("Not found.")]
    NotFound,
    #[error("You do not have permission to perform this action.")]
    Forbidden,
    #[error("This question already has a reply.")]
    AlreadyReplied,
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}
// endregion: --- Commands

// region:    --- Command Handlers

/// 사용자 등록
pub async fn register_user(
    cmd: RegisterUserCommand,
    db_manager: &DatabaseManager,
) -> Result<User, ListingError> {
    info!("{:<12} --> 사용자 등록: {}", "Command", cmd.username);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(queries::INSERT_USER)
                    .bind(cmd.username)
                    .bind(cmd.email)
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(ListingError::from)
            })
        })
        .await
}

/// 상품 등록
/// 소유자는 호출자(인증된 사용자)로 서버가 지정하며, 생성 시 활성 상태로 시작한다.
pub async fn create_item(
    cmd: CreateItemCommand,
    owner_id: i64,
    db_manager: &DatabaseManager,
) -> Result<Item, ListingError> {
    info!("{:<12} --> 상품 등록: {}", "Command", cmd.title);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Item>(queries::INSERT_ITEM)
                    .bind(owner_id)
                    .bind(cmd.title)
                    .bind(cmd.description)
                    .bind(cmd.starting_price)
                    .bind(cmd.end_date)
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(ListingError::from)
            })
        })
        .await
}

/// 상품 수정 (소유자 전용)
/// 활성 플래그는 여기서 변경되지 않는다. 마감은 close_item 이 담당한다.
pub async fn update_item(
    cmd: UpdateItemCommand,
    item_id: i64,
    user_id: i64,
    db_manager: &DatabaseManager,
) -> Result<Item, ListingError> {
    info!("{:<12} --> 상품 수정 id: {}", "Command", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let item = sqlx::query_as::<_, Item>(queries::GET_ITEM)
                    .bind(item_id)
                    .fetch_optional(&mut **tx)
                    .await?;

                match check_owner(item.map(|i| i.owner_id), user_id) {
                    Access::NotFound => return Err(ListingError::NotFound),
                    Access::Forbidden => return Err(ListingError::Forbidden),
                    Access::Allowed => {}
                }

                sqlx::query_as::<_, Item>(queries::UPDATE_ITEM)
                    .bind(cmd.title)
                    .bind(cmd.description)
                    .bind(cmd.starting_price)
                    .bind(cmd.end_date)
                    .bind(item_id)
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(ListingError::from)
            })
        })
        .await
}

/// 상품 마감 (소유자 전용)
/// 활성 -> 비활성 단방향 전이. 이미 마감된 상품에 대해서는 아무 일도 하지 않는다.
pub async fn close_item(
    item_id: i64,
    user_id: i64,
    db_manager: &DatabaseManager,
) -> Result<(), ListingError> {
    info!("{:<12} --> 상품 마감 id: {}", "Command", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let item = sqlx::query_as::<_, Item>(queries::GET_ITEM)
                    .bind(item_id)
                    .fetch_optional(&mut **tx)
                    .await?;

                match check_owner(item.as_ref().map(|i| i.owner_id), user_id) {
                    Access::NotFound => return Err(ListingError::NotFound),
                    Access::Forbidden => return Err(ListingError::Forbidden),
                    Access::Allowed => {}
                }

                sqlx::query(queries::CLOSE_ITEM)
                    .bind(item_id)
                    .execute(&mut **tx)
                    .await?;

                Ok(())
            })
        })
        .await
}

/// 질문 등록
pub async fn post_question(
    cmd: PostQuestionCommand,
    item_id: i64,
    author_id: i64,
    db_manager: &DatabaseManager,
) -> Result<Question, ListingError> {
    info!("{:<12} --> 질문 등록 item_id: {}", "Command", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let item = sqlx::query_as::<_, Item>(queries::GET_ITEM)
                    .bind(item_id)
                    .fetch_optional(&mut **tx)
                    .await?;
                if item.is_none() {
                    return Err(ListingError::NotFound);
                }

                sqlx::query_as::<_, Question>(queries::INSERT_QUESTION)
                    .bind(item_id)
                    .bind(author_id)
                    .bind(cmd.question_text)
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(ListingError::from)
            })
        })
        .await
}

/// 질문 답변 (상품 소유자 전용, 최초 1회)
/// 답변 본문과 답변 시각은 함께, 정확히 한 번만 설정된다.
pub async fn reply_question(
    cmd: ReplyQuestionCommand,
    question_id: i64,
    user_id: i64,
    now: DateTime<Utc>,
    db_manager: &DatabaseManager,
) -> Result<Question, ListingError> {
    info!("{:<12} --> 질문 답변 id: {}", "Command", question_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let question = sqlx::query_as::<_, Question>(queries::GET_QUESTION)
                    .bind(question_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(ListingError::NotFound)?;

                let item = sqlx::query_as::<_, Item>(queries::GET_ITEM)
                    .bind(question.item_id)
                    .fetch_optional(&mut **tx)
                    .await?;

                match check_owner(item.map(|i| i.owner_id), user_id) {
                    Access::NotFound => return Err(ListingError::NotFound),
                    Access::Forbidden => return Err(ListingError::Forbidden),
                    Access::Allowed => {}
                }

                // WHERE reply_text IS NULL 조건으로 두 번째 답변을 차단한다
                sqlx::query_as::<_, Question>(queries::REPLY_QUESTION)
                    .bind(cmd.reply_text)
                    .bind(now)
                    .bind(question_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(ListingError::AlreadyReplied)
            })
        })
        .await
}

// endregion: --- Command Handlers
