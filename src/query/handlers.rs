// region:    --- Imports
use super::queries;
use crate::auction::state::AuctionState;
use crate::bidding::model::{Bid, Item, Question};
use crate::database::DatabaseManager;
use rust_decimal::Decimal;
use sqlx::Error as SqlxError;
use sqlx::Row;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 상품 조회
pub async fn get_item(db_manager: &DatabaseManager, item_id: i64) -> Result<Option<Item>, SqlxError> {
    info!("{:<12} --> 상품 조회 id: {}", "Query", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Item>(queries::GET_ITEM)
                    .bind(item_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 활성 상품 목록 조회, 검색어가 있으면 제목/설명으로 필터링
pub async fn get_active_items(
    db_manager: &DatabaseManager,
    search: Option<String>,
) -> Result<Vec<Item>, SqlxError> {
    info!("{:<12} --> 활성 상품 목록 조회 search: {:?}", "Query", search);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                match search {
                    Some(keyword) => {
                        let pattern = format!("%{}%", keyword);
                        sqlx::query_as::<_, Item>(queries::SEARCH_ACTIVE_ITEMS)
                            .bind(pattern)
                            .fetch_all(&mut **tx)
                            .await
                    }
                    None => {
                        sqlx::query_as::<_, Item>(queries::GET_ACTIVE_ITEMS)
                            .fetch_all(&mut **tx)
                            .await
                    }
                }
            })
        })
        .await
}

/// 최고 입찰가 조회
/// 입찰 테이블에서 매번 다시 계산한다 (요청 간 캐시 없음).
pub async fn get_highest_bid(
    db_manager: &DatabaseManager,
    item_id: i64,
) -> Result<Option<Decimal>, SqlxError> {
    info!("{:<12} --> 최고 입찰가 조회 id: {}", "Query", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let result = sqlx::query(queries::GET_HIGHEST_BID)
                    .bind(item_id)
                    .fetch_one(&mut **tx)
                    .await?;

                Ok(result.get("highest_bid"))
            })
        })
        .await
}

/// 상품 입찰 이력 조회
pub async fn get_item_bids(
    db_manager: &DatabaseManager,
    item_id: i64,
) -> Result<Vec<Bid>, SqlxError> {
    info!("{:<12} --> 상품 입찰 이력 조회 id: {}", "Query", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Bid>(queries::GET_ITEM_BIDS)
                    .bind(item_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 상품 질문 목록 조회
pub async fn get_item_questions(
    db_manager: &DatabaseManager,
    item_id: i64,
) -> Result<Vec<Question>, SqlxError> {
    info!("{:<12} --> 상품 질문 목록 조회 id: {}", "Query", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Question>(queries::GET_ITEM_QUESTIONS)
                    .bind(item_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 질문 조회
pub async fn get_question(
    db_manager: &DatabaseManager,
    question_id: i64,
) -> Result<Option<Question>, SqlxError> {
    info!("{:<12} --> 질문 조회 id: {}", "Query", question_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Question>(queries::GET_QUESTION)
                    .bind(question_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 경매 상태 조회
/// 상품 + 파생 최고 입찰가 + 입찰/질문 목록을 하나의 투영으로 합친다.
pub async fn get_auction_state(
    db_manager: &DatabaseManager,
    item_id: i64,
) -> Result<Option<AuctionState>, SqlxError> {
    info!("{:<12} --> 경매 상태 조회 id: {}", "Query", item_id);

    let Some(item) = get_item(db_manager, item_id).await? else {
        return Ok(None);
    };
    let bids = get_item_bids(db_manager, item_id).await?;
    let questions = get_item_questions(db_manager, item_id).await?;

    // 입찰 이력이 금액 내림차순이므로 선두가 곧 최고 입찰
    let highest_bid = bids.first().map(|bid| bid.amount);

    Ok(Some(AuctionState {
        item,
        highest_bid,
        bids,
        questions,
    }))
}

// endregion: --- Query Handlers
