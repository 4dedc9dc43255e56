/// 입찰 커맨드 처리
/// "최고가 조회 -> 검증 -> 입찰 기록" 을 상품 행 잠금이 걸린 단일 트랜잭션으로 묶어
/// 동일 상품에 대한 동시 입찰을 직렬화한다. 나중에 커밋되는 입찰은 반드시
/// 먼저 커밋된 입찰의 금액을 본 뒤 검증된다.
// region:    --- Imports
use crate::bidding::model::{Bid, Item};
use crate::bidding::validator::{validate_bid, BidRejection};
use crate::database::DatabaseManager;
use crate::query::queries;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use thiserror::Error;
use tracing::info;
// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlaceBidCommand {
    pub item_id: i64,
    pub bidder_id: i64,
    pub amount: Decimal,
}

/// 입찰 처리 오류
#[derive(Debug, Error)]
pub enum BidError {
    /// 존재하지 않는 상품
    #[error("Item not found.")]
    NotFound,
    /// 검증 거절 (사유는 BidRejection 이 보유)
    #[error("{}", .0.reason())]
    Rejected(BidRejection),
    /// 저장소 오류
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

/// 입찰 처리
/// 거절 시 어떤 부수효과도 발생하지 않는다. 수락 경로만 입찰 기록을 생성하며,
/// 상품 상태(활성/종료 시각)는 입찰로 변경되지 않는다.
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    db_manager: &DatabaseManager,
    now: DateTime<Utc>,
) -> Result<Bid, BidError> {
    info!("{:<12} --> 입찰 처리 시작: {:?}", "Command", cmd);

    let bid = db_manager
        .transaction(|tx| {
            Box::pin(async move {
                // 상품 행 잠금: 같은 상품에 대한 입찰 트랜잭션을 직렬화한다
                let item = sqlx::query_as::<_, Item>(queries::GET_ITEM_FOR_UPDATE)
                    .bind(cmd.item_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(BidError::NotFound)?;

                // 잠금 이후에 최고 입찰가를 다시 읽는다 (결정 시점의 확정 값)
                let row = sqlx::query(queries::GET_HIGHEST_BID)
                    .bind(cmd.item_id)
                    .fetch_one(&mut **tx)
                    .await?;
                let highest_bid: Option<Decimal> = row.get("highest_bid");

                validate_bid(&item, highest_bid, cmd.bidder_id, cmd.amount, now)
                    .map_err(BidError::Rejected)?;

                // 서버가 타임스탬프를 부여한다. 입찰은 생성 후 불변.
                sqlx::query_as::<_, Bid>(queries::INSERT_BID)
                    .bind(cmd.item_id)
                    .bind(cmd.bidder_id)
                    .bind(cmd.amount)
                    .bind(now)
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(BidError::from)
            })
        })
        .await?;

    info!(
        "{:<12} --> 입찰 수락: item_id={}, bidder_id={}, amount={}",
        "Command", bid.item_id, bid.bidder_id, bid.amount
    );
    Ok(bid)
}
// endregion: --- Commands
