/// 경매 마감 배치 작업
/// 주기적으로 실행되어 종료 시각이 지난 활성 경매를 찾아 낙찰자를 결정하고
/// 상품을 비활성 상태로 전이한다. 전이는 단방향이며, 비활성 상품은 다음 실행의
/// 선택 조건에 걸리지 않으므로 작업 자체가 멱등이다.
// region:    --- Imports
use crate::bidding::model::{Bid, Item, User};
use crate::notifier::Notifier;
use crate::query::queries;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- Closing Outcome
/// 상품별 마감 결과
#[derive(Debug, Serialize)]
pub enum ClosingOutcome {
    /// 낙찰자 결정 및 알림 발송 완료
    ClosedWithWinner {
        item_id: i64,
        title: String,
        winner_id: i64,
        amount: Decimal,
    },
    /// 입찰 없이 종료
    ClosedNoBids { item_id: i64, title: String },
    /// 낙찰자는 결정되었으나 알림 발송 실패 (상품은 정상 마감됨)
    EmailFailed {
        item_id: i64,
        title: String,
        winner_id: i64,
        amount: Decimal,
        error: String,
    },
}
// endregion: --- Closing Outcome

// region:    --- Winner Selection
/// 낙찰 입찰 선택
/// 최대 금액의 입찰을 고른다. 검증기가 동일 금액 입찰을 거절하므로 동점은
/// 실제로 발생하지 않아야 하지만, 발생하더라도 가장 이른 입찰을 결정적으로
/// 선택하고 중단 없이 진행한다.
pub fn select_winner(bids: &[Bid]) -> Option<&Bid> {
    bids.iter().max_by(|a, b| {
        a.amount
            .cmp(&b.amount)
            .then_with(|| b.bid_time.cmp(&a.bid_time))
    })
}
// endregion: --- Winner Selection

// region:    --- Auction Closer
/// 경매 마감 스케줄러
pub struct AuctionCloser {
    pool: Arc<PgPool>,
    notifier: Arc<dyn Notifier>,
}

impl AuctionCloser {
    pub fn new(pool: Arc<PgPool>, notifier: Arc<dyn Notifier>) -> Self {
        Self { pool, notifier }
    }

    /// 마감 작업 주기 실행 시작
    /// 한 번에 하나의 인스턴스만 실행된다 (단일 루프 내 순차 tick).
    pub async fn start(&self) {
        let pool = Arc::clone(&self.pool);
        let notifier = Arc::clone(&self.notifier);
        let secs = std::env::var("CLOSER_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(secs));
            loop {
                interval.tick().await;
                if let Err(e) = Self::close_expired(&pool, notifier.as_ref(), Utc::now()).await {
                    error!("{:<12} --> 경매 마감 작업 실패: {:?}", "Closer", e);
                }
            }
        });
    }

    /// 종료 시각이 지난 활성 경매를 모두 마감
    /// 상품 단위로 독립 처리하며, 한 상품의 오류가 나머지 처리를 중단시키지 않는다.
    pub async fn close_expired(
        pool: &PgPool,
        notifier: &dyn Notifier,
        now: DateTime<Utc>,
    ) -> Result<Vec<ClosingOutcome>, sqlx::Error> {
        let expired_items = sqlx::query_as::<_, Item>(queries::GET_EXPIRED_ACTIVE_ITEMS)
            .bind(now)
            .fetch_all(pool)
            .await?;

        if expired_items.is_empty() {
            info!("{:<12} --> 마감 대상 경매 없음", "Closer");
            return Ok(Vec::new());
        }

        let mut outcomes = Vec::with_capacity(expired_items.len());
        for item in expired_items {
            let item_id = item.id;
            match Self::close_item(pool, notifier, item).await {
                Ok(outcome) => {
                    Self::report(&outcome);
                    outcomes.push(outcome);
                }
                Err(e) => {
                    // 다음 실행에서 재시도되도록 해당 상품만 건너뛴다
                    error!(
                        "{:<12} --> 상품 마감 실패 id: {}, error: {:?}",
                        "Closer", item_id, e
                    );
                }
            }
        }

        Ok(outcomes)
    }

    /// 단일 상품 마감
    /// 알림 발송 결과와 무관하게 상품은 반드시 비활성으로 전이된다.
    async fn close_item(
        pool: &PgPool,
        notifier: &dyn Notifier,
        item: Item,
    ) -> Result<ClosingOutcome, sqlx::Error> {
        let bids = sqlx::query_as::<_, Bid>(queries::GET_ITEM_BIDS)
            .bind(item.id)
            .fetch_all(pool)
            .await?;

        let outcome = match select_winner(&bids) {
            Some(winner) => {
                let notify_result = Self::notify_winner(pool, notifier, &item, winner).await;
                match notify_result {
                    Ok(()) => ClosingOutcome::ClosedWithWinner {
                        item_id: item.id,
                        title: item.title.clone(),
                        winner_id: winner.bidder_id,
                        amount: winner.amount,
                    },
                    Err(e) => ClosingOutcome::EmailFailed {
                        item_id: item.id,
                        title: item.title.clone(),
                        winner_id: winner.bidder_id,
                        amount: winner.amount,
                        error: e,
                    },
                }
            }
            None => ClosingOutcome::ClosedNoBids {
                item_id: item.id,
                title: item.title.clone(),
            },
        };

        sqlx::query(queries::CLOSE_ITEM)
            .bind(item.id)
            .execute(pool)
            .await?;

        Ok(outcome)
    }

    /// 낙찰자에게 알림 발송
    async fn notify_winner(
        pool: &PgPool,
        notifier: &dyn Notifier,
        item: &Item,
        winner: &Bid,
    ) -> Result<(), String> {
        let bidder = sqlx::query_as::<_, User>(queries::GET_USER)
            .bind(winner.bidder_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("winner user {} not found", winner.bidder_id))?;

        notifier
            .send(
                &bidder.email,
                &format!("You won the auction: {}", item.title),
                &format!(
                    "Congratulations! You had the highest bid of {}. Please proceed to payment.",
                    winner.amount
                ),
            )
            .await
    }

    /// 상품별 마감 결과 로그
    fn report(outcome: &ClosingOutcome) {
        match outcome {
            ClosingOutcome::ClosedWithWinner {
                item_id,
                title,
                winner_id,
                amount,
            } => info!(
                "{:<12} --> 마감 완료 id: {}, title: {}, 낙찰자: {}, 금액: {}",
                "Closer", item_id, title, winner_id, amount
            ),
            ClosingOutcome::ClosedNoBids { item_id, title } => info!(
                "{:<12} --> 입찰 없이 마감 id: {}, title: {}",
                "Closer", item_id, title
            ),
            ClosingOutcome::EmailFailed {
                item_id, error, ..
            } => warn!(
                "{:<12} --> 마감 완료, 알림 발송 실패 id: {}, error: {}",
                "Closer", item_id, error
            ),
        }
    }
}
// endregion: --- Auction Closer

// endregion: --- Tests
