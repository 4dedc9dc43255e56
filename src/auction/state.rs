use crate::bidding::model::{Bid, Item, Question};
use rust_decimal::Decimal;
use serde::Serialize;

/// 경매 상태 투영
/// 상품과 파생된 현재 최고 입찰가의 조합. 캐시하지 않으며,
/// 매 조회/검증 시점에 입찰 테이블에서 다시 계산한다.
#[derive(Debug, Serialize)]
pub struct AuctionState {
    #[serde(flatten)]
    pub item: Item,
    pub highest_bid: Option<Decimal>,
    pub bids: Vec<Bid>,
    pub questions: Vec<Question>,
}
