/// 입찰 유효성 검증
/// 입찰 제출 시점의 상품 상태와 현재 최고 입찰가를 기준으로 허용 여부를 결정한다.
/// 순수 함수로 유지: 시각과 입찰자 식별자를 모두 명시적 파라미터로 받는다.
// region:    --- Imports
use crate::bidding::model::Item;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
// endregion: --- Imports

// region:    --- Bid Rejection
/// 입찰 거절 사유
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BidRejection {
    /// 경매가 비활성 상태이거나 종료 시각이 지남
    AuctionEnded,
    /// 소유자 본인의 상품에 대한 입찰
    OwnItem,
    /// 시작가 미만의 입찰
    BelowStartingPrice { minimum: Decimal },
    /// 현재 최고 입찰가 이하의 입찰
    BelowHighestBid { highest: Decimal },
}

impl BidRejection {
    /// 호출자에게 반환할 사유 문자열
    pub fn reason(&self) -> String {
        match self {
            BidRejection::AuctionEnded => "This auction has ended.".to_string(),
            BidRejection::OwnItem => "You cannot bid on your own item.".to_string(),
            BidRejection::BelowStartingPrice { minimum } => {
                format!("Bid must be at least {}.", minimum)
            }
            BidRejection::BelowHighestBid { highest } => {
                format!("Bid must be higher than current highest bid ({}).", highest)
            }
        }
    }

    /// 기계 판독용 코드
    pub fn code(&self) -> &'static str {
        match self {
            BidRejection::AuctionEnded => "AUCTION_ENDED",
            BidRejection::OwnItem => "OWN_ITEM",
            BidRejection::BelowStartingPrice { .. } => "BELOW_STARTING_PRICE",
            BidRejection::BelowHighestBid { .. } => "BELOW_HIGHEST_BID",
        }
    }
}
// endregion: --- Bid Rejection

// region:    --- Validator
/// 입찰 허용 여부 결정
/// 검사 순서가 의미를 가진다: 먼저 실패한 검사의 사유가 반환된다.
/// 1. 경매 종료 여부 (비활성 또는 종료 시각 경과)
/// 2. 소유자 본인 입찰 여부
/// 3. 시작가 미만 여부
/// 4. 현재 최고 입찰가 초과 여부 (동일 금액은 거절)
pub fn validate_bid(
    item: &Item,
    highest_bid: Option<Decimal>,
    bidder_id: i64,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<(), BidRejection> {
    if !item.is_active || item.is_expired(now) {
        return Err(BidRejection::AuctionEnded);
    }

    if bidder_id == item.owner_id {
        return Err(BidRejection::OwnItem);
    }

    if amount < item.starting_price {
        return Err(BidRejection::BelowStartingPrice {
            minimum: item.starting_price,
        });
    }

    if let Some(highest) = highest_bid {
        if amount <= highest {
            return Err(BidRejection::BelowHighestBid { highest });
        }
    }

    Ok(())
}
// endregion: --- Validator

// endregion: --- Tests
