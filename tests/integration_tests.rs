use async_trait::async_trait;
use auction_marketplace::bidding::model::{Item, User};
use auction_marketplace::database::DatabaseManager;
use auction_marketplace::notifier::Notifier;
use auction_marketplace::query;
use auction_marketplace::scheduler::{AuctionCloser, ClosingOutcome};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const BASE_URL: &str = "http://localhost:3000";

/// 데이터베이스 매니저 설정
async fn setup() -> Arc<DatabaseManager> {
    Arc::new(DatabaseManager::new().await)
}

/// 테스트용 사용자 생성
async fn create_test_user(db_manager: &DatabaseManager, username: &str) -> User {
    let username = username.to_string();
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(
                    "INSERT INTO users (username, email)
                     VALUES ($1, $2)
                     RETURNING id, username, email, created_at",
                )
                .bind(&username)
                .bind(format!("{}@example.com", username))
                .fetch_one(&mut **tx)
                .await
            })
        })
        .await
        .unwrap()
}

/// 테스트용 상품 생성
async fn create_test_item(
    db_manager: &DatabaseManager,
    owner_id: i64,
    starting_price: Decimal,
    end_date: DateTime<Utc>,
) -> Item {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Item>(
                    "INSERT INTO items (owner_id, title, description, starting_price, end_date)
                     VALUES ($1, $2, $3, $4, $5)
                     RETURNING id, owner_id, title, description, starting_price, end_date, is_active, created_at",
                )
                .bind(owner_id)
                .bind("Test Item")
                .bind("Test description")
                .bind(starting_price)
                .bind(end_date)
                .fetch_one(&mut **tx)
                .await
            })
        })
        .await
        .unwrap()
}

/// 발송 기록을 남기는 테스트용 알림 발송자
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingNotifier {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), String> {
        self.sent.lock().unwrap().push((
            recipient.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

/// 항상 실패하는 테스트용 알림 발송자
struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _recipient: &str, _subject: &str, _body: &str) -> Result<(), String> {
        Err("smtp unreachable".to_string())
    }
}

/// 입찰 시나리오 테스트
/// 시작가 10.00 상품: A 의 12.00 입찰 수락, B 의 11.00 입찰 거절,
/// 소유자의 20.00 입찰 거절, 미인증 호출자 거절.
#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_bidding_scenario() {
    let db_manager = setup().await;
    let client = Client::new();

    let owner = create_test_user(&db_manager, "scenario_owner").await;
    let bidder_a = create_test_user(&db_manager, "scenario_bidder_a").await;
    let bidder_b = create_test_user(&db_manager, "scenario_bidder_b").await;
    let item = create_test_item(
        &db_manager,
        owner.id,
        dec!(10.00),
        Utc::now() + Duration::hours(2),
    )
    .await;

    // A 의 12.00 입찰 -> 수락 (201)
    let response = client
        .post(format!("{}/items/{}/bid", BASE_URL, item.id))
        .header("x-user-id", bidder_a.id)
        .json(&json!({ "amount": "12.00" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    // B 의 11.00 입찰 -> 최고가 이하로 거절 (400)
    let response = client
        .post(format!("{}/items/{}/bid", BASE_URL, item.id))
        .header("x-user-id", bidder_b.id)
        .json(&json!({ "amount": "11.00" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "BELOW_HIGHEST_BID");
    assert!(body["error"].as_str().unwrap().contains("12.00"));

    // 소유자의 20.00 입찰 -> 거절
    let response = client
        .post(format!("{}/items/{}/bid", BASE_URL, item.id))
        .header("x-user-id", owner.id)
        .json(&json!({ "amount": "20.00" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "OWN_ITEM");

    // 미인증 호출자 -> 403
    let response = client
        .post(format!("{}/items/{}/bid", BASE_URL, item.id))
        .json(&json!({ "amount": "30.00" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);

    // 거절된 입찰은 기록을 남기지 않는다
    let bids = query::handlers::get_item_bids(&db_manager, item.id)
        .await
        .unwrap();
    assert_eq!(bids.len(), 1);
    assert_eq!(bids[0].amount, dec!(12.00));
    assert_eq!(bids[0].bidder_id, bidder_a.id);
}

/// 경매 마감 테스트
/// 만료된 상품을 마감하고 낙찰자에게 알림을 발송하며, 두 번째 실행은 아무 일도
/// 하지 않는다 (멱등성).
#[tokio::test]
#[ignore = "requires a database"]
async fn test_close_expired_auction() {
    let db_manager = setup().await;
    let pool = db_manager.get_pool();

    let owner = create_test_user(&db_manager, "closer_owner").await;
    let winner = create_test_user(&db_manager, "closer_winner").await;
    let item = create_test_item(
        &db_manager,
        owner.id,
        dec!(10.00),
        Utc::now() - Duration::minutes(5),
    )
    .await;

    // 만료 전에 들어온 입찰 기록
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query(
                    "INSERT INTO bids (item_id, bidder_id, amount, bid_time)
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(item.id)
                .bind(winner.id)
                .bind(dec!(18.50))
                .bind(Utc::now() - Duration::minutes(10))
                .execute(&mut **tx)
                .await
            })
        })
        .await
        .unwrap();

    let notifier = RecordingNotifier::new();
    let outcomes = AuctionCloser::close_expired(&pool, &notifier, Utc::now())
        .await
        .unwrap();

    let outcome = outcomes
        .iter()
        .find(|o| matches!(o, ClosingOutcome::ClosedWithWinner { item_id, .. } if *item_id == item.id))
        .expect("expected a winner outcome for the expired item");
    if let ClosingOutcome::ClosedWithWinner { amount, winner_id, .. } = outcome {
        assert_eq!(*amount, dec!(18.50));
        assert_eq!(*winner_id, winner.id);
    }

    // 낙찰자에게 알림 발송
    let sent = notifier.sent.lock().unwrap().clone();
    let mail = sent
        .iter()
        .find(|(to, _, _)| to == &winner.email)
        .expect("expected a notification to the winner");
    assert!(mail.1.contains("Test Item"));
    assert!(mail.2.contains("18.50"));

    // 상품은 비활성으로 전이
    let closed = query::handlers::get_item(&db_manager, item.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!closed.is_active);

    // 두 번째 실행은 해당 상품을 다시 선택하지 않는다
    let notifier2 = RecordingNotifier::new();
    let outcomes2 = AuctionCloser::close_expired(&pool, &notifier2, Utc::now())
        .await
        .unwrap();
    assert!(!outcomes2
        .iter()
        .any(|o| matches!(o, ClosingOutcome::ClosedWithWinner { item_id, .. } if *item_id == item.id)));
}

/// 입찰 없는 경매 마감 테스트
#[tokio::test]
#[ignore = "requires a database"]
async fn test_close_expired_auction_without_bids() {
    let db_manager = setup().await;
    let pool = db_manager.get_pool();

    let owner = create_test_user(&db_manager, "nobids_owner").await;
    let item = create_test_item(
        &db_manager,
        owner.id,
        dec!(10.00),
        Utc::now() - Duration::minutes(5),
    )
    .await;

    let notifier = RecordingNotifier::new();
    let outcomes = AuctionCloser::close_expired(&pool, &notifier, Utc::now())
        .await
        .unwrap();

    assert!(outcomes
        .iter()
        .any(|o| matches!(o, ClosingOutcome::ClosedNoBids { item_id, .. } if *item_id == item.id)));

    // 알림 발송 없음, 상품은 비활성
    assert!(notifier.sent.lock().unwrap().is_empty());
    let closed = query::handlers::get_item(&db_manager, item.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!closed.is_active);
}

/// 알림 발송 실패 시에도 상품은 마감되어야 한다
#[tokio::test]
#[ignore = "requires a database"]
async fn test_email_failure_does_not_block_closing() {
    let db_manager = setup().await;
    let pool = db_manager.get_pool();

    let owner = create_test_user(&db_manager, "mailfail_owner").await;
    let bidder = create_test_user(&db_manager, "mailfail_bidder").await;
    let item = create_test_item(
        &db_manager,
        owner.id,
        dec!(10.00),
        Utc::now() - Duration::minutes(5),
    )
    .await;

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query(
                    "INSERT INTO bids (item_id, bidder_id, amount, bid_time)
                     VALUES ($1, $2, $3, now())",
                )
                .bind(item.id)
                .bind(bidder.id)
                .bind(dec!(15.00))
                .execute(&mut **tx)
                .await
            })
        })
        .await
        .unwrap();

    let outcomes = AuctionCloser::close_expired(&pool, &FailingNotifier, Utc::now())
        .await
        .unwrap();

    assert!(outcomes
        .iter()
        .any(|o| matches!(o, ClosingOutcome::EmailFailed { item_id, .. } if *item_id == item.id)));

    let closed = query::handlers::get_item(&db_manager, item.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!closed.is_active);
}

/// 질문/답변 흐름 테스트
#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_question_and_reply() {
    let db_manager = setup().await;
    let client = Client::new();

    let owner = create_test_user(&db_manager, "qa_owner").await;
    let asker = create_test_user(&db_manager, "qa_asker").await;
    let item = create_test_item(
        &db_manager,
        owner.id,
        dec!(10.00),
        Utc::now() + Duration::hours(2),
    )
    .await;

    // 질문 등록
    let response = client
        .post(format!("{}/items/{}/question", BASE_URL, item.id))
        .header("x-user-id", asker.id)
        .json(&json!({ "question_text": "Is shipping included?" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let question: Value = response.json().await.unwrap();
    let question_id = question["id"].as_i64().unwrap();

    // 소유자가 아닌 사용자의 답변 -> 403
    let response = client
        .put(format!("{}/questions/{}/reply", BASE_URL, question_id))
        .header("x-user-id", asker.id)
        .json(&json!({ "reply_text": "Yes." }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);

    // 소유자의 답변 -> 성공
    let response = client
        .put(format!("{}/questions/{}/reply", BASE_URL, question_id))
        .header("x-user-id", owner.id)
        .json(&json!({ "reply_text": "Yes, shipping is included." }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let replied: Value = response.json().await.unwrap();
    assert_eq!(replied["reply_text"], "Yes, shipping is included.");
    assert!(!replied["replied_at"].is_null());

    // 두 번째 답변 -> 거절
    let response = client
        .put(format!("{}/questions/{}/reply", BASE_URL, question_id))
        .header("x-user-id", owner.id)
        .json(&json!({ "reply_text": "Changed my mind." }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}
