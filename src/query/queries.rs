/// 상품 조회
pub const GET_ITEM: &str = r#"
    SELECT id, owner_id, title, description, starting_price, end_date, is_active, created_at
    FROM items
    WHERE id = $1
"#;

/// 상품 조회 (행 잠금)
/// 입찰 트랜잭션이 상품 단위로 직렬화되도록 FOR UPDATE 로 잠근다.
pub const GET_ITEM_FOR_UPDATE: &str = r#"
    SELECT id, owner_id, title, description, starting_price, end_date, is_active, created_at
    FROM items
    WHERE id = $1
    FOR UPDATE
"#;

/// 활성 상품 목록 조회 (최신순)
pub const GET_ACTIVE_ITEMS: &str = r#"
    SELECT id, owner_id, title, description, starting_price, end_date, is_active, created_at
    FROM items
    WHERE is_active = TRUE
    ORDER BY created_at DESC
"#;

/// 활성 상품 검색 (제목/설명)
pub const SEARCH_ACTIVE_ITEMS: &str = r#"
    SELECT id, owner_id, title, description, starting_price, end_date, is_active, created_at
    FROM items
    WHERE is_active = TRUE AND (title ILIKE $1 OR description ILIKE $1)
    ORDER BY created_at DESC
"#;

/// 종료 시각이 지난 활성 상품 조회 (경매 마감 작업 대상)
pub const GET_EXPIRED_ACTIVE_ITEMS: &str = r#"
    SELECT id, owner_id, title, description, starting_price, end_date, is_active, created_at
    FROM items
    WHERE is_active = TRUE AND end_date <= $1
"#;

/// 최고 입찰가 조회
pub const GET_HIGHEST_BID: &str =
    "SELECT MAX(amount) AS highest_bid FROM bids WHERE item_id = $1";

/// 상품 입찰 이력 조회 (금액 내림차순, 동일 금액은 먼저 들어온 입찰 우선)
pub const GET_ITEM_BIDS: &str = r#"
    SELECT id, item_id, bidder_id, amount, bid_time
    FROM bids
    WHERE item_id = $1
    ORDER BY amount DESC, bid_time ASC
"#;

/// 입찰 기록 생성
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (item_id, bidder_id, amount, bid_time)
    VALUES ($1, $2, $3, $4)
    RETURNING id, item_id, bidder_id, amount, bid_time
"#;

/// 상품 등록
pub const INSERT_ITEM: &str = r#"
    INSERT INTO items (owner_id, title, description, starting_price, end_date)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, owner_id, title, description, starting_price, end_date, is_active, created_at
"#;

/// 상품 수정 (소유자 전용, 활성/종료 상태는 건드리지 않는다)
pub const UPDATE_ITEM: &str = r#"
    UPDATE items
    SET title = $1, description = $2, starting_price = $3, end_date = $4
    WHERE id = $5
    RETURNING id, owner_id, title, description, starting_price, end_date, is_active, created_at
"#;

/// 상품 마감 (활성 -> 비활성, 단방향)
pub const CLOSE_ITEM: &str = "UPDATE items SET is_active = FALSE WHERE id = $1";

/// 사용자 등록
pub const INSERT_USER: &str = r#"
    INSERT INTO users (username, email)
    VALUES ($1, $2)
    RETURNING id, username, email, created_at
"#;

/// 사용자 조회
pub const GET_USER: &str = "SELECT id, username, email, created_at FROM users WHERE id = $1";

/// 질문 등록
pub const INSERT_QUESTION: &str = r#"
    INSERT INTO questions (item_id, author_id, question_text)
    VALUES ($1, $2, $3)
    RETURNING id, item_id, author_id, question_text, reply_text, created_at, replied_at
"#;

/// 질문 조회
pub const GET_QUESTION: &str = r#"
    SELECT id, item_id, author_id, question_text, reply_text, created_at, replied_at
    FROM questions
    WHERE id = $1
"#;

/// 상품 질문 목록 조회
pub const GET_ITEM_QUESTIONS: &str = r#"
    SELECT id, item_id, author_id, question_text, reply_text, created_at, replied_at
    FROM questions
    WHERE item_id = $1
    ORDER BY created_at ASC
"#;

/// 질문 답변 (최초 1회만 허용)
pub const REPLY_QUESTION: &str = r#"
    UPDATE questions
    SET reply_text = $1, replied_at = $2
    WHERE id = $3 AND reply_text IS NULL
    RETURNING id, item_id, author_id, question_text, reply_text, created_at, replied_at
"#;
