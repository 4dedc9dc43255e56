/// 낙찰 알림 발송
/// 메일 발송은 최선 노력(best-effort) 외부 협력자다: 실패는 보고될 뿐
/// 경매 마감 상태 전이를 막지 않는다.
// region:    --- Imports
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

// endregion: --- Imports

// region:    --- Notifier Trait
/// 알림 발송 트레이트
/// 실패는 사유 문자열로 반환되며 호출자가 복구한다.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), String>;
}
// endregion: --- Notifier Trait

// region:    --- Mail Relay Notifier
/// HTTP 메일 릴레이를 통한 알림 발송 구현체
pub struct MailRelayNotifier {
    client: reqwest::Client,
    relay_url: String,
    sender: String,
}

impl MailRelayNotifier {
    pub fn new(relay_url: String, sender: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            relay_url,
            sender,
        }
    }

    /// 환경 변수에서 설정을 읽어 생성
    pub fn from_env() -> Self {
        let relay_url = std::env::var("MAIL_RELAY_URL")
            .unwrap_or_else(|_| "http://localhost:8025/api/send".to_string());
        let sender =
            std::env::var("MAIL_SENDER").unwrap_or_else(|_| "auctions@example.com".to_string());
        Self::new(relay_url, sender)
    }
}

#[async_trait]
impl Notifier for MailRelayNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), String> {
        // 주소 유효성 실패도 발송 실패와 동일하게 비치명 오류로 취급한다
        if !recipient.contains('@') {
            return Err(format!("invalid recipient address: {}", recipient));
        }

        info!(
            "{:<12} --> 메일 발송: to={}, subject={}",
            "Notifier", recipient, subject
        );

        let payload = json!({
            "from": self.sender,
            "to": recipient,
            "subject": subject,
            "body": body,
        });

        let response = self
            .client
            .post(&self.relay_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("mail relay request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("mail relay returned status {}", response.status()));
        }

        Ok(())
    }
}
// endregion: --- Mail Relay Notifier
