use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, warn};

use crate::models::ticket::SupportTicket;
use crate::tickets::{TicketStore, TicketStoreError};

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Forwards tickets to a support ticketing API: `POST {url}` to create,
/// `GET {url}` to list. Retries 429 and 5xx with exponential backoff.
#[derive(Clone)]
pub struct HttpTicketStore {
    client: Client,
    url: String,
    token: Option<String>,
    /// First retry delay; each later retry doubles it.
    backoff_base: Duration,
}

impl HttpTicketStore {
    pub fn new(url: String, token: Option<String>) -> Result<Self, TicketStoreError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            url,
            token,
            backoff_base: Duration::from_millis(1000),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post_with_retry(&self, ticket: &SupportTicket) -> Result<(), TicketStoreError> {
        let mut last_error: Option<TicketStoreError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = self.backoff_base * (1 << (attempt - 1));
                warn!(
                    "Ticket API attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .authorized(self.client.post(&self.url))
                .json(ticket)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(TicketStoreError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Ticket API returned {}: {}", status, body);
                last_error = Some(TicketStoreError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(TicketStoreError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            debug!("Ticket #{} accepted by ticket API ({})", ticket.id, status);
            return Ok(());
        }

        Err(last_error.unwrap_or(TicketStoreError::RetriesExhausted {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl TicketStore for HttpTicketStore {
    async fn append(&self, ticket: &SupportTicket) -> Result<(), TicketStoreError> {
        self.post_with_retry(ticket).await
    }

    async fn list(&self) -> Result<Vec<SupportTicket>, TicketStoreError> {
        let response = self.authorized(self.client.get(&self.url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TicketStoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    fn backend(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ticket::TicketStatus;
    use chrono::Utc;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ticket() -> SupportTicket {
        SupportTicket {
            id: 4242,
            email: "user@example.com".to_string(),
            message: "my CV didn't upload".to_string(),
            status: TicketStatus::Open,
            created_at: Utc::now(),
        }
    }

    fn store(server: &MockServer, token: Option<&str>) -> HttpTicketStore {
        let mut store = HttpTicketStore::new(
            format!("{}/api/support/tickets", server.uri()),
            token.map(str::to_string),
        )
        .unwrap();
        store.backoff_base = Duration::from_millis(1);
        store
    }

    #[tokio::test]
    async fn test_append_posts_ticket_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/support/tickets"))
            .and(body_partial_json(serde_json::json!({
                "id": 4242,
                "email": "user@example.com",
                "status": "open"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        store(&server, None).append(&ticket()).await.unwrap();
    }

    #[tokio::test]
    async fn test_append_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        store(&server, Some("secret")).append(&ticket()).await.unwrap();
    }

    #[tokio::test]
    async fn test_append_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        store(&server, None).append(&ticket()).await.unwrap();
    }

    #[tokio::test]
    async fn test_append_gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .expect(3)
            .mount(&server)
            .await;

        let err = store(&server, None).append(&ticket()).await.unwrap_err();
        assert!(matches!(err, TicketStoreError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_append_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad ticket"))
            .expect(1)
            .mount(&server)
            .await;

        let err = store(&server, None).append(&ticket()).await.unwrap_err();
        match err {
            TicketStoreError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad ticket");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_parses_tickets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/support/tickets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![ticket()]))
            .mount(&server)
            .await;

        let tickets = store(&server, None).list().await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, 4242);
    }
}
