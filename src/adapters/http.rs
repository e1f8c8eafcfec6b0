use crate::adapters::cookie::{parse_cookie_string, to_cookie_header};
use crate::config::service::ServiceProfile;
use crate::domain::model::{AvailabilityResponse, BookingPayload, RawResponse, ReservationRequest};
use crate::domain::ports::ReservationApi;
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE, ORIGIN, REFERER, USER_AGENT,
};
use reqwest::Client;
use std::time::Duration;

const CSRF_HEADER: &str = "x-csrf-token";

/// `lookup` 診斷的結果
#[derive(Debug, Clone)]
pub struct RestaurantLookup {
    pub status: u16,
    /// 第一個 availability 節點，回應中沒有時為 `None`
    pub node: Option<serde_json::Value>,
    pub name: Option<String>,
    /// 完整回應，找不到節點時印出來方便排查
    pub document: serde_json::Value,
}

/// 訂位服務的 HTTP 實作。所有請求共用同一個 client 與逾時設定
pub struct OpenTableClient {
    client: Client,
    profile: ServiceProfile,
}

impl OpenTableClient {
    pub fn new(profile: ServiceProfile, token: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ORIGIN, header_value("service.origin", &profile.origin)?);
        headers.insert(USER_AGENT, header_value("service.user_agent", &profile.user_agent)?);
        headers.insert(
            HeaderName::from_static(CSRF_HEADER),
            header_value("auth.token", token)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, profile })
    }

    pub fn profile(&self) -> &ServiceProfile {
        &self.profile
    }

    /// persisted query 的請求內容
    pub fn availability_body(&self, request: &ReservationRequest) -> serde_json::Value {
        serde_json::json!({
            "operationName": self.profile.operation_name,
            "variables": {
                "restaurantIds": [request.restaurant_id],
                "date": request.date,
                "time": request.time,
                "partySize": request.party_size,
                "databaseRegion": self.profile.database_region,
            },
            "extensions": {
                "persistedQuery": {
                    "sha256Hash": self.profile.persisted_query_hash,
                }
            }
        })
    }

    /// 以瀏覽器 cookie 與 referer 查詢一次，取出餐廳名稱以確認 id 正確
    pub async fn lookup_restaurant(
        &self,
        request: &ReservationRequest,
        cookie: Option<&str>,
        referer: Option<&str>,
    ) -> Result<RestaurantLookup> {
        let mut builder = self
            .client
            .post(self.profile.availability_url())
            .header(ACCEPT, "application/json, text/plain, */*")
            .json(&self.availability_body(request));

        if let Some(raw) = cookie {
            let pairs = parse_cookie_string(raw);
            tracing::debug!("Sending {} cookies", pairs.len());
            builder = builder.header(COOKIE, header_value("auth.cookie", &to_cookie_header(&pairs))?);
        }
        if let Some(referer) = referer {
            builder = builder.header(REFERER, header_value("referer", referer)?);
        }

        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!("Lookup response status: {}", status);

        if !status.is_success() {
            let headers = format!("{:?}", response.headers());
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Lookup response headers: {}", headers);
            return Err(BotError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let document: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
            BotError::malformed(format!(
                "response was not valid JSON ({}): {}",
                e,
                String::from_utf8_lossy(&body)
            ))
        })?;

        let node = document
            .pointer("/data/availability/0")
            .cloned();
        let name = node.as_ref().and_then(restaurant_display_name);

        Ok(RestaurantLookup {
            status: status.as_u16(),
            node,
            name,
            document,
        })
    }
}

/// 依序嘗試 `restaurant.name`、`restaurant.displayName`、`restaurantName`、`name`
pub fn restaurant_display_name(node: &serde_json::Value) -> Option<String> {
    let non_empty = |value: Option<&serde_json::Value>| {
        value
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let restaurant = node.get("restaurant").filter(|r| r.is_object());
    restaurant
        .and_then(|r| non_empty(r.get("name")).or_else(|| non_empty(r.get("displayName"))))
        .or_else(|| non_empty(node.get("restaurantName")))
        .or_else(|| non_empty(node.get("name")))
}

fn header_value(field_name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| BotError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: format!("Not a valid HTTP header value: {}", e),
    })
}

#[async_trait]
impl ReservationApi for OpenTableClient {
    async fn query_availability(
        &self,
        request: &ReservationRequest,
    ) -> Result<AvailabilityResponse> {
        let response = self
            .client
            .post(self.profile.availability_url())
            .json(&self.availability_body(request))
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Availability response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        AvailabilityResponse::from_slice(&body)
    }

    async fn make_reservation(&self, payload: &BookingPayload) -> Result<RawResponse> {
        let response = self
            .client
            .post(self.profile.booking_url())
            .json(payload)
            .send()
            .await?;

        // 狀態碼已經收到，body 讀取失敗也不能當成傳輸錯誤，否則可能重複訂位
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(status, error = %e, "Booking response body could not be read");
                format!("<body unreadable: {}>", e)
            }
        };
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::submitter::build_booking_payload;
    use crate::domain::model::{BookingDefaults, Requester, Slot};
    use httpmock::prelude::*;
    use serde_json::json;

    fn request() -> ReservationRequest {
        ReservationRequest {
            restaurant_id: 1367977,
            date: "2025-07-17".to_string(),
            time: "19:00".to_string(),
            party_size: 4,
            requester: Requester {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: "5145550100".to_string(),
            },
        }
    }

    fn client_for(server: &MockServer, timeout: Duration) -> OpenTableClient {
        OpenTableClient::new(
            ServiceProfile::with_base_url(server.base_url()),
            "csrf-123",
            timeout,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_query_sends_persisted_query_with_headers() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/fe/gql")
                .query_param("optype", "query")
                .query_param("opname", "RestaurantsAvailability")
                .header("x-csrf-token", "csrf-123")
                .header("origin", "https://www.opentable.com")
                .header("content-type", "application/json")
                .json_body(json!({
                    "operationName": "RestaurantsAvailability",
                    "variables": {
                        "restaurantIds": [1367977],
                        "date": "2025-07-17",
                        "time": "19:00",
                        "partySize": 4,
                        "databaseRegion": "NA"
                    },
                    "extensions": {"persistedQuery": {
                        "sha256Hash": "e6b87021ed6e865a7778aa39d35d09864c1be29c683c707602dd3de43c854d86"
                    }}
                }));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"data": {"availability": [{"availabilityDays": [{"slots": [
                    {"isAvailable": true, "timeOffsetMinutes": 0, "slotAvailabilityToken": "tok", "slotHash": "hash"}
                ]}]}]}}));
        });

        let client = client_for(&server, Duration::from_secs(5));
        let response = client.query_availability(&request()).await.unwrap();

        api_mock.assert();
        let slots = response.first_day_slots().unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].slot_availability_token.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_status_error() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/fe/gql");
            then.status(403).body("Access Denied");
        });

        let client = client_for(&server, Duration::from_secs(5));
        let err = client.query_availability(&request()).await.unwrap_err();

        api_mock.assert();
        match err {
            BotError::HttpStatus { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "Access Denied");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/fe/gql");
            then.status(200).body("<html>captcha</html>");
        });

        let client = client_for(&server, Duration::from_secs(5));
        let err = client.query_availability(&request()).await.unwrap_err();

        assert!(matches!(err, BotError::MalformedResponse { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_slow_server_hits_timeout() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/fe/gql");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(json!({}));
        });

        let client = client_for(&server, Duration::from_millis(300));
        let err = client.query_availability(&request()).await.unwrap_err();

        match err {
            BotError::Transport(e) => assert!(e.is_timeout()),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_make_reservation_returns_raw_response_for_any_status() {
        let server = MockServer::start();
        let booking_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/booking/make-reservation")
                .header("x-csrf-token", "csrf-123")
                .json_body_partial(
                    r#"{"restaurantId": 1367977, "slotHash": "hash", "isModify": false,
                        "reservationDateTime": "2025-07-17T19:00", "country": "CA"}"#,
                );
            then.status(422).body("{\"errors\":[\"SlotUnavailable\"]}");
        });

        let client = client_for(&server, Duration::from_secs(5));
        let slot = Slot {
            is_available: true,
            time_offset_minutes: 0,
            slot_availability_token: "tok".to_string(),
            slot_hash: "hash".to_string(),
        };
        let payload = build_booking_payload(&request(), &slot, &BookingDefaults::default());

        let raw = client.make_reservation(&payload).await.unwrap();

        booking_mock.assert_hits(1);
        assert_eq!(raw.status, 422);
        assert!(!raw.is_success());
        assert!(raw.body.contains("SlotUnavailable"));
    }

    /// 回應標頭後連線就斷掉的伺服器，httpmock 無法送出截斷的 body
    async fn truncated_booking_server() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            // 把整個請求讀完再回應
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                received.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&received);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if received.len() >= header_end + 4 + length {
                        break;
                    }
                }
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"partial")
                .await
                .unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_make_reservation_keeps_status_when_body_is_cut_off() {
        let base_url = truncated_booking_server().await;
        let client = OpenTableClient::new(
            ServiceProfile::with_base_url(base_url),
            "csrf-123",
            Duration::from_secs(5),
        )
        .unwrap();
        let slot = Slot {
            is_available: true,
            time_offset_minutes: 0,
            slot_availability_token: "tok".to_string(),
            slot_hash: "hash".to_string(),
        };
        let payload = build_booking_payload(&request(), &slot, &BookingDefaults::default());

        let raw = client.make_reservation(&payload).await.unwrap();

        // 已送達的訂位不能被當成傳輸錯誤
        assert_eq!(raw.status, 200);
        assert!(raw.is_success());
        assert!(raw.body.contains("body unreadable"));
    }

    #[tokio::test]
    async fn test_lookup_sends_cookie_and_extracts_name() {
        let server = MockServer::start();
        let lookup_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/fe/gql")
                .header("cookie", "otuvid=abc; OT-SessionId=xyz")
                .header("referer", "https://www.opentable.ca/r/sabayon-montreal");
            then.status(200).json_body(json!({"data": {"availability": [
                {"restaurantId": 1367977, "restaurant": {"displayName": "Sabayon"}}
            ]}}));
        });

        let client = client_for(&server, Duration::from_secs(5));
        let lookup = client
            .lookup_restaurant(
                &request(),
                Some("otuvid=abc; ; OT-SessionId=xyz"),
                Some("https://www.opentable.ca/r/sabayon-montreal"),
            )
            .await
            .unwrap();

        lookup_mock.assert();
        assert_eq!(lookup.status, 200);
        assert_eq!(lookup.name.as_deref(), Some("Sabayon"));
    }

    #[tokio::test]
    async fn test_lookup_without_availability_node() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/fe/gql");
            then.status(200).json_body(json!({"data": {"availability": []}}));
        });

        let client = client_for(&server, Duration::from_secs(5));
        let lookup = client.lookup_restaurant(&request(), None, None).await.unwrap();

        assert!(lookup.node.is_none());
        assert!(lookup.name.is_none());
        assert_eq!(lookup.document, json!({"data": {"availability": []}}));
    }

    #[test]
    fn test_restaurant_display_name_fallbacks() {
        assert_eq!(
            restaurant_display_name(&json!({"restaurant": {"name": "A", "displayName": "B"}})),
            Some("A".to_string())
        );
        assert_eq!(
            restaurant_display_name(&json!({"restaurant": {"displayName": "B"}, "name": "D"})),
            Some("B".to_string())
        );
        assert_eq!(
            restaurant_display_name(&json!({"restaurant": "x", "restaurantName": "C"})),
            Some("C".to_string())
        );
        assert_eq!(
            restaurant_display_name(&json!({"name": "D"})),
            Some("D".to_string())
        );
        assert_eq!(restaurant_display_name(&json!({"restaurantId": 1})), None);
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let result = OpenTableClient::new(ServiceProfile::default(), "bad\ntoken", Duration::from_secs(1));
        assert!(matches!(
            result,
            Err(BotError::InvalidConfigValueError { .. })
        ));
    }
}
