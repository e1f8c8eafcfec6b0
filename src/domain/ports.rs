use crate::domain::model::{AvailabilityResponse, BookingPayload, RawResponse, ReservationRequest};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 訂位服務的遠端介面
#[async_trait]
pub trait ReservationApi: Send + Sync {
    /// 查詢一次可用時段。非 2xx 回傳 `HttpStatus`，無法解碼回傳 `MalformedResponse`
    async fn query_availability(&self, request: &ReservationRequest)
        -> Result<AvailabilityResponse>;

    /// 送出一次訂位。任何狀態碼都以 `RawResponse` 回傳，只有傳輸錯誤才是 `Err`
    async fn make_reservation(&self, payload: &BookingPayload) -> Result<RawResponse>;
}
