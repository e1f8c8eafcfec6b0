use crate::domain::model::{BookingDefaults, BookingOutcome, BookingPayload, ReservationRequest, Slot};
use crate::domain::ports::ReservationApi;
use std::sync::Arc;

/// 由請求與時段組出訂位內容。純函式，不含亂數或目前時間
pub fn build_booking_payload(
    request: &ReservationRequest,
    slot: &Slot,
    defaults: &BookingDefaults,
) -> BookingPayload {
    BookingPayload {
        restaurant_id: request.restaurant_id,
        slot_availability_token: slot.slot_availability_token.clone(),
        slot_hash: slot.slot_hash.clone(),
        is_modify: false,
        reservation_date_time: request.reservation_date_time(),
        party_size: request.party_size,
        first_name: request.requester.first_name.clone(),
        last_name: request.requester.last_name.clone(),
        email: request.requester.email.clone(),
        phone_number: request.requester.phone.clone(),
        defaults: defaults.clone(),
    }
}

/// 送出訂位。每次呼叫最多一個請求，不在內部重試，以免重複訂位
pub struct ReservationSubmitter<A: ReservationApi> {
    api: Arc<A>,
    defaults: BookingDefaults,
}

impl<A: ReservationApi> ReservationSubmitter<A> {
    pub fn new(api: Arc<A>, defaults: BookingDefaults) -> Self {
        Self { api, defaults }
    }

    /// 時段 token 只能用一次，所以這裡直接取得 `slot` 的所有權
    pub async fn submit(&self, request: &ReservationRequest, slot: Slot) -> BookingOutcome {
        let payload = build_booking_payload(request, &slot, &self.defaults);

        tracing::info!(
            "📨 Submitting reservation for {} (party of {}) at restaurant {}",
            payload.reservation_date_time,
            payload.party_size,
            payload.restaurant_id
        );

        match self.api.make_reservation(&payload).await {
            Ok(raw) if raw.is_success() => {
                tracing::info!("✅ Booking response ({}): {}", raw.status, raw.body);
                BookingOutcome::Accepted {
                    status: raw.status,
                    body: raw.body,
                }
            }
            Ok(raw) => {
                tracing::error!("❌ Booking rejected ({}): {}", raw.status, raw.body);
                BookingOutcome::Rejected {
                    status: raw.status,
                    body: raw.body,
                }
            }
            Err(e) => {
                tracing::error!("❌ Booking request failed: {}", e);
                BookingOutcome::TransportFailed {
                    error: e.to_string(),
                }
            }
        }
    }
}
