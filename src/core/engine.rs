use crate::core::poller::{AvailabilityPoller, PollOutcome, PollPolicy, ShutdownSignal};
use crate::core::selector::select_from_entries;
use crate::core::submitter::ReservationSubmitter;
use crate::domain::model::{BookingDefaults, RawResponse, ReservationRequest, Slot, SlotEntry};
use crate::domain::ports::ReservationApi;
use crate::utils::error::{BotError, Result};
use std::sync::Arc;
use tracing::Instrument;

/// 單次查詢的結果，供 `check` 指令顯示
#[derive(Debug, Clone)]
pub struct AvailabilitySnapshot {
    pub entries: Vec<SlotEntry>,
    pub selected: Option<Slot>,
}

/// 輪詢 → 選擇 → 訂位，依序執行
pub struct ReservationEngine<A: ReservationApi> {
    api: Arc<A>,
    request: ReservationRequest,
    poller: AvailabilityPoller<A>,
    submitter: ReservationSubmitter<A>,
}

impl<A: ReservationApi> ReservationEngine<A> {
    pub fn new(
        api: Arc<A>,
        request: ReservationRequest,
        policy: PollPolicy,
        defaults: BookingDefaults,
    ) -> Self {
        Self {
            poller: AvailabilityPoller::new(api.clone(), policy),
            submitter: ReservationSubmitter::new(api.clone(), defaults),
            api,
            request,
        }
    }

    pub fn request(&self) -> &ReservationRequest {
        &self.request
    }

    /// 輪詢直到找到時段，然後訂位一次。訂位失敗一律回傳 `BookingFailed`
    pub async fn run(&self, shutdown: &mut ShutdownSignal) -> Result<RawResponse> {
        async move {
            let slot = self.poll_for_slot(shutdown).await?;

            tracing::info!("🎉 Slot found! Attempting to book...");
            let outcome = self.submitter.submit(&self.request, slot).await;
            outcome.into_result()
        }
        .instrument(self.span())
        .await
    }

    /// 只輪詢，不訂位
    pub async fn find_slot(&self, shutdown: &mut ShutdownSignal) -> Result<Slot> {
        self.poll_for_slot(shutdown).instrument(self.span()).await
    }

    async fn poll_for_slot(&self, shutdown: &mut ShutdownSignal) -> Result<Slot> {
        match self.poller.run(&self.request, shutdown).await {
            PollOutcome::SlotFound { slot, .. } => Ok(slot),
            PollOutcome::Cancelled { attempts } => {
                tracing::info!("🛑 Polling cancelled after {} attempts", attempts);
                Err(BotError::Cancelled)
            }
            PollOutcome::Exhausted { attempts } => Err(BotError::PollingExhausted { attempts }),
        }
    }

    fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "reservation",
            restaurant_id = self.request.restaurant_id,
            date = %self.request.date,
            time = %self.request.time
        )
    }

    /// 單次查詢，錯誤直接回傳而不重試
    pub async fn check_once(&self) -> Result<AvailabilitySnapshot> {
        let response = self.api.query_availability(&self.request).await?;
        let entries = response.first_day_slots().map(<[SlotEntry]>::to_vec).unwrap_or_default();
        let selected = select_from_entries(&entries);
        Ok(AvailabilitySnapshot { entries, selected })
    }
}
