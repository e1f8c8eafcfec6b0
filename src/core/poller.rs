use crate::core::selector::select_from_entries;
use crate::domain::model::{ReservationRequest, Slot};
use crate::domain::ports::ReservationApi;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// 輪詢間隔下限，避免洪水式請求
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// 等待開始時間時每次最多睡這麼久，之後重新讀取時鐘
pub const START_WAIT_STEP: Duration = Duration::from_millis(500);

/// 輪詢策略。預設無上限，直到找到時段或被取消
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    pub start_at: Option<DateTime<Local>>,
    pub max_attempts: Option<u32>,
    pub max_duration: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: MIN_POLL_INTERVAL,
            start_at: None,
            max_attempts: None,
            max_duration: None,
        }
    }
}

impl PollPolicy {
    pub fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_POLL_INTERVAL)
    }

    fn limit_reached(&self, attempts: u32, started: Instant) -> bool {
        if let Some(max) = self.max_attempts {
            if attempts >= max {
                return true;
            }
        }
        if let Some(max) = self.max_duration {
            if started.elapsed() >= max {
                return true;
            }
        }
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    SlotFound { slot: Slot, attempts: u32 },
    Cancelled { attempts: u32 },
    Exhausted { attempts: u32 },
}

/// 外部取消訊號，在每次查詢前與每次睡眠中檢查
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// 永遠不會觸發的訊號
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    async fn cancelled(&mut self) -> bool {
        loop {
            if *self.rx.borrow_and_update() {
                return true;
            }
            if self.rx.changed().await.is_err() {
                // sender 已經不在了，不會再有取消
                return std::future::pending().await;
            }
        }
    }

    /// 睡眠 `duration`；被取消時提早返回 `true`
    pub async fn sleep_or_cancel(&mut self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            cancelled = self.cancelled() => cancelled,
        }
    }
}

pub struct AvailabilityPoller<A: ReservationApi> {
    api: Arc<A>,
    policy: PollPolicy,
}

impl<A: ReservationApi> AvailabilityPoller<A> {
    pub fn new(api: Arc<A>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub async fn run(
        &self,
        request: &ReservationRequest,
        shutdown: &mut ShutdownSignal,
    ) -> PollOutcome {
        if let Some(start_at) = self.policy.start_at {
            tracing::info!("⏰ Waiting until {} to start polling...", start_at.format("%Y-%m-%d %H:%M:%S"));
            if !wait_until(start_at, shutdown).await {
                tracing::info!("🛑 Cancelled while waiting for start time");
                return PollOutcome::Cancelled { attempts: 0 };
            }
        }

        let interval = self.policy.effective_interval();
        let started = Instant::now();
        let mut attempts = 0u32;

        tracing::info!(
            "🔍 Starting to poll restaurant {} for {} at {} (party of {}, every {:?})",
            request.restaurant_id,
            request.date,
            request.time,
            request.party_size,
            interval
        );

        loop {
            if shutdown.is_cancelled() {
                return PollOutcome::Cancelled { attempts };
            }

            attempts += 1;
            if let Some(slot) = self.poll_once(request, attempts).await {
                tracing::info!(
                    "🎉 Slot found on attempt {} (offset {} min)",
                    attempts,
                    slot.time_offset_minutes
                );
                return PollOutcome::SlotFound { slot, attempts };
            }

            if self.policy.limit_reached(attempts, started) {
                tracing::warn!("⌛ Polling limit reached after {} attempts", attempts);
                return PollOutcome::Exhausted { attempts };
            }

            if shutdown.sleep_or_cancel(interval).await {
                return PollOutcome::Cancelled { attempts };
            }
        }
    }

    /// 單一輪詢週期。任何錯誤都只記錄並視為本週期沒有時段
    async fn poll_once(&self, request: &ReservationRequest, attempt: u32) -> Option<Slot> {
        let response = match self.api.query_availability(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Availability query failed, will retry");
                return None;
            }
        };

        let Some(entries) = response.first_day_slots() else {
            tracing::debug!(attempt, "Response has no availability nodes");
            return None;
        };

        let slot = select_from_entries(entries);
        if slot.is_none() {
            tracing::debug!(attempt, returned = entries.len(), "No bookable slot yet");
        }
        slot
    }
}

/// 以有上限的步長等待到 `start_at`；被取消時回傳 `false`
async fn wait_until(start_at: DateTime<Local>, shutdown: &mut ShutdownSignal) -> bool {
    loop {
        // 已過時間時 to_std 會失敗
        let remaining = match (start_at - Local::now()).to_std() {
            Ok(remaining) if !remaining.is_zero() => remaining,
            _ => return true,
        };
        if shutdown.sleep_or_cancel(remaining.min(START_WAIT_STEP)).await {
            return false;
        }
    }
}
