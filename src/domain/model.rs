use serde::{Deserialize, Serialize};

use crate::utils::error::{BotError, Result};

/// 訂位者身份資料
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// 一次執行只針對一間餐廳、一個日期時間
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRequest {
    pub restaurant_id: i64,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM
    pub time: String,
    pub party_size: u32,
    pub requester: Requester,
}

impl ReservationRequest {
    pub fn reservation_date_time(&self) -> String {
        format!("{}T{}", self.date, self.time)
    }
}

/// 可用時段查詢的回應
///
/// 只解析核心需要的節點 `data.availability[].availabilityDays[].slots[]`，
/// 其餘欄位忽略。任何節點缺失（或為 null）都視為沒有時段，而不是錯誤。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityResponse {
    #[serde(default)]
    pub data: Option<AvailabilityData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityData {
    #[serde(default)]
    pub availability: Option<Vec<RestaurantAvailability>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantAvailability {
    #[serde(default)]
    pub availability_days: Option<Vec<AvailabilityDay>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityDay {
    #[serde(default)]
    pub slots: Option<Vec<SlotEntry>>,
}

/// 回應中的原始時段，不可訂的時段通常沒有 token。
///
/// 可用旗標與時間差是必要欄位；缺少時整份回應視為格式錯誤，
/// 否則缺欄位的時段會被當成差 0 分鐘而搶走選擇。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotEntry {
    pub is_available: bool,
    pub time_offset_minutes: i32,
    #[serde(default)]
    pub slot_availability_token: Option<String>,
    #[serde(default)]
    pub slot_hash: Option<String>,
}

impl AvailabilityResponse {
    /// 型別化解碼；形狀不符時回傳 `MalformedResponse`
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| BotError::malformed(format!("availability document: {}", e)))
    }

    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| BotError::malformed(format!("availability document: {}", e)))
    }

    /// 第一間餐廳、第一天的時段列表。
    ///
    /// 一次只查一間餐廳、一天，所以多餐廳/多日的回應只取第一個元素。
    /// 回傳 `None` 表示回應缺少預期的節點。
    pub fn first_day_slots(&self) -> Option<&[SlotEntry]> {
        self.data
            .as_ref()?
            .availability
            .as_ref()?
            .first()?
            .availability_days
            .as_ref()?
            .first()?
            .slots
            .as_deref()
    }
}

/// 被選中、可訂位的時段。token 只在產生它的那次輪詢中有效
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub is_available: bool,
    pub time_offset_minutes: i32,
    pub slot_availability_token: String,
    pub slot_hash: String,
}

impl Slot {
    /// 只有標記為可用且兩個 token 都存在的時段才能訂
    pub fn from_entry(entry: &SlotEntry) -> Option<Self> {
        if !entry.is_available {
            return None;
        }
        let token = entry.slot_availability_token.as_deref().filter(|t| !t.is_empty())?;
        let hash = entry.slot_hash.as_deref().filter(|h| !h.is_empty())?;

        Some(Self {
            is_available: true,
            time_offset_minutes: entry.time_offset_minutes,
            slot_availability_token: token.to_string(),
            slot_hash: hash.to_string(),
        })
    }
}

/// 訂位請求中由服務端定義的固定欄位，原樣轉發
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"), default)]
pub struct BookingDefaults {
    pub country: String,
    pub reservation_type: String,
    pub reservation_attribute: String,
    pub additional_service_fees: Vec<serde_json::Value>,
    pub tip_amount: u32,
    pub tip_percent: u32,
    pub points_type: String,
    pub points: u32,
    pub dining_area_id: u32,
    pub fbp: String,
    pub phone_number_country_id: String,
    pub opt_in_email_restaurant: bool,
}

impl Default for BookingDefaults {
    fn default() -> Self {
        Self {
            country: "CA".to_string(),
            reservation_type: "Standard".to_string(),
            reservation_attribute: "default".to_string(),
            additional_service_fees: Vec::new(),
            tip_amount: 0,
            tip_percent: 0,
            points_type: "Standard".to_string(),
            points: 100,
            dining_area_id: 1,
            fbp: "fb.1.1685721920137.7677309689611231".to_string(),
            phone_number_country_id: "CA".to_string(),
            opt_in_email_restaurant: false,
        }
    }
}

/// make-reservation 的請求內容
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    pub restaurant_id: i64,
    pub slot_availability_token: String,
    pub slot_hash: String,
    pub is_modify: bool,
    pub reservation_date_time: String,
    pub party_size: u32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(flatten)]
    pub defaults: BookingDefaults,
}

/// 未經解讀的 HTTP 回應
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 訂位結果。成功的內容由服務端定義，這裡不做解讀
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Accepted { status: u16, body: String },
    Rejected { status: u16, body: String },
    TransportFailed { error: String },
}

impl BookingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// 失敗時轉成 `BookingFailed`，保留原始狀態碼與內容
    pub fn into_result(self) -> Result<RawResponse> {
        match self {
            Self::Accepted { status, body } => Ok(RawResponse { status, body }),
            Self::Rejected { status, body } => Err(BotError::BookingFailed {
                detail: format!("HTTP {}: {}", status, body),
            }),
            Self::TransportFailed { error } => Err(BotError::BookingFailed { detail: error }),
        }
    }
}
