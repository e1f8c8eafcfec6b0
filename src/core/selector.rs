use crate::domain::model::{AvailabilityResponse, Slot, SlotEntry};

/// 從回應中挑出最接近目標時間的可訂時段。
///
/// 只看第一間餐廳的第一天。同距離時取回應中先出現者，
/// 不區分早於或晚於目標時間。
pub fn select_slot(response: &AvailabilityResponse) -> Option<Slot> {
    response.first_day_slots().and_then(select_from_entries)
}

pub fn select_from_entries(entries: &[SlotEntry]) -> Option<Slot> {
    entries
        .iter()
        .filter_map(Slot::from_entry)
        // min_by_key 在相同鍵值時回傳第一個元素
        .min_by_key(|slot| slot.time_offset_minutes.unsigned_abs())
}
