use crate::domain::model::BookingDefaults;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROFILE_VERSION: &str = "2025-06";
pub const DEFAULT_BASE_URL: &str = "https://www.opentable.com/dapi";
pub const DEFAULT_AVAILABILITY_PATH: &str = "/fe/gql?optype=query&opname=RestaurantsAvailability";
pub const DEFAULT_BOOKING_PATH: &str = "/booking/make-reservation";
pub const DEFAULT_ORIGIN: &str = "https://www.opentable.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";
pub const DEFAULT_OPERATION_NAME: &str = "RestaurantsAvailability";
pub const DEFAULT_PERSISTED_QUERY_HASH: &str =
    "e6b87021ed6e865a7778aa39d35d09864c1be29c683c707602dd3de43c854d86";
pub const DEFAULT_DATABASE_REGION: &str = "NA";

/// 遠端服務的契約常數。
///
/// 服務端改版時只需要在設定檔的 `[service]` 覆蓋，不必改動核心邏輯。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceProfile {
    pub version: String,
    pub base_url: String,
    pub availability_path: String,
    pub booking_path: String,
    pub origin: String,
    pub user_agent: String,
    pub operation_name: String,
    pub persisted_query_hash: String,
    pub database_region: String,
    pub booking_defaults: BookingDefaults,
}

impl Default for ServiceProfile {
    fn default() -> Self {
        Self {
            version: DEFAULT_PROFILE_VERSION.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            availability_path: DEFAULT_AVAILABILITY_PATH.to_string(),
            booking_path: DEFAULT_BOOKING_PATH.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            operation_name: DEFAULT_OPERATION_NAME.to_string(),
            persisted_query_hash: DEFAULT_PERSISTED_QUERY_HASH.to_string(),
            database_region: DEFAULT_DATABASE_REGION.to_string(),
            booking_defaults: BookingDefaults::default(),
        }
    }
}

impl ServiceProfile {
    /// 以 `base_url` 指向其他主機（例如測試用的 mock server）
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn availability_url(&self) -> String {
        join_url(&self.base_url, &self.availability_path)
    }

    pub fn booking_url(&self) -> String {
        join_url(&self.base_url, &self.booking_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

impl Validate for ServiceProfile {
    fn validate(&self) -> Result<()> {
        validate_url("service.base_url", &self.base_url)?;
        validate_url("service.origin", &self.origin)?;
        validate_url("service.availability_url", &self.availability_url())?;
        validate_url("service.booking_url", &self.booking_url())?;
        validate_non_empty_string("service.user_agent", &self.user_agent)?;
        validate_non_empty_string("service.operation_name", &self.operation_name)?;
        validate_non_empty_string("service.persisted_query_hash", &self.persisted_query_hash)?;
        validate_non_empty_string("service.database_region", &self.database_region)?;
        Ok(())
    }
}
