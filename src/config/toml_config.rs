use crate::config::service::ServiceProfile;
use crate::core::poller::PollPolicy;
use crate::domain::model::{ReservationRequest, Requester};
use crate::utils::error::{BotError, Result};
use crate::utils::validation::{
    validate_date, validate_email, validate_non_empty_string, validate_positive_number,
    validate_range, validate_resolved, validate_time, Validate,
};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 15;
pub const MAX_PARTY_SIZE: u32 = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub reservation: ReservationConfig,
    pub requester: Requester,
    pub auth: AuthConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub service: ServiceProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationConfig {
    pub restaurant_id: i64,
    pub date: String,
    pub time: String,
    pub party_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token: String,
    /// 只有 `lookup` 診斷會用到
    pub cookie: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// 本地時間，格式 YYYY-MM-DDTHH:MM:SS
    pub start_at: Option<String>,
    pub interval_seconds: Option<u64>,
    pub max_attempts: Option<u32>,
    pub max_duration_seconds: Option<u64>,
    pub request_timeout_seconds: Option<u64>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            start_at: None,
            interval_seconds: Some(1),
            max_attempts: None,
            max_duration_seconds: None,
            request_timeout_seconds: Some(DEFAULT_REQUEST_TIMEOUT_SECONDS),
        }
    }
}

impl BotConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BotError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BotError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPEN_TABLE_TOKEN})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BotError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn reservation_request(&self) -> ReservationRequest {
        ReservationRequest {
            restaurant_id: self.reservation.restaurant_id,
            date: self.reservation.date.clone(),
            time: self.reservation.time.clone(),
            party_size: self.reservation.party_size,
            requester: self.requester.clone(),
        }
    }

    pub fn poll_policy(&self) -> Result<PollPolicy> {
        let start_at = match &self.polling.start_at {
            Some(raw) => Some(parse_local_datetime("polling.start_at", raw)?),
            None => None,
        };

        Ok(PollPolicy {
            interval: Duration::from_secs(self.polling.interval_seconds.unwrap_or(1)),
            start_at,
            max_attempts: self.polling.max_attempts,
            max_duration: self.polling.max_duration_seconds.map(Duration::from_secs),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.polling
                .request_timeout_seconds
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS),
        )
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if self.reservation.restaurant_id <= 0 {
            return Err(BotError::InvalidConfigValueError {
                field: "reservation.restaurant_id".to_string(),
                value: self.reservation.restaurant_id.to_string(),
                reason: "Restaurant id must be positive".to_string(),
            });
        }
        validate_date("reservation.date", &self.reservation.date)?;
        validate_time("reservation.time", &self.reservation.time)?;
        validate_range(
            "reservation.party_size",
            self.reservation.party_size,
            1,
            MAX_PARTY_SIZE,
        )?;

        let identity = [
            ("requester.first_name", &self.requester.first_name),
            ("requester.last_name", &self.requester.last_name),
            ("requester.phone", &self.requester.phone),
            ("auth.token", &self.auth.token),
        ];
        for (field, value) in identity {
            validate_resolved(field, value)?;
            validate_non_empty_string(field, value)?;
        }
        validate_resolved("requester.email", &self.requester.email)?;
        validate_email("requester.email", &self.requester.email)?;

        if let Some(start_at) = &self.polling.start_at {
            parse_local_datetime("polling.start_at", start_at)?;
        }
        if let Some(attempts) = self.polling.max_attempts {
            validate_positive_number("polling.max_attempts", attempts as u64, 1)?;
        }
        if let Some(timeout) = self.polling.request_timeout_seconds {
            validate_positive_number("polling.request_timeout_seconds", timeout, 1)?;
        }

        self.service.validate()
    }
}

impl Validate for BotConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

/// 解析本地時間；夏令時間重疊時取較早者
pub fn parse_local_datetime(field_name: &str, raw: &str) -> Result<DateTime<Local>> {
    let invalid = |reason: String| BotError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: raw.to_string(),
        reason,
    };

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| invalid(format!("Expected YYYY-MM-DDTHH:MM:SS: {}", e)))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| invalid("Time does not exist in the local timezone".to_string()))
}
