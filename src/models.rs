//! Data structures shared across the DramaBox client
//!
//! - **Token**: the short-lived credential pair issued by the token endpoint
//! - **UpstreamResponse**: verbatim status + body from the upstream API
//! - **Request bodies**: the exact JSON shapes the upstream expects

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Credentials
// =============================================================================

/// Credential pair required by every upstream call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub token: String,
    #[serde(rename = "deviceid")]
    pub device_id: String,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the full bearer value
        let shown = self.token.chars().take(8).collect::<String>();
        write!(f, "Token({}…, device {})", shown, self.device_id)
    }
}

// =============================================================================
// Upstream passthrough
// =============================================================================

/// Whatever the upstream answered, passed through untouched.
///
/// Non-2xx statuses are data here, not errors: callers interpret them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl UpstreamResponse {
    /// True for the auth-failure statuses that trigger a token refresh
    pub fn is_auth_failure(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

/// Body for the "latest dramas" listing endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestRequest {
    pub new_channel_style: u8,
    pub is_need_rank: u8,
    pub page_no: u32,
    pub index: u32,
    pub channel_id: u32,
}

impl LatestRequest {
    pub fn new(page_no: u32, channel_id: u32) -> Self {
        Self {
            new_channel_style: 1,
            is_need_rank: 1,
            page_no,
            index: 1,
            channel_id,
        }
    }
}

/// Body for the episode/stream endpoint. Most fields are fixed values the
/// mobile app sends; only `book_id` and the episode `index` vary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRequest {
    pub boundary_index: u32,
    pub coming_play_section_id: i64,
    pub index: u32,
    pub currency_play_source: String,
    pub need_end_recommend: u8,
    pub currency_play_source_name: String,
    pub pre_load: bool,
    pub rid: String,
    pub pull_cid: String,
    pub load_direction: u8,
    pub start_up_key: String,
    pub book_id: String,
}

impl StreamRequest {
    pub fn new(book_id: impl Into<String>, index: u32) -> Self {
        Self {
            boundary_index: 0,
            coming_play_section_id: -1,
            index,
            currency_play_source: "discover_new_rec_new".to_string(),
            need_end_recommend: 0,
            currency_play_source_name: String::new(),
            pre_load: false,
            rid: String::new(),
            pull_cid: String::new(),
            load_direction: 0,
            start_up_key: String::new(),
            book_id: book_id.into(),
        }
    }
}

/// Body for keyword search
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub keyword: String,
}

impl SearchRequest {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_deserializes_deviceid() {
        let token: Token =
            serde_json::from_value(json!({"token": "abc", "deviceid": "dev-1"})).unwrap();
        assert_eq!(token.token, "abc");
        assert_eq!(token.device_id, "dev-1");
    }

    #[test]
    fn test_token_display_truncates_bearer() {
        let token = Token {
            token: "supersecretbearer".to_string(),
            device_id: "dev-1".to_string(),
        };
        let shown = token.to_string();
        assert!(shown.contains("superse"));
        assert!(!shown.contains("supersecretbearer"));
    }

    #[test]
    fn test_latest_request_field_names() {
        let body = serde_json::to_value(LatestRequest::new(2, 43)).unwrap();
        assert_eq!(
            body,
            json!({
                "newChannelStyle": 1,
                "isNeedRank": 1,
                "pageNo": 2,
                "index": 1,
                "channelId": 43
            })
        );
    }

    #[test]
    fn test_stream_request_field_names() {
        let body = serde_json::to_value(StreamRequest::new("41000103868", 5)).unwrap();
        assert_eq!(
            body,
            json!({
                "boundaryIndex": 0,
                "comingPlaySectionId": -1,
                "index": 5,
                "currencyPlaySource": "discover_new_rec_new",
                "needEndRecommend": 0,
                "currencyPlaySourceName": "",
                "preLoad": false,
                "rid": "",
                "pullCid": "",
                "loadDirection": 0,
                "startUpKey": "",
                "bookId": "41000103868"
            })
        );
    }

    #[test]
    fn test_auth_failure_statuses() {
        for status in [401u16, 403] {
            let res = UpstreamResponse {
                status,
                body: serde_json::Value::Null,
            };
            assert!(res.is_auth_failure());
        }
        for status in [200u16, 404, 500] {
            let res = UpstreamResponse {
                status,
                body: serde_json::Value::Null,
            };
            assert!(!res.is_auth_failure());
        }
    }
}
