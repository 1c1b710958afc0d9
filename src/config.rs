//! Configuration for the DramaBox client
//!
//! Every setting maps to a `DRAMABOX_*` environment variable with a
//! documented default. Only the token-issuing URL has no default: calls
//! fail fast when it is unset.

/// Client configuration, resolved once at construction time
#[derive(Debug, Clone)]
pub struct Config {
    /// Token-issuing endpoint (DRAMABOX_TOKEN_URL). Required.
    pub token_url: Option<String>,
    /// App version code sent in the `version` header (DRAMABOX_VERSION_CODE)
    pub version_code: String,
    /// App version name sent in the `vn` header (DRAMABOX_VERSION_NAME)
    pub version_name: String,
    /// Client id sent in the `cid` header (DRAMABOX_CID)
    pub cid: String,
    /// Android package name header (DRAMABOX_PACKAGE_NAME)
    pub package_name: String,
    /// APN flag header (DRAMABOX_APN)
    pub apn: String,
    /// Language for `language` and `current-language` (DRAMABOX_LANGUAGE)
    pub language: String,
    /// Platform code for the `p` header and `channelId` body field
    /// (DRAMABOX_PLATFORM_P)
    pub platform: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token_url: None,
            version_code: "430".to_string(),
            version_name: "4.3.0".to_string(),
            cid: "DRA1000042".to_string(),
            package_name: "com.storymatrix.drama".to_string(),
            apn: "1".to_string(),
            language: "in".to_string(),
            platform: "43".to_string(),
        }
    }
}

impl Config {
    /// Build a config from the environment, falling back to the defaults
    /// for anything unset
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            token_url: std::env::var("DRAMABOX_TOKEN_URL").ok(),
            version_code: env_or("DRAMABOX_VERSION_CODE", defaults.version_code),
            version_name: env_or("DRAMABOX_VERSION_NAME", defaults.version_name),
            cid: env_or("DRAMABOX_CID", defaults.cid),
            package_name: env_or("DRAMABOX_PACKAGE_NAME", defaults.package_name),
            apn: env_or("DRAMABOX_APN", defaults.apn),
            language: env_or("DRAMABOX_LANGUAGE", defaults.language),
            platform: env_or("DRAMABOX_PLATFORM_P", defaults.platform),
        }
    }

    /// Platform code as a number, used for the `channelId` body field
    pub fn channel_id(&self) -> u32 {
        self.platform.parse().unwrap_or(43)
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}
