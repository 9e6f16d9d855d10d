// ABOUTME: Protocol constants for the Garmin Connect SSO and OAuth flows
// ABOUTME: URL paths, scrape patterns, user agents, and file names organized by concern

/// Garmin Connect domains
pub mod domains {
    /// International service
    pub const GARMIN_COM: &str = "garmin.com";
    /// Mainland China service
    pub const GARMIN_CN: &str = "garmin.cn";
}

/// Query values used by the SSO widget flow
pub mod sso {
    /// Client identifier sent on the embed request
    pub const CLIENT_ID: &str = "GarminConnect";
    /// Locale for every SSO page
    pub const LOCALE: &str = "en";
    /// Widget identifier for the sign-in page
    pub const WIDGET_ID: &str = "gauth-widget";
}

/// Regular expressions matched against SSO HTML
///
/// These must match the live service's markup exactly.
pub mod patterns {
    /// Hidden CSRF input on the sign-in page
    pub const CSRF: &str = r#"name="_csrf"\s+value="(.+?)""#;
    /// Service ticket embedded in the post-login redirect
    pub const TICKET: &str = r#"ticket=([^"]+)""#;
    /// Status assignment present when the account is locked
    pub const ACCOUNT_LOCKED: &str = r#"var status\s*=\s*"([^"]*)""#;
    /// Page title
    pub const PAGE_TITLE: &str = r"<title>([^<]*)</title>";
    /// Title of the phone verification interstitial
    pub const PHONE_UPDATE_TITLE: &str = "Update Phone Number";
}

/// User agents; the service changes behavior depending on which is sent
pub mod user_agents {
    /// Android Connect app, required by the OAuth endpoints
    pub const CONNECT_MOBILE: &str = "com.garmin.android.apps.connectmobile";
    /// Desktop browser, used for the HTML sign-in steps
    pub const BROWSER: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
}

/// OAuth endpoints and signing parameters
pub mod oauth {
    /// Public bootstrap document holding the shared consumer key/secret
    pub const CONSUMER_URL: &str = "https://thegarth.s3.amazonaws.com/oauth_consumer.json";
    /// Path (under the OAuth base) exchanging a ticket for an OAuth1 token
    pub const PREAUTHORIZED_PATH: &str = "preauthorized";
    /// Path (under the OAuth base) exchanging an OAuth1 token for an OAuth2 token
    pub const EXCHANGE_PATH: &str = "exchange/user/2.0";
    /// Signature method
    pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
    /// Protocol version
    pub const VERSION: &str = "1.0";
    /// Length of generated nonces
    pub const NONCE_LENGTH: usize = 32;
}

/// Persisted file names
pub mod files {
    /// OAuth1 token document
    pub const OAUTH1_TOKEN: &str = "oauth1_token.json";
    /// OAuth2 token document
    pub const OAUTH2_TOKEN: &str = "oauth2_token.json";
    /// Credentials config document
    pub const CREDENTIALS_CONFIG: &str = "garmin.config.json";
    /// Default token directory under the user's home
    pub const DEFAULT_TOKEN_DIR: &str = ".garminconnect";
}

/// HTTP client defaults
pub mod http {
    /// Request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Connect timeout in seconds
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Session event channel capacity
    pub const EVENT_CHANNEL_CAPACITY: usize = 16;
}
