/// Application constants

// Local storage keys
pub const KEY_ANON_PREFIX: &str = "anon_";
pub const KEY_ANON_COUNT: &str = "anonCount";
pub const KEY_WINS_PREFIX: &str = "wins_";
pub const KEY_NICKNAME_PREFIX: &str = "nickname_";
pub const KEY_CHAT_MESSAGES: &str = "publicChatMessages";

// Gated access
pub const UNLOCK_WINS: u32 = 3;
pub const NICKNAME_MAX_LEN: usize = 8;
pub const ANON_NAME_PREFIX: &str = "anon";
pub const DEFAULT_NICKNAME_PREFIX: &str = "User";

// Timers
pub const REQUEST_EXPIRY_SECS: i64 = 300; // 5 minutes
pub const DEFAULT_CONNECT_DELAY_MS: u64 = 1500;
pub const DEFAULT_MATCH_CLOSE_DELAY_MS: u64 = 500;
pub const DEFAULT_EXPIRY_SWEEP_INTERVAL_MS: u64 = 1000;

// Wallet
pub const WALLET_ADDRESS_BYTES: usize = 20;
pub const WALLET_HEADER: &str = "x-wallet-address";

// API version
pub const API_VERSION: &str = "v1";

// WebSocket configuration
pub const WS_HEARTBEAT_INTERVAL_SECS: u64 = 30;
pub const WS_CLIENT_TIMEOUT_SECS: u64 = 60;
pub const NOTIFICATION_CHANNEL_CAPACITY: usize = 256;
