pub const VERSION: &str = env!("BUILD_VERSION");

// ===== GREETING SCHEME =====

// Prefix prepended to every caller-supplied name
pub const GREETING_PREFIX: &str = "Hello, ";
// Separator byte between the name and the counter in a box key ('_')
pub const BOX_KEY_SEPARATOR: u8 = 0x5F;
// Size of the big-endian counter suffix of a box key
pub const COUNTER_SUFFIX_SIZE: usize = 8;
// Global state slot holding the greeting counter
pub const COUNTER_GLOBAL_KEY: &str = "counter";
// Box used by the legacy fixed-key mode, overwritten on every call
pub const FIXED_GREETING_BOX: &[u8] = b"greeting";
// Longest box key a ledger accepts, leaves 55 bytes for a name
pub const MAX_BOX_KEY_SIZE: usize = 64;

// ===== CONTRACT =====

// Application name used to find an existing deployment
pub const HELLO_WORLD_APP_NAME: &str = "HelloWorld";
// The only method exposed by the contract
pub const HELLO_METHOD: &str = "hello";
// Name used by the client when none is given
pub const DEFAULT_GREETING_NAME: &str = "John Doe";

// ===== STORAGE FUNDING (MBR) =====

// 6 decimals numbers
pub const COIN_DECIMALS: u8 = 6;
// 1 000 000 micro-units to represent 1 coin
pub const COIN_VALUE: u64 = 10u64.pow(COIN_DECIMALS as u32);
// Base balance any application account must keep
pub const MIN_ACCOUNT_BALANCE: u64 = 100_000;
// Flat cost of each box, whatever its size
pub const BOX_FLAT_MIN_BALANCE: u64 = 2_500;
// Cost of each byte held by a box (key + value)
pub const BOX_BYTE_MIN_BALANCE: u64 = 400;
// Balance the deploy step keeps on the application account
// 2 coins support roughly a hundred greeting boxes
pub const DEFAULT_MIN_FUNDING: u64 = 2 * COIN_VALUE;

// ===== CLIENT =====

// Directory holding one ledger snapshot per network
pub const DEFAULT_LEDGER_DIR: &str = "ledger/";
// Log file written by the client when file logging is enabled
pub const DEFAULT_LOG_FILENAME: &str = "greeter.log";
pub const DEFAULT_LOGS_PATH: &str = "logs/";

/// Minimum balance required to hold one box of the given key and value sizes
pub const fn box_min_balance(key_len: usize, value_len: usize) -> u64 {
    BOX_FLAT_MIN_BALANCE + BOX_BYTE_MIN_BALANCE * (key_len + value_len) as u64
}
