/// Hours a member has to respond to a pending penalty before it is auto-accepted.
pub const RESPONSE_DEADLINE_HOURS: i64 = 24;

/// Currency symbol used when a group does not configure one.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "€";

/// IANA timezone used when a group does not configure one.
pub const DEFAULT_GROUP_TIMEZONE: &str = "UTC";

/// Upper bound on how many days back the group streak is counted.
pub const STREAK_LOOKBACK_DAYS: i64 = 365;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;
