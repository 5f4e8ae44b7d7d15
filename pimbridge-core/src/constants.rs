/// Default reach of event hash listings, in days either side of now.
pub const DEFAULT_HASH_WINDOW_DAYS: i64 = 365;
