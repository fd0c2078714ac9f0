/// Smallest party that counts as a large group.
pub const LARGE_GROUP_THRESHOLD: i64 = 5;

/// 1 for parties of five or more, else 0.
pub fn large_group(passenger_count: i64) -> u8 {
    u8::from(passenger_count >= LARGE_GROUP_THRESHOLD)
}
