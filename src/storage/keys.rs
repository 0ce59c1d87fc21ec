//! Storage keys
//!
//! One key per store. The values must stay readable across client reloads,
//! so renaming a key is a breaking change to the persisted schema.

/// Array of cart lines
pub const CART: &str = "cart.v1";

/// Mapping of recipient key to that recipient's notifications
pub const NOTIFICATIONS: &str = "notifications.v1";

/// Array of harvests created locally and not yet confirmed by the server
pub const LOCAL_HARVESTS: &str = "localHarvests";

/// Mapping of crop id to the ISO timestamp at which its timer was frozen
pub const CROP_FREEZE_TIMES: &str = "cropFreezeTimes";

/// All keys owned by the SDK
pub const ALL: [&str; 4] = [CART, NOTIFICATIONS, LOCAL_HARVESTS, CROP_FREEZE_TIMES];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_distinct() {
        let unique: HashSet<_> = ALL.iter().collect();
        assert_eq!(unique.len(), ALL.len());
    }
}
