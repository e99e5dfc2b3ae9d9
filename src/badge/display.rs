/// Largest count shown verbatim.
pub const MAX_BADGE_COUNT: u64 = 99;

pub const BADGE_OVERFLOW_LABEL: &str = "99+";

/// Text shown on the badge, or `None` when no badge should be visible.
pub fn format_badge(count: u64) -> Option<String> {
    match count {
        0 => None,
        c if c > MAX_BADGE_COUNT => Some(BADGE_OVERFLOW_LABEL.to_string()),
        c => Some(c.to_string()),
    }
}
