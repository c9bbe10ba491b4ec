//! Reviews-per-day cap.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyLimiter {
    daily_cap: usize,
}

impl DailyLimiter {
    /// A cap of 0 disables limiting.
    pub fn new(daily_cap: usize) -> Self {
        Self { daily_cap }
    }

    pub fn daily_cap(&self) -> usize {
        self.daily_cap
    }

    pub fn remaining(&self, reviews_done_today: usize) -> usize {
        remaining_quota(reviews_done_today, self.daily_cap)
    }
}

/// Reviews still allowed today. `usize::MAX` when `daily_cap` is 0.
pub fn remaining_quota(reviews_done_today: usize, daily_cap: usize) -> usize {
    if daily_cap == 0 {
        return usize::MAX;
    }
    daily_cap.saturating_sub(reviews_done_today)
}
