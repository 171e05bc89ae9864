use chrono::NaiveTime;
use clubhouse_core::club_lifecycle::DEFAULT_PLATFORM_MIN_GRACE_DAYS;
use clubhouse_core::scheduling::parse_time_of_day;

/// Lifecycle settings loaded from environment variables.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Floor applied to every requested grace period.
    pub platform_min_grace_days: i32,
    /// Daily UTC time of the deletion sweep.
    pub deletion_sweep_at: NaiveTime,
    /// Daily UTC time of the milestone sweep.
    pub milestone_sweep_at: NaiveTime,
}

impl LifecycleConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `PLATFORM_MIN_GRACE_DAYS` | `7`     |
    /// | `DELETION_SWEEP_AT`       | `00:00` |
    /// | `MILESTONE_SWEEP_AT`      | `01:00` |
    pub fn from_env() -> Self {
        let platform_min_grace_days: i32 = std::env::var("PLATFORM_MIN_GRACE_DAYS")
            .unwrap_or_else(|_| DEFAULT_PLATFORM_MIN_GRACE_DAYS.to_string())
            .parse()
            .expect("PLATFORM_MIN_GRACE_DAYS must be a valid i32");
        assert!(
            platform_min_grace_days >= 0,
            "PLATFORM_MIN_GRACE_DAYS must not be negative"
        );

        let deletion_sweep_at = parse_time_of_day(
            &std::env::var("DELETION_SWEEP_AT").unwrap_or_else(|_| "00:00".into()),
        )
        .expect("DELETION_SWEEP_AT must be HH:MM");

        let milestone_sweep_at = parse_time_of_day(
            &std::env::var("MILESTONE_SWEEP_AT").unwrap_or_else(|_| "01:00".into()),
        )
        .expect("MILESTONE_SWEEP_AT must be HH:MM");

        Self {
            platform_min_grace_days,
            deletion_sweep_at,
            milestone_sweep_at,
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            platform_min_grace_days: DEFAULT_PLATFORM_MIN_GRACE_DAYS,
            deletion_sweep_at: NaiveTime::MIN,
            milestone_sweep_at: NaiveTime::from_hms_opt(1, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}
