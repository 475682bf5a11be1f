use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time. Migration steps receive it at construction, so tests can pin
/// timestamps written to the database.
///
/// Any `Fn() -> i64` is a clock:
///
/// ```
/// use mass_update::Clock;
///
/// let frozen = || 1_500_000_000_000_i64;
/// assert_eq!(1_500_000_000_000, frozen.now());
/// ```
pub trait Clock {
    /// Milliseconds since the unix epoch.
    fn now(&self) -> i64;
}

impl<F> Clock for F
where
    F: Fn() -> i64,
{
    fn now(&self) -> i64 {
        self()
    }
}

/// Reads the wall clock of the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(since_epoch) => since_epoch.as_millis().try_into().unwrap_or(i64::MAX),
            // System clock set before 1970
            Err(before_epoch) => {
                let millis: i64 = before_epoch.duration().as_millis().try_into().unwrap_or(i64::MAX);
                -millis
            }
        }
    }
}
