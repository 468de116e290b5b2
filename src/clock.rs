use chrono::{DateTime, Utc};

/// Time source injected into the controllers so timestamp- and id-sensitive
/// logic stays deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
