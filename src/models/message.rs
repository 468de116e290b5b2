use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

/// One turn of the conversation. Lives only for the session; the whole log
/// is discarded when the owning controller goes away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    /// ISO-8601. Assistant turns carry the server-stamped time when the
    /// request succeeded, a client-stamped time otherwise.
    pub timestamp: String,
}

impl Message {
    pub fn new(id: u64, text: impl Into<String>, sender: Sender, at: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.into(),
            sender,
            timestamp: at.to_rfc3339(),
        }
    }
}

/// Millisecond-clock-derived message ids, bumped past the last issued value
/// so two messages created in the same millisecond never collide.
#[derive(Debug, Default)]
pub struct MessageIdGen {
    last: u64,
}

impl MessageIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, now: DateTime<Utc>) -> u64 {
        let millis = now.timestamp_millis().max(0) as u64;
        self.last = millis.max(self.last + 1);
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ids_are_strictly_increasing_within_a_millisecond() {
        let mut ids = MessageIdGen::new();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let a = ids.next(at);
        let b = ids.next(at);
        let c = ids.next(at);
        assert!(a < b && b < c);
    }

    #[test]
    fn ids_follow_the_clock_forward() {
        let mut ids = MessageIdGen::new();
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let t1 = t0 + chrono::Duration::seconds(5);
        let a = ids.next(t0);
        let b = ids.next(t1);
        assert_eq!(b, t1.timestamp_millis() as u64);
        assert!(b > a);
    }

    #[test]
    fn ids_never_go_backwards_when_the_clock_does() {
        let mut ids = MessageIdGen::new();
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let earlier = t0 - chrono::Duration::seconds(30);
        let a = ids.next(t0);
        let b = ids.next(earlier);
        assert!(b > a);
    }

    #[test]
    fn sender_wire_form_is_lowercase() {
        assert_eq!(serde_json::to_string(&Sender::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Sender::Assistant).unwrap(),
            "\"assistant\""
        );
    }
}
