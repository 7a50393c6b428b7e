use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One scheduled instance of a (possibly recurring) meeting. `occurrence_id`
/// is the decimal unix-seconds string of the scheduled start, derived,
/// never independently assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub occurrence_id: String,
    pub start_time: DateTime<Utc>,
    pub index: u32,
}

impl Occurrence {
    pub fn occurrence_id_for(start_time: DateTime<Utc>) -> String {
        start_time.timestamp().to_string()
    }

    pub fn new(start_time: DateTime<Utc>, index: u32) -> Self {
        Self {
            occurrence_id: Self::occurrence_id_for(start_time),
            start_time,
            index,
        }
    }
}
