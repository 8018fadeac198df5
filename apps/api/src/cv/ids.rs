use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::cv::CvId;

/// Source of record identifiers. Implementations must never hand out the same id twice.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> CvId;
}

/// Random UUID v4 ids. Default for running services.
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> CvId {
        CvId::new(Uuid::new_v4().to_string())
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
