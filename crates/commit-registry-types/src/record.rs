use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::commitment::{Commitment, ExtraData};
use crate::timepoint::Timepoint;

/// An accepted commitment. Presence in the store means accepted.
///
/// All fields are fixed at acceptance; the only mutation a store allows is
/// removing the whole record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentRecord {
    pub commitment: Commitment,
    pub committer: AccountId,
    pub extra_data: ExtraData,
    pub timepoint: Timepoint,
}

/// Notification published once for every accepted commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEvent {
    pub timepoint: Timepoint,
    pub from: AccountId,
    pub commitment: Commitment,
    pub extra_data: ExtraData,
}

impl From<&CommitmentRecord> for CommitEvent {
    fn from(record: &CommitmentRecord) -> Self {
        Self {
            timepoint: record.timepoint,
            from: record.committer,
            commitment: record.commitment,
            extra_data: record.extra_data.clone(),
        }
    }
}

impl CommitEvent {
    /// Whether this event describes exactly `record`.
    pub fn describes(&self, record: &CommitmentRecord) -> bool {
        self.timepoint == record.timepoint
            && self.from == record.committer
            && self.commitment == record.commitment
            && self.extra_data == record.extra_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CommitmentRecord {
        CommitmentRecord {
            commitment: Commitment::from_bytes([2u8; 32]),
            committer: AccountId::from_bytes([1u8; 32]),
            extra_data: ExtraData::from(vec![0x01]),
            timepoint: Timepoint::new(10, 3),
        }
    }

    #[test]
    fn event_mirrors_record() {
        let r = record();
        let event = CommitEvent::from(&r);
        assert!(event.describes(&r));

        let mut other = r.clone();
        other.timepoint = Timepoint::new(10, 4);
        assert!(!event.describes(&other));
    }

    #[test]
    fn record_json_shape() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["extra_data"], "01");
        assert_eq!(json["timepoint"]["tick"], 10);
        assert_eq!(json["timepoint"]["seq"], 3);
        assert_eq!(json["committer"], "01".repeat(32));
    }
}
