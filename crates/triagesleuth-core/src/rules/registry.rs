/// Registry operation classification.
///
/// Each value under a key is labelled from the key's last-write time and the
/// value's data, checked in order:
///
/// 1. no last-write time → `UNKNOWN`
/// 2. written within the recent window (or in the future) → `MODIFY`
/// 3. binary data → `BINARY_UPDATE`
/// 4. otherwise → `ACCESS`
use crate::config::RegistryConfig;
use crate::model::{CanonicalTime, OperationLabel, ValueData, ValueRecord, ValueSlot};
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy)]
pub struct OperationClassifier {
    window: Duration,
}

impl OperationClassifier {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn from_config(cfg: &RegistryConfig) -> Self {
        let hours = i64::try_from(cfg.recent_window_hours).unwrap_or(i64::MAX / 3_600);
        Self::new(Duration::hours(hours))
    }

    pub fn classify(
        &self,
        last_write: CanonicalTime,
        data: &ValueData,
        now: DateTime<Utc>,
    ) -> OperationLabel {
        let Some(written) = last_write.get() else {
            return OperationLabel::Unknown;
        };
        if now.signed_duration_since(written) < self.window {
            OperationLabel::Modify
        } else if data.is_binary() {
            OperationLabel::BinaryUpdate
        } else {
            OperationLabel::Access
        }
    }

    /// Build the value record for one value read, successful or not.
    pub fn value_record(
        &self,
        slot: ValueSlot,
        last_write: CanonicalTime,
        now: DateTime<Utc>,
    ) -> ValueRecord {
        let ValueSlot { name, data } = slot;
        match data {
            Ok(data) => ValueRecord {
                operation: self.classify(last_write, &data, now),
                value_type: data.type_label(),
                value: data.render(),
                name,
            },
            Err(err) => ValueRecord {
                name,
                value: format!("Error reading value: {err}"),
                value_type: OperationLabel::Error.label().to_string(),
                operation: OperationLabel::Error,
            },
        }
    }
}

impl Default for OperationClassifier {
    fn default() -> Self {
        Self::from_config(&RegistryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NodeError;
    use crate::model::RegistryValue;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn at(dt: DateTime<Utc>) -> CanonicalTime {
        CanonicalTime::from_datetime(dt)
    }

    #[test]
    fn recent_write_is_modify() {
        let c = OperationClassifier::default();
        let two_hours_ago = at(now() - Duration::hours(2));
        assert_eq!(
            c.classify(two_hours_ago, &ValueData::Integer(1), now()),
            OperationLabel::Modify
        );
        // Recent outranks binary.
        assert_eq!(
            c.classify(two_hours_ago, &ValueData::Binary(vec![1]), now()),
            OperationLabel::Modify
        );
    }

    #[test]
    fn future_write_counts_as_recent() {
        let c = OperationClassifier::default();
        let later = at(now() + Duration::days(3));
        assert_eq!(
            c.classify(later, &ValueData::Integer(1), now()),
            OperationLabel::Modify
        );
    }

    #[test]
    fn old_writes_split_on_data_type() {
        let c = OperationClassifier::default();
        let old = at(now() - Duration::days(30));
        assert_eq!(
            c.classify(old, &ValueData::Binary(vec![0xde, 0xad]), now()),
            OperationLabel::BinaryUpdate
        );
        assert_eq!(
            c.classify(old, &ValueData::String("x".into()), now()),
            OperationLabel::Access
        );
    }

    #[test]
    fn missing_timestamp_is_unknown() {
        let c = OperationClassifier::default();
        assert_eq!(
            c.classify(CanonicalTime::MISSING, &ValueData::Integer(1), now()),
            OperationLabel::Unknown
        );
    }

    #[test]
    fn window_is_configurable() {
        let c = OperationClassifier::new(Duration::hours(1));
        let two_hours_ago = at(now() - Duration::hours(2));
        assert_eq!(
            c.classify(two_hours_ago, &ValueData::Integer(1), now()),
            OperationLabel::Access
        );
    }

    #[test]
    fn failed_value_becomes_error_record() {
        let c = OperationClassifier::default();
        let slot = ValueSlot {
            name: "Broken".into(),
            data: Err(NodeError::corrupt("bad cell")),
        };
        let rec = c.value_record(slot, CanonicalTime::MISSING, now());
        assert_eq!(rec.name, "Broken");
        assert_eq!(rec.value_type, "ERROR");
        assert_eq!(rec.operation, OperationLabel::Error);
        assert!(rec.value.contains("bad cell"));
    }

    #[test]
    fn value_record_renders_binary_as_hex() {
        let c = OperationClassifier::default();
        let value = RegistryValue {
            name: "Blob".into(),
            data: ValueData::Binary(vec![0x0a, 0xff]),
        };
        let rec = c.value_record(value.into(), at(now() - Duration::days(30)), now());
        assert_eq!(rec.name, "Blob");
        assert_eq!(rec.value, "0aff");
        assert_eq!(rec.value_type, "BINARY");
        assert_eq!(rec.operation, OperationLabel::BinaryUpdate);
    }
}
