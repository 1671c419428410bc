//! Stability samples are not stored on their own; a sample is the set of
//! test results sharing a composite key built from the protocol and the
//! matrix cell.

use pqms_schemas::testing::TestResult;
use std::fmt;

/// Composite key `"{protocol}-{condition}-{time_point}"`.
///
/// Two conditions sharing an id end up aggregated under the same key; ids are
/// assumed unique within a protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleKey(String);

impl SampleKey {
    pub fn new(protocol_number: &str, condition_id: &str, time_point_id: &str) -> Self {
        Self(format!("{}-{}-{}", protocol_number, condition_id, time_point_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SampleKey> for String {
    fn from(key: SampleKey) -> Self {
        key.0
    }
}

pub fn sample_key(protocol_number: &str, condition_id: &str, time_point_id: &str) -> String {
    SampleKey::new(protocol_number, condition_id, time_point_id).into()
}

/// All results recorded against the sample, in collection order.
pub fn results_for_sample<'a>(results: &'a [TestResult], key: &str) -> Vec<&'a TestResult> {
    results.iter().filter(|r| r.sample_id == key).collect()
}
