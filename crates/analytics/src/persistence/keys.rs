#![forbid(unsafe_code)]

use serde_json::{Map, Value};

/// Every property name the history document uses, in its written form.
const CANONICAL_KEYS: &[&str] = &[
    "formatVersion",
    "firstRecordedDate",
    "lastUpdatedDate",
    "installationId",
    "snapshots",
    "summaryStats",
    "timestamp",
    "totalDevices",
    "cloudManagedDevices",
    "configMgrOnlyDevices",
    "cloudNativeDevices",
    "isRealData",
    "sourceHash",
    "peakDevices",
    "currentDevices",
    "currentPercentage",
    "migratedLast7Days",
    "migratedLast30Days",
    "migratedLast90Days",
    "averageDailyVelocity",
    "trendDirection",
    "estimatedDaysToCompletion",
    "snapshotCount",
    "realSnapshotCount",
    "daysOfHistory",
];

fn normalize(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn canonical(key: &str) -> Option<&'static str> {
    let wanted = normalize(key);
    CANONICAL_KEYS
        .iter()
        .copied()
        .find(|candidate| normalize(candidate) == wanted)
}

/// Rewrite object keys onto their canonical spelling, ignoring case and
/// `_`/`-` separators. Unknown keys are left untouched.
pub fn fold_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut folded = Map::with_capacity(map.len());
            for (key, value) in map {
                let key = canonical(&key).map(str::to_owned).unwrap_or(key);
                folded.insert(key, fold_keys(value));
            }
            Value::Object(folded)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(fold_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn folds_pascal_and_snake_case() {
        let value = json!({
            "FormatVersion": 1,
            "installation_id": "abc",
            "Snapshots": [{ "TOTALDEVICES": 5, "is_real_data": true }],
            "extra": 1,
        });
        let folded = fold_keys(value);
        assert_eq!(folded["formatVersion"], 1);
        assert_eq!(folded["installationId"], "abc");
        assert_eq!(folded["snapshots"][0]["totalDevices"], 5);
        assert_eq!(folded["snapshots"][0]["isRealData"], true);
        assert_eq!(folded["extra"], 1);
    }
}
