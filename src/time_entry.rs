use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// APIから取得したtime entry。
///
/// このクライアントでは読み取り専用で扱う。
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub person_id: String,
    #[serde(default)]
    pub project_id: String,
    pub date_of_work: NaiveDate,
    #[serde(deserialize_with = "deserialize_number")]
    pub hours: u32,
    #[serde(deserialize_with = "deserialize_number")]
    pub minutes: u32,
    #[serde(default)]
    pub notes: String,
    pub is_tangible: bool,
}

impl TimeEntry {
    /// 時間単位の長さを返す。
    pub fn total_hours(&self) -> f64 {
        f64::from(self.hours) + f64::from(self.minutes) / 60.0
    }
}

/// tangible/intangibleのどちらかに一致するtime entryの合計時間を計算する。
///
/// 丸めは行わない。表示時に小数点以下2桁で表示する。
///
/// # Arguments
///
/// * `time_entries` - 集計するtime entry
/// * `is_tangible` - 集計対象とするtangibleフラグ
pub fn calculate_total_time(time_entries: &[TimeEntry], is_tangible: bool) -> f64 {
    time_entries
        .iter()
        .filter(|entry| entry.is_tangible == is_tangible)
        .fold(0.0, |total, entry| total + entry.total_hours())
}

/// 数値、または数値の文字列として送られてくる値をデシリアライズする。
fn deserialize_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u32),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::String(value) => value.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::NaiveDate;
    use rstest::rstest;

    use super::{calculate_total_time, TimeEntry};

    /// テスト用にダミーのTimeEntryを作成する。
    pub(crate) fn dummy_entry(
        id: &str,
        project_id: &str,
        hours: u32,
        minutes: u32,
        is_tangible: bool,
    ) -> TimeEntry {
        TimeEntry {
            id: id.to_string(),
            person_id: "user1".to_string(),
            project_id: project_id.to_string(),
            date_of_work: NaiveDate::from_ymd_opt(2024, 5, 13).unwrap(),
            hours,
            minutes,
            notes: format!("notes of {}", id),
            is_tangible,
        }
    }

    #[rstest]
    #[case::empty_tangible(&[], true, 0.0)]
    #[case::empty_intangible(&[], false, 0.0)]
    #[case::tangible(
        &[dummy_entry("a", "p1", 1, 30, true), dummy_entry("b", "p1", 0, 45, false)],
        true,
        1.5,
    )]
    #[case::intangible(
        &[dummy_entry("a", "p1", 1, 30, true), dummy_entry("b", "p1", 0, 45, false)],
        false,
        0.75,
    )]
    #[case::multiple(
        &[dummy_entry("a", "p1", 2, 0, true), dummy_entry("b", "p2", 1, 15, true)],
        true,
        3.25,
    )]
    fn test_calculate_total_time(
        #[case] entries: &[TimeEntry],
        #[case] is_tangible: bool,
        #[case] expected: f64,
    ) {
        assert!((calculate_total_time(entries, is_tangible) - expected).abs() < 1e-9);
    }

    /// 連結したリストの集計が、それぞれの集計の和になることを確認する。
    #[test]
    fn test_calculate_total_time_is_additive() {
        let first = vec![
            dummy_entry("a", "p1", 1, 10, true),
            dummy_entry("b", "p2", 3, 5, false),
        ];
        let second = vec![
            dummy_entry("c", "p1", 0, 50, true),
            dummy_entry("d", "p3", 2, 20, true),
        ];
        let concatenated = [first.clone(), second.clone()].concat();

        for is_tangible in [true, false] {
            let expected = calculate_total_time(&first, is_tangible)
                + calculate_total_time(&second, is_tangible);
            assert!((calculate_total_time(&concatenated, is_tangible) - expected).abs() < 1e-9);
        }
    }

    /// hours, minutesが文字列でも数値でもデシリアライズできることを確認する。
    #[rstest]
    #[case(r#""hours": "2", "minutes": "05""#)]
    #[case(r#""hours": 2, "minutes": 5"#)]
    fn test_deserialize_time_entry(#[case] duration: &str) {
        let json = format!(
            r#"{{"_id": "e1", "personId": "u1", "projectId": "p1", "dateOfWork": "2024-05-13", {}, "notes": "work", "isTangible": true}}"#,
            duration
        );

        let entry: TimeEntry = serde_json::from_str(&json).unwrap();

        assert_eq!(entry.id, "e1");
        assert_eq!(entry.hours, 2);
        assert_eq!(entry.minutes, 5);
        assert_eq!(entry.date_of_work, NaiveDate::from_ymd_opt(2024, 5, 13).unwrap());
    }

    #[test]
    fn test_deserialize_time_entry_invalid_hours() {
        let json = r#"{"_id": "e1", "dateOfWork": "2024-05-13", "hours": "two", "minutes": 0, "isTangible": true}"#;

        assert!(serde_json::from_str::<TimeEntry>(json).is_err());
    }
}
