use crate::job_id::JobId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Key used for records that carry no usable id.
pub const NO_ID_KEY: &str = "no-id";

/// A single job posting as delivered by the feed and as stored in bookmarks.
///
/// Every field is optional on the wire and decoded on its own: a field of the
/// wrong type becomes `None` instead of failing the whole record, numbers sent
/// for text fields are kept as their text. An id that is missing, null or not
/// an integer makes the record non-keyable: it can be listed but never
/// bookmarked.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<JobId>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(
        rename = "whatsapp_no",
        default,
        deserialize_with = "deserialize_lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub whatsapp_number: Option<String>,
    #[serde(
        rename = "primary_details",
        default,
        deserialize_with = "deserialize_lenient_details",
        skip_serializing_if = "Option::is_none"
    )]
    pub primary_details: Option<PrimaryDetails>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrimaryDetails {
    #[serde(
        rename = "Place",
        default,
        deserialize_with = "deserialize_lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub place: Option<String>,
    #[serde(
        rename = "Salary",
        default,
        deserialize_with = "deserialize_lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub salary: Option<String>,
    #[serde(
        rename = "Job_Type",
        default,
        deserialize_with = "deserialize_lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub job_type: Option<String>,
}

fn deserialize_lenient_id<'de, D>(deserializer: D) -> Result<Option<JobId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_i64()).map(JobId::new))
}

fn deserialize_lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn deserialize_lenient_details<'de, D>(deserializer: D) -> Result<Option<PrimaryDetails>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(details @ Value::Object(_)) => serde_json::from_value(details).ok(),
        _ => None,
    })
}

impl JobRecord {
    /// Create a record with only an id, the rest can be filled in with the `with_*` methods
    pub fn new(id: i64) -> Self {
        Self {
            id: Some(JobId::new(id)),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_whatsapp_number(mut self, number: impl Into<String>) -> Self {
        self.whatsapp_number = Some(number.into());
        self
    }

    pub fn with_primary_details(mut self, details: PrimaryDetails) -> Self {
        self.primary_details = Some(details);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The identity of this record, `None` for the no-id sentinel
    pub fn key(&self) -> Option<JobId> {
        self.id
    }

    /// Stable list key: the id as text, or [`NO_ID_KEY`]
    pub fn list_key(&self) -> String {
        self.id
            .map(|id| id.to_string())
            .unwrap_or_else(|| NO_ID_KEY.to_string())
    }

    pub fn display_title(&self) -> &str {
        non_empty(self.title.as_deref()).unwrap_or("No Title")
    }

    pub fn display_place(&self) -> &str {
        non_empty(self.primary_details.as_ref().and_then(|d| d.place.as_deref()))
            .unwrap_or("No Location")
    }

    pub fn display_salary(&self) -> &str {
        non_empty(self.primary_details.as_ref().and_then(|d| d.salary.as_deref()))
            .unwrap_or("No Salary")
    }

    pub fn display_whatsapp_number(&self) -> &str {
        non_empty(self.whatsapp_number.as_deref()).unwrap_or("No Number")
    }

    pub fn display_description(&self) -> &str {
        non_empty(self.description.as_deref()).unwrap_or("No Description")
    }
}

// empty strings render as the placeholder too
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_wire_names() {
        let record: JobRecord = serde_json::from_str(
            r#"{
                "id": 42,
                "title": "Delivery Executive",
                "whatsapp_no": "919999999999",
                "primary_details": {"Place": "Hyderabad", "Salary": "₹15000", "Job_Type": "Full Time"},
                "description": "Two wheeler required",
                "company_name": "ignored"
            }"#,
        )
        .unwrap();

        assert_eq!(record.key(), Some(JobId::new(42)));
        assert_eq!(record.display_title(), "Delivery Executive");
        assert_eq!(record.display_place(), "Hyderabad");
        assert_eq!(record.display_salary(), "₹15000");
        assert_eq!(
            record.primary_details.unwrap().job_type.as_deref(),
            Some("Full Time")
        );
    }

    #[test]
    fn test_unusable_ids_become_no_id() {
        for body in [r#"{}"#, r#"{"id": null}"#, r#"{"id": "7"}"#, r#"{"id": 1.5}"#] {
            let record: JobRecord = serde_json::from_str(body).unwrap();
            assert_eq!(record.key(), None, "body {}", body);
            assert_eq!(record.list_key(), NO_ID_KEY);
        }
    }

    #[test]
    fn test_mistyped_fields_degrade_alone() {
        let record: JobRecord = serde_json::from_str(
            r#"{
                "id": 1,
                "title": 5,
                "whatsapp_no": 919999999999,
                "primary_details": "Hyderabad",
                "description": ["walk-in"]
            }"#,
        )
        .unwrap();

        assert_eq!(record.key(), Some(JobId::new(1)));
        assert_eq!(record.title.as_deref(), Some("5"));
        assert_eq!(record.whatsapp_number.as_deref(), Some("919999999999"));
        assert_eq!(record.primary_details, None);
        assert_eq!(record.display_description(), "No Description");

        let record: JobRecord = serde_json::from_str(
            r#"{"id": 2, "primary_details": {"Place": {"city": "Pune"}, "Salary": 15000}}"#,
        )
        .unwrap();
        let details = record.primary_details.unwrap();
        assert_eq!(details.place, None);
        assert_eq!(details.salary.as_deref(), Some("15000"));
    }

    #[test]
    fn test_placeholders() {
        let record = JobRecord::new(1).with_title("");
        assert_eq!(record.list_key(), "1");
        assert_eq!(record.display_title(), "No Title");
        assert_eq!(record.display_place(), "No Location");
        assert_eq!(record.display_salary(), "No Salary");
        assert_eq!(record.display_whatsapp_number(), "No Number");
        assert_eq!(record.display_description(), "No Description");
    }

    #[test]
    fn test_encode_uses_wire_names() {
        let record = JobRecord::new(3)
            .with_whatsapp_number("123")
            .with_primary_details(PrimaryDetails {
                place: Some("Pune".to_string()),
                ..PrimaryDetails::default()
            });
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["id"], 3);
        assert_eq!(value["whatsapp_no"], "123");
        assert_eq!(value["primary_details"]["Place"], "Pune");
        assert!(value.get("title").is_none());
    }
}
