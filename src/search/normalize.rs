use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use super::types::{Opportunity, RawJob};

pub const DEFAULT_EMPLOYER: &str = "Company Confidential";
pub const DEFAULT_TITLE: &str = "Position Available";

fn generated_id() -> String {
    format!("job-{}", Uuid::new_v4())
}

/// Non-empty string value; anything else counts as missing.
fn text(v: Option<Value>) -> Option<String> {
    match v {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

/// Provider ids are usually strings but occasionally bare numbers.
fn identifier(v: Option<Value>) -> Option<String> {
    match v {
        Some(Value::Number(n)) => Some(n.to_string()),
        other => text(other),
    }
}

/// Maps one provider entry onto the internal shape, filling display defaults.
pub(crate) fn normalize_one(raw: RawJob) -> Opportunity {
    Opportunity {
        external_id: identifier(raw.job_id).unwrap_or_else(generated_id),
        employer_name: text(raw.employer_name).unwrap_or_else(|| DEFAULT_EMPLOYER.to_string()),
        title: text(raw.job_title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        apply_url: text(raw.job_apply_link).unwrap_or_default(),
        details: raw.details,
    }
}

/// Normalizes a provider `data` array. Anything other than an array yields an
/// empty list and non-object entries are skipped. Mistyped fields inside an
/// object are treated as missing.
pub fn normalize(payload: &Value) -> Vec<Opportunity> {
    let Some(entries) = payload.as_array() else {
        warn!(kind = %value_kind(payload), "search payload is not an array");
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| match RawJob::deserialize_entry(entry) {
            Ok(raw) => Some(normalize_one(raw)),
            Err(e) => {
                warn!(index = idx, error = %e, "skipping undecodable search entry");
                None
            }
        })
        .collect()
}

impl RawJob {
    fn deserialize_entry(entry: &Value) -> Result<RawJob, serde_json::Error> {
        if !entry.is_object() {
            return Err(serde::de::Error::custom(format!(
                "expected object, found {}",
                value_kind(entry)
            )));
        }
        serde_json::from_value(entry.clone())
    }
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_entry_gets_display_defaults() {
        let out = normalize(&json!([{}]));
        assert_eq!(out.len(), 1);
        let o = &out[0];
        assert_eq!(o.title, "Position Available");
        assert_eq!(o.employer_name, "Company Confidential");
        assert_eq!(o.apply_url, "");
        assert!(!o.external_id.is_empty());
    }

    #[test]
    fn generated_ids_are_unique() {
        let out = normalize(&json!([{}, {}, {}]));
        assert_ne!(out[0].external_id, out[1].external_id);
        assert_ne!(out[1].external_id, out[2].external_id);
    }

    #[test]
    fn skills_pass_through_unchanged() {
        let out = normalize(&json!([{ "job_required_skills": ["Go", "SQL"] }]));
        assert_eq!(
            out[0].details.required_skills,
            Some(vec!["Go".to_string(), "SQL".to_string()])
        );
    }

    #[test]
    fn nested_structures_pass_through() {
        let out = normalize(&json!([{
            "job_id": "abc123",
            "employer_name": "Acme",
            "job_title": "Data Intern",
            "job_apply_link": "https://acme.example/apply",
            "job_is_remote": true,
            "job_city": "Athens",
            "job_state": "GA",
            "job_min_salary": 20,
            "job_max_salary": 25.5,
            "job_salary_period": "HOUR",
            "job_benefits": ["health_insurance"],
            "job_required_experience": { "no_experience_required": true },
            "job_required_education": { "bachelors_degree": true, "degree_mentioned": true },
            "job_highlights": { "Qualifications": ["SQL"], "Responsibilities": ["Reports"] },
            "some_future_field": { "ignored": true }
        }]));
        let o = &out[0];
        assert_eq!(o.external_id, "abc123");
        assert_eq!(o.employer_name, "Acme");
        assert_eq!(o.title, "Data Intern");
        assert_eq!(o.apply_url, "https://acme.example/apply");
        assert_eq!(o.details.is_remote, Some(true));
        assert_eq!(o.details.city.as_deref(), Some("Athens"));
        assert_eq!(o.details.salary_min, Some(20.0));
        assert_eq!(o.details.salary_max, Some(25.5));
        assert_eq!(
            o.details.required_experience.as_ref().and_then(|e| e.no_experience_required),
            Some(true)
        );
        assert_eq!(
            o.details.required_education.as_ref().and_then(|e| e.bachelors_degree),
            Some(true)
        );
        let highlights = o.details.highlights.as_ref().unwrap();
        assert_eq!(highlights.qualifications, Some(vec!["SQL".to_string()]));
        assert_eq!(highlights.benefits, None);
    }

    #[test]
    fn serializes_with_provider_field_names() {
        let out = normalize(&json!([{ "job_id": "x", "job_required_skills": ["Rust"] }]));
        let v = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(v["job_id"], "x");
        assert_eq!(v["job_title"], "Position Available");
        assert_eq!(v["employer_name"], "Company Confidential");
        assert_eq!(v["job_apply_link"], "");
        assert_eq!(v["job_required_skills"], json!(["Rust"]));
        assert!(v.get("job_city").is_none());
    }

    #[test]
    fn non_array_payloads_degrade_to_empty() {
        assert!(normalize(&Value::Null).is_empty());
        assert!(normalize(&json!({ "data": [] })).is_empty());
        assert!(normalize(&json!("oops")).is_empty());
    }

    #[test]
    fn mistyped_fields_do_not_drop_the_listing() {
        let out = normalize(&json!([
            { "job_title": "Numeric id", "job_id": 12345 },
            { "job_title": "Fractional months",
              "job_required_experience": { "required_experience_in_months": 36.5 } },
            { "job_title": "String remote", "job_is_remote": "true", "job_city": "Athens" },
            { "job_title": 7, "employer_name": ["Acme"], "job_apply_link": false },
        ]));
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].title, "Numeric id");
        assert_eq!(out[0].external_id, "12345");
        assert_eq!(
            out[1].details.required_experience.as_ref().and_then(|e| e.required_experience_in_months),
            Some(36.5)
        );
        assert_eq!(out[2].title, "String remote");
        assert_eq!(out[2].details.is_remote, None);
        assert_eq!(out[2].details.city.as_deref(), Some("Athens"));
        assert_eq!(out[3].title, "Position Available");
        assert_eq!(out[3].employer_name, "Company Confidential");
        assert_eq!(out[3].apply_url, "");
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let out = normalize(&json!([42, { "job_title": "Kept" }, "str"]));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Kept");
    }
}
