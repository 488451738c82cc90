use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Decodes an optional field, reading a value of the wrong shape as absent so
/// one bad field never costs the rest of the listing.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

// Field names on the wire follow the JSearch payload so that a saved
// opportunity round-trips through the client unchanged.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequiredExperience {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub no_experience_required: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub required_experience_in_months: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub experience_mentioned: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub experience_preferred: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequiredEducation {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub postgraduate_degree: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub professional_school: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub high_school: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub associates_degree: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub bachelors_degree: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub degree_mentioned: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub degree_preferred: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub professional_school_mentioned: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobHighlights {
    #[serde(rename = "Qualifications", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub qualifications: Option<Vec<String>>,
    #[serde(rename = "Responsibilities", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub responsibilities: Option<Vec<String>>,
    #[serde(rename = "Benefits", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub benefits: Option<Vec<String>>,
}

/// Optional listing fields, passed through untouched from the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDetails {
    #[serde(rename = "employer_logo", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub employer_logo_url: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub employer_website: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub employer_company_type: Option<String>,
    #[serde(rename = "job_publisher", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(rename = "job_employment_type", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(rename = "job_apply_is_direct", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub apply_is_direct: Option<bool>,
    #[serde(rename = "job_apply_quality_score", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub apply_quality_score: Option<f64>,
    #[serde(rename = "job_description", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "job_is_remote", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub is_remote: Option<bool>,
    #[serde(rename = "job_posted_at_timestamp", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub posted_at_timestamp: Option<i64>,
    #[serde(rename = "job_posted_at_datetime_utc", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub posted_at_utc: Option<String>,
    #[serde(rename = "job_city", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(rename = "job_state", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "job_country", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "job_latitude", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(rename = "job_longitude", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(rename = "job_benefits", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub benefits: Option<Vec<String>>,
    #[serde(rename = "job_google_link", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub google_link: Option<String>,
    #[serde(rename = "job_offer_expiration_datetime_utc", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub offer_expiration_utc: Option<String>,
    #[serde(rename = "job_offer_expiration_timestamp", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub offer_expiration_timestamp: Option<i64>,
    #[serde(rename = "job_required_experience", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub required_experience: Option<RequiredExperience>,
    #[serde(rename = "job_required_skills", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub required_skills: Option<Vec<String>>,
    #[serde(rename = "job_required_education", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub required_education: Option<RequiredEducation>,
    #[serde(rename = "job_experience_in_place_of_education", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub experience_in_place_of_education: Option<bool>,
    #[serde(rename = "job_min_salary", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<f64>,
    #[serde(rename = "job_max_salary", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<f64>,
    #[serde(rename = "job_salary_currency", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub salary_currency: Option<String>,
    #[serde(rename = "job_salary_period", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub salary_period: Option<String>,
    #[serde(rename = "job_highlights", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub highlights: Option<JobHighlights>,
    #[serde(rename = "job_job_title", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub normalized_title: Option<String>,
    #[serde(rename = "job_posting_language", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub posting_language: Option<String>,
    #[serde(rename = "job_onet_soc", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub onet_soc: Option<String>,
    #[serde(rename = "job_onet_job_zone", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub onet_job_zone: Option<String>,
    #[serde(rename = "job_naics_code", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub naics_code: Option<String>,
    #[serde(rename = "job_naics_name", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub naics_name: Option<String>,
}

/// A normalized, displayable listing. The four display fields are always set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    #[serde(rename = "job_id")]
    pub external_id: String,
    pub employer_name: String,
    #[serde(rename = "job_title")]
    pub title: String,
    #[serde(rename = "job_apply_link")]
    pub apply_url: String,
    #[serde(flatten)]
    pub details: JobDetails,
}

/// Provider entry as received; every key may be missing or mistyped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawJob {
    pub job_id: Option<Value>,
    pub employer_name: Option<Value>,
    pub job_title: Option<Value>,
    pub job_apply_link: Option<Value>,
    #[serde(flatten)]
    pub details: JobDetails,
}

/// Opportunity fields carried on a saved application; all optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedOpportunity {
    #[serde(rename = "job_id", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub employer_name: Option<String>,
    #[serde(rename = "job_title", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "job_apply_link", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub apply_url: Option<String>,
    #[serde(flatten)]
    pub details: JobDetails,
}

impl From<Opportunity> for SavedOpportunity {
    fn from(o: Opportunity) -> Self {
        Self {
            external_id: Some(o.external_id),
            employer_name: Some(o.employer_name),
            title: Some(o.title),
            apply_url: Some(o.apply_url),
            details: o.details,
        }
    }
}
