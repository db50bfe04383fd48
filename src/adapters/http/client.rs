//! HTTP record source implementation

use crate::adapters::traits::{ProfileStore, RecordSource, SourceResult};
use crate::config::schema::HttpSourceConfig;
use crate::domain::errors::{CensusError, SourceError};
use crate::domain::ids::SchoolId;
use crate::domain::period::ExportPeriod;
use crate::domain::profile::ComplianceProfile;
use crate::domain::records::{
    AssessmentRecord, AttendanceEvent, ClassRecord, StaffRecord, StudentRecord, SubjectRecord,
};
use crate::domain::Result;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Record source talking to the school administration REST API
///
/// # Example
///
/// ```no_run
/// use census::adapters::http::HttpRecordSource;
/// use census::config::schema::HttpSourceConfig;
///
/// # fn example() -> census::domain::Result<()> {
/// let config = HttpSourceConfig {
///     base_url: "https://records.example.org/api/v1".to_string(),
///     api_token: None,
///     timeout_seconds: 30,
/// };
/// let source = HttpRecordSource::new(&config)?;
/// # Ok(())
/// # }
/// ```
pub struct HttpRecordSource {
    base_url: Url,
    client: Client,
    auth_header: Option<String>,
}

impl HttpRecordSource {
    /// Create a new client from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &HttpSourceConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            CensusError::Configuration(format!("Invalid source.base_url '{}': {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CensusError::Configuration(format!(
                "source.base_url '{}' cannot be used as a base URL",
                config.base_url
            )));
        }

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CensusError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        let auth_header = config
            .api_token
            .as_ref()
            .map(|token| format!("Bearer {}", token.expose_secret()));

        Ok(Self {
            base_url,
            client,
            auth_header,
        })
    }

    /// Base URL of the API
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn school_url(&self, school_id: &SchoolId, resource: &str) -> SourceResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::Unavailable("Base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["schools", school_id.as_str(), resource]);
        Ok(url)
    }

    fn period_url(
        &self,
        school_id: &SchoolId,
        resource: &str,
        period: &ExportPeriod,
    ) -> SourceResult<Url> {
        let mut url = self.school_url(school_id, resource)?;
        url.query_pairs_mut()
            .append_pair("academicYear", &period.academic_year)
            .append_pair("term", &period.term);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> SourceResult<T> {
        tracing::debug!(url = %url, "GET record collection");

        let mut request = self.client.get(url.clone());
        if let Some(auth) = &self.auth_header {
            request = request.header("Authorization", auth);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout(format!("{url}: {e}"))
            } else {
                SourceError::Unavailable(format!("{url}: {e}"))
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Unavailable(format!(
                "{url} returned {status}: {body}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::InvalidData(format!("{url}: {e}")))
    }
}

#[async_trait]
impl ProfileStore for HttpRecordSource {
    async fn get_compliance_profile(
        &self,
        school_id: &SchoolId,
    ) -> SourceResult<ComplianceProfile> {
        self.get_json(self.school_url(school_id, "compliance-profile")?)
            .await
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn list_students(&self, school_id: &SchoolId) -> SourceResult<Vec<StudentRecord>> {
        self.get_json(self.school_url(school_id, "students")?).await
    }

    async fn list_staff(&self, school_id: &SchoolId) -> SourceResult<Vec<StaffRecord>> {
        self.get_json(self.school_url(school_id, "staff")?).await
    }

    async fn list_classes(&self, school_id: &SchoolId) -> SourceResult<Vec<ClassRecord>> {
        self.get_json(self.school_url(school_id, "classes")?).await
    }

    async fn list_subjects(&self, school_id: &SchoolId) -> SourceResult<Vec<SubjectRecord>> {
        self.get_json(self.school_url(school_id, "subjects")?).await
    }

    async fn list_attendance_for_period(
        &self,
        school_id: &SchoolId,
        period: &ExportPeriod,
    ) -> SourceResult<Vec<AttendanceEvent>> {
        self.get_json(self.period_url(school_id, "attendance", period)?)
            .await
    }

    async fn list_assessments_for_period(
        &self,
        school_id: &SchoolId,
        period: &ExportPeriod,
    ) -> SourceResult<Vec<AssessmentRecord>> {
        self.get_json(self.period_url(school_id, "assessments", period)?)
            .await
    }
}
