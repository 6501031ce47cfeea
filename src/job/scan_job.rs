//! A single scan on the remote service.
//!
//! A job goes through two phases. [`ScanJob::submit`] uploads the target
//! and binds the tracking identifier (`data_id`) the service assigns.
//! [`ScanJob::fetch_results`] then reads the scan's current state by that
//! identifier, as often as the caller likes. The latest document is cached
//! so that [`ScanJob::results`] and [`ScanJob::is_clean`] only touch the
//! network when the cached one is missing, incomplete, or a refresh is
//! forced.
//!
//! ```text
//! CREATED --submit--> SUBMITTED --fetch--> HAS_SNAPSHOT(<100) --fetch--> ... HAS_SNAPSHOT(=100)
//! ```

use crate::client::Client;
use crate::core::traits::{HEADER_API_KEY, HEADER_ARCHIVE_PASSWORD, HEADER_FILENAME};
use crate::core::{
    FileInput, HttpRequest, HttpResponse, Refresh, ScanError, ScanSnapshot, Verdict,
};
use crate::job::PollConfig;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// One scan request and its most recent result.
///
/// Methods that change the job take `&mut self`; a job is driven by one
/// caller at a time. Run many jobs concurrently by giving each its own
/// `ScanJob` built from a shared [`Client`].
///
/// # Example
///
/// ```rust,ignore
/// use metascan::{Client, ClientConfig, PollConfig};
///
/// let client = Client::new(ClientConfig::new(api_key))?;
/// let mut job = client.scan("/srv/uploads/invoice.zip").with_archive_password("infected");
///
/// job.submit().await?;
/// job.wait_for_completion(&PollConfig::default()).await?;
/// if job.is_clean(false).await? {
///     println!("no threats");
/// }
/// ```
#[derive(Debug)]
pub struct ScanJob {
    /// Local identifier, only used to correlate log lines.
    id: Uuid,
    client: Client,
    target: FileInput,
    archive_password: Option<String>,
    /// Set at most once, by a successful submission.
    data_id: Option<String>,
    /// Replaced wholesale on every successful fetch.
    snapshot: Option<ScanSnapshot>,
    fetched_at: Option<DateTime<Utc>>,
}

impl ScanJob {
    /// Creates an unsubmitted job. See also [`Client::scan`].
    pub fn new(client: Client, target: impl Into<FileInput>) -> Self {
        Self {
            id: Uuid::new_v4(),
            client,
            target: target.into(),
            archive_password: None,
            data_id: None,
            snapshot: None,
            fetched_at: None,
        }
    }

    /// Sets the password of a protected archive target.
    pub fn with_archive_password(mut self, password: impl Into<String>) -> Self {
        self.archive_password = Some(password.into());
        self
    }

    /// Returns the local job identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the scan target.
    pub fn target(&self) -> &FileInput {
        &self.target
    }

    /// Returns the archive password, if any.
    pub fn archive_password(&self) -> Option<&str> {
        self.archive_password.as_deref()
    }

    /// Returns the tracking identifier, once submitted.
    pub fn data_id(&self) -> Option<&str> {
        self.data_id.as_deref()
    }

    /// Returns the cached snapshot without any network activity.
    pub fn snapshot(&self) -> Option<&ScanSnapshot> {
        self.snapshot.as_ref()
    }

    /// Returns when the cached snapshot was fetched. `None` for injected ones.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// Replaces the cached snapshot without a round trip.
    ///
    /// Lets the verdict logic run against a known document, e.g. in tests
    /// or when results arrive through another channel.
    pub fn set_results(&mut self, snapshot: impl Into<ScanSnapshot>) {
        self.snapshot = Some(snapshot.into());
        self.fetched_at = None;
    }

    /// Builds the submission request: raw target bytes as the body, plus
    /// `filename`, `archivepwd` and `apikey` headers, each omitted when
    /// absent.
    ///
    /// Use together with [`apply_submission_response`](Self::apply_submission_response)
    /// when the request is dispatched by something other than the client's
    /// transport.
    pub async fn submission_request(&self) -> Result<HttpRequest, ScanError> {
        if let Some(data_id) = &self.data_id {
            return Err(ScanError::AlreadySubmitted {
                data_id: data_id.clone(),
            });
        }

        let max = self.client.config().max_file_size;
        if let Some(size) = self.target.size_hint() {
            if size > max {
                return Err(ScanError::FileTooLarge { size, max });
            }
        }

        let body = self.target.read_bytes_up_to(max).await?;

        Ok(HttpRequest::post(&self.client.endpoints().scan_file, body)
            .with_optional_header(HEADER_FILENAME, self.target.display_name())
            .with_optional_header(HEADER_ARCHIVE_PASSWORD, self.archive_password.as_deref())
            .with_header(HEADER_API_KEY, self.client.api_key()))
    }

    /// Binds the tracking identifier from a submission response.
    ///
    /// On any error the job stays unsubmitted.
    pub fn apply_submission_response(&mut self, response: HttpResponse) -> Result<&str, ScanError> {
        if let Some(data_id) = &self.data_id {
            return Err(ScanError::AlreadySubmitted {
                data_id: data_id.clone(),
            });
        }

        let endpoint = &self.client.endpoints().scan_file;
        let response = response.error_for_status()?;
        let body: Value = serde_json::from_slice(&response.body).map_err(|e| {
            ScanError::protocol_violation(endpoint, format!("invalid JSON: {}", e))
        })?;

        let data_id = body
            .get("data_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ScanError::protocol_violation(endpoint, "missing data_id"))?;

        tracing::info!(job_id = %self.id, data_id = %data_id, "Scan submitted");

        Ok(self.data_id.insert(data_id.to_owned()).as_str())
    }

    /// Uploads the target and binds the tracking identifier.
    ///
    /// A job maps to exactly one remote scan; submitting twice fails with
    /// [`ScanError::AlreadySubmitted`] before any request is sent.
    pub async fn submit(&mut self) -> Result<&str, ScanError> {
        let request = self.submission_request().await?;

        tracing::debug!(
            job_id = %self.id,
            filename = ?self.target.display_name(),
            size = request.body.as_ref().map(Vec::len).unwrap_or(0),
            archive = self.archive_password.is_some(),
            "Submitting file for scan"
        );

        let job_id = self.id;
        let warn = |e: ScanError| {
            tracing::warn!(job_id = %job_id, error = %e, "Submission failed");
            e
        };
        let response = self.client.send(request).await.map_err(warn)?;
        self.apply_submission_response(response).map_err(warn)
    }

    /// Builds the results request for the bound tracking identifier.
    pub fn results_request(&self) -> Result<HttpRequest, ScanError> {
        let data_id = self.data_id.as_deref().ok_or(ScanError::NotSubmitted)?;
        Ok(HttpRequest::get(self.client.endpoints().results_url(data_id))
            .with_header(HEADER_API_KEY, self.client.api_key()))
    }

    /// Parses a results response and replaces the cached snapshot with it.
    ///
    /// The document must carry `scan_results.progress_percentage`; otherwise
    /// the cached snapshot is left as it was.
    pub fn apply_results_response(
        &mut self,
        response: HttpResponse,
    ) -> Result<&ScanSnapshot, ScanError> {
        let data_id = self.data_id.as_deref().ok_or(ScanError::NotSubmitted)?;
        let url = self.client.endpoints().results_url(data_id);

        let response = response.error_for_status()?;
        let snapshot = ScanSnapshot::from_slice(&url, &response.body)?;

        if snapshot.scan_results().is_none() {
            return Err(ScanError::protocol_violation(url, "missing scan_results"));
        }
        let Some(progress) = snapshot.progress() else {
            return Err(ScanError::protocol_violation(
                url,
                "missing scan_results.progress_percentage",
            ));
        };

        tracing::debug!(
            job_id = %self.id,
            data_id = %data_id,
            progress,
            "Fetched scan results"
        );
        if progress == crate::core::types::COMPLETE_PROGRESS {
            tracing::info!(
                job_id = %self.id,
                data_id = %data_id,
                verdict = %snapshot.verdict(),
                "Scan complete"
            );
        }

        self.fetched_at = Some(Utc::now());
        Ok(&*self.snapshot.insert(snapshot))
    }

    /// Fetches the scan's current state and caches it.
    ///
    /// Fails with [`ScanError::NotSubmitted`], sending nothing, if the job
    /// has no tracking identifier yet.
    pub async fn fetch_results(&mut self) -> Result<&ScanSnapshot, ScanError> {
        let request = self.results_request()?;
        let job_id = self.id;
        let warn = |e: ScanError| {
            tracing::warn!(job_id = %job_id, error = %e, "Results fetch failed");
            e
        };
        let response = self.client.send(request).await.map_err(warn)?;
        self.apply_results_response(response).map_err(warn)
    }

    /// Returns the snapshot, fetching once first if `refresh` is forced, no
    /// snapshot is cached, or the cached one is not complete.
    ///
    /// Complete means `progress_percentage == 100` exactly. Passing a
    /// `bool` works too: `true` forces a fetch.
    pub async fn results(&mut self, refresh: impl Into<Refresh>) -> Result<&ScanSnapshot, ScanError> {
        if self.needs_fetch(refresh.into())? {
            self.fetch_results().await?;
        }
        self.snapshot.as_ref().ok_or(ScanError::NotSubmitted)
    }

    /// Returns `true` iff `scan_results.scan_all_result_i` is exactly zero in
    /// the snapshot [`results`](Self::results) yields.
    ///
    /// A nonzero, missing or malformed count is `false`; use
    /// [`verdict`](Self::verdict) to tell infected from undecided.
    pub async fn is_clean(&mut self, refresh: impl Into<Refresh>) -> Result<bool, ScanError> {
        Ok(self.results(refresh).await?.is_clean())
    }

    /// Classifies the snapshot [`results`](Self::results) yields.
    pub async fn verdict(&mut self, refresh: impl Into<Refresh>) -> Result<Verdict, ScanError> {
        Ok(self.results(refresh).await?.verdict())
    }

    /// Fetches until the scan is complete or `config.max_poll_time` runs out.
    ///
    /// Running out of time fails with [`ScanError::PollDeadlineExceeded`],
    /// never with [`ScanError::Timeout`], which is reserved for a single
    /// request. Any fetch error ends the wait and is returned as is.
    pub async fn wait_for_completion(
        &mut self,
        config: &PollConfig,
    ) -> Result<&ScanSnapshot, ScanError> {
        let started = tokio::time::Instant::now();

        loop {
            let snapshot = self.results(Refresh::IfIncomplete).await?;
            if snapshot.is_complete()? {
                break;
            }
            let progress = snapshot.progress();

            let elapsed = started.elapsed();
            let Some(delay) = config.next_delay(elapsed) else {
                return Err(ScanError::PollDeadlineExceeded {
                    data_id: self.data_id.clone(),
                    progress,
                    elapsed,
                });
            };

            tracing::debug!(
                job_id = %self.id,
                progress = ?progress,
                delay_ms = delay.as_millis() as u64,
                "Scan in progress, waiting"
            );
            tokio::time::sleep(delay).await;
        }

        self.snapshot.as_ref().ok_or(ScanError::NotSubmitted)
    }

    fn needs_fetch(&self, refresh: Refresh) -> Result<bool, ScanError> {
        match (&self.snapshot, refresh) {
            (_, Refresh::Force) | (None, _) => Ok(true),
            (Some(snapshot), Refresh::IfIncomplete) => Ok(!snapshot.is_complete()?),
        }
    }
}
