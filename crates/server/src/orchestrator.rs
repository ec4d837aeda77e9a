//! # Availability Service
//!
//! This module coordinates the whole availability flow.
//!
//! At startup, once:
//! 1. Load and encode the roster
//! 2. Compute model features for every record
//! 3. Ask the engagement model for one label per record
//! 4. Freeze the labelled roster behind an `Arc`
//!
//! Per interaction:
//! 1. Resolve the user's labels against the codecs
//! 2. Apply the filter pipeline to a borrowed view
//! 3. Project, decode and sort the result table
//! 4. Optionally export it as a workbook

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use data_loader::{CategoricalField, Roster};
use exporter::{ExportArtifact, Exporter};
use ml_client::{EngagementClassifier, EngagementFeatures};
use pipeline::{
    FeatureEngineer, FilterPipeline, FilterSelection, RecordFeatures, ResultProjector, ResultRow,
    SelectionRequest, TimeWindow,
};

/// Outcome of one availability query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Window the rows were selected with
    pub window: TimeWindow,
    pub rows: Vec<ResultRow>,
}

impl QueryResult {
    /// Shown instead of a table when nothing matched
    pub const EMPTY_MESSAGE: &'static str = "No available doctors found in the selected time slot.";

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Answers availability queries over a labelled roster
#[derive(Clone)]
pub struct AvailabilityService {
    roster: Arc<Roster>,
    filter_pipeline: Arc<FilterPipeline>,
    projector: ResultProjector,
    exporter: Exporter,
}

impl AvailabilityService {
    /// Label `roster` with `classifier` and build the service around it.
    ///
    /// Inference runs exactly once, over every record. Any classifier failure
    /// aborts the load; there is no per-record fallback.
    pub async fn load<C>(roster: Roster, classifier: &C) -> Result<Self>
    where
        C: EngagementClassifier + ?Sized,
    {
        let start_time = Instant::now();

        let features = FeatureEngineer::new().compute_features(roster.records());
        info!(
            "Computed features for {} records, sending to {}",
            features.len(),
            classifier.name()
        );

        let rows: Vec<EngagementFeatures> = features.iter().map(to_proto_features).collect();
        let labels = classifier
            .predict(rows)
            .await
            .with_context(|| format!("Engagement classifier '{}' failed", classifier.name()))?;

        let roster = roster
            .with_engagement(labels)
            .context("Failed to attach engagement labels")?;

        info!("Roster labelled in {:.2?}", start_time.elapsed());
        Ok(Self::from_roster(Arc::new(roster)))
    }

    /// Read the roster file off the async runtime, then [`Self::load`] it
    pub async fn load_from_file<C>(path: impl Into<PathBuf>, classifier: &C) -> Result<Self>
    where
        C: EngagementClassifier + ?Sized,
    {
        let path = path.into();
        let roster = tokio::task::spawn_blocking({
            let path = path.clone();
            move || Roster::load_from_file(&path)
        })
        .await
        .context("Roster loading task panicked")?
        .with_context(|| format!("Failed to load roster from {}", path.display()))?;

        Self::load(roster, classifier).await
    }

    /// Wrap an already labelled roster
    pub fn from_roster(roster: Arc<Roster>) -> Self {
        Self {
            roster,
            filter_pipeline: Arc::new(FilterPipeline::availability()),
            projector: ResultProjector::new(),
            exporter: Exporter::new(),
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Selector choices per categorical field, `All` first
    pub fn options(&self) -> Vec<(CategoricalField, Vec<&str>)> {
        CategoricalField::ALL
            .into_iter()
            .map(|field| (field, self.roster.codecs().get(field).selector_options()))
            .collect()
    }

    /// Resolve raw user choices against the roster's codecs
    pub fn resolve(&self, request: &SelectionRequest) -> Result<FilterSelection> {
        request
            .resolve(self.roster.codecs())
            .context("Invalid selection")
    }

    /// Filter, project and sort for one resolved selection
    pub fn query(&self, selection: &FilterSelection) -> Result<QueryResult> {
        let start_time = Instant::now();

        let view = self.filter_pipeline.apply(self.roster.records(), selection);
        let rows = self
            .projector
            .project(&view, self.roster.codecs())
            .context("Failed to project results")?;

        debug!(
            "Query matched {} of {} records in {:.2?}",
            rows.len(),
            self.roster.len(),
            start_time.elapsed()
        );

        Ok(QueryResult {
            window: selection.window,
            rows,
        })
    }

    /// Resolve and query in one step
    pub fn run(&self, request: &SelectionRequest) -> Result<QueryResult> {
        let selection = self.resolve(request)?;
        self.query(&selection)
    }

    /// Workbook for a result; `None` when there is nothing to export
    pub fn export(&self, result: &QueryResult) -> Result<Option<ExportArtifact>> {
        let artifact = self
            .exporter
            .export(&result.rows, &result.window)
            .context("Failed to export results")?;

        if artifact.is_none() {
            warn!("Export requested for an empty result; nothing produced");
        }
        Ok(artifact)
    }
}

/// Convert pipeline features into the model's wire representation
fn to_proto_features(f: &RecordFeatures) -> EngagementFeatures {
    EngagementFeatures {
        state: f.state as i32,
        region: f.region as i32,
        speciality: f.speciality as i32,
        login_hour: f.login_hour as i32,
        logout_hour: f.logout_hour as i32,
        session_duration: f.session_duration_minutes,
        usage_time_mins: f.usage_time_mins,
        survey_attempts: f.survey_attempts as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use data_loader::RawRecord;
    use ml_client::engagement::engagement_model_server::{EngagementModel, EngagementModelServer};
    use ml_client::engagement::{PredictRequest, PredictResponse};
    use ml_client::{FnClassifier, GrpcEngagementClient};
    use std::io::Write;
    use tokio::net::TcpListener;
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::transport::Server;
    use tonic::{Request, Response, Status};

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn raw(npi: u64, login: (u32, u32), logout: (u32, u32), speciality: &str, usage: f64) -> RawRecord {
        RawRecord {
            npi,
            login: ts(login.0, login.1),
            logout: ts(logout.0, logout.1),
            speciality: speciality.to_string(),
            region: "Northeast".to_string(),
            state: "NY".to_string(),
            usage_time_mins: usage,
            survey_attempts: 1,
        }
    }

    fn build_test_roster() -> Roster {
        Roster::from_raw(vec![
            raw(1, (8, 0), (9, 0), "Cardiology", 45.0),
            raw(2, (7, 0), (10, 0), "Neurology", 12.0),
            raw(3, (22, 0), (23, 30), "Cardiology", 31.0),
        ])
        .unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // ============================================================================
    // Mock engagement model
    // ============================================================================

    /// Labels a row engaged when usage exceeds 30 minutes
    #[derive(Default)]
    struct MockEngagementModel {
        /// Answer with one label too few
        truncate: bool,
    }

    #[tonic::async_trait]
    impl EngagementModel for MockEngagementModel {
        async fn predict(
            &self,
            request: Request<PredictRequest>,
        ) -> Result<Response<PredictResponse>, Status> {
            let mut labels: Vec<i32> = request
                .get_ref()
                .rows
                .iter()
                .map(|row| i32::from(row.usage_time_mins > 30.0))
                .collect();
            if self.truncate {
                labels.pop();
            }
            Ok(Response::new(PredictResponse { labels }))
        }
    }

    async fn start_mock_model(model: MockEngagementModel) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock model service");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            Server::builder()
                .add_service(EngagementModelServer::new(model))
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .expect("Mock model service failed");
        });

        (format!("http://{}", addr), handle)
    }

    async fn build_test_service() -> AvailabilityService {
        let classifier = FnClassifier::new("usage", |row: &EngagementFeatures| row.usage_time_mins > 30.0);
        AvailabilityService::load(build_test_roster(), &classifier)
            .await
            .expect("Failed to load service")
    }

    // ============================================================================
    // Loading
    // ============================================================================

    #[tokio::test]
    async fn test_load_with_grpc_model() {
        let (addr, handle) = start_mock_model(MockEngagementModel::default()).await;
        let client = GrpcEngagementClient::connect(addr).await.expect("Failed to connect");

        let service = AvailabilityService::load(build_test_roster(), &client)
            .await
            .expect("Failed to load service");

        let engaged: Vec<bool> = service.roster().records().iter().map(|r| r.engaged).collect();
        assert_eq!(engaged, vec![true, false, true]);

        handle.abort();
    }

    #[tokio::test]
    async fn test_load_aborts_on_label_mismatch() {
        let (addr, handle) = start_mock_model(MockEngagementModel { truncate: true }).await;
        let client = GrpcEngagementClient::connect(addr).await.expect("Failed to connect");

        let result = AvailabilityService::load(build_test_roster(), &client).await;
        assert!(result.is_err(), "Short label vector must abort loading");

        handle.abort();
    }

    #[tokio::test]
    async fn test_load_through_trait_object() {
        let classifier: Box<dyn EngagementClassifier> =
            Box::new(FnClassifier::new("never", |_: &EngagementFeatures| false));

        let service = AvailabilityService::load(build_test_roster(), classifier.as_ref())
            .await
            .unwrap();
        assert_eq!(service.roster().stats().engaged, 0);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "NPI,Login Time,Logout Time,Speciality,Region,State,Usage Time (mins),Count of Survey Attempts"
        )
        .unwrap();
        writeln!(file, "5,2025-03-10 09:00:00,2025-03-10 09:45:00,Oncology,West,CA,50,2").unwrap();

        let classifier = FnClassifier::new("always", |_: &EngagementFeatures| true);
        let service = AvailabilityService::load_from_file(file.path(), &classifier)
            .await
            .unwrap();
        assert_eq!(service.roster().len(), 1);
        assert!(service.roster().records()[0].engaged);

        let missing = AvailabilityService::load_from_file("/definitely/not/here.csv", &classifier).await;
        assert!(missing.is_err());
    }

    // ============================================================================
    // Queries
    // ============================================================================

    #[tokio::test]
    async fn test_query_cardiology() {
        let service = build_test_service().await;
        let request = SelectionRequest {
            speciality: "Cardiology".to_string(),
            ..SelectionRequest::default()
        };

        let result = service.run(&request).unwrap();
        let slots: Vec<&str> = result.rows.iter().map(|r| r.time_slot.as_str()).collect();
        assert_eq!(slots, vec!["08:00:00 - 09:00:00", "22:00:00 - 23:30:00"]);
        assert_eq!(result.window, TimeWindow::default());
    }

    #[tokio::test]
    async fn test_query_engaged_only() {
        let service = build_test_service().await;
        let request = SelectionRequest {
            engaged_only: true,
            ..SelectionRequest::default()
        };

        let ids: Vec<u64> = service.run(&request).unwrap().rows.iter().map(|r| r.npi).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_query_unknown_label_is_error() {
        let service = build_test_service().await;
        let request = SelectionRequest {
            speciality: "Dermatology".to_string(),
            ..SelectionRequest::default()
        };
        assert!(service.run(&request).is_err());
    }

    #[tokio::test]
    async fn test_empty_result_has_no_export() {
        let service = build_test_service().await;
        let request = SelectionRequest {
            start: t(11, 0),
            end: t(12, 0),
            ..SelectionRequest::default()
        };

        let result = service.run(&request).unwrap();
        assert!(result.is_empty());
        assert!(service.export(&result).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_export_uses_selected_window() {
        let service = build_test_service().await;
        let request = SelectionRequest {
            start: t(7, 30),
            end: t(23, 45),
            ..SelectionRequest::default()
        };

        let result = service.run(&request).unwrap();
        assert_eq!(result.len(), 2);

        let artifact = service.export(&result).unwrap().expect("Expected an artifact");
        assert_eq!(artifact.file_name, "available_doctors_07_30_to_23_45.xlsx");
        assert!(!artifact.bytes.is_empty());
    }

    #[tokio::test]
    async fn test_options() {
        let service = build_test_service().await;
        let options = service.options();

        assert_eq!(options.len(), 3);
        assert_eq!(options[0].0, CategoricalField::Speciality);
        assert_eq!(options[0].1, vec!["All", "Cardiology", "Neurology"]);
        assert_eq!(options[2].1, vec!["All", "NY"]);
    }

    #[tokio::test]
    async fn test_service_clones_share_roster() {
        let service = build_test_service().await;
        let clone = service.clone();

        let selection = service.resolve(&SelectionRequest::default()).unwrap();
        let handle = tokio::task::spawn_blocking(move || clone.query(&selection).unwrap());

        let from_task = handle.await.unwrap();
        assert_eq!(from_task, service.query(&selection).unwrap());
    }
}
