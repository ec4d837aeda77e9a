//! Engagement model client.
//!
//! The engagement classifier is trained and served outside this workspace.
//! This crate is the boundary to it:
//! - [`EngagementClassifier`] is the seam the rest of the system calls
//! - [`GrpcEngagementClient`] talks to the model service over gRPC
//! - [`FnClassifier`] wraps an in-process function (offline runs, tests)
//!
//! A classifier receives one [`EngagementFeatures`] row per record and must
//! return exactly one binary label per row, in the same order. Anything else
//! is an error; there is no per-row fallback.

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;
use tonic::transport::Channel;
use tracing::{debug, error, info};

// Include the generated protobuf code
pub mod engagement {
    tonic::include_proto!("engagement");
}

pub use engagement::EngagementFeatures;
use engagement::{engagement_model_client::EngagementModelClient, PredictRequest};

/// Model input column names, in feature order
pub const FEATURE_COLUMNS: [&str; 8] = [
    "State",
    "Region",
    "Speciality",
    "Login hour",
    "Logout hour",
    "Session Duration",
    "Usage Time (mins)",
    "Count of Survey Attempts",
];

/// Errors that can occur when interacting with the engagement model
#[derive(Error, Debug)]
pub enum MLClientError {
    #[error("Failed to connect to engagement model: {0}")]
    ConnectionError(String),

    #[error("Failed to predict engagement: {0}")]
    PredictionError(String),

    #[error("Invalid response from engagement model: {0}")]
    InvalidResponse(String),
}

/// Anything that can label feature rows as engaged or not.
#[async_trait]
pub trait EngagementClassifier: Send + Sync {
    /// Returns the name of this classifier (for logging)
    fn name(&self) -> &str;

    /// Predict one label per row, in row order
    async fn predict(&self, rows: Vec<EngagementFeatures>) -> Result<Vec<bool>, MLClientError>;
}

/// Client for the gRPC engagement model service.
#[derive(Clone)]
pub struct GrpcEngagementClient {
    client: EngagementModelClient<Channel>,
    service_addr: String,
}

impl GrpcEngagementClient {
    /// Connect to the model service.
    ///
    /// # Arguments
    /// * `addr` - Address of the gRPC service (e.g., "http://localhost:50051")
    pub async fn connect(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        info!("Connecting to engagement model at {}", addr);

        let channel = Channel::from_shared(addr.clone())
            .context("Creating channel from address")?
            .connect()
            .await
            .map_err(|e| MLClientError::ConnectionError(format!("{}: {}", addr, e)))?;

        let client = EngagementModelClient::new(channel);
        Ok(Self {
            client,
            service_addr: addr,
        })
    }

    /// Get the address of the model service this client is connected to.
    pub fn service_address(&self) -> &str {
        &self.service_addr
    }
}

#[async_trait]
impl EngagementClassifier for GrpcEngagementClient {
    fn name(&self) -> &str {
        "GrpcEngagementClient"
    }

    async fn predict(&self, rows: Vec<EngagementFeatures>) -> Result<Vec<bool>, MLClientError> {
        let expected_len = rows.len();
        debug!("Requesting engagement labels for {} rows", expected_len);

        let request = tonic::Request::new(PredictRequest {
            feature_names: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
        });

        // Generated clients need &mut self; channels are cheap to clone
        let mut client = self.client.clone();
        let response = client.predict(request).await.map_err(|e| {
            error!("gRPC error while predicting engagement: {}", e);
            MLClientError::PredictionError(e.to_string())
        })?;

        labels_to_flags(response.into_inner().labels, expected_len)
    }
}

/// Wraps a plain function as a classifier.
pub struct FnClassifier<F> {
    name: String,
    predict_fn: F,
}

impl<F> FnClassifier<F>
where
    F: Fn(&EngagementFeatures) -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, predict_fn: F) -> Self {
        Self {
            name: name.into(),
            predict_fn,
        }
    }
}

#[async_trait]
impl<F> EngagementClassifier for FnClassifier<F>
where
    F: Fn(&EngagementFeatures) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn predict(&self, rows: Vec<EngagementFeatures>) -> Result<Vec<bool>, MLClientError> {
        Ok(rows.iter().map(|row| (self.predict_fn)(row)).collect())
    }
}

/// Check a raw label vector and convert it to flags.
///
/// The model must answer every row with 0 or 1.
pub fn labels_to_flags(labels: Vec<i32>, expected_len: usize) -> Result<Vec<bool>, MLClientError> {
    if labels.len() != expected_len {
        error!(
            "Mismatch in number of labels returned: expected {}, got {}",
            expected_len,
            labels.len()
        );
        return Err(MLClientError::InvalidResponse(format!(
            "expected {} labels, got {}",
            expected_len,
            labels.len()
        )));
    }

    labels
        .into_iter()
        .enumerate()
        .map(|(row, label)| match label {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(MLClientError::InvalidResponse(format!(
                "label {} for row {} is not binary",
                other, row
            ))),
        })
        .collect()
}

/// Helper function to create EngagementFeatures (for testing/examples)
#[allow(clippy::too_many_arguments)]
pub fn create_engagement_features(
    state: i32,
    region: i32,
    speciality: i32,
    login_hour: i32,
    logout_hour: i32,
    session_duration: f64,
    usage_time_mins: f64,
    survey_attempts: f64,
) -> EngagementFeatures {
    EngagementFeatures {
        state,
        region,
        speciality,
        login_hour,
        logout_hour,
        session_duration,
        usage_time_mins,
        survey_attempts,
    }
}
