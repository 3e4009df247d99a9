//! Health aggregation service
//!
//! Probes the database, the language model, the transcription service and
//! the speech output with per-service timeouts.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::ports::{DatabaseHealthPort, InferencePort, SpeechPort, TranscriptionPort};

/// Default global timeout for health checks in seconds
const DEFAULT_HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;

/// Timeout for the transcription probe, which sits in the readiness path
const TRANSCRIPTION_PROBE_TIMEOUT_MS: u64 = 1500;

/// Configuration for health check behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Global timeout for all health checks in seconds (default: 5)
    #[serde(default = "default_global_timeout")]
    pub global_timeout_secs: u64,

    /// Service-specific timeout overrides in milliseconds
    #[serde(default)]
    pub service_timeouts_ms: HashMap<String, u64>,
}

const fn default_global_timeout() -> u64 {
    DEFAULT_HEALTH_CHECK_TIMEOUT_SECS
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            global_timeout_secs: default_global_timeout(),
            service_timeouts_ms: HashMap::from([(
                "transcription".to_string(),
                TRANSCRIPTION_PROBE_TIMEOUT_MS,
            )]),
        }
    }
}

impl HealthConfig {
    /// Get the timeout for a specific service
    #[must_use]
    pub fn timeout_for_service(&self, service: &str) -> Duration {
        self.service_timeouts_ms.get(service).map_or_else(
            || Duration::from_secs(self.global_timeout_secs),
            |ms| Duration::from_millis(*ms),
        )
    }
}

/// Status of an individual service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub healthy: bool,
    /// Additional information such as the model name or backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceHealth {
    #[must_use]
    pub const fn healthy() -> Self {
        Self {
            healthy: true,
            info: None,
            response_time_ms: None,
            error: None,
        }
    }

    #[must_use]
    pub fn healthy_with_info(info: impl Into<String>) -> Self {
        Self {
            info: Some(info.into()),
            ..Self::healthy()
        }
    }

    #[must_use]
    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            info: None,
            response_time_ms: None,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn timeout() -> Self {
        Self::unhealthy("Health check timed out")
    }

    #[must_use]
    pub const fn with_response_time(mut self, ms: u64) -> Self {
        self.response_time_ms = Some(ms);
        self
    }
}

/// Health of every probed service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// True when every service is healthy
    pub healthy: bool,
    pub services: HashMap<String, ServiceHealth>,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl HealthReport {
    #[must_use]
    pub fn new(services: HashMap<String, ServiceHealth>) -> Self {
        let healthy = services.values().all(|s| s.healthy);
        Self {
            healthy,
            services,
            checked_at: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn service_status(&self, name: &str) -> Option<&ServiceHealth> {
        self.services.get(name)
    }
}

/// Aggregates health checks across the backing services
pub struct HealthService {
    config: HealthConfig,
    database: Arc<dyn DatabaseHealthPort>,
    inference: Arc<dyn InferencePort>,
    transcription: Arc<dyn TranscriptionPort>,
    speech: Arc<dyn SpeechPort>,
}

impl std::fmt::Debug for HealthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(start: std::time::Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

impl HealthService {
    #[must_use]
    pub fn new(
        database: Arc<dyn DatabaseHealthPort>,
        inference: Arc<dyn InferencePort>,
        transcription: Arc<dyn TranscriptionPort>,
        speech: Arc<dyn SpeechPort>,
    ) -> Self {
        Self {
            config: HealthConfig::default(),
            database,
            inference,
            transcription,
            speech,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: HealthConfig) -> Self {
        self.config = config;
        self
    }

    /// Check every service concurrently
    #[instrument(skip(self))]
    pub async fn report(&self) -> HealthReport {
        let (database, inference, transcription, speech) = tokio::join!(
            self.check_database(),
            self.check_inference(),
            self.check_transcription(),
            self.check_speech(),
        );

        HealthReport::new(HashMap::from([
            ("database".to_string(), database),
            ("inference".to_string(), inference),
            ("transcription".to_string(), transcription),
            ("speech".to_string(), speech),
        ]))
    }

    pub async fn check_database(&self) -> ServiceHealth {
        let limit = self.config.timeout_for_service("database");
        let start = std::time::Instant::now();

        match timeout(limit, self.database.check_health()).await {
            Ok(Ok(health)) if health.reachable => health
                .description
                .map_or_else(ServiceHealth::healthy, ServiceHealth::healthy_with_info)
                .with_response_time(elapsed_ms(start)),
            Ok(Ok(_)) => ServiceHealth::unhealthy("Database unreachable").with_response_time(elapsed_ms(start)),
            Ok(Err(e)) => {
                warn!(error = %e, "Database health check failed");
                ServiceHealth::unhealthy(e.to_string())
            },
            Err(_) => {
                warn!("Database health check timed out");
                ServiceHealth::timeout()
            },
        }
    }

    pub async fn check_inference(&self) -> ServiceHealth {
        let inference = Arc::clone(&self.inference);
        self.probe("inference", async move { inference.is_healthy().await })
            .await
            .map_or_else(
                |status| status,
                |status| ServiceHealth {
                    info: Some(self.inference.current_model()),
                    ..status
                },
            )
    }

    pub async fn check_transcription(&self) -> ServiceHealth {
        let transcription = Arc::clone(&self.transcription);
        self.probe("transcription", async move { transcription.is_available().await })
            .await
            .unwrap_or_else(|status| status)
    }

    pub async fn check_speech(&self) -> ServiceHealth {
        let speech = Arc::clone(&self.speech);
        self.probe("speech", async move { speech.is_available().await })
            .await
            .map_or_else(
                |status| status,
                |status| ServiceHealth {
                    info: Some(self.speech.voice()),
                    ..status
                },
            )
    }

    /// Run a boolean probe under the service's timeout
    ///
    /// `Ok` carries a healthy status, `Err` an unhealthy one.
    async fn probe<F>(&self, service: &str, check: F) -> Result<ServiceHealth, ServiceHealth>
    where
        F: Future<Output = bool> + Send,
    {
        let limit = self.config.timeout_for_service(service);
        let start = std::time::Instant::now();

        match timeout(limit, check).await {
            Ok(true) => {
                let ms = elapsed_ms(start);
                debug!(service, response_time_ms = ms, "Service healthy");
                Ok(ServiceHealth::healthy().with_response_time(ms))
            },
            Ok(false) => {
                let ms = elapsed_ms(start);
                warn!(service, response_time_ms = ms, "Service unhealthy");
                Err(ServiceHealth::unhealthy(format!("{service} unavailable")).with_response_time(ms))
            },
            Err(_) => {
                warn!(service, "Health check timed out");
                Err(ServiceHealth::timeout())
            },
        }
    }
}
