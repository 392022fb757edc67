//! Async driver.
//!
//! Runs an [`Experience`] against a real clock: assets are fetched
//! concurrently through an [`AssetFetcher`], decoded, and reported back as
//! host events while scheduled tasks fire on time. Virtual time is the
//! tokio time elapsed since the run began, so paused-clock tests run
//! instantly.

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use talkar_core::{Duration, TalkarResult, Timestamp, Vec3};
use talkar_ir::UniqueName;
use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::host::{HostEvent, SceneHost};
use crate::loader::AssetRequest;
use crate::media::decode_asset;
use crate::orchestrator::{Experience, ExperiencePhase};

/// Fetches the raw bytes of an asset.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, request: &AssetRequest) -> TalkarResult<Vec<u8>>;
}

pub struct RunOptions {
    /// Tap at this point as soon as the experience is prepared.
    pub tap: Option<Vec3>,
    /// Stop this long after the run began.
    pub horizon: Duration,
    /// Extra host events, delivered as they arrive.
    pub events: Option<mpsc::UnboundedReceiver<HostEvent>>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tap: Some(Vec3::zero()),
            horizon: Duration::from_seconds(30.0),
            events: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub session: Uuid,
    pub phase: ExperiencePhase,
    pub progress: f64,
    pub elapsed: Duration,
    pub loaded: Vec<UniqueName>,
    pub failed: Vec<FailedAsset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedAsset {
    pub asset: UniqueName,
    pub url: String,
    pub error: String,
}

/// Prepare, materialize and run `experience` until `options.horizon`.
pub async fn run_experience(
    experience: &mut Experience,
    host: &mut dyn SceneHost,
    fetcher: &dyn AssetFetcher,
    mut options: RunOptions,
) -> RunSummary {
    let began = Instant::now();
    let horizon = began + options.horizon.to_std();
    let elapsed = |at: Instant| Timestamp::from_seconds(at.duration_since(began).as_secs_f64());

    let requests = experience.prepare(host);
    tracing::info!("Fetching {} assets", requests.len());
    experience.materialize(host);

    let mut fetches: FuturesUnordered<_> = requests
        .into_iter()
        .map(|request| async move {
            let result = fetcher
                .fetch(&request)
                .await
                .and_then(|bytes| decode_asset(request.kind, &bytes));
            (request, result)
        })
        .collect();

    if let Some(point) = options.tap {
        experience.handle(HostEvent::Tap { point }, host);
    }

    let mut loaded = Vec::new();
    let mut failed = Vec::new();

    loop {
        let now = Instant::now();
        experience.advance_to(elapsed(now), host);
        if now >= horizon {
            break;
        }

        let wake = experience
            .next_deadline()
            .map(|t| began + std::time::Duration::from_secs_f64(t.as_seconds()))
            .map_or(horizon, |d| d.min(horizon));

        tokio::select! {
            Some((request, result)) = fetches.next(), if !fetches.is_empty() => {
                experience.advance_to(elapsed(Instant::now()), host);
                match result {
                    Ok(handle) => {
                        tracing::info!("Loaded {} asset {} from {}", request.kind, request.name, request.url);
                        loaded.push(request.name.clone());
                        experience.handle(HostEvent::AssetLoaded { asset: request.name, handle }, host);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {} from {}: {}", request.name, request.url, e);
                        failed.push(FailedAsset {
                            asset: request.name.clone(),
                            url: request.url.clone(),
                            error: e.to_string(),
                        });
                        experience.handle(
                            HostEvent::AssetFailed { asset: request.name, error: e.to_string() },
                            host,
                        );
                    }
                }
            }
            Some(event) = next_event(&mut options.events) => {
                experience.advance_to(elapsed(Instant::now()), host);
                experience.handle(event, host);
            }
            _ = tokio::time::sleep_until(wake) => {}
        }
    }

    let summary = RunSummary {
        session: experience.session(),
        phase: experience.phase(),
        progress: experience.progress(),
        elapsed: Duration::from_seconds(experience.now().as_seconds()),
        loaded,
        failed,
    };
    tracing::info!(
        "Run finished after {} in phase {:?} ({}% loaded)",
        summary.elapsed,
        summary.phase,
        summary.progress.round()
    );
    summary
}

async fn next_event(events: &mut Option<mpsc::UnboundedReceiver<HostEvent>>) -> Option<HostEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
