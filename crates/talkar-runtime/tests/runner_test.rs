use std::collections::HashMap;
use std::io::Cursor;

use async_trait::async_trait;
use talkar_core::{Duration, TalkarConfig, TalkarError, TalkarResult, Vec3};
use talkar_ir::{AssetKind, DocumentBuilder, ElementBuilder, ExperienceDocument, UniqueName};
use talkar_runtime::{
    run_experience, AssetFetcher, AssetRequest, Experience, ExperiencePhase, HeadlessHost,
    HostEvent, RunOptions,
};

/// Serves assets from memory, keyed by resolved URL.
struct MemoryFetcher {
    files: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl AssetFetcher for MemoryFetcher {
    async fn fetch(&self, request: &AssetRequest) -> TalkarResult<Vec<u8>> {
        self.files
            .get(&request.url)
            .cloned()
            .ok_or_else(|| TalkarError::asset("not found", &request.url))
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::RgbaImage::new(width, height)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn document() -> ExperienceDocument {
    let mut doc = DocumentBuilder::new("root");
    doc.add_asset(AssetKind::Image, "poster-img", "/poster.png")
        .add_element(ElementBuilder::image("poster", "poster-img").build());
    doc.build()
}

fn fetcher() -> MemoryFetcher {
    let mut files = HashMap::new();
    files.insert("https://admin.talkar.app/poster.png".to_string(), png(40, 20));
    MemoryFetcher { files }
}

#[tokio::test(start_paused = true)]
async fn test_run_loads_and_starts() {
    let mut exp = Experience::new(document(), TalkarConfig::default()).unwrap();
    let mut host = HeadlessHost::new();
    let summary = run_experience(
        &mut exp,
        &mut host,
        &fetcher(),
        RunOptions {
            tap: Some(Vec3::new(0.0, 0.0, -1.0)),
            horizon: Duration::from_seconds(10.0),
            events: None,
        },
    )
    .await;

    assert_eq!(summary.phase, ExperiencePhase::Started);
    assert_eq!(summary.progress, 100.0);
    assert_eq!(summary.loaded, vec![UniqueName::from("poster-img")]);
    assert!(summary.failed.is_empty());
    assert!(summary.elapsed.as_seconds() >= 10.0);

    // Sized from the decoded image.
    let poster = exp.node_of("poster").unwrap();
    assert_eq!(host.children_of(poster).next().unwrap().size, Some((1.0, 0.5)));
    assert_eq!(host.lights().count(), 2);
    assert!(host.button_visible);
}

#[tokio::test(start_paused = true)]
async fn test_run_without_tap_never_starts() {
    let mut exp = Experience::new(document(), TalkarConfig::default()).unwrap();
    let mut host = HeadlessHost::new();
    let summary = run_experience(
        &mut exp,
        &mut host,
        &fetcher(),
        RunOptions {
            tap: None,
            ..Default::default()
        },
    )
    .await;
    assert_eq!(summary.phase, ExperiencePhase::Awaiting);
    assert_eq!(summary.progress, 100.0);
}

#[tokio::test(start_paused = true)]
async fn test_run_reports_failed_assets() {
    let mut exp = Experience::new(document(), TalkarConfig::default()).unwrap();
    let mut host = HeadlessHost::new();
    let empty = MemoryFetcher {
        files: HashMap::new(),
    };
    let summary = run_experience(&mut exp, &mut host, &empty, RunOptions::default()).await;
    assert_eq!(summary.phase, ExperiencePhase::Awaiting);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].url, "https://admin.talkar.app/poster.png");
}

#[tokio::test(start_paused = true)]
async fn test_run_delivers_external_events() {
    let mut exp = Experience::new(document(), TalkarConfig::default()).unwrap();
    let mut host = HeadlessHost::new();
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    tx.send(HostEvent::Tap {
        point: Vec3::zero(),
    })
    .unwrap();
    drop(tx);

    let summary = run_experience(
        &mut exp,
        &mut host,
        &fetcher(),
        RunOptions {
            tap: None,
            horizon: Duration::from_seconds(1.0),
            events: Some(rx),
        },
    )
    .await;
    assert_eq!(summary.phase, ExperiencePhase::Started);
}
