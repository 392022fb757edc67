//! The experience lifecycle.
//!
//! `prepare → (tap | assets | materialize, any order) → start`. The three
//! middle completions feed a [`StartGate`]; the last one to arrive starts
//! the experience, exactly once. All state lives in [`InterpreterState`],
//! owned by the [`Experience`].

use serde::Serialize;
use talkar_core::{
    AssetFailurePolicy, Color, Duration, TalkarConfig, TalkarError, Timestamp, Vec3,
};
use talkar_ir::{validate_document, ExperienceDocument, MaterializationPlan, UniqueName};
use uuid::Uuid;

use crate::clock::Scheduler;
use crate::gate::{Completion, StartGate};
use crate::host::{Behaviour, ButtonStyle, HostEvent, NodeId, Primitive, SceneHost};
use crate::lights::init_lights;
use crate::loader::{AssetRequest, AssetTable, LoadOutcome, UrlPolicy};
use crate::materializer::{bind_clip_chains, materialize, refresh_anchors, Materialized};
use crate::sequencer::{ElementPhase, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExperiencePhase {
    /// Created; nothing asked of the host yet.
    Idle,
    /// Waiting on the tap, the assets and the scene.
    Awaiting,
    Started,
}

/// Everything the interpreter mutates while an experience runs.
#[derive(Debug, Default)]
pub struct InterpreterState {
    pub assets: AssetTable,
    pub materialized: Option<Materialized>,
    pub gate: StartGate,
    pub tapped: bool,
    pub scheduler: Scheduler<Task>,
    pub root: Option<NodeId>,
    pub loading: Option<NodeId>,
    pub lights: Vec<NodeId>,
}

pub struct Experience {
    session: Uuid,
    span: tracing::Span,
    document: ExperienceDocument,
    plan: MaterializationPlan,
    config: TalkarConfig,
    state: InterpreterState,
    phase: ExperiencePhase,
}

impl Experience {
    /// Validate `document` and set up an interpreter for it. Every
    /// structural problem is reported, not only the first.
    pub fn new(document: ExperienceDocument, config: TalkarConfig) -> Result<Self, Vec<TalkarError>> {
        let plan = validate_document(&document)?;
        let session = Uuid::new_v4();
        let span = tracing::info_span!("experience", session = %session);
        let assets = AssetTable::new(&document.assets, &UrlPolicy::from_config(&config.assets));
        Ok(Self {
            session,
            span,
            document,
            plan,
            config,
            state: InterpreterState {
                assets,
                ..Default::default()
            },
            phase: ExperiencePhase::Idle,
        })
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn document(&self) -> &ExperienceDocument {
        &self.document
    }

    pub fn config(&self) -> &TalkarConfig {
        &self.config
    }

    pub fn state(&self) -> &InterpreterState {
        &self.state
    }

    pub fn phase(&self) -> ExperiencePhase {
        self.phase
    }

    pub fn has_started(&self) -> bool {
        self.phase == ExperiencePhase::Started
    }

    /// Asset loading progress, 0 to 100.
    pub fn progress(&self) -> f64 {
        self.state.assets.progress()
    }

    pub fn now(&self) -> Timestamp {
        self.state.scheduler.now()
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.state.scheduler.next_deadline()
    }

    pub fn element_phase(&self, element: &str) -> Option<ElementPhase> {
        self.state
            .materialized
            .as_ref()
            .and_then(|m| m.sequencer.phase(element))
    }

    pub fn node_of(&self, element: &str) -> Option<NodeId> {
        if element == self.document.root_name().as_str() {
            return self.state.root;
        }
        self.state.materialized.as_ref().and_then(|m| m.node_of(element))
    }

    /// Build the hidden root, the loading indicator and the button, and
    /// return the assets the host should fetch.
    pub fn prepare(&mut self, host: &mut dyn SceneHost) -> Vec<AssetRequest> {
        let span = self.span.clone();
        let _enter = span.enter();
        if self.phase != ExperiencePhase::Idle {
            tracing::warn!("Experience already prepared");
            return self.state.assets.requests();
        }
        self.phase = ExperiencePhase::Awaiting;
        tracing::info!(
            "Preparing experience '{}' with {} assets and {} elements",
            self.document.root_name(),
            self.state.assets.total(),
            self.document.elements.len()
        );

        let root = host.create_node(self.document.root_name().as_str(), Primitive::Entity, None);
        host.set_visible(root, false);
        self.state.root = Some(root);

        let loading = host.create_loading_indicator();
        host.set_visible(loading, false);
        let scale = self.document.loading.as_ref().and_then(|l| l.scale).unwrap_or(1.0);
        host.set_scale(loading, Vec3::splat(scale));
        host.add_behaviour(loading, Behaviour::FollowCamera);
        self.state.loading = Some(loading);

        if let Some(button) = &self.document.button {
            host.style_button(&ButtonStyle {
                text: button.text.clone(),
                text_color: button.text_color.as_deref().and_then(parse_hex),
                button_color: button.button_color.as_deref().and_then(parse_hex),
                url: button.url.clone(),
            });
        }

        if self.state.assets.is_complete() {
            tracing::info!("No assets to load");
            self.complete(Completion::AssetsLoaded, host);
        } else {
            self.show_progress(0.0, host);
            if let Some(timeout) = self.config.assets.timeout() {
                self.state.scheduler.schedule_after(timeout, Task::AssetTimeout);
            }
        }

        self.state.assets.requests()
    }

    /// Build every element under the root. Runs once; later calls do nothing.
    pub fn materialize(&mut self, host: &mut dyn SceneHost) {
        let span = self.span.clone();
        let _enter = span.enter();
        if self.state.materialized.is_some() {
            return;
        }
        let Some(root) = self.state.root else {
            tracing::warn!("Materialize called before prepare");
            return;
        };

        let materialized = materialize(&self.document, &self.plan, &self.state.assets, root, host);
        let expected = self.document.elements.len() + 1;
        let ready = materialized.count == expected;
        tracing::info!("Materialized {} of {} elements", materialized.count, expected);
        self.state.materialized = Some(materialized);
        if ready {
            self.complete(Completion::ElementsReady, host);
        } else {
            tracing::error!("Element count mismatch, the experience cannot start");
        }
    }

    /// React to something that happened outside the interpreter.
    pub fn handle(&mut self, event: HostEvent, host: &mut dyn SceneHost) {
        let span = self.span.clone();
        let _enter = span.enter();
        match event {
            HostEvent::RealityReady => tracing::info!("Scene tracking ready"),
            HostEvent::Tap { point } => self.on_tap(point, host),
            HostEvent::AssetLoaded { asset, handle } => {
                tracing::debug!("Asset '{}' loaded", asset);
                let outcome = self.state.assets.mark_loaded(asset.as_str(), handle);
                if let (LoadOutcome::Progress(_) | LoadOutcome::Complete, Some(m)) =
                    (outcome, &self.state.materialized)
                {
                    refresh_anchors(m, asset.as_str(), &self.state.assets, host);
                }
                self.on_load_outcome(&asset, outcome, host);
            }
            HostEvent::AssetFailed { asset, error } => {
                tracing::warn!("Asset '{}' failed to load: {}", asset, error);
                match self.config.assets.failure {
                    AssetFailurePolicy::Skip => {
                        let outcome = self.state.assets.mark_skipped(asset.as_str());
                        self.on_load_outcome(&asset, outcome, host);
                    }
                    AssetFailurePolicy::Stall => {
                        tracing::warn!("Asset '{}' will never complete, loading stalls", asset)
                    }
                }
            }
            HostEvent::MediaEnded { asset } => {
                let Some(m) = self.state.materialized.as_mut() else {
                    return;
                };
                let count = m
                    .sequencer
                    .fire_video_end(asset.as_str(), &mut self.state.scheduler);
                tracing::debug!("Media '{}' ended, triggering {} end animations", asset, count);
            }
            HostEvent::ModelClipFinished { node } => {
                if let Some(m) = self.state.materialized.as_mut() {
                    m.sequencer.clip_finished(node, &mut self.state.scheduler);
                }
            }
        }
    }

    /// Move the virtual clock to `now`, running every task that falls due.
    pub fn advance_to(&mut self, now: Timestamp, host: &mut dyn SceneHost) {
        let span = self.span.clone();
        let _enter = span.enter();
        while let Some((_, task)) = self.state.scheduler.pop_due(now) {
            self.run_task(task, host);
        }
        self.state.scheduler.advance(now);
    }

    fn on_tap(&mut self, point: Vec3, host: &mut dyn SceneHost) {
        if self.state.tapped {
            tracing::debug!("Ignoring repeated tap");
            return;
        }
        self.state.tapped = true;
        tracing::info!("Placing experience at {}", point);

        let placed = point + self.config.scene.root_offset();
        if let Some(root) = self.state.root {
            host.set_position(root, placed);
        }
        if let Some(loading) = self.state.loading {
            host.set_position(loading, placed);
            if !self.state.assets.is_complete() {
                host.set_visible(loading, true);
            }
        }
        host.hide_tap_prompt();
        for asset in self.state.assets.iter().filter(|a| a.kind().is_media()) {
            host.prime_media(&asset.asset_ref());
        }

        self.complete(Completion::UserTapped, host);
    }

    fn on_load_outcome(&mut self, asset: &UniqueName, outcome: LoadOutcome, host: &mut dyn SceneHost) {
        match outcome {
            LoadOutcome::Progress(progress) => self.show_progress(progress, host),
            LoadOutcome::Complete => {
                self.show_progress(100.0, host);
                tracing::info!("All {} assets settled", self.state.assets.total());
                self.complete(Completion::AssetsLoaded, host);
            }
            LoadOutcome::Duplicate => tracing::debug!("Asset '{}' already completed", asset),
            LoadOutcome::Unknown => tracing::warn!("Completion for undeclared asset '{}'", asset),
        }
    }

    fn show_progress(&self, progress: f64, host: &mut dyn SceneHost) {
        if let Some(loading) = self.state.loading {
            host.set_loading_text(loading, &format!("{}%", progress.round()));
        }
    }

    fn complete(&mut self, completion: Completion, host: &mut dyn SceneHost) {
        if self.state.gate.complete(completion) {
            self.start(host);
        }
    }

    fn start(&mut self, host: &mut dyn SceneHost) {
        let Some(root) = self.state.root else {
            return;
        };
        tracing::info!("Starting experience");
        self.phase = ExperiencePhase::Started;
        host.set_visible(root, true);

        let materialized = self.state.materialized.as_ref();
        let root_name = self.document.root_name().as_str();
        self.state.lights = init_lights(
            &self.document,
            root,
            |name| {
                if name == root_name {
                    Some(root)
                } else {
                    materialized.and_then(|m| m.node_of(name))
                }
            },
            host,
        );

        let timing = &self.config.timing;
        match &self.document.button {
            None => self
                .state
                .scheduler
                .schedule_after(timing.button_default_delay(), Task::ShowButton),
            Some(button) => match button.show_after {
                Some(secs) if secs < 0.0 => tracing::debug!("Button hidden for good"),
                Some(secs) if secs > 0.0 => self.state.scheduler.schedule_after(
                    Duration::from_seconds(secs),
                    Task::ShowButton,
                ),
                _ => host.show_button(),
            },
        }

        if let Some(loading) = self.state.loading {
            host.set_visible(loading, false);
        }
        self.state
            .scheduler
            .schedule_after(timing.start_grace(), Task::Fire);
    }

    fn fire(&mut self, host: &mut dyn SceneHost) {
        let state = &mut self.state;
        let Some(m) = state.materialized.as_mut() else {
            return;
        };
        tracing::debug!("Firing start triggers");
        m.sequencer.fire_start(&mut state.scheduler);
        m.sequencer.fire_time_end(&mut state.scheduler);
        bind_clip_chains(&mut m.sequencer, &state.assets, host);
        m.sequencer.fire_model_chains(&mut state.scheduler);
        for emitter in &m.emitters {
            state
                .scheduler
                .schedule_after(emitter.delay, Task::StartParticles { node: emitter.node });
        }
        for video in &m.videos {
            state.scheduler.schedule_after(
                video.delay,
                Task::PlayVideo {
                    node: video.node,
                    asset: video.asset.clone(),
                },
            );
        }
        for audio in &m.timed_audio {
            state.scheduler.schedule_after(
                audio.delay,
                Task::PlayAudio {
                    asset: audio.asset.clone(),
                },
            );
        }
    }

    fn run_task(&mut self, task: Task, host: &mut dyn SceneHost) {
        match task {
            Task::Fire => self.fire(host),
            Task::BeginTween {
                timeline,
                group,
                index,
            } => {
                if let Some(m) = self.state.materialized.as_mut() {
                    m.sequencer
                        .begin_tween(timeline, group, index, &mut self.state.scheduler, host);
                }
            }
            Task::TweenDone { timeline, group } => {
                if let Some(m) = self.state.materialized.as_mut() {
                    m.sequencer.tween_done(timeline, group);
                }
            }
            Task::StartClip { timeline } => {
                if let Some(m) = self.state.materialized.as_mut() {
                    m.sequencer
                        .start_clip(timeline, &mut self.state.scheduler, host);
                }
            }
            Task::ClipElapsed { timeline } => {
                if let Some(m) = self.state.materialized.as_mut() {
                    m.sequencer.clip_elapsed(timeline, &mut self.state.scheduler);
                }
            }
            Task::PlayAudio { asset } => {
                tracing::debug!("Playing audio '{}'", asset.name);
                host.play_media(&asset);
            }
            Task::PlayVideo { node, asset } => {
                tracing::debug!("Playing video '{}'", asset.name);
                host.play_media(&asset);
                self.state
                    .scheduler
                    .schedule_after(self.config.timing.video_reveal(), Task::Reveal { node });
            }
            Task::Reveal { node } => host.set_visible(node, true),
            Task::StartParticles { node } => host.start_particles(node),
            Task::ShowButton => host.show_button(),
            Task::AssetTimeout => {
                if self.state.assets.is_complete() {
                    return;
                }
                let skipped = self.state.assets.skip_pending();
                tracing::warn!(
                    "Timed out waiting on {} assets: {}",
                    skipped.len(),
                    skipped
                        .iter()
                        .map(UniqueName::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                self.show_progress(100.0, host);
                self.complete(Completion::AssetsLoaded, host);
            }
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    Color::from_hex(hex)
        .map_err(|_| tracing::warn!("Button color '{}' is not a hex color, ignoring it", hex))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessHost;
    use talkar_ir::{ButtonSettings, DocumentBuilder, ElementBuilder};

    fn experience(doc: ExperienceDocument) -> (Experience, HeadlessHost) {
        let mut host = HeadlessHost::new();
        let mut exp = Experience::new(doc, TalkarConfig::default()).unwrap();
        exp.prepare(&mut host);
        (exp, host)
    }

    fn tap() -> HostEvent {
        HostEvent::Tap {
            point: Vec3::new(1.0, 0.0, -2.0),
        }
    }

    #[test]
    fn test_invalid_document_is_rejected() {
        let mut orphan = ElementBuilder::container("a");
        orphan.parent("nowhere");
        let mut doc = DocumentBuilder::new("root");
        doc.add_element(orphan.build());
        let errors = Experience::new(doc.build(), TalkarConfig::default())
            .err()
            .unwrap();
        assert!(matches!(errors[0], TalkarError::MissingParent { .. }));
    }

    #[test]
    fn test_non_ascii_button_colors_are_ignored() {
        let doc = ExperienceDocument::from_json(
            r#"{"rootElement": {"uniqueName": "root"},
                "button": {"text": "Go", "textColor": "aébcd", "buttonColor": "E91E63"}}"#,
        )
        .unwrap();
        let (_, host) = experience(doc);
        let button = host.button.as_ref().unwrap();
        assert_eq!(button.text_color, None);
        assert_eq!(button.button_color, Some(Color::from_hex("E91E63").unwrap()));
    }

    #[test]
    fn test_prepare_builds_hidden_root_and_loading() {
        let (exp, host) = experience(DocumentBuilder::new("root").build());
        assert_eq!(exp.phase(), ExperiencePhase::Awaiting);
        let root = host.node_by_name("root").unwrap();
        assert!(!root.visible);
        let loading = host.node_by_name(crate::headless::LOADING_NODE_NAME).unwrap();
        assert!(!loading.visible);
        assert_eq!(loading.behaviours, vec![Behaviour::FollowCamera]);
    }

    #[test]
    fn test_tap_places_root_once() {
        let (mut exp, mut host) = experience(DocumentBuilder::new("root").build());
        exp.handle(tap(), &mut host);
        exp.handle(
            HostEvent::Tap {
                point: Vec3::new(9.0, 9.0, 9.0),
            },
            &mut host,
        );
        assert_eq!(host.node_by_name("root").unwrap().position, Vec3::new(1.0, 0.0, -2.0));
        assert!(!host.tap_prompt_visible);
    }

    #[test]
    fn test_start_needs_materialize() {
        let (mut exp, mut host) = experience(DocumentBuilder::new("root").build());
        exp.handle(tap(), &mut host);
        assert_eq!(exp.phase(), ExperiencePhase::Awaiting);
        exp.materialize(&mut host);
        assert!(exp.has_started());
        assert!(host.node_by_name("root").unwrap().visible);
    }

    #[test]
    fn test_button_default_delay() {
        let (mut exp, mut host) = experience(DocumentBuilder::new("root").build());
        exp.materialize(&mut host);
        exp.handle(tap(), &mut host);
        exp.advance_to(Timestamp::from_millis(6999), &mut host);
        assert!(!host.button_visible);
        exp.advance_to(Timestamp::from_millis(7000), &mut host);
        assert!(host.button_visible);
    }

    #[test]
    fn test_button_show_after() {
        let cases = [(None, Some(0)), (Some(0.0), Some(0)), (Some(2.5), Some(2500)), (Some(-1.0), None)];
        for (show_after, shown_at) in cases {
            let mut doc = DocumentBuilder::new("root");
            doc.button(ButtonSettings {
                text: Some("Shop".into()),
                text_color: Some("FFF".into()),
                button_color: Some("nope".into()),
                url: None,
                show_after,
            });
            let (mut exp, mut host) = experience(doc.build());
            exp.materialize(&mut host);
            exp.handle(tap(), &mut host);
            exp.advance_to(Timestamp::from_millis(60_000), &mut host);
            assert_eq!(host.button_visible, shown_at.is_some(), "{:?}", show_after);
            let style = host.button.clone().unwrap();
            assert_eq!(style.text_color, Some(Color::WHITE));
            assert_eq!(style.button_color, None);
        }
    }
}
