//! # talkar-runtime
//!
//! The TalkAR scene interpreter. An [`Experience`] owns one validated
//! document and drives it through its lifecycle:
//!
//! 1. [`Experience::prepare`] builds the root and loading indicator and
//!    returns the assets to fetch.
//! 2. [`Experience::materialize`] builds the element tree, parents first.
//! 3. Host events ([`HostEvent`]) report taps, asset completions and media
//!    playback.
//! 4. When the assets are in, the tree is built and the user has tapped,
//!    the experience starts and its animations, clips, particles and media
//!    are scheduled.
//! 5. [`Experience::advance_to`] moves a virtual clock forward and runs
//!    whatever falls due.
//!
//! Rendering goes through the [`SceneHost`] trait. [`HeadlessHost`] is an
//! in-memory implementation used by the CLI and the tests, and
//! [`runner::run_experience`] drives everything asynchronously against an
//! [`AssetFetcher`].

pub mod clock;
pub mod gate;
pub mod headless;
pub mod host;
pub mod lights;
pub mod loader;
pub mod materializer;
pub mod media;
pub mod orchestrator;
pub mod particles;
pub mod resolver;
pub mod runner;
pub mod sequencer;

pub use clock::Scheduler;
pub use gate::{Completion, StartGate};
pub use headless::{HeadlessHost, HeadlessNode};
pub use host::{HostEvent, NodeId, Primitive, SceneHost};
pub use loader::{resolve_asset_url, AssetRequest, AssetTable, UrlPolicy};
pub use media::{decode_asset, AssetHandle};
pub use orchestrator::{Experience, ExperiencePhase, InterpreterState};
pub use runner::{run_experience, AssetFetcher, RunOptions, RunSummary};
pub use sequencer::ElementPhase;
