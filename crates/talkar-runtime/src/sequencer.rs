//! Animation sequencing.
//!
//! Each element gets a [`Timeline`] holding its start tweens, its end
//! tweens and, for animatable models, a clip chain. Triggers are global:
//! one start event reaches every timeline at once, one time-end event
//! likewise, and a video ending reaches every timeline waiting on that
//! video. Everything after a trigger runs off the shared [`Scheduler`].

use std::collections::HashMap;

use serde::Serialize;
use talkar_core::Duration;
use talkar_ir::{ModelAnimation, UniqueName};

use crate::clock::Scheduler;
use crate::host::{AssetRef, ClipPlayback, NodeId, SceneHost, Tween};

/// Where one element is in its animation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementPhase {
    /// Waiting for the experience to start.
    Idle,
    StartAnimating,
    /// Start tweens are done; end tweens are waiting on their trigger.
    AwaitingEnd,
    EndAnimating,
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenGroup {
    Start,
    End,
}

/// Work queued on the virtual clock.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// The post-start grace period is over; fire every trigger.
    Fire,
    BeginTween {
        timeline: usize,
        group: TweenGroup,
        index: usize,
    },
    TweenDone {
        timeline: usize,
        group: TweenGroup,
    },
    StartClip {
        timeline: usize,
    },
    ClipElapsed {
        timeline: usize,
    },
    /// Restart an audio asset.
    PlayAudio {
        asset: AssetRef,
    },
    /// Restart a video element's asset; reveal it shortly after.
    PlayVideo {
        node: NodeId,
        asset: AssetRef,
    },
    Reveal {
        node: NodeId,
    },
    StartParticles {
        node: NodeId,
    },
    ShowButton,
    AssetTimeout,
}

/// A tween waiting for its trigger.
#[derive(Debug, Clone)]
pub struct ScheduledTween {
    pub node: NodeId,
    pub tween: Tween,
    /// Offset from the trigger.
    pub delay: Duration,
    /// Identifier audio elements link to.
    pub animation: Option<UniqueName>,
    /// For end tweens: the video whose end triggers it. `None` means the
    /// time trigger.
    pub video: Option<UniqueName>,
    pub fired: bool,
}

/// One resolved clip of a model's playlist.
#[derive(Debug, Clone)]
pub struct ClipStep {
    /// `None` when the clip number is out of range for the model.
    pub playback: Option<ClipPlayback>,
    pub delay: Duration,
    /// Zero means wait for the engine to report the clip finished.
    pub duration: Duration,
}

/// A model's clip playlist. Authored clips wait in `pending` until the
/// model has loaded and they can be checked against its clip list.
#[derive(Debug, Clone)]
pub struct ClipChain {
    pub node: NodeId,
    pub model: Option<UniqueName>,
    pub pending: Vec<ModelAnimation>,
    pub steps: Vec<ClipStep>,
    next: usize,
    awaiting_engine: bool,
}

impl ClipChain {
    pub fn new(node: NodeId, steps: Vec<ClipStep>) -> Self {
        Self {
            node,
            model: None,
            pending: Vec::new(),
            steps,
            next: 0,
            awaiting_engine: false,
        }
    }

    /// A chain whose clips are resolved later against `model`.
    pub fn unbound(node: NodeId, model: Option<UniqueName>, pending: Vec<ModelAnimation>) -> Self {
        Self {
            model,
            pending,
            ..Self::new(node, Vec::new())
        }
    }

    pub fn is_bound(&self) -> bool {
        self.pending.is_empty()
    }

    /// How many clips have been started.
    pub fn started(&self) -> usize {
        self.next
    }
}

#[derive(Debug, Clone)]
pub struct Timeline {
    pub element: UniqueName,
    pub start: Vec<ScheduledTween>,
    pub end: Vec<ScheduledTween>,
    pub clips: Option<ClipChain>,
    started: bool,
    start_done: usize,
    end_begun: usize,
    end_done: usize,
}

impl Timeline {
    pub fn new(element: UniqueName) -> Self {
        Self {
            element,
            start: Vec::new(),
            end: Vec::new(),
            clips: None,
            started: false,
            start_done: 0,
            end_begun: 0,
            end_done: 0,
        }
    }

    pub fn phase(&self) -> ElementPhase {
        if !self.started {
            ElementPhase::Idle
        } else if self.start_done == self.start.len() && self.end_done == self.end.len() {
            ElementPhase::Settled
        } else if self.end_begun > 0 {
            ElementPhase::EndAnimating
        } else if self.start_done < self.start.len() {
            ElementPhase::StartAnimating
        } else {
            ElementPhase::AwaitingEnd
        }
    }

    fn tweens(&self, group: TweenGroup) -> &[ScheduledTween] {
        match group {
            TweenGroup::Start => &self.start,
            TweenGroup::End => &self.end,
        }
    }
}

/// An audio element waiting on an animation to begin.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioCue {
    pub asset: AssetRef,
    pub delay: Duration,
}

#[derive(Debug, Default)]
pub struct Sequencer {
    timelines: Vec<Timeline>,
    by_element: HashMap<UniqueName, usize>,
    by_clip_node: HashMap<NodeId, usize>,
    audio_links: HashMap<UniqueName, Vec<AudioCue>>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_timeline(&mut self, timeline: Timeline) -> usize {
        let index = self.timelines.len();
        if let Some(chain) = &timeline.clips {
            self.by_clip_node.insert(chain.node, index);
        }
        self.by_element.insert(timeline.element.clone(), index);
        self.timelines.push(timeline);
        index
    }

    /// Play `cue` whenever the animation named `animation` begins.
    pub fn link_audio(&mut self, animation: UniqueName, cue: AudioCue) {
        self.audio_links.entry(animation).or_default().push(cue);
    }

    pub fn timeline(&self, element: &str) -> Option<&Timeline> {
        self.by_element.get(element).map(|&i| &self.timelines[i])
    }

    pub fn phase(&self, element: &str) -> Option<ElementPhase> {
        self.timeline(element).map(Timeline::phase)
    }

    pub fn timelines(&self) -> &[Timeline] {
        &self.timelines
    }

    pub fn timelines_mut(&mut self) -> &mut [Timeline] {
        &mut self.timelines
    }

    /// The global start event: every start tween begins after its delay.
    pub fn fire_start(&mut self, scheduler: &mut Scheduler<Task>) {
        for (i, timeline) in self.timelines.iter_mut().enumerate() {
            timeline.started = true;
            for (index, tween) in timeline.start.iter().enumerate() {
                scheduler.schedule_after(
                    tween.delay,
                    Task::BeginTween {
                        timeline: i,
                        group: TweenGroup::Start,
                        index,
                    },
                );
            }
        }
    }

    /// The global time-end event.
    pub fn fire_time_end(&mut self, scheduler: &mut Scheduler<Task>) {
        let mut count = 0;
        for (i, timeline) in self.timelines.iter().enumerate() {
            for (index, tween) in timeline.end.iter().enumerate() {
                if tween.video.is_none() {
                    count += 1;
                    scheduler.schedule_after(
                        tween.delay,
                        Task::BeginTween {
                            timeline: i,
                            group: TweenGroup::End,
                            index,
                        },
                    );
                }
            }
        }
        tracing::debug!("Scheduled {} time-triggered end animations", count);
    }

    /// Broadcast the end of `video` to every timeline waiting on it.
    /// Returns how many tweens were triggered.
    pub fn fire_video_end(&mut self, video: &str, scheduler: &mut Scheduler<Task>) -> usize {
        let mut count = 0;
        for (i, timeline) in self.timelines.iter_mut().enumerate() {
            for (index, tween) in timeline.end.iter_mut().enumerate() {
                if tween.fired || tween.video.as_ref().map(|v| v.as_str()) != Some(video) {
                    continue;
                }
                // Claimed now so a second end event cannot queue it twice.
                tween.fired = true;
                count += 1;
                scheduler.schedule_after(
                    tween.delay,
                    Task::BeginTween {
                        timeline: i,
                        group: TweenGroup::End,
                        index,
                    },
                );
            }
        }
        count
    }

    /// Queue the first clip of every model chain.
    pub fn fire_model_chains(&mut self, scheduler: &mut Scheduler<Task>) {
        for (i, timeline) in self.timelines.iter().enumerate() {
            if let Some(step) = timeline.clips.as_ref().and_then(|c| c.steps.first()) {
                scheduler.schedule_after(step.delay, Task::StartClip { timeline: i });
            }
        }
    }

    pub fn begin_tween(
        &mut self,
        timeline: usize,
        group: TweenGroup,
        index: usize,
        scheduler: &mut Scheduler<Task>,
        host: &mut dyn SceneHost,
    ) {
        let Some(t) = self.timelines.get_mut(timeline) else {
            return;
        };
        let Some(tween) = t.tweens(group).get(index).cloned() else {
            return;
        };
        tracing::debug!(
            "Playing {} on '{}' for {}",
            tween.tween.name,
            t.element,
            tween.tween.duration
        );
        host.play_tween(tween.node, &tween.tween);
        match group {
            TweenGroup::Start => t.start[index].fired = true,
            TweenGroup::End => {
                t.end[index].fired = true;
                t.end_begun += 1;
            }
        }
        scheduler.schedule_after(tween.tween.duration, Task::TweenDone { timeline, group });

        if let Some(cues) = tween.animation.as_ref().and_then(|a| self.audio_links.get(a)) {
            for cue in cues {
                tracing::debug!("Animation {} begins, cueing audio '{}'", tween.tween.name, cue.asset.name);
                scheduler.schedule_after(
                    cue.delay,
                    Task::PlayAudio {
                        asset: cue.asset.clone(),
                    },
                );
            }
        }
    }

    pub fn tween_done(&mut self, timeline: usize, group: TweenGroup) {
        if let Some(t) = self.timelines.get_mut(timeline) {
            match group {
                TweenGroup::Start => t.start_done += 1,
                TweenGroup::End => t.end_done += 1,
            }
            if t.phase() == ElementPhase::Settled {
                tracing::debug!("Element '{}' settled", t.element);
            }
        }
    }

    pub fn start_clip(
        &mut self,
        timeline: usize,
        scheduler: &mut Scheduler<Task>,
        host: &mut dyn SceneHost,
    ) {
        let Some(chain) = self
            .timelines
            .get_mut(timeline)
            .and_then(|t| t.clips.as_mut())
        else {
            return;
        };
        let Some(step) = chain.steps.get(chain.next).cloned() else {
            return;
        };
        chain.next += 1;

        match &step.playback {
            Some(playback) => {
                tracing::debug!("Model {} playing clip '{}'", chain.node, playback.clip);
                host.play_model_clip(chain.node, playback);
                if step.duration.is_zero() {
                    chain.awaiting_engine = true;
                } else {
                    scheduler.schedule_after(step.duration, Task::ClipElapsed { timeline });
                }
            }
            // The authoring error was reported when the chain was built.
            None if step.duration.is_zero() => self.advance_chain(timeline, scheduler),
            None => scheduler.schedule_after(step.duration, Task::ClipElapsed { timeline }),
        }
    }

    pub fn clip_elapsed(&mut self, timeline: usize, scheduler: &mut Scheduler<Task>) {
        self.advance_chain(timeline, scheduler);
    }

    /// The engine finished the clip playing on `node`.
    pub fn clip_finished(&mut self, node: NodeId, scheduler: &mut Scheduler<Task>) {
        let Some(&timeline) = self.by_clip_node.get(&node) else {
            tracing::debug!("Clip finished on {} which has no clip chain", node);
            return;
        };
        let awaiting = self.timelines[timeline]
            .clips
            .as_ref()
            .map(|c| c.awaiting_engine)
            .unwrap_or(false);
        if awaiting {
            self.advance_chain(timeline, scheduler);
        }
    }

    fn advance_chain(&mut self, timeline: usize, scheduler: &mut Scheduler<Task>) {
        let Some(chain) = self
            .timelines
            .get_mut(timeline)
            .and_then(|t| t.clips.as_mut())
        else {
            return;
        };
        chain.awaiting_engine = false;
        if let Some(step) = chain.steps.get(chain.next) {
            scheduler.schedule_after(step.delay, Task::StartClip { timeline });
        }
    }
}
