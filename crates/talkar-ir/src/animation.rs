use serde::{Deserialize, Serialize};
use talkar_core::Duration;

use crate::property::{PartialVec3, PropertyType};
use crate::UniqueName;

/// What makes an end animation play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndTrigger {
    /// A fixed delay after the experience starts.
    #[serde(rename = "startAfterTime")]
    Time,
    /// Playback of a named video asset ending.
    #[serde(rename = "startAfterVideo")]
    Video,
}

/// A tween of one property channel.
///
/// Start animations carry `from*` overrides and tween toward the element's
/// property; end animations tween from the property toward `to*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animation {
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default)]
    pub from_x: Option<f64>,
    #[serde(default)]
    pub from_y: Option<f64>,
    #[serde(default)]
    pub from_z: Option<f64>,
    #[serde(default)]
    pub to_x: Option<f64>,
    #[serde(default)]
    pub to_y: Option<f64>,
    #[serde(default)]
    pub to_z: Option<f64>,
    /// Seconds.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Seconds.
    #[serde(default)]
    pub delay: Option<f64>,
    #[serde(default)]
    pub easing: Option<String>,
    #[serde(default)]
    pub trigger: Option<EndTrigger>,
    #[serde(default)]
    pub video_asset_unique_name: Option<UniqueName>,
    /// Identifier audio elements use to start alongside this animation.
    #[serde(default)]
    pub unique_name: Option<UniqueName>,
}

impl Animation {
    pub const DEFAULT_DURATION_SECS: f64 = 1.0;

    pub fn new(property_type: PropertyType) -> Self {
        Self {
            property_type,
            from_x: None,
            from_y: None,
            from_z: None,
            to_x: None,
            to_y: None,
            to_z: None,
            duration: None,
            delay: None,
            easing: None,
            trigger: None,
            video_asset_unique_name: None,
            unique_name: None,
        }
    }

    pub fn from(&self) -> PartialVec3 {
        PartialVec3 {
            x: self.from_x,
            y: self.from_y,
            z: self.from_z,
        }
    }

    pub fn to(&self) -> PartialVec3 {
        PartialVec3 {
            x: self.to_x,
            y: self.to_y,
            z: self.to_z,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_seconds(self.duration.unwrap_or(Self::DEFAULT_DURATION_SECS))
    }

    pub fn delay(&self) -> Duration {
        Duration::from_seconds(self.delay.unwrap_or(0.0))
    }
}

/// How a model clip repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoopType {
    Once,
    #[default]
    Repeat,
    #[serde(alias = "pingPong")]
    Pingpong,
}

/// One entry in an animatable model's clip playlist.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAnimation {
    #[serde(default)]
    pub clip_number: Option<usize>,
    #[serde(default)]
    pub clamp_when_finished: Option<bool>,
    /// Seconds.
    #[serde(default)]
    pub cross_fade_duration: Option<f64>,
    /// Seconds.
    #[serde(default)]
    pub delay: Option<f64>,
    /// Seconds. Zero means "until the engine reports the clip finished".
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub loop_type: Option<LoopType>,
    /// Absent means repeat forever.
    #[serde(default)]
    pub repetitions: Option<u32>,
    #[serde(default)]
    pub time_scale: Option<f64>,
}

impl ModelAnimation {
    pub fn clip_number(&self) -> usize {
        self.clip_number.unwrap_or(0)
    }

    pub fn clamp_when_finished(&self) -> bool {
        self.clamp_when_finished.unwrap_or(false)
    }

    pub fn cross_fade_duration(&self) -> Duration {
        Duration::from_seconds(self.cross_fade_duration.unwrap_or(0.0))
    }

    pub fn delay(&self) -> Duration {
        Duration::from_seconds(self.delay.unwrap_or(0.0))
    }

    pub fn duration(&self) -> Duration {
        Duration::from_seconds(self.duration.unwrap_or(0.0))
    }

    pub fn loop_type(&self) -> LoopType {
        self.loop_type.unwrap_or_default()
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale.unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_animation_from_json() {
        let json = r#"{
            "type": "opacity",
            "toX": 0,
            "duration": 2,
            "trigger": "startAfterVideo",
            "videoAssetUniqueName": "intro",
            "easing": "easeOutQuad"
        }"#;
        let a: Animation = serde_json::from_str(json).unwrap();
        assert_eq!(a.property_type, PropertyType::Opacity);
        assert_eq!(a.trigger, Some(EndTrigger::Video));
        assert_eq!(a.video_asset_unique_name, Some(UniqueName::from("intro")));
        assert_eq!(a.to().x, Some(0.0));
        assert_eq!(a.duration().as_seconds(), 2.0);
        assert!(a.delay().is_zero());
    }

    #[test]
    fn test_animation_defaults() {
        let a = Animation::new(PropertyType::Position);
        assert_eq!(a.duration().as_seconds(), 1.0);
        assert!(a.delay().is_zero());
        assert_eq!(a.from(), PartialVec3::default());
    }

    #[test]
    fn test_model_animation_defaults() {
        let clip: ModelAnimation = serde_json::from_str("{}").unwrap();
        assert_eq!(clip.clip_number(), 0);
        assert!(!clip.clamp_when_finished());
        assert!(clip.cross_fade_duration().is_zero());
        assert!(clip.delay().is_zero());
        assert!(clip.duration().is_zero());
        assert_eq!(clip.loop_type(), LoopType::Repeat);
        assert_eq!(clip.repetitions, None);
        assert_eq!(clip.time_scale(), 1.0);
    }

    #[test]
    fn test_model_animation_nulls() {
        let clip: ModelAnimation =
            serde_json::from_str(r#"{"clipNumber":2,"loopType":"once","repetitions":null}"#)
                .unwrap();
        assert_eq!(clip.clip_number(), 2);
        assert_eq!(clip.loop_type(), LoopType::Once);
    }
}
