use crate::animation::{Animation, EndTrigger, ModelAnimation};
use crate::asset::{AssetDeclaration, AssetKind};
use crate::document::{ButtonSettings, ExperienceDocument, LoadingSettings};
use crate::element::{
    Anchor, AudioElement, AudioTrigger, ElementDeclaration, ElementKind, ImageElement,
    ModelElement, VideoElement,
};
use crate::light::LightDeclaration;
use crate::particle::ParticleElement;
use crate::property::{Property, PropertyType};
use crate::UniqueName;

/// A builder for constructing an experience document programmatically.
/// Useful for tooling and unit testing.
pub struct DocumentBuilder {
    document: ExperienceDocument,
}

impl DocumentBuilder {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            document: ExperienceDocument::new(root),
        }
    }

    pub fn add_asset(
        &mut self,
        kind: AssetKind,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> &mut Self {
        self.document
            .assets
            .push(AssetDeclaration::new(name, kind, url));
        self
    }

    /// Add a fully specified asset declaration.
    pub fn add_asset_declaration(&mut self, asset: AssetDeclaration) -> &mut Self {
        self.document.assets.push(asset);
        self
    }

    pub fn add_element(&mut self, element: ElementDeclaration) -> &mut Self {
        self.document.elements.push(element);
        self
    }

    pub fn add_light(&mut self, light: LightDeclaration) -> &mut Self {
        self.document.lights.push(light);
        self
    }

    pub fn loading_scale(&mut self, scale: f64) -> &mut Self {
        self.document.loading = Some(LoadingSettings { scale: Some(scale) });
        self
    }

    pub fn button(&mut self, button: ButtonSettings) -> &mut Self {
        self.document.button = Some(button);
        self
    }

    pub fn debug(&mut self, debug: bool) -> &mut Self {
        self.document.debug = Some(debug);
        self
    }

    pub fn build(self) -> ExperienceDocument {
        self.document
    }
}

/// A builder for one element declaration.
pub struct ElementBuilder {
    element: ElementDeclaration,
}

impl ElementBuilder {
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            element: ElementDeclaration::new(name, kind),
        }
    }

    pub fn container(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Container)
    }

    pub fn image(name: impl Into<String>, asset: impl Into<String>) -> Self {
        Self::new(
            name,
            ElementKind::Image(ImageElement {
                image_asset_unique_name: UniqueName::new(asset),
                anchor: None,
                transparent: None,
            }),
        )
    }

    pub fn video(name: impl Into<String>, asset: impl Into<String>) -> Self {
        Self::new(
            name,
            ElementKind::Video(VideoElement {
                video_asset_unique_name: UniqueName::new(asset),
                anchor: None,
                green_screen: None,
                delay: None,
            }),
        )
    }

    pub fn audio(name: impl Into<String>, asset: impl Into<String>, trigger: AudioTrigger) -> Self {
        Self::new(
            name,
            ElementKind::Audio(AudioElement {
                audio_asset_unique_name: UniqueName::new(asset),
                trigger: Some(trigger),
                delay: None,
                animation_unique_name: None,
            }),
        )
    }

    pub fn model(name: impl Into<String>, asset: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Model(Self::model_fields(asset)))
    }

    pub fn animatable_model(name: impl Into<String>, asset: impl Into<String>) -> Self {
        Self::new(name, ElementKind::AnimatableModel(Self::model_fields(asset)))
    }

    pub fn particle(name: impl Into<String>, texture: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Particle(ParticleElement::new(texture)))
    }

    fn model_fields(asset: impl Into<String>) -> ModelElement {
        ModelElement {
            model_asset_unique_name: UniqueName::new(asset),
            reflection: None,
            model_animations: Vec::new(),
        }
    }

    pub fn parent(&mut self, parent: impl Into<String>) -> &mut Self {
        self.element.parent_unique_name = Some(UniqueName::new(parent));
        self
    }

    pub fn property(&mut self, property_type: PropertyType, x: f64, y: f64, z: f64) -> &mut Self {
        self.element
            .properties
            .push(Property::new(property_type, x, y, z));
        self
    }

    pub fn add_property(&mut self, property: Property) -> &mut Self {
        self.element.properties.push(property);
        self
    }

    pub fn start_animation(&mut self, animation: Animation) -> &mut Self {
        self.element.start_animations.push(animation);
        self
    }

    pub fn end_animation(&mut self, animation: Animation) -> &mut Self {
        self.element.end_animations.push(animation);
        self
    }

    pub fn follow_camera(&mut self) -> &mut Self {
        self.element.follow_camera = Some(true);
        self
    }

    /// Set the anchor of an image or video element; ignored for other kinds.
    pub fn anchor(&mut self, anchor: Anchor) -> &mut Self {
        match &mut self.element.kind {
            ElementKind::Image(e) | ElementKind::ImageCircle(e) => e.anchor = Some(anchor),
            ElementKind::Video(e) | ElementKind::VideoCircle(e) => e.anchor = Some(anchor),
            _ => {}
        }
        self
    }

    /// Set the playback or emission delay of video, audio and particle
    /// elements; ignored for other kinds.
    pub fn delay(&mut self, seconds: f64) -> &mut Self {
        match &mut self.element.kind {
            ElementKind::Video(e) | ElementKind::VideoCircle(e) => e.delay = Some(seconds),
            ElementKind::Audio(e) => e.delay = Some(seconds),
            ElementKind::Particle(e) => e.delay = Some(seconds),
            _ => {}
        }
        self
    }

    /// Link an audio element to the animation it starts with.
    pub fn with_animation(&mut self, animation: impl Into<String>) -> &mut Self {
        if let ElementKind::Audio(e) = &mut self.element.kind {
            e.animation_unique_name = Some(UniqueName::new(animation));
        }
        self
    }

    /// Append a clip to a model's playlist.
    pub fn add_clip(&mut self, clip: ModelAnimation) -> &mut Self {
        if let ElementKind::Model(e) | ElementKind::AnimatableModel(e) = &mut self.element.kind {
            e.model_animations.push(clip);
        }
        self
    }

    pub fn build(self) -> ElementDeclaration {
        self.element
    }
}

/// Helper builder for start and end animations.
pub struct AnimationBuilder {
    animation: Animation,
}

impl AnimationBuilder {
    /// An animation that plays when the user taps.
    pub fn start(property_type: PropertyType) -> Self {
        Self {
            animation: Animation::new(property_type),
        }
    }

    /// An end animation that plays a fixed time after the experience starts.
    pub fn after_time(property_type: PropertyType) -> Self {
        let mut animation = Animation::new(property_type);
        animation.trigger = Some(EndTrigger::Time);
        Self { animation }
    }

    /// An end animation that plays once the named video ends.
    pub fn after_video(property_type: PropertyType, video: impl Into<String>) -> Self {
        let mut animation = Animation::new(property_type);
        animation.trigger = Some(EndTrigger::Video);
        animation.video_asset_unique_name = Some(UniqueName::new(video));
        Self { animation }
    }

    pub fn from(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) -> &mut Self {
        self.animation.from_x = x;
        self.animation.from_y = y;
        self.animation.from_z = z;
        self
    }

    pub fn to(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) -> &mut Self {
        self.animation.to_x = x;
        self.animation.to_y = y;
        self.animation.to_z = z;
        self
    }

    pub fn duration(&mut self, seconds: f64) -> &mut Self {
        self.animation.duration = Some(seconds);
        self
    }

    pub fn delay(&mut self, seconds: f64) -> &mut Self {
        self.animation.delay = Some(seconds);
        self
    }

    pub fn easing(&mut self, easing: impl Into<String>) -> &mut Self {
        self.animation.easing = Some(easing.into());
        self
    }

    pub fn unique_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.animation.unique_name = Some(UniqueName::new(name));
        self
    }

    pub fn build(self) -> Animation {
        self.animation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_document;

    #[test]
    fn test_build_valid_document() {
        let mut image = ElementBuilder::image("poster", "poster-img");
        image
            .parent("root")
            .anchor(Anchor::TopRight)
            .property(PropertyType::Position, 0.0, 1.0, 0.0);

        let mut fade = AnimationBuilder::start(PropertyType::Opacity);
        fade.from(Some(0.0), None, None).duration(2.0).unique_name("fade");
        image.start_animation(fade.build());

        let mut doc = DocumentBuilder::new("root");
        doc.add_asset_declaration(
            AssetDeclaration::new("poster-img", AssetKind::Image, "/poster.png")
                .with_resolution(200.0, 100.0),
        )
        .add_element(image.build())
        .loading_scale(0.5);
        let doc = doc.build();

        assert!(validate_document(&doc).is_ok());
        let element = doc.element("poster").unwrap();
        assert_eq!(element.kind.anchor(), Some(Anchor::TopRight));
        assert_eq!(element.start_animations[0].from_x, Some(0.0));
        assert_eq!(doc.loading.as_ref().unwrap().scale, Some(0.5));
    }

    #[test]
    fn test_builder_ignores_mismatched_setters() {
        let mut cube = ElementBuilder::new("box", ElementKind::Cube);
        cube.anchor(Anchor::TopLeft).delay(3.0).with_animation("x");
        assert_eq!(cube.build().kind, ElementKind::Cube);
    }

    #[test]
    fn test_after_video_animation() {
        let mut a = AnimationBuilder::after_video(PropertyType::Scale, "intro");
        a.to(Some(2.0), Some(2.0), Some(2.0));
        let a = a.build();
        assert_eq!(a.trigger, Some(EndTrigger::Video));
        assert_eq!(a.video_asset_unique_name, Some(UniqueName::from("intro")));
    }
}
