//! Property resolution.
//!
//! An element's effective value for a channel comes from, per axis: the
//! `from` of a start animation on that channel, then the declared property,
//! then the channel's default. Resolving also back-fills the property list
//! so every channel an animation touches has a complete property.

use talkar_core::{Color, Vec3};
use talkar_ir::{Animation, ElementDeclaration, Property, PropertyType};

use crate::host::{Channel, TweenValue};

/// Stand-in for a zero scale axis; renderers cannot invert a zero scale.
pub const SCALE_EPSILON: f64 = 0.000001;

/// Where an element's color and opacity are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialTarget {
    /// The element's own node.
    Node,
    /// The nested textured child of image and video elements.
    Child,
    /// Every mesh of a loaded model.
    Model,
}

impl MaterialTarget {
    pub fn channel(&self, property_type: PropertyType) -> Channel {
        match property_type {
            PropertyType::Position => Channel::Position,
            PropertyType::Rotation => Channel::Rotation,
            PropertyType::Scale => Channel::Scale,
            PropertyType::Color => Channel::MaterialColor,
            PropertyType::Opacity if *self == MaterialTarget::Model => Channel::ModelOpacity,
            PropertyType::Opacity => Channel::MaterialOpacity,
        }
    }
}

/// Make sure `element` has a complete property of `property_type` and
/// return its value.
pub fn backfill_property(element: &mut ElementDeclaration, property_type: PropertyType) -> Vec3 {
    let default = property_type.default_value();
    match element
        .properties
        .iter_mut()
        .find(|p| p.property_type == property_type)
    {
        Some(property) => {
            let value = property.value.or(default);
            property.value = value.into();
            value
        }
        None => {
            element
                .properties
                .push(Property::new(property_type, default.x, default.y, default.z));
            default
        }
    }
}

/// The value `element` shows for `property_type` before any tween plays.
pub fn resolve_property(element: &mut ElementDeclaration, property_type: PropertyType) -> Vec3 {
    let property = backfill_property(element, property_type);
    let value = match element.start_animation(property_type) {
        Some(animation) => animation.from().or(property),
        None => property,
    };
    clamp_scale(property_type, value)
}

/// `from` and `to` of a start animation: the resolved value toward the
/// declared property.
pub fn start_values(element: &mut ElementDeclaration, animation: &Animation) -> (Vec3, Vec3) {
    let property_type = animation.property_type;
    let property = backfill_property(element, property_type);
    let from = animation.from().or(property);
    (
        clamp_scale(property_type, from),
        clamp_scale(property_type, property),
    )
}

/// `from` and `to` of an end animation: the declared property toward the
/// animation's targets.
pub fn end_values(element: &mut ElementDeclaration, animation: &Animation) -> (Vec3, Vec3) {
    let property_type = animation.property_type;
    let property = backfill_property(element, property_type);
    let to = animation.to().or(property);
    (
        clamp_scale(property_type, property),
        clamp_scale(property_type, to),
    )
}

/// Replace zero scale axes with [`SCALE_EPSILON`]; other channels pass through.
pub fn clamp_scale(property_type: PropertyType, value: Vec3) -> Vec3 {
    if property_type != PropertyType::Scale {
        return value;
    }
    value.map(|v| if v == 0.0 { SCALE_EPSILON } else { v })
}

/// Convert an authored value into what the host expects on that channel:
/// rotations in radians, colors normalized, opacity as a scalar.
pub fn to_tween_value(property_type: PropertyType, value: Vec3) -> TweenValue {
    match property_type {
        PropertyType::Position | PropertyType::Scale => TweenValue::Vector(value),
        PropertyType::Rotation => TweenValue::Vector(value.to_radians()),
        PropertyType::Color => TweenValue::Color(Color::from_rgb255(value.x, value.y, value.z)),
        PropertyType::Opacity => TweenValue::Scalar(value.x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talkar_ir::{AnimationBuilder, ElementBuilder};

    fn element() -> ElementDeclaration {
        ElementBuilder::container("e").build()
    }

    #[test]
    fn test_start_override_wins_per_axis() {
        let mut e = element();
        e.properties.push(Property::new(PropertyType::Position, 1.0, 2.0, 3.0));
        let mut a = AnimationBuilder::start(PropertyType::Position);
        a.from(None, Some(-5.0), None);
        e.start_animations.push(a.build());

        assert_eq!(
            resolve_property(&mut e, PropertyType::Position),
            Vec3::new(1.0, -5.0, 3.0)
        );
    }

    #[test]
    fn test_override_without_property_uses_defaults() {
        let mut e = element();
        let mut a = AnimationBuilder::start(PropertyType::Scale);
        a.from(Some(0.5), None, None);
        e.start_animations.push(a.build());

        assert_eq!(
            resolve_property(&mut e, PropertyType::Scale),
            Vec3::new(0.5, 1.0, 1.0)
        );
        // The synthesized property holds the default, not the override.
        assert_eq!(
            e.property(PropertyType::Scale).unwrap().resolved(),
            Vec3::splat(1.0)
        );
    }

    #[test]
    fn test_defaults_and_backfill() {
        let mut e = element();
        assert_eq!(resolve_property(&mut e, PropertyType::Position), Vec3::zero());
        assert_eq!(resolve_property(&mut e, PropertyType::Color), Vec3::splat(255.0));
        assert_eq!(resolve_property(&mut e, PropertyType::Opacity).x, 1.0);
        assert_eq!(e.properties.len(), 3);

        // Resolving again does not append a second property.
        resolve_property(&mut e, PropertyType::Position);
        assert_eq!(e.properties.len(), 3);
    }

    #[test]
    fn test_null_axes_are_filled_in_place() {
        let mut e: ElementDeclaration = serde_json::from_str(
            r#"{"uniqueName":"e","__component":"elements.container-element",
                "properties":[{"type":"rotation","x":null,"y":90,"z":null}]}"#,
        )
        .unwrap();
        resolve_property(&mut e, PropertyType::Rotation);
        assert!(e.property(PropertyType::Rotation).unwrap().value.is_complete());
        assert_eq!(e.properties.len(), 1);
    }

    #[test]
    fn test_scale_zero_axes_become_epsilon() {
        let mut e = element();
        e.properties.push(Property::new(PropertyType::Scale, 0.0, 2.0, 0.0));
        let v = resolve_property(&mut e, PropertyType::Scale);
        assert!(v.x > 0.0 && v.x < 1e-3);
        assert_eq!(v.y, 2.0);
        assert!(v.z > 0.0);
    }

    #[test]
    fn test_scale_animation_values_clamped() {
        let mut e = element();
        let mut a = AnimationBuilder::start(PropertyType::Scale);
        a.from(Some(0.0), Some(0.0), Some(0.0));
        let (from, to) = start_values(&mut e, &a.build());
        assert_eq!(from, Vec3::splat(SCALE_EPSILON));
        assert_eq!(to, Vec3::splat(1.0));

        let mut end = AnimationBuilder::after_time(PropertyType::Scale);
        end.to(Some(0.0), None, Some(3.0));
        let (from, to) = end_values(&mut e, &end.build());
        assert_eq!(from, Vec3::splat(1.0));
        assert_eq!(to, Vec3::new(SCALE_EPSILON, 1.0, 3.0));
    }

    #[test]
    fn test_end_values_fall_back_to_property() {
        let mut e = element();
        e.properties.push(Property::new(PropertyType::Opacity, 0.4, 0.0, 0.0));
        let mut end = AnimationBuilder::after_time(PropertyType::Opacity);
        end.to(Some(0.0), None, None);
        let (from, to) = end_values(&mut e, &end.build());
        assert_eq!(from.x, 0.4);
        assert_eq!(to.x, 0.0);
    }

    #[test]
    fn test_tween_values() {
        assert_eq!(
            to_tween_value(PropertyType::Color, Vec3::splat(255.0)),
            TweenValue::Color(Color::WHITE)
        );
        assert_eq!(
            to_tween_value(PropertyType::Color, Vec3::zero()),
            TweenValue::Color(Color::BLACK)
        );
        assert_eq!(
            to_tween_value(PropertyType::Opacity, Vec3::new(0.25, 1.0, 1.0)),
            TweenValue::Scalar(0.25)
        );
        match to_tween_value(PropertyType::Rotation, Vec3::new(180.0, 0.0, 0.0)) {
            TweenValue::Vector(v) => assert!((v.x - std::f64::consts::PI).abs() < 1e-9),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_material_channels() {
        assert_eq!(
            MaterialTarget::Model.channel(PropertyType::Opacity),
            Channel::ModelOpacity
        );
        assert_eq!(
            MaterialTarget::Child.channel(PropertyType::Opacity),
            Channel::MaterialOpacity
        );
        assert_eq!(
            MaterialTarget::Model.channel(PropertyType::Color),
            Channel::MaterialColor
        );
    }
}
