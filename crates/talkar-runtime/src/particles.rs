//! Particle emitter configuration.

use serde::{Deserialize, Serialize};
use talkar_core::{Color, Duration, Vec3};
use talkar_ir::{ParticleElement, ParticleProperty, ParticlePropertyType};

pub const DEFAULT_MAX_AGE: f64 = 6.0;
pub const DEFAULT_PARTICLE_COUNT: u32 = 1000;

/// Everything a renderer needs to build an emitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleConfig {
    pub enabled: bool,
    /// Emitter shape code: box 1, sphere 2, disc 3.
    pub shape: u8,
    /// Blending code: none 0, normal 1, additive 2, subtractive 3, multiply 4.
    pub blending: u8,
    pub color: Color,
    /// Seconds; `None` emits forever.
    pub duration: Option<f64>,
    pub max_age: f64,
    pub opacity: f64,
    pub particle_count: u32,
    pub rotation_axis: Option<String>,
    pub size: f64,
    pub texture: String,
    pub position_spread: Vec3,
    pub velocity_value: Vec3,
    pub velocity_spread: Vec3,
    pub acceleration_value: Vec3,
    pub acceleration_spread: Vec3,
}

/// Resolve emitter settings with their defaults. Emitter sub-properties
/// missing from the element are appended to it, and missing axes filled.
pub fn resolve_particles(particle: &mut ParticleElement, texture_url: &str) -> ParticleConfig {
    let color = match particle.color.as_deref().map(str::trim) {
        None | Some("") => Color::GREY,
        Some(hex) => Color::from_hex(hex).unwrap_or_else(|_| {
            tracing::warn!("Particle color '{}' is not a hex color, using grey", hex);
            Color::GREY
        }),
    };

    let mut spread = |t: ParticlePropertyType| backfill_particle_property(particle, t);
    let position_spread = spread(ParticlePropertyType::PositionSpread);
    let velocity_value = spread(ParticlePropertyType::VelocityValue);
    let velocity_spread = spread(ParticlePropertyType::VelocitySpread);
    let acceleration_value = spread(ParticlePropertyType::AccelerationValue);
    let acceleration_spread = spread(ParticlePropertyType::AccelerationSpread);

    ParticleConfig {
        enabled: false,
        shape: particle.shape.unwrap_or_default().code(),
        blending: particle.blending_mode.unwrap_or_default().code(),
        color,
        duration: particle.duration,
        max_age: particle.max_age.unwrap_or(DEFAULT_MAX_AGE),
        opacity: particle.opacity.unwrap_or(1.0),
        particle_count: particle.particle_count.unwrap_or(DEFAULT_PARTICLE_COUNT),
        rotation_axis: particle.rotation_axis.clone(),
        size: particle.size.unwrap_or(1.0),
        texture: texture_url.to_string(),
        position_spread,
        velocity_value,
        velocity_spread,
        acceleration_value,
        acceleration_spread,
    }
}

/// Seconds after the experience starts before the emitter is switched on.
pub fn emission_delay(particle: &ParticleElement) -> Duration {
    Duration::from_seconds(particle.delay.unwrap_or(0.0))
}

fn backfill_particle_property(particle: &mut ParticleElement, t: ParticlePropertyType) -> Vec3 {
    let default = t.default_value().unwrap_or_default();
    match particle
        .particle_properties
        .iter_mut()
        .find(|p| p.property_type == t)
    {
        Some(p) => {
            let value = p.value.or(default);
            p.value = value.into();
            value
        }
        None => {
            particle.particle_properties.push(ParticleProperty {
                property_type: t,
                value: default.into(),
            });
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talkar_ir::{BlendingMode, ParticleShape, PartialVec3};

    #[test]
    fn test_defaults() {
        let mut p = ParticleElement::new("spark");
        let config = resolve_particles(&mut p, "https://cdn/spark.png");
        assert!(!config.enabled);
        assert_eq!(config.shape, 1);
        assert_eq!(config.blending, 1);
        assert_eq!(config.color, Color::GREY);
        assert_eq!(config.max_age, 6.0);
        assert_eq!(config.opacity, 1.0);
        assert_eq!(config.particle_count, 1000);
        assert_eq!(config.size, 1.0);
        assert_eq!(config.velocity_value, Vec3::new(0.0, 25.0, 0.0));
        assert_eq!(config.acceleration_spread, Vec3::new(10.0, 0.0, 10.0));
        assert_eq!(config.texture, "https://cdn/spark.png");
        assert_eq!(p.particle_properties.len(), 5);
        assert!(emission_delay(&p).is_zero());
    }

    #[test]
    fn test_explicit_values_and_partial_sub_properties() {
        let mut p = ParticleElement::new("spark");
        p.shape = Some(ParticleShape::Disc);
        p.blending_mode = Some(BlendingMode::Additive);
        p.color = Some("#ff0000".into());
        p.particle_count = Some(50);
        p.delay = Some(2.0);
        p.particle_properties.push(ParticleProperty {
            property_type: ParticlePropertyType::VelocityValue,
            value: PartialVec3 {
                x: None,
                y: Some(5.0),
                z: None,
            },
        });
        let config = resolve_particles(&mut p, "t");
        assert_eq!(config.shape, 3);
        assert_eq!(config.blending, 2);
        assert_eq!(config.color.to_rgba8(), [255, 0, 0, 255]);
        assert_eq!(config.particle_count, 50);
        assert_eq!(config.velocity_value, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(emission_delay(&p).as_seconds(), 2.0);
        assert_eq!(p.particle_properties.len(), 5);
    }

    #[test]
    fn test_bad_color_falls_back_to_grey() {
        let mut p = ParticleElement::new("spark");
        p.color = Some("sparkly".into());
        assert_eq!(resolve_particles(&mut p, "t").color, Color::GREY);
    }
}
