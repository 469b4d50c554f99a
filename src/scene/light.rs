//! Light variants and their GPU encoding.

use crate::codec::{LightRecord, LIGHT_RECORD_SIZE};
use crate::util::{Mat3, Mat4, Vec3};

/// How a light shows up to primary rays.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    Invisible = 0,
    #[default]
    Sphere = 1,
}

/// Light type tag written into [`LightRecord::light_type`].
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    Sun = 0,
    Point = 1,
}

/// Parameters shared by every light variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightParams {
    pub radiance: Vec3,
    pub ambient_multiplier: f32,
    pub visibility: Visibility,
}

impl LightParams {
    fn with_visibility(visibility: Visibility) -> Self {
        Self {
            radiance: Vec3::ONE,
            ambient_multiplier: 1.0,
            visibility,
        }
    }
}

impl Default for LightParams {
    fn default() -> Self {
        Self::with_visibility(Visibility::default())
    }
}

/// Directional light. Shines along the node's local -Y axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunLight {
    pub params: LightParams,
}

impl SunLight {
    pub fn new(radiance: Vec3, ambient_multiplier: f32) -> Self {
        Self {
            params: LightParams {
                radiance,
                ambient_multiplier,
                visibility: Visibility::Invisible,
            },
        }
    }
}

impl Default for SunLight {
    fn default() -> Self {
        Self {
            params: LightParams::with_visibility(Visibility::Invisible),
        }
    }
}

/// Omnidirectional light at the node's origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointLight {
    pub params: LightParams,
}

impl PointLight {
    pub fn new(radiance: Vec3, ambient_multiplier: f32) -> Self {
        Self {
            params: LightParams {
                radiance,
                ambient_multiplier,
                visibility: Visibility::Sphere,
            },
        }
    }
}

/// Closed set of light variants carried by light nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Sun(SunLight),
    Point(PointLight),
}

impl Light {
    pub fn light_type(&self) -> LightType {
        match self {
            Light::Sun(_) => LightType::Sun,
            Light::Point(_) => LightType::Point,
        }
    }

    pub fn params(&self) -> &LightParams {
        match self {
            Light::Sun(sun) => &sun.params,
            Light::Point(point) => &point.params,
        }
    }

    pub fn params_mut(&mut self) -> &mut LightParams {
        match self {
            Light::Sun(sun) => &mut sun.params,
            Light::Point(point) => &mut point.params,
        }
    }

    /// Record for a light whose node has world matrix `world`.
    ///
    /// Position is the translation column. Sun lights also get
    /// `normalize(mat3(world) * -Y)`; point lights leave direction zero.
    pub fn record(&self, world: &Mat4) -> LightRecord {
        let direction = match self {
            Light::Sun(_) => (Mat3::from_mat4(*world) * Vec3::NEG_Y).normalize(),
            Light::Point(_) => Vec3::ZERO,
        };
        let params = self.params();
        LightRecord {
            position: world.w_axis.truncate().to_array(),
            light_type: self.light_type() as i32,
            direction: direction.to_array(),
            visibility: params.visibility as i32,
            radiance: params.radiance.to_array(),
            ambient_multiplier: params.ambient_multiplier,
        }
    }

    pub fn encode(&self, world: &Mat4) -> [u8; LIGHT_RECORD_SIZE] {
        self.record(world).to_bytes()
    }
}

impl From<SunLight> for Light {
    fn from(sun: SunLight) -> Self {
        Light::Sun(sun)
    }
}

impl From<PointLight> for Light {
    fn from(point: PointLight) -> Self {
        Light::Point(point)
    }
}
