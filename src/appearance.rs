use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Stored as `[r, g, b]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear blend towards `other`; `t` is clamped to [0,1].
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 { (a as f32 + (b as f32 - a as f32) * t) as u8 };
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EyeStyle {
    Dot,
    Oval,
    Wide,
}

/// Stored as `[dx, dy, radius, color]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "(i32, i32, i32, Rgb)", into = "(i32, i32, i32, Rgb)")]
pub struct Spot {
    pub dx: i32,
    pub dy: i32,
    pub radius: i32,
    pub color: Rgb,
}

impl From<(i32, i32, i32, Rgb)> for Spot {
    fn from((dx, dy, radius, color): (i32, i32, i32, Rgb)) -> Self {
        Self {
            dx,
            dy,
            radius,
            color,
        }
    }
}

impl From<Spot> for (i32, i32, i32, Rgb) {
    fn from(s: Spot) -> Self {
        (s.dx, s.dy, s.radius, s.color)
    }
}

/// Visual descriptor of a creature. Generated once, never changed afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    #[serde(rename = "w")]
    pub width: i32,
    #[serde(rename = "h")]
    pub height: i32,
    pub squash_x: f32,
    pub squash_y: f32,
    pub roundness: f32,
    pub base_color: Rgb,
    pub belly_color: Option<Rgb>,
    pub spots: Vec<Spot>,
    pub eyes: EyeStyle,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            width: 24,
            height: 16,
            squash_x: 1.0,
            squash_y: 1.0,
            roundness: 0.22,
            base_color: Rgb::new(120, 200, 140),
            belly_color: Some(Rgb::new(200, 230, 210)),
            spots: Vec::new(),
            eyes: EyeStyle::Dot,
        }
    }
}

fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
    Rgb::new(
        rng.gen_range(60..=220),
        rng.gen_range(60..=220),
        rng.gen_range(60..=220),
    )
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

pub fn random_appearance<R: Rng + ?Sized>(rng: &mut R) -> Appearance {
    let width = rng.gen_range(20..=30);
    let height = rng.gen_range(14..=22);
    let squash_x = round2(rng.gen_range(0.8..=1.3));
    let squash_y = round2(rng.gen_range(0.8..=1.3));
    let roundness = round2(rng.gen_range(0.16..=0.30));
    let base_color = random_color(rng);
    let belly_color = if rng.gen_bool(0.6) {
        Some(random_color(rng))
    } else {
        None
    };

    let spot_count = rng.gen_range(0..=3);
    let spots = (0..spot_count)
        .map(|_| Spot {
            dx: rng.gen_range(-width / 3..=width / 3),
            dy: rng.gen_range(-height / 3..=height / 3),
            radius: rng.gen_range(2..=4),
            color: random_color(rng),
        })
        .collect();

    let eyes = *[EyeStyle::Dot, EyeStyle::Oval, EyeStyle::Wide]
        .choose(rng)
        .unwrap_or(&EyeStyle::Dot);

    Appearance {
        width,
        height,
        squash_x,
        squash_y,
        roundness,
        base_color,
        belly_color,
        spots,
        eyes,
    }
}
