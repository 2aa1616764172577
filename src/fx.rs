//! Particles and floating text, in stage pixel coordinates.

use crate::appearance::Rgb;
use crate::emotion::Burst;
use rand::seq::SliceRandom;
use rand::Rng;
use std::f32::consts::TAU;

pub mod palette {
    use crate::appearance::Rgb;

    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const RED: Rgb = Rgb::new(232, 69, 69);
    pub const GREEN: Rgb = Rgb::new(67, 217, 124);
    pub const BLUE: Rgb = Rgb::new(64, 156, 255);
    pub const YELLOW: Rgb = Rgb::new(255, 214, 10);
    pub const PURPLE: Rgb = Rgb::new(180, 90, 225);
    pub const CYAN: Rgb = Rgb::new(50, 220, 220);
}

use palette::*;

const FLOAT_RISE: f32 = 12.0;

#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: f32,
    pub color: Rgb,
}

impl Particle {
    fn update(&mut self, dt: f32) {
        self.x += self.vx * dt;
        self.y += self.vy * dt;
        self.life -= dt;
    }
}

#[derive(Clone, Debug)]
pub struct FloatText {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Default)]
pub struct Effects {
    particles: Vec<Particle>,
    floats: Vec<FloatText>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn floats(&self) -> &[FloatText] {
        &self.floats
    }

    pub fn say(&mut self, text: impl Into<String>, x: f32, y: f32) {
        self.floats.push(FloatText {
            text: text.into(),
            x,
            y,
        });
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.floats.clear();
    }

    pub fn update(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.update(dt);
        }
        self.particles.retain(|p| p.life > 0.0);
        for f in &mut self.floats {
            f.y -= FLOAT_RISE * dt;
        }
        self.floats.retain(|f| f.y > -10.0);
    }

    pub fn spawn<R: Rng + ?Sized>(&mut self, burst: Burst, cx: f32, cy: f32, rng: &mut R) {
        match burst {
            Burst::Crumbs => {
                for _ in 0..20 {
                    let ang = rng.gen::<f32>() * TAU;
                    let spd = 20.0 + rng.gen::<f32>() * 30.0;
                    self.particles.push(Particle {
                        x: cx,
                        y: cy,
                        vx: ang.cos() * spd,
                        vy: ang.sin() * spd,
                        life: 0.4 + rng.gen::<f32>() * 0.3,
                        color: GREEN,
                    });
                }
            }
            Burst::Confetti => {
                let cols = [RED, GREEN, BLUE, YELLOW, PURPLE, CYAN];
                for _ in 0..30 {
                    self.particles.push(Particle {
                        x: cx + (rng.gen::<f32>() - 0.5) * 10.0,
                        y: cy,
                        vx: (rng.gen::<f32>() - 0.5) * 50.0,
                        vy: -20.0 - rng.gen::<f32>() * 30.0,
                        life: 0.8,
                        color: *cols.choose(rng).unwrap_or(&WHITE),
                    });
                }
            }
            Burst::Stars => {
                for _ in 0..8 {
                    self.particles.push(Particle {
                        x: cx + 16.0,
                        y: cy - 10.0,
                        vx: (rng.gen::<f32>() - 0.5) * 10.0,
                        vy: -5.0 - rng.gen::<f32>() * 10.0,
                        life: 1.0,
                        color: YELLOW,
                    });
                }
            }
            Burst::Bubbles => {
                for _ in 0..16 {
                    self.particles.push(Particle {
                        x: cx + (rng.gen::<f32>() - 0.5) * 8.0,
                        y: cy + 8.0,
                        vx: (rng.gen::<f32>() - 0.5) * 10.0,
                        vy: -10.0 - rng.gen::<f32>() * 10.0,
                        life: 0.9,
                        color: BLUE,
                    });
                }
            }
        }
    }
}
