use crate::appearance::{EyeStyle, Rgb};
use crate::chat::{ChatMessage, Role};
use crate::emotion::{Expression, Face};
use crate::fx::{palette, Effects};
use crate::pet::{Action, Life, PetState};
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::cmp::{max, min};
use std::io::{self, Write};

/// Logical stage the pet and effects are laid out on, in pixels.
pub const STAGE_W: i32 = 128;
pub const STAGE_H: i32 = 96;

const SICK_TINT: Rgb = Rgb::new(200, 80, 80);
const SHADOW: Rgb = Rgb::new(40, 40, 40);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub struct CellBuffer {
    pub w: u16,
    pub h: u16,
    pub cells: Vec<Cell>,
}

impl CellBuffer {
    pub fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub fn get(&self, x: u16, y: u16) -> Option<Cell> {
        (x < self.w && y < self.h).then(|| self.cells[self.idx(x, y)])
    }
    pub fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell {
            ch: ' ',
            fg: Color::White,
            bg,
        });
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgb> for Pixel {
    fn from(c: Rgb) -> Self {
        Pixel {
            r: c.r,
            g: c.g,
            b: c.b,
            a: 255,
        }
    }
}

pub struct PixelCanvas {
    pub w: u32,
    pub h: u32,
    pub px: Vec<Pixel>,
}

impl PixelCanvas {
    pub fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
        }
    }
    pub fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub fn clear(&mut self) {
        self.px.fill(Pixel::default());
    }
    fn write(&mut self, x: i32, y: i32, p: Pixel) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        self.px[i] = p;
    }
}

pub struct Terminal {
    pub out: io::Stdout,
    pub cols: u16,
    pub rows: u16,
    pub prev: CellBuffer,
    pub cur: CellBuffer,
    pub canvas: PixelCanvas,
}

impl Terminal {
    pub fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;

        // Braille: 2×4 pixels per cell
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            canvas: PixelCanvas::new(cols as u32 * 2, rows as u32 * 4),
        })
    }

    pub fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as u32 * 2, r as u32 * 4);
        // Force a full repaint.
        queue!(self.out, Clear(ClearType::All))?;
        self.prev.cells.fill(Cell {
            ch: '\0',
            ..Cell::default()
        });
        Ok(true)
    }

    pub fn bell(&mut self) -> anyhow::Result<()> {
        queue!(self.out, Print('\x07'))?;
        Ok(())
    }

    pub fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Braille encoding: 2×4 pixels -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    // Dot mapping:
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

pub fn canvas_to_cells(canvas: &PixelCanvas, out: &mut CellBuffer, bg: Color) {
    let cols = out.w as u32;
    let rows = out.h as u32;

    for cy in 0..rows {
        for cx in 0..cols {
            let mut mask: u8 = 0;
            let (mut sum_r, mut sum_g, mut sum_b) = (0u32, 0u32, 0u32);
            let mut ink: u32 = 0;

            for dy in 0..4 {
                for dx in 0..2 {
                    let (x, y) = (cx * 2 + dx, cy * 4 + dy);
                    if x >= canvas.w || y >= canvas.h {
                        continue;
                    }
                    let p = canvas.px[canvas.idx(x, y)];
                    if p.a >= 32 {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.r as u32;
                        sum_g += p.g as u32;
                        sum_b += p.b as u32;
                        ink += 1;
                    }
                }
            }
            if ink == 0 {
                continue;
            }

            let ch = char::from_u32(0x2800 + (mask as u32)).unwrap_or(' ');
            let fg = Color::Rgb {
                r: (sum_r / ink) as u8,
                g: (sum_g / ink) as u8,
                b: (sum_b / ink) as u8,
            };
            out.set(cx as u16, cy as u16, Cell { ch, fg, bg });
        }
    }
}

/* -----------------------------
   Stage: logical pixels scaled into the braille canvas
------------------------------ */

#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stage {
    ox: i32,
    oy: i32,
    scale: i32,
}

impl Stage {
    /// Largest integer scale that fits, centered in `vp` (subpixel units).
    pub fn fit(vp: Viewport) -> Self {
        let scale = max(1, min(vp.w / STAGE_W, vp.h / STAGE_H));
        Self {
            ox: vp.x + (vp.w - STAGE_W * scale) / 2,
            oy: vp.y + (vp.h - STAGE_H * scale) / 2,
            scale,
        }
    }

    /// Stage position to the terminal cell containing it.
    pub fn to_cell(&self, x: f32, y: f32) -> (i32, i32) {
        let sx = self.ox + (x * self.scale as f32) as i32;
        let sy = self.oy + (y * self.scale as f32) as i32;
        (sx.div_euclid(2), sy.div_euclid(4))
    }
}

struct Painter<'a> {
    canvas: &'a mut PixelCanvas,
    stage: Stage,
}

impl Painter<'_> {
    fn fill(&mut self, x: i32, y: i32, p: Pixel) {
        let s = self.stage.scale;
        for dy in 0..s {
            for dx in 0..s {
                self.canvas
                    .write(self.stage.ox + x * s + dx, self.stage.oy + y * s + dy, p);
            }
        }
    }

    fn put(&mut self, x: i32, y: i32, c: Rgb) {
        self.fill(x, y, c.into());
    }

    /// Dark features are holes in the braille pattern.
    fn cut(&mut self, x: i32, y: i32) {
        self.fill(x, y, Pixel::default());
    }

    fn cut_hline(&mut self, x0: i32, x1: i32, y: i32) {
        for x in x0..=x1 {
            self.cut(x, y);
        }
    }
}

/// Everything needed to draw one frame of the pet.
pub struct Scene<'a> {
    pub state: &'a PetState,
    pub expression: &'a Expression,
    pub effects: &'a Effects,
}

pub fn draw_pet(canvas: &mut PixelCanvas, stage: Stage, scene: &Scene<'_>) {
    let st = scene.state;
    let app = st.appearance();
    let expr = scene.expression;
    let face = expr.current();
    let asleep = st.is_asleep();
    let mut p = Painter { canvas, stage };

    let base = app.base_color.lerp(SICK_TINT, (1.0 - st.mood()) as f32);
    let (w, h) = (app.width.max(4), app.height.max(4));
    let ry = (expr.reaction() * 2.0) as i32;
    let x0 = STAGE_W / 2 - w / 2;
    let y0 = STAGE_H / 2 - h / 2 - ry;
    let (cx, cy) = (x0 + w / 2, y0 + h / 2);

    let ex = (w * w) as f32 * app.roundness * app.squash_x;
    let ey = (h * h) as f32 * 0.3 * app.squash_y;
    for yy in 0..h {
        for xx in 0..w {
            let (rx, ryy) = ((xx - w / 2) as f32, (yy - h / 2) as f32);
            if rx * rx / ex + ryy * ryy / ey <= 1.0 {
                p.put(x0 + xx, y0 + yy, base);
            }
        }
    }

    if let Some(belly) = app.belly_color {
        for yy in -h / 3..h / 3 {
            for xx in -w / 4..w / 4 {
                let (fx, fy) = (xx as f32, yy as f32);
                if fx * fx / ((w * w) as f32 * 0.06) + fy * fy / ((h * h) as f32 * 0.10) <= 1.0 {
                    p.put(cx + xx, cy + yy, belly);
                }
            }
        }
    }

    for spot in &app.spots {
        let r = spot.radius;
        for yy in -r..=r {
            for xx in -r..=r {
                if xx * xx + yy * yy <= r * r {
                    p.put(cx + spot.dx + xx, cy + spot.dy + yy, spot.color);
                }
            }
        }
    }

    let eye_y = cy - 4;
    let (eye_x1, eye_x2) = (cx - 6, cx + 3);
    let blink = (expr.clock() * 2.0) as i32 % 6 == 0;

    if asleep {
        p.cut_hline(eye_x1 - 1, eye_x1 + 1, eye_y);
        p.cut_hline(eye_x2 - 1, eye_x2 + 1, eye_y);
    } else if !blink {
        draw_eyes(&mut p, face, app.eyes, eye_x1, eye_x2, eye_y);
    }
    if face == Some(Face::Angry) && !asleep {
        for (a, b) in [(eye_x1 - 2, eye_y - 2), (eye_x1 - 1, eye_y - 2), (eye_x1, eye_y - 1)] {
            p.cut(a, b);
        }
        for (a, b) in [(eye_x2 + 2, eye_y - 2), (eye_x2 + 1, eye_y - 2), (eye_x2, eye_y - 1)] {
            p.cut(a, b);
        }
    }

    draw_mouth(&mut p, face, cx - 3, cy + 2);
    draw_face_icon(&mut p, face, cx, y0, eye_x2, eye_y);

    if !asleep {
        for x in (STAGE_W / 2 - w / 2 + 4)..(STAGE_W / 2 + w / 2 - 4) {
            for y in [STAGE_H / 2 + h / 2 + 4, STAGE_H / 2 + h / 2 + 5] {
                p.put(x, y, SHADOW);
            }
        }
    }

    for part in scene.effects.particles() {
        p.put(part.x as i32, part.y as i32, part.color);
    }
}

fn draw_eyes(p: &mut Painter<'_>, face: Option<Face>, own: EyeStyle, x1: i32, x2: i32, y: i32) {
    enum Eyes {
        Dot,
        Oval,
        Wide,
        Flat,
    }
    let style = match face {
        Some(Face::Love | Face::Excited | Face::Surprised) => Eyes::Wide,
        Some(Face::Tired | Face::Sleepy | Face::Angry) => Eyes::Flat,
        Some(Face::Sad) => Eyes::Oval,
        _ => match own {
            EyeStyle::Dot => Eyes::Dot,
            EyeStyle::Oval => Eyes::Oval,
            EyeStyle::Wide => Eyes::Wide,
        },
    };
    for ex in [x1, x2] {
        match style {
            Eyes::Dot => {
                p.cut(ex, y);
                p.cut(ex, y + 1);
            }
            Eyes::Oval => (0..3).for_each(|dy| p.cut(ex, y + dy)),
            Eyes::Wide => (0..3).for_each(|dx| p.cut(ex + dx, y)),
            Eyes::Flat => p.cut_hline(ex - 1, ex + 1, y),
        }
    }
}

fn draw_mouth(p: &mut Painter<'_>, face: Option<Face>, mx: i32, my: i32) {
    const LEN: i32 = 6;
    match face {
        Some(Face::Love | Face::Excited) => {
            for i in 0..LEN {
                let lift = if i == 0 || i == LEN - 1 { 0 } else { 1 };
                p.cut(mx + i, my + lift);
                if i % 2 == 0 {
                    p.cut(mx + i, my + 1);
                }
            }
        }
        Some(Face::Tired | Face::Sleepy) => p.cut_hline(mx, mx + LEN - 1, my),
        Some(Face::Yuck) => {
            for i in 0..LEN {
                p.cut(mx + i, if i % 2 == 0 { my - 1 } else { my + 1 });
            }
        }
        Some(Face::Surprised) => {
            for (dx, dy) in [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)] {
                p.cut(mx + 2 + dx, my + dy);
            }
        }
        Some(Face::Angry) => {
            p.cut_hline(mx, mx + LEN - 1, my - 1);
            p.cut(mx, my - 2);
            p.cut(mx + LEN - 1, my - 2);
        }
        Some(Face::Sad) => {
            for i in 0..LEN {
                let drop = if i == 0 || i == LEN - 1 { 1 } else { 0 };
                p.cut(mx + i, my - drop);
            }
        }
        None => {}
    }
}

fn draw_face_icon(p: &mut Painter<'_>, face: Option<Face>, cx: i32, top: i32, eye_x2: i32, eye_y: i32) {
    const HEART: [(i32, i32); 10] = [
        (1, 0),
        (3, 0),
        (0, 1),
        (2, 1),
        (4, 1),
        (0, 2),
        (4, 2),
        (1, 3),
        (3, 3),
        (2, 2),
    ];
    match face {
        Some(Face::Love) => {
            for (ox, oy) in [(cx + 10, top - 6), (cx + 6, top - 10)] {
                for (dx, dy) in HEART {
                    p.put(ox + dx, oy + dy, palette::RED);
                }
            }
        }
        Some(Face::Excited) => {
            for d in -1..=1 {
                p.put(cx + 10 + d, top - 6, palette::YELLOW);
                p.put(cx + 10, top - 6 + d, palette::YELLOW);
            }
        }
        Some(Face::Tired) => {
            p.put(cx + 9, eye_y - 6, palette::BLUE);
            p.put(cx + 9, eye_y - 5, palette::CYAN);
            p.put(cx + 9, eye_y - 4, palette::CYAN);
        }
        Some(Face::Sad) => {
            for dy in 0..3 {
                p.put(eye_x2 + 1, eye_y + 2 + dy, palette::CYAN);
            }
        }
        _ => {}
    }
}

/* -----------------------------
   Text overlay
------------------------------ */

pub fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

fn draw_text_at(buf: &mut CellBuffer, x: i32, y: i32, s: &str, fg: Color) {
    if y < 0 || y >= buf.h as i32 {
        return;
    }
    for (i, ch) in s.chars().enumerate() {
        let xx = x + i as i32;
        if xx >= 0 && xx < buf.w as i32 {
            buf.set(xx as u16, y as u16, Cell { ch, fg, bg: Color::Black });
        }
    }
}

pub fn bar(value01: f64, width: usize) -> String {
    let v = value01.clamp(0.0, 1.0);
    let fill = (v * width as f64 + 0.5) as usize;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { ' ' });
    }
    s.push(']');
    s
}

pub fn status_label(life: Life) -> &'static str {
    match life {
        Life::Awake => "Awake",
        Life::Asleep => "Asleep",
        Life::Dead => "Dead",
    }
}

pub struct Hud<'a> {
    pub selected: usize,
    pub muted: bool,
    pub chat_status: &'a str,
}

pub fn ui_overlay(buf: &mut CellBuffer, st: &PetState, hud: &Hud<'_>) {
    let bg = Color::Black;
    let fg = Color::White;

    let status = status_label(st.life());
    let title = format!(
        "Pixelgotchi  |  {}  |  Mood {}%",
        status,
        (st.mood() * 100.0) as i32
    );
    draw_text(buf, 1, 0, &title, fg, bg);

    let meters = [
        ("Food  ", 1.0 - st.hunger(), Color::Green),
        ("Energy", st.energy(), Color::Yellow),
        ("Fun   ", st.fun(), Color::Cyan),
        ("Clean ", st.hygiene(), Color::Blue),
    ];
    for (i, (name, val, col)) in meters.iter().enumerate() {
        let y = 2 + i as u16;
        draw_text(buf, 1, y, name, fg, bg);
        draw_text(buf, 8, y, &bar(*val, 14), *col, bg);
        draw_text(buf, 25, y, &format!("{:>3}%", (val * 100.0).round() as i32), fg, bg);
    }

    if st.is_alive() {
        let mut x = 1u16;
        for (i, action) in Action::ALL.iter().enumerate() {
            let label = format!("[{}] {}", action.hotkey(), action.name());
            let col = if i == hud.selected { Color::Yellow } else { fg };
            let marker = if i == hud.selected { ">" } else { " " };
            draw_text(buf, x, 7, marker, col, bg);
            draw_text(buf, x + 1, 7, &label, col, bg);
            x += label.chars().count() as u16 + 2;
        }
        if let Some(action) = Action::ALL.get(hud.selected) {
            draw_text(buf, 1, 8, action.describe(), Color::DarkGrey, bg);
        }
    }

    draw_text(buf, 1, 10, &format!("Chat: {}", hud.chat_status), fg, bg);
    if hud.muted {
        draw_text(buf, 1, 11, "Muted", Color::DarkGrey, bg);
    }

    let help = if st.is_alive() {
        "Keys: ←→ select | enter do | f/p/s/c | t chat | h help | m mute | q quit"
    } else {
        "Dead: r respawn | q quit"
    };
    draw_text(buf, 1, buf.h.saturating_sub(1), help, fg, bg);
}

/// Floating lines and the sleep marker, placed via the stage transform.
pub fn draw_stage_text(buf: &mut CellBuffer, stage: Stage, st: &PetState, effects: &Effects) {
    for f in effects.floats() {
        let (x, y) = stage.to_cell(f.x, f.y);
        draw_text_at(buf, x, y, &f.text, Color::White);
    }
    if st.is_alive() && st.is_asleep() {
        let (x, y) = stage.to_cell(STAGE_W as f32 / 2.0 + 6.0, STAGE_H as f32 / 2.0 - 16.0);
        draw_text_at(buf, x, y, "Z z z", Color::White);
    }
}

/* -----------------------------
   Boxes: help, death, chat
------------------------------ */

fn frame_box(buf: &mut CellBuffer, bw: u16, bh: u16) -> (u16, u16, u16, u16) {
    let bw = min(bw, buf.w.saturating_sub(2));
    let bh = min(bh, buf.h.saturating_sub(2));
    let x0 = (buf.w - bw) / 2;
    let y0 = (buf.h - bh) / 2;
    let cell = |ch| Cell {
        ch,
        fg: Color::White,
        bg: Color::Black,
    };

    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            buf.set(x, y, cell(' '));
        }
    }
    if bw < 2 || bh < 2 {
        return (x0, y0, bw, bh);
    }
    for x in x0..x0 + bw {
        buf.set(x, y0, cell('─'));
        buf.set(x, y0 + bh - 1, cell('─'));
    }
    for y in y0..y0 + bh {
        buf.set(x0, y, cell('│'));
        buf.set(x0 + bw - 1, y, cell('│'));
    }
    buf.set(x0, y0, cell('┌'));
    buf.set(x0 + bw - 1, y0, cell('┐'));
    buf.set(x0, y0 + bh - 1, cell('└'));
    buf.set(x0 + bw - 1, y0 + bh - 1, cell('┘'));
    (x0, y0, bw, bh)
}

pub fn draw_center_box(buf: &mut CellBuffer, title: &str, body: &str) {
    let (x0, y0, _bw, bh) = frame_box(buf, 48, 12);
    draw_text(buf, x0 + 2, y0 + 1, title, Color::White, Color::Black);
    let mut yy = y0 + 3;
    for line in body.lines() {
        if yy >= y0 + bh.saturating_sub(1) {
            break;
        }
        draw_text(buf, x0 + 2, yy, line, Color::White, Color::Black);
        yy += 1;
    }
}

pub fn draw_help(buf: &mut CellBuffer) {
    draw_center_box(
        buf,
        "Help",
        "Arrows: choose action\n\
         Enter/Space: do action\n\
         F/P/S/C: feed, play, sleep, clean\n\
         T: chat\n\
         H: toggle help\n\
         M: mute\n\
         Esc/Q: quit",
    );
}

pub fn draw_death_screen(buf: &mut CellBuffer, reason: &str) {
    draw_center_box(
        buf,
        "Your Pixelgotchi",
        &format!("has died ({reason}).\n\nPress R to respawn, or Q to quit."),
    );
}

/// Greedy word wrap by character count.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let needed = if cur.is_empty() {
            word.chars().count()
        } else {
            cur.chars().count() + 1 + word.chars().count()
        };
        if needed <= width {
            if !cur.is_empty() {
                cur.push(' ');
            }
            cur.push_str(word);
            continue;
        }
        if !cur.is_empty() {
            lines.push(std::mem::take(&mut cur));
        }
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > width {
            lines.push(chars.drain(..width).collect());
        }
        cur = chars.into_iter().collect();
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

pub fn draw_chat_dialog<'a>(
    buf: &mut CellBuffer,
    messages: impl Iterator<Item = &'a ChatMessage>,
    input: &str,
    cursor_on: bool,
) {
    let bw = (buf.w as f32 * 0.85) as u16;
    let bh = (buf.h as f32 * 0.75) as u16;
    let (x0, y0, bw, bh) = frame_box(buf, bw, bh);
    if bw < 8 || bh < 6 {
        return;
    }
    draw_text(buf, x0 + 2, y0, " Chat ", Color::White, Color::Black);

    let inner_w = (bw - 4) as usize;
    let mut lines = Vec::new();
    for m in messages {
        let tag = match m.role {
            Role::User => "You:",
            Role::Assistant => "Pet:",
            Role::System => continue,
        };
        lines.extend(wrap_text(&format!("{tag} {}", m.content), inner_w));
    }
    let max_lines = (bh - 4) as usize;
    let shown = &lines[lines.len().saturating_sub(max_lines)..];
    for (i, line) in shown.iter().enumerate() {
        draw_text(buf, x0 + 2, y0 + 1 + i as u16, line, Color::White, Color::Black);
    }

    let mut visible: Vec<char> = input.chars().collect();
    let room = inner_w.saturating_sub(3);
    if visible.len() > room {
        visible.drain(..visible.len() - room);
    }
    let prompt = format!(
        "> {}{}",
        visible.into_iter().collect::<String>(),
        if cursor_on { "_" } else { "" }
    );
    draw_text(buf, x0 + 2, y0 + bh - 2, &prompt, Color::Yellow, Color::Black);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(bar(0.0, 4), "[    ]");
        assert_eq!(bar(0.5, 4), "[██  ]");
        assert_eq!(bar(2.0, 4), "[████]");
    }

    #[test]
    fn full_braille_cell() {
        let mut canvas = PixelCanvas::new(2, 4);
        for y in 0..4 {
            for x in 0..2 {
                canvas.write(x, y, Rgb::new(10, 20, 30).into());
            }
        }
        let mut buf = CellBuffer::new(1, 1);
        canvas_to_cells(&canvas, &mut buf, Color::Black);
        let c = buf.get(0, 0).expect("cell");
        assert_eq!(c.ch, '\u{28FF}');
        assert_eq!(c.fg, Color::Rgb { r: 10, g: 20, b: 30 });
    }

    #[test]
    fn empty_canvas_leaves_cells_alone() {
        let canvas = PixelCanvas::new(2, 4);
        let mut buf = CellBuffer::new(1, 1);
        buf.set(0, 0, Cell { ch: 'x', ..Cell::default() });
        canvas_to_cells(&canvas, &mut buf, Color::Black);
        assert_eq!(buf.get(0, 0).map(|c| c.ch), Some('x'));
    }

    #[test]
    fn stage_fits_and_centers() {
        let st = Stage::fit(Viewport {
            x: 10,
            y: 0,
            w: 300,
            h: 200,
        });
        assert_eq!(st.scale, 2);
        assert_eq!(st.ox, 10 + (300 - 256) / 2);
        assert_eq!(st.oy, (200 - 192) / 2);

        let tiny = Stage::fit(Viewport {
            x: 0,
            y: 0,
            w: 50,
            h: 40,
        });
        assert_eq!(tiny.scale, 1);
        // Offsets go negative when the stage overflows; cells round down.
        assert_eq!(tiny.to_cell(0.0, 0.0), (-20, -7));
    }

    #[test]
    fn status_follows_life() {
        use crate::appearance::Appearance;
        use crate::pet::Needs;

        let mut st = PetState::new(0.0, Appearance::default());
        assert_eq!(status_label(st.life()), "Awake");
        st.toggle_sleep();
        assert_eq!(status_label(st.life()), "Asleep");
        let dead = PetState::from_parts(
            Needs::default(),
            true,
            Some("Starved".into()),
            0.0,
            Appearance::default(),
        );
        assert_eq!(status_label(dead.life()), "Dead");
    }

    #[test]
    fn wrap_breaks_on_words_and_long_tokens() {
        assert_eq!(wrap_text("hello there pet", 11), vec!["hello there", "pet"]);
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert!(wrap_text("   ", 5).is_empty());
    }
}
