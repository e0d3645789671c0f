//! Software-rendered gesture overlay.
//!
//! Layout (mirrored preview, default calibration):
//!
//! ```text
//! ┌───────────────┬───────────┬───────────────┐
//! │ HAND: YES     │           │               │
//! │ MOVE: LEFT    │    ( )    │               │
//! │ ...           │   dead    │               │
//! │  right zone   │   zone    │   left zone   │
//! └───────────────┴───────────┴───────────────┘
//! ```
//!
//! Direction and zones are computed in camera space; only the drawing is
//! mirrored, so on a mirrored preview the camera's "left" zone sits on the
//! right of the screen.

use hand_signal::{Calibration, GestureState, MoveDirection};

use crate::pointer::mirror_x;

// ════════════════════════════════════════════════════════════════════════════
// Colors / layout
// ════════════════════════════════════════════════════════════════════════════

pub const BACKGROUND:  u32 = 0xFF101418;
const LEFT_ZONE:       u32 = 0xFF2F6FDF;
const DEAD_ZONE:       u32 = 0xFF7A7A7A;
const RIGHT_ZONE:      u32 = 0xFFDF8F2F;
const ZONE_ALPHA:      f32 = 0.18;
const ZONE_EDGE:       u32 = 0xFFC8C8C8;
const OPEN_COLOR:      u32 = 0xFF3CE05A;
const CLOSED_COLOR:    u32 = 0xFFE04848;
const ARROW_COLOR:     u32 = 0xFFFFD23C;
const PANEL_COLOR:     u32 = 0xFF000000;
const PANEL_ALPHA:     f32 = 0.6;
const TEXT_COLOR:      u32 = 0xFFF0F0F0;

const RING_RADIUS:     f32 = 30.0;
const RING_THICKNESS:  f32 = 4.0;
const ARROW_LENGTH:    isize = 70;
const TEXT_SCALE:      usize = 2;
const LINE_HEIGHT:     usize = 6 * TEXT_SCALE + 4;

// ════════════════════════════════════════════════════════════════════════════
// Canvas
// ════════════════════════════════════════════════════════════════════════════

/// ARGB framebuffer, row-major, in the layout `minifb` wants.
pub struct Canvas {
    width:  usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas { width, height, pixels: vec![BACKGROUND; width * height] }
    }

    pub fn width(&self)  -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn pixels(&self) -> &[u32] { &self.pixels }

    pub fn clear(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Off-canvas writes are dropped.
    pub fn put(&mut self, x: isize, y: isize, color: u32) {
        if x < 0 || y < 0 { return; }
        let (x, y) = (x as usize, y as usize);
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }

    /// Clipped rectangle `[x0, x1) × [y0, y1)`.
    fn span(&self, x0: isize, y0: isize, x1: isize, y1: isize) -> Option<(usize, usize, usize, usize)> {
        let cx0 = x0.max(0) as usize;
        let cy0 = y0.max(0) as usize;
        let cx1 = x1.clamp(0, self.width as isize) as usize;
        let cy1 = y1.clamp(0, self.height as isize) as usize;
        (cx0 < cx1 && cy0 < cy1).then_some((cx0, cy0, cx1, cy1))
    }

    pub fn fill_rect(&mut self, x0: isize, y0: isize, x1: isize, y1: isize, color: u32) {
        let Some((x0, y0, x1, y1)) = self.span(x0, y0, x1, y1) else { return };
        for row in y0..y1 {
            self.pixels[row * self.width + x0..row * self.width + x1].fill(color);
        }
    }

    /// Mix `color` over what is already there.
    pub fn blend_rect(&mut self, x0: isize, y0: isize, x1: isize, y1: isize, color: u32, alpha: f32) {
        let Some((x0, y0, x1, y1)) = self.span(x0, y0, x1, y1) else { return };
        for row in y0..y1 {
            for px in &mut self.pixels[row * self.width + x0..row * self.width + x1] {
                *px = mix(*px, color, alpha);
            }
        }
    }

    /// Circle outline: pixels whose distance from the center is within
    /// `thickness` inside `radius`.
    pub fn ring(&mut self, cx: f32, cy: f32, radius: f32, thickness: f32, color: u32) {
        let inner = (radius - thickness).max(0.0);
        let r = radius.ceil() as isize;
        let (icx, icy) = (cx.round() as isize, cy.round() as isize);
        for dy in -r..=r {
            for dx in -r..=r {
                let (x, y) = (icx + dx, icy + dy);
                let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
                if d >= inner && d <= radius {
                    self.put(x, y, color);
                }
            }
        }
    }

    /// Horizontal arrow from `(x, y)`, `length` pixels toward `dir` (±1).
    pub fn arrow(&mut self, x: isize, y: isize, length: isize, dir: isize, color: u32) {
        let tip = x + dir * length;
        let (a, b) = if dir > 0 { (x, tip) } else { (tip, x) };
        self.fill_rect(a, y - 2, b + 1, y + 3, color);
        let head = 12;
        for i in 0..head {
            let hx = tip - dir * i;
            self.fill_rect(hx, y - i, hx + 1, y + i + 1, color);
        }
    }

    /// 3×5 glyphs, scaled.  Unknown characters render as `?`.
    pub fn text(&mut self, x: isize, y: isize, scale: usize, color: u32, text: &str) {
        let s = scale as isize;
        let mut pen = x;
        for ch in text.chars() {
            let bits = glyph(ch);
            for row in 0..5isize {
                for col in 0..3isize {
                    if bits & (1 << (14 - (row * 3 + col))) != 0 {
                        let (px, py) = (pen + col * s, y + row * s);
                        self.fill_rect(px, py, px + s, py + s, color);
                    }
                }
            }
            pen += 4 * s;
            if pen >= self.width as isize { break; }
        }
    }
}

/// Per-channel linear mix; `alpha` 0 keeps `base`, 1 gives `over`.
pub fn mix(base: u32, over: u32, alpha: f32) -> u32 {
    let a = alpha.clamp(0.0, 1.0);
    let channel = |shift: u32| {
        let b = ((base >> shift) & 0xFF) as f32;
        let o = ((over >> shift) & 0xFF) as f32;
        ((b + (o - b) * a).round() as u32) << shift
    };
    0xFF00_0000 | channel(16) | channel(8) | channel(0)
}

/// Rows top to bottom, three bits each, leftmost column highest.
fn glyph(c: char) -> u16 {
    match c.to_ascii_uppercase() {
        'A' => 0b111_101_111_101_101,
        'B' => 0b110_101_110_101_110,
        'C' => 0b011_100_100_100_011,
        'D' => 0b110_101_101_101_110,
        'E' => 0b111_100_110_100_111,
        'F' => 0b111_100_110_100_100,
        'G' => 0b011_100_101_101_011,
        'H' => 0b101_101_111_101_101,
        'I' => 0b111_010_010_010_111,
        'J' => 0b001_001_001_101_010,
        'K' => 0b101_101_110_101_101,
        'L' => 0b100_100_100_100_111,
        'M' => 0b101_111_111_101_101,
        'N' => 0b110_101_101_101_101,
        'O' => 0b010_101_101_101_010,
        'P' => 0b110_101_110_100_100,
        'Q' => 0b010_101_101_110_011,
        'R' => 0b110_101_110_101_101,
        'S' => 0b011_100_010_001_110,
        'T' => 0b111_010_010_010_010,
        'U' => 0b101_101_101_101_111,
        'V' => 0b101_101_101_101_010,
        'W' => 0b101_101_111_111_101,
        'X' => 0b101_101_010_101_101,
        'Y' => 0b101_101_010_010_010,
        'Z' => 0b111_001_010_100_111,
        '0' => 0b111_101_101_101_111,
        '1' => 0b010_110_010_010_111,
        '2' => 0b110_001_010_100_111,
        '3' => 0b110_001_010_001_110,
        '4' => 0b101_101_111_001_001,
        '5' => 0b111_100_110_001_110,
        '6' => 0b011_100_111_101_111,
        '7' => 0b111_001_010_010_010,
        '8' => 0b111_101_111_101_111,
        '9' => 0b111_101_111_001_110,
        ':' => 0b000_010_000_010_000,
        '%' => 0b101_001_010_100_101,
        '.' => 0b000_000_000_000_010,
        '-' => 0b000_000_111_000_000,
        '/' => 0b001_001_010_100_100,
        ' ' => 0,
        _   => 0b110_001_010_000_010,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Overlay
// ════════════════════════════════════════════════════════════════════════════

/// Status panel text, one entry per line.
pub fn status_lines(state: &GestureState) -> Vec<String> {
    let detected = if state.is_hand_detected { "YES" } else { "NO" };
    let palm = if state.is_palm_open { "OPEN" } else { "CLOSED" };
    let mut fingers = format!("FINGERS: {}", state.fingers_extended);
    if let Some(slot) = state.power_up_slot() {
        fingers.push_str(&format!("  POWER {slot}"));
    }
    vec![
        format!("HAND: {detected}"),
        format!("MOVE: {}", state.move_direction.name().to_uppercase()),
        format!("PALM: {palm}"),
        format!("HEIGHT: {}", state.hand_height.name().to_uppercase()),
        fingers,
        format!("CONFIDENCE: {:.0}%", state.confidence * 100.0),
    ]
}

/// Draw zones, hand marker and status over whatever is on the canvas.
pub fn draw_overlay(canvas: &mut Canvas, state: &GestureState, calibration: &Calibration, mirrored: bool) {
    let w = canvas.width() as u32;
    let h = canvas.height() as isize;
    let to_screen = |nx: f32| mirror_x(nx * w as f32, w, mirrored);

    // ── zones (camera-space ranges, drawn through the mirror) ────────────
    let left  = calibration.left_edge();
    let right = calibration.right_edge();
    for (a, b, color) in [
        (0.0,   left,  LEFT_ZONE),
        (left,  right, DEAD_ZONE),
        (right, 1.0,   RIGHT_ZONE),
    ] {
        let (sa, sb) = (to_screen(a), to_screen(b));
        let (x0, x1) = (sa.min(sb).round() as isize, sa.max(sb).round() as isize);
        canvas.blend_rect(x0, 0, x1, h, color, ZONE_ALPHA);
    }
    for edge in [left, right] {
        let x = to_screen(edge).round() as isize;
        canvas.fill_rect(x, 0, x + 1, h, ZONE_EDGE);
    }

    // ── hand ─────────────────────────────────────────────────────────────
    if state.is_hand_detected {
        let cx = to_screen(state.hand_x);
        let cy = state.hand_y * canvas.height() as f32;
        let color = if state.is_palm_open { OPEN_COLOR } else { CLOSED_COLOR };
        canvas.ring(cx, cy, RING_RADIUS, RING_THICKNESS, color);

        let camera_dir = match state.move_direction {
            MoveDirection::Left   => -1,
            MoveDirection::Right  =>  1,
            MoveDirection::Center =>  0,
        };
        if camera_dir != 0 {
            let dir = if mirrored { -camera_dir } else { camera_dir };
            let start = cx.round() as isize + dir * (RING_RADIUS as isize + 6);
            canvas.arrow(start, cy.round() as isize, ARROW_LENGTH, dir, ARROW_COLOR);
        }
    }

    // ── status panel ─────────────────────────────────────────────────────
    let lines = status_lines(state);
    let panel_w = lines.iter().map(|l| l.len()).max().unwrap_or(0) * 4 * TEXT_SCALE + 16;
    let panel_h = lines.len() * LINE_HEIGHT + 12;
    canvas.blend_rect(0, 0, panel_w as isize, panel_h as isize, PANEL_COLOR, PANEL_ALPHA);
    for (i, line) in lines.iter().enumerate() {
        let y = 8 + (i * LINE_HEIGHT) as isize;
        canvas.text(8, y, TEXT_SCALE, TEXT_COLOR, line);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
