// Eyes animation engine
// Owns all eye geometry, mood state and macro animation timers, and runs the
// per-frame recompute-and-render pass against a drawing Surface. The host
// calls update() at its own cadence; actual redraws are rate limited to the
// configured frame interval.

use std::time::Instant;

use log::debug;
use rand::rngs::ThreadRng;
use rand::Rng as _;
use thiserror::Error;

use crate::color::{Bgra, BGCOLOR, FGCOLOR};
use crate::framebuffer::Surface;
use crate::gfx;
use crate::sequence::Sequences;

// Curious gaze: extra eye height near a screen edge, and how close to the
// edge the target position has to be to get it
const CURIOUS_HEIGHT_BOOST: i32 = 8;
const CURIOUS_EDGE_MARGIN: i32 = 10;

const LAUGH_FLICKER_AMPLITUDE: i32 = 5;
const CONFUSED_FLICKER_AMPLITUDE: i32 = 20;
const ONESHOT_DURATION_MS: u64 = 500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EyesError {
    #[error("frame rate must be at least 1 fps")]
    InvalidFrameRate,
    #[error("wink needs a target eye, left or right")]
    WinkWithoutTarget,
}

/// Monotonic millisecond timestamp source, immune to wall-clock adjustments.
pub trait Clock {
    fn ticks_ms(&self) -> u64;
}

/// Production clock anchored at engine construction.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn ticks_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Uniform integer randomness for blink/idle scheduling.
pub trait RandomSource {
    /// Pick uniformly from `low..=high`; `high <= low` yields `low`.
    fn pick(&mut self, low: i32, high: i32) -> i32;
}

pub struct ThreadRandom {
    rng: ThreadRng,
}

impl ThreadRandom {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl RandomSource for ThreadRandom {
    fn pick(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            low
        } else {
            self.rng.gen_range(low..=high)
        }
    }
}

/// Mood expression. Setting one derives the tired/angry/happy eyelid flags
/// and the flicker/curious side states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mood {
    #[default]
    Default,
    Tired,
    Angry,
    Happy,
    Frozen,
    Scary,
    Curious,
}

/// Predefined gaze positions, eight compass points plus center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
    #[default]
    Center,
}

// ============================================================================
// STATE RECORDS
// ============================================================================

// One eye's geometry channels. `current` chases `next` by integer averaging
// once per frame; `default` is the at-rest value restored on reopen.
#[derive(Debug, Clone)]
struct Eye {
    width_default: i32,
    width_current: i32,
    width_next: i32,
    height_default: i32,
    height_current: i32,
    height_next: i32,
    radius_default: i32,
    radius_current: i32,
    radius_next: i32,
    x: i32,
    y: i32,
    x_next: i32,
    y_next: i32,
    // Transient curious-gaze boost, recomputed every frame
    height_offset: i32,
    // Reopen automatically once fully closed
    open: bool,
}

impl Eye {
    fn new(width: i32, height: i32, radius: i32, x: i32, y: i32) -> Self {
        Self {
            width_default: width,
            width_current: width,
            width_next: width,
            height_default: height,
            height_current: 1, // start closed
            height_next: height,
            radius_default: radius,
            radius_current: radius,
            radius_next: radius,
            x,
            y,
            x_next: x,
            y_next: y,
            height_offset: 0,
            open: false,
        }
    }
}

// Periodic macro animation: fires when its deadline passes, then rearms with
// a randomized interval.
#[derive(Debug, Clone)]
struct PeriodicTimer {
    active: bool,
    interval_s: u32,
    variation_s: u32,
    deadline_ms: u64,
}

impl PeriodicTimer {
    fn new(interval_s: u32, variation_s: u32) -> Self {
        Self {
            active: false,
            interval_s,
            variation_s,
            deadline_ms: 0,
        }
    }
}

// One-shot macro animation: armed -> firing for duration_ms -> rearmed.
#[derive(Debug, Clone)]
struct OneShot {
    active: bool,
    armed: bool,
    started_ms: u64,
    duration_ms: u64,
}

impl OneShot {
    fn new(duration_ms: u64) -> Self {
        Self {
            active: false,
            armed: true,
            started_ms: 0,
            duration_ms,
        }
    }
}

#[derive(Debug, Clone)]
struct Flicker {
    enabled: bool,
    amplitude: i32,
    alternate: bool,
}

impl Flicker {
    fn new(amplitude: i32) -> Self {
        Self {
            enabled: false,
            amplitude,
            alternate: false,
        }
    }
}

// Smoothed eyelid overlay channels, targets derived from the mood flags
#[derive(Debug, Clone, Default)]
struct Eyelids {
    tired_height: i32,
    tired_height_next: i32,
    angry_height: i32,
    angry_height_next: i32,
    happy_bottom_offset: i32,
    happy_bottom_offset_next: i32,
}

// ============================================================================
// EYES ENGINE
// ============================================================================

pub struct RoboEyes<S: Surface> {
    surface: S,
    on_show: Box<dyn FnMut(&mut S)>,
    clock: Box<dyn Clock>,
    rng: Box<dyn RandomSource>,

    screen_width: i32,
    screen_height: i32,
    pub bgcolor: Bgra,
    pub fgcolor: Bgra,

    /// Scripted animation sequences, advanced from update().
    pub sequences: Sequences<S>,

    frame_interval_ms: u64,
    fps_timer_ms: u64,

    mood: Mood,
    tired: bool,
    angry: bool,
    happy: bool,
    curious: bool,
    cyclops: bool,
    position: Direction,

    eye_l: Eye,
    eye_r: Eye,
    space_between_default: i32,
    space_between_current: i32,
    space_between_next: i32,
    eyelids: Eyelids,

    blinker: PeriodicTimer,
    idle: PeriodicTimer,
    confused_anim: OneShot,
    laugh_anim: OneShot,
    h_flicker: Flicker,
    v_flicker: Flicker,
}

impl<S: Surface> RoboEyes<S> {
    /// Build an engine rendering to `surface`. `on_show` runs at the end of
    /// every redraw so the host can present the frame; one blank frame is
    /// rendered immediately.
    pub fn new(
        surface: S,
        width: i32,
        height: i32,
        frame_rate: u32,
        on_show: impl FnMut(&mut S) + 'static,
    ) -> Result<Self, EyesError> {
        Self::with_parts(
            surface,
            width,
            height,
            frame_rate,
            Box::new(on_show),
            Box::new(MonotonicClock::new()),
            Box::new(ThreadRandom::new()),
        )
    }

    /// Like new(), with an explicit clock and random source.
    pub fn with_parts(
        surface: S,
        width: i32,
        height: i32,
        frame_rate: u32,
        on_show: Box<dyn FnMut(&mut S)>,
        clock: Box<dyn Clock>,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, EyesError> {
        let eye_width = 170;
        let eye_height = 180;
        let radius = 23;
        let spacing = 10;

        // Center the default pair on the screen
        let lx = (width - (eye_width + spacing + eye_width)) / 2;
        let ly = (height - eye_height) / 2;
        let rx = lx + eye_width + spacing;

        let mut eyes = Self {
            surface,
            on_show,
            clock,
            rng,
            screen_width: width,
            screen_height: height,
            bgcolor: BGCOLOR,
            fgcolor: FGCOLOR,
            sequences: Sequences::default(),
            frame_interval_ms: 0,
            fps_timer_ms: 0,
            mood: Mood::Default,
            tired: false,
            angry: false,
            happy: false,
            curious: false,
            cyclops: false,
            position: Direction::Center,
            eye_l: Eye::new(eye_width, eye_height, radius, lx, ly),
            eye_r: Eye::new(eye_width, eye_height, radius, rx, ly),
            space_between_default: spacing,
            space_between_current: spacing,
            space_between_next: spacing,
            eyelids: Eyelids::default(),
            blinker: PeriodicTimer::new(1, 4),
            idle: PeriodicTimer::new(1, 3),
            confused_anim: OneShot::new(ONESHOT_DURATION_MS),
            laugh_anim: OneShot::new(ONESHOT_DURATION_MS),
            h_flicker: Flicker::new(2),
            v_flicker: Flicker::new(10),
        };
        eyes.set_framerate(frame_rate)?;

        // Show a blank screen while the eyes are still closed
        eyes.clear();
        (eyes.on_show)(&mut eyes.surface);
        Ok(eyes)
    }

    // --- GENERAL METHODS ---------------------------------

    /// Advance sequences, then redraw if the frame interval has elapsed.
    /// Safe to call at any cadence; calls faster than the frame interval are
    /// cheap no-ops and slower calls simply drop frames.
    pub fn update(&mut self) {
        let now = self.clock.ticks_ms();

        // Swapped out so steps can borrow the engine mutably
        let mut sequences = std::mem::take(&mut self.sequences);
        sequences.update(now, self);
        self.sequences = sequences;

        if now.saturating_sub(self.fps_timer_ms) >= self.frame_interval_ms {
            self.draw_eyes();
            self.fps_timer_ms = self.clock.ticks_ms();
        }
    }

    /// Current engine time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.clock.ticks_ms()
    }

    fn clear(&mut self) {
        self.surface.fill(self.bgcolor);
    }

    // --- SETTER METHODS ----------------------------------

    /// Recompute the frame interval; zero fps would redraw every tick and is
    /// rejected as a caller error.
    pub fn set_framerate(&mut self, fps: u32) -> Result<(), EyesError> {
        if fps == 0 {
            return Err(EyesError::InvalidFrameRate);
        }
        self.frame_interval_ms = 1000 / u64::from(fps);
        Ok(())
    }

    pub fn eyes_width(&mut self, left: Option<i32>, right: Option<i32>) {
        if let Some(w) = left {
            self.eye_l.width_next = w;
            self.eye_l.width_default = w;
        }
        if let Some(w) = right {
            self.eye_r.width_next = w;
            self.eye_r.width_default = w;
        }
    }

    pub fn eyes_height(&mut self, left: Option<i32>, right: Option<i32>) {
        if let Some(h) = left {
            self.eye_l.height_next = h;
            self.eye_l.height_default = h;
        }
        if let Some(h) = right {
            self.eye_r.height_next = h;
            self.eye_r.height_default = h;
        }
    }

    pub fn eyes_radius(&mut self, left: Option<i32>, right: Option<i32>) {
        if let Some(r) = left {
            self.eye_l.radius_next = r;
            self.eye_l.radius_default = r;
        }
        if let Some(r) = right {
            self.eye_r.radius_next = r;
            self.eye_r.radius_default = r;
        }
    }

    /// Space between the eyes, can also be negative.
    pub fn eyes_spacing(&mut self, space: i32) {
        self.space_between_next = space;
        self.space_between_default = space;
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn set_mood(&mut self, mood: Mood) {
        let was_flickering = matches!(self.mood, Mood::Frozen | Mood::Scary);
        let now_flickering = matches!(mood, Mood::Frozen | Mood::Scary);
        if was_flickering && !now_flickering {
            self.horiz_flicker(false, None);
            self.vert_flicker(false, None);
        }
        if self.curious && mood != Mood::Curious {
            self.curious = false;
        }

        match mood {
            Mood::Tired => {
                self.tired = true;
                self.angry = false;
                self.happy = false;
            }
            Mood::Angry => {
                self.tired = false;
                self.angry = true;
                self.happy = false;
            }
            Mood::Happy => {
                self.tired = false;
                self.angry = false;
                self.happy = true;
            }
            Mood::Frozen => {
                self.tired = false;
                self.angry = false;
                self.happy = false;
                self.horiz_flicker(true, Some(2));
                self.vert_flicker(false, None);
            }
            Mood::Scary => {
                self.tired = true;
                self.angry = false;
                self.happy = false;
                self.horiz_flicker(false, None);
                self.vert_flicker(true, Some(2));
            }
            Mood::Curious => {
                self.tired = false;
                self.angry = false;
                self.happy = false;
                self.curious = true;
            }
            Mood::Default => {
                self.tired = false;
                self.angry = false;
                self.happy = false;
            }
        }
        self.mood = mood;
        debug!("mood set to {mood:?}");
    }

    pub fn position(&self) -> Direction {
        self.position
    }

    /// Aim the eyes at one of the predefined positions within the travel box.
    pub fn set_position(&mut self, direction: Direction) {
        let cx = self.screen_constraint_x();
        let cy = self.screen_constraint_y();
        let (x, y) = match direction {
            Direction::N => (cx / 2, 0),
            Direction::Ne => (cx, 0),
            Direction::E => (cx, cy / 2),
            Direction::Se => (cx, cy),
            Direction::S => (cx / 2, cy),
            Direction::Sw => (0, cy),
            Direction::W => (0, cy / 2),
            Direction::Nw => (0, 0),
            Direction::Center => (cx / 2, cy / 2),
        };
        self.eye_l.x_next = x;
        self.eye_l.y_next = y;
        self.position = direction;
    }

    /// Automated blinking; omitted interval/variation keep prior values.
    pub fn set_auto_blinker(&mut self, active: bool, interval_s: Option<u32>, variation_s: Option<u32>) {
        self.blinker.active = active;
        if let Some(i) = interval_s {
            self.blinker.interval_s = i;
        }
        if let Some(v) = variation_s {
            self.blinker.variation_s = v;
        }
    }

    /// Automated eye repositioning; omitted interval/variation keep prior values.
    pub fn set_idle_mode(&mut self, active: bool, interval_s: Option<u32>, variation_s: Option<u32>) {
        self.idle.active = active;
        if let Some(i) = interval_s {
            self.idle.interval_s = i;
        }
        if let Some(v) = variation_s {
            self.idle.variation_s = v;
        }
    }

    pub fn curious(&self) -> bool {
        self.curious
    }

    /// Curious mode: the outer eye gets taller when looking far left or right.
    pub fn set_curious(&mut self, enable: bool) {
        self.curious = enable;
    }

    pub fn cyclops(&self) -> bool {
        self.cyclops
    }

    /// Cyclops mode: render only the left eye. Render-time override only,
    /// the right eye's stored geometry keeps animating underneath.
    pub fn set_cyclops(&mut self, enabled: bool) {
        self.cyclops = enabled;
    }

    pub fn horiz_flicker(&mut self, enable: bool, amplitude: Option<i32>) {
        self.h_flicker.enabled = enable;
        if let Some(a) = amplitude {
            self.h_flicker.amplitude = a;
        }
    }

    pub fn vert_flicker(&mut self, enable: bool, amplitude: Option<i32>) {
        self.v_flicker.enabled = enable;
        if let Some(a) = amplitude {
            self.v_flicker.amplitude = a;
        }
    }

    // --- GETTER METHODS ----------------------------------

    /// Max x position for the left eye.
    pub fn screen_constraint_x(&self) -> i32 {
        self.screen_width
            - self.eye_l.width_current
            - self.space_between_current
            - self.eye_r.width_current
    }

    /// Max y position for the left eye. Uses the default height because the
    /// current height varies while blinking and in curious mode.
    pub fn screen_constraint_y(&self) -> i32 {
        self.screen_height - self.eye_l.height_default
    }

    // --- BASIC ANIMATION METHODS -------------------------

    /// Close eyes. A side argument that is present (any value) selects that
    /// side only; with both absent, both eyes close.
    pub fn close(&mut self, left: Option<bool>, right: Option<bool>) {
        if left.is_none() && right.is_none() {
            self.eye_l.height_next = 1;
            self.eye_l.open = false;
            self.eye_r.height_next = 1;
            self.eye_r.open = false;
        } else {
            if left.is_some() {
                self.eye_l.height_next = 1;
                self.eye_l.open = false;
            }
            if right.is_some() {
                self.eye_r.height_next = 1;
                self.eye_r.open = false;
            }
        }
    }

    /// Open eyes, same per-side presence semantics as close(). The redraw
    /// pass restores the default height once a flagged eye has fully closed.
    pub fn open(&mut self, left: Option<bool>, right: Option<bool>) {
        if left.is_none() && right.is_none() {
            self.eye_l.open = true;
            self.eye_r.open = true;
        } else {
            if left.is_some() {
                self.eye_l.open = true;
            }
            if right.is_some() {
                self.eye_r.open = true;
            }
        }
    }

    /// Trigger an eyeblink: close, then reopen automatically.
    pub fn blink(&mut self, left: Option<bool>, right: Option<bool>) {
        self.close(left, right);
        self.open(left, right);
    }

    // --- MACRO ANIMATION METHODS -------------------------

    /// One-shot confused animation, eyes shaking left and right.
    /// Re-triggering during an active cycle is a no-op.
    pub fn confuse(&mut self) {
        self.confused_anim.active = true;
    }

    /// One-shot laugh animation, eyes shaking up and down.
    /// Re-triggering during an active cycle is a no-op.
    pub fn laugh(&mut self) {
        self.laugh_anim.active = true;
    }

    /// Wink one eye. Disables auto-blink and idle mode so the wink is not
    /// overridden; rejects a call naming neither side.
    pub fn wink(&mut self, left: Option<bool>, right: Option<bool>) -> Result<(), EyesError> {
        if left.is_none() && right.is_none() {
            return Err(EyesError::WinkWithoutTarget);
        }
        self.blinker.active = false;
        self.idle.active = false;
        self.blink(left, right);
        Ok(())
    }

    // --- PRE-CALCULATIONS AND ACTUAL DRAWINGS ------------

    fn draw_eyes(&mut self) {
        // --[ PRE-CALCULATIONS: TWEEN EVERY GEOMETRY CHANNEL ]--

        // Curious gaze: boost the outer eye's height when its target nears a
        // screen edge
        if self.curious {
            self.eye_l.height_offset = if self.eye_l.x_next <= CURIOUS_EDGE_MARGIN {
                CURIOUS_HEIGHT_BOOST
            } else if self.cyclops
                && self.eye_l.x_next >= self.screen_constraint_x() - CURIOUS_EDGE_MARGIN
            {
                CURIOUS_HEIGHT_BOOST
            } else {
                0
            };
            self.eye_r.height_offset = if self.eye_r.x_next
                >= self.screen_width - self.eye_r.width_current - CURIOUS_EDGE_MARGIN
            {
                CURIOUS_HEIGHT_BOOST
            } else {
                0
            };
        } else {
            self.eye_l.height_offset = 0;
            self.eye_r.height_offset = 0;
        }

        // Heights, with vertical recentering as the eye closes or opens
        let l_off = self.eye_l.height_offset;
        self.eye_l.height_current =
            (self.eye_l.height_current + self.eye_l.height_next + l_off) / 2;
        self.eye_l.y += (self.eye_l.height_default - self.eye_l.height_current) / 2;
        self.eye_l.y -= l_off / 2;

        let r_off = self.eye_r.height_offset;
        self.eye_r.height_current =
            (self.eye_r.height_current + self.eye_r.height_next + r_off) / 2;
        self.eye_r.y += (self.eye_r.height_default - self.eye_r.height_current) / 2;
        self.eye_r.y -= r_off / 2;

        // Pop eyes open again after they have fully closed
        if self.eye_l.open && self.eye_l.height_current <= 1 + l_off {
            self.eye_l.height_next = self.eye_l.height_default;
        }
        if self.eye_r.open && self.eye_r.height_current <= 1 + r_off {
            self.eye_r.height_next = self.eye_r.height_default;
        }

        // Widths and spacing
        self.eye_l.width_current = (self.eye_l.width_current + self.eye_l.width_next) / 2;
        self.eye_r.width_current = (self.eye_r.width_current + self.eye_r.width_next) / 2;
        self.space_between_current =
            (self.space_between_current + self.space_between_next) / 2;

        // Left eye position; the right eye tracks the left plus spacing
        self.eye_l.x = (self.eye_l.x + self.eye_l.x_next) / 2;
        self.eye_l.y = (self.eye_l.y + self.eye_l.y_next) / 2;
        self.eye_r.x_next =
            self.eye_l.x_next + self.eye_l.width_current + self.space_between_current;
        self.eye_r.y_next = self.eye_l.y_next;
        self.eye_r.x = (self.eye_r.x + self.eye_r.x_next) / 2;
        self.eye_r.y = (self.eye_r.y + self.eye_r.y_next) / 2;

        // Border radii
        self.eye_l.radius_current = (self.eye_l.radius_current + self.eye_l.radius_next) / 2;
        self.eye_r.radius_current = (self.eye_r.radius_current + self.eye_r.radius_next) / 2;

        // --[ MACRO ANIMATIONS ]--

        let now = self.clock.ticks_ms();

        if self.blinker.active && now >= self.blinker.deadline_ms {
            self.blink(None, None);
            let jitter = self.rng.pick(0, self.blinker.variation_s as i32) as u64;
            self.blinker.deadline_ms =
                now + u64::from(self.blinker.interval_s) * 1000 + jitter * 1000;
        }

        // Laughing: vertical shaking for a fixed duration
        if self.laugh_anim.active {
            if self.laugh_anim.armed {
                self.vert_flicker(true, Some(LAUGH_FLICKER_AMPLITUDE));
                self.laugh_anim.started_ms = now;
                self.laugh_anim.armed = false;
            } else if now - self.laugh_anim.started_ms >= self.laugh_anim.duration_ms {
                self.vert_flicker(false, Some(0));
                self.laugh_anim.armed = true;
                self.laugh_anim.active = false;
            }
        }

        // Confused: horizontal shaking for a fixed duration
        if self.confused_anim.active {
            if self.confused_anim.armed {
                self.horiz_flicker(true, Some(CONFUSED_FLICKER_AMPLITUDE));
                self.confused_anim.started_ms = now;
                self.confused_anim.armed = false;
            } else if now - self.confused_anim.started_ms >= self.confused_anim.duration_ms {
                self.horiz_flicker(false, Some(0));
                self.confused_anim.armed = true;
                self.confused_anim.active = false;
            }
        }

        // Idle: wander to a random position within the travel box
        if self.idle.active && now >= self.idle.deadline_ms {
            let cx = self.screen_constraint_x().max(0);
            let cy = self.screen_constraint_y().max(0);
            self.eye_l.x_next = self.rng.pick(0, cx);
            self.eye_l.y_next = self.rng.pick(0, cy);
            let jitter = self.rng.pick(0, self.idle.variation_s as i32) as u64;
            self.idle.deadline_ms =
                now + u64::from(self.idle.interval_s) * 1000 + jitter * 1000;
        }

        // Flicker offsets alternate sign every frame and apply to this
        // frame's draw only, never to the smoothed positions
        let mut flicker_dx = 0;
        let mut flicker_dy = 0;
        if self.h_flicker.enabled {
            flicker_dx = if self.h_flicker.alternate {
                self.h_flicker.amplitude
            } else {
                -self.h_flicker.amplitude
            };
            self.h_flicker.alternate = !self.h_flicker.alternate;
        }
        if self.v_flicker.enabled {
            flicker_dy = if self.v_flicker.alternate {
                self.v_flicker.amplitude
            } else {
                -self.v_flicker.amplitude
            };
            self.v_flicker.alternate = !self.v_flicker.alternate;
        }

        // --[ ACTUAL DRAWINGS ]--

        let lx = self.eye_l.x + flicker_dx;
        let ly = self.eye_l.y + flicker_dy;
        let lw = self.eye_l.width_current;
        let lh = self.eye_l.height_current;
        let rx = self.eye_r.x + flicker_dx;
        let ry = self.eye_r.y + flicker_dy;
        let rw = self.eye_r.width_current;
        let rh = self.eye_r.height_current;

        self.clear();

        gfx::fill_rounded_rect(
            &mut self.surface,
            lx,
            ly,
            lw,
            lh,
            self.eye_l.radius_current,
            self.fgcolor,
        );
        if !self.cyclops {
            gfx::fill_rounded_rect(
                &mut self.surface,
                rx,
                ry,
                rw,
                rh,
                self.eye_r.radius_current,
                self.fgcolor,
            );
        }

        // Mood transitions: eyelid targets derived from the current height
        if self.tired {
            self.eyelids.tired_height_next = self.eye_l.height_current / 2;
            self.eyelids.angry_height_next = 0;
        } else {
            self.eyelids.tired_height_next = 0;
        }
        if self.angry {
            self.eyelids.angry_height_next = self.eye_l.height_current / 2;
            self.eyelids.tired_height_next = 0;
        } else {
            self.eyelids.angry_height_next = 0;
        }
        if self.happy {
            self.eyelids.happy_bottom_offset_next = self.eye_l.height_current / 2;
        } else {
            self.eyelids.happy_bottom_offset_next = 0;
        }

        // Tired top eyelids: wedges drooping from the inner corners
        self.eyelids.tired_height =
            (self.eyelids.tired_height + self.eyelids.tired_height_next) / 2;
        let th = self.eyelids.tired_height;
        if !self.cyclops {
            gfx::fill_triangle(&mut self.surface, lx, ly - 1, lx + lw, ly - 1, lx, ly + th - 1, self.bgcolor);
            gfx::fill_triangle(&mut self.surface, rx, ry - 1, rx + rw, ry - 1, rx + rw, ry + th - 1, self.bgcolor);
        } else {
            // Two half wedges over the single eye, one combined eyebrow look
            gfx::fill_triangle(&mut self.surface, lx, ly - 1, lx + lw / 2, ly - 1, lx, ly + th - 1, self.bgcolor);
            gfx::fill_triangle(&mut self.surface, lx + lw / 2, ly - 1, lx + lw, ly - 1, lx + lw, ly + th - 1, self.bgcolor);
        }

        // Angry top eyelids: mirrored wedges from the outer corners
        self.eyelids.angry_height =
            (self.eyelids.angry_height + self.eyelids.angry_height_next) / 2;
        let ah = self.eyelids.angry_height;
        if !self.cyclops {
            gfx::fill_triangle(&mut self.surface, lx, ly - 1, lx + lw, ly - 1, lx + lw, ly + ah - 1, self.bgcolor);
            gfx::fill_triangle(&mut self.surface, rx, ry - 1, rx + rw, ry - 1, rx, ry + ah - 1, self.bgcolor);
        } else {
            gfx::fill_triangle(&mut self.surface, lx, ly - 1, lx + lw / 2, ly - 1, lx + lw / 2, ly + ah - 1, self.bgcolor);
            gfx::fill_triangle(&mut self.surface, lx + lw / 2, ly - 1, lx + lw, ly - 1, lx + lw / 2, ly + ah - 1, self.bgcolor);
        }

        // Happy bottom eyelids: background rounded rects rising from below
        self.eyelids.happy_bottom_offset =
            (self.eyelids.happy_bottom_offset + self.eyelids.happy_bottom_offset_next) / 2;
        let hb = self.eyelids.happy_bottom_offset;
        gfx::fill_rounded_rect(
            &mut self.surface,
            lx - 1,
            ly + lh - hb + 1,
            lw + 2,
            self.eye_l.height_default,
            self.eye_l.radius_current,
            self.bgcolor,
        );
        if !self.cyclops {
            gfx::fill_rounded_rect(
                &mut self.surface,
                rx - 1,
                ry + rh - hb + 1,
                rw + 2,
                self.eye_r.height_default,
                self.eye_r.radius_current,
                self.bgcolor,
            );
        }

        (self.on_show)(&mut self.surface);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::framebuffer::MemorySurface;

    #[derive(Clone)]
    pub(crate) struct FakeClock(pub(crate) Rc<Cell<u64>>);

    impl Clock for FakeClock {
        fn ticks_ms(&self) -> u64 {
            self.0.get()
        }
    }

    pub(crate) struct FixedRandom(pub(crate) i32);

    impl RandomSource for FixedRandom {
        fn pick(&mut self, low: i32, high: i32) -> i32 {
            self.0.clamp(low, high)
        }
    }

    pub(crate) fn test_engine(fps: u32) -> (RoboEyes<MemorySurface>, Rc<Cell<u64>>) {
        let ticks = Rc::new(Cell::new(0));
        let eyes = RoboEyes::with_parts(
            MemorySurface::new(480, 320),
            480,
            320,
            fps,
            Box::new(|_s: &mut MemorySurface| {}),
            Box::new(FakeClock(ticks.clone())),
            Box::new(FixedRandom(0)),
        )
        .unwrap();
        (eyes, ticks)
    }

    /// Advance the fake clock one frame interval at a time, forcing one
    /// redraw per update() call.
    pub(crate) fn run_frames(
        eyes: &mut RoboEyes<MemorySurface>,
        ticks: &Rc<Cell<u64>>,
        frames: u32,
    ) {
        for _ in 0..frames {
            ticks.set(ticks.get() + eyes.frame_interval_ms.max(1));
            eyes.update();
        }
    }
}
