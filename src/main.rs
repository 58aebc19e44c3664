// Module declarations
mod color;
mod eyes;
mod framebuffer;
mod gfx;
mod sequence;
mod serial_link;

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use eyes::{Mood, RoboEyes};
use framebuffer::{LinuxFramebuffer, Surface};
use serial_link::SensorLink;

/// Animated robot eyes on a Linux framebuffer display.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Framebuffer device to draw on
    #[arg(long, default_value = "/dev/fb0")]
    fb_path: String,

    /// Screen width in pixels
    #[arg(long, default_value_t = 480)]
    width: i32,

    /// Screen height in pixels
    #[arg(long, default_value_t = 320)]
    height: i32,

    /// Frame rate cap
    #[arg(long, default_value_t = 7)]
    fps: u32,

    /// Serial device of the touch sensor board (omit to run without it)
    #[arg(long)]
    serial_port: Option<String>,

    /// Baud rate of the sensor link
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Sensor reading above this switches the mood to happy
    #[arg(long, default_value_t = 9)]
    happy_threshold: i32,

    /// How often to poll the sensor, in seconds
    #[arg(long, default_value_t = 3)]
    poll_secs: u64,

    /// Loop the scripted demo sequence instead of idle behaviour
    #[arg(long)]
    demo: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let fb = LinuxFramebuffer::open(&args.fb_path, args.width, args.height)
        .with_context(|| format!("opening framebuffer {}", args.fb_path))?;
    info!(
        "framebuffer {} at {}x{}",
        args.fb_path, args.width, args.height
    );

    let mut sensor = match &args.serial_port {
        Some(path) => match SensorLink::open(
            path,
            args.baud,
            Duration::from_secs(args.poll_secs),
            args.happy_threshold,
        ) {
            Ok(mut link) => {
                if let Err(e) = link.configure() {
                    warn!("sensor setup command failed: {e}");
                }
                info!("sensor link on {path} at {} baud", args.baud);
                Some(link)
            }
            Err(e) => {
                warn!("could not open sensor port {path}: {e}; running without it");
                None
            }
        },
        None => None,
    };

    let mut robo = RoboEyes::new(
        fb,
        args.width,
        args.height,
        args.fps,
        |surface: &mut LinuxFramebuffer| {
            if let Err(e) = surface.present() {
                warn!("framebuffer present failed: {e}");
            }
        },
    )?;

    // Give the eyes a second to open from their closed start
    let warmup = Instant::now();
    while warmup.elapsed() < Duration::from_secs(1) {
        robo.update();
        thread::sleep(Duration::from_millis(10));
    }

    robo.set_auto_blinker(true, Some(4), Some(2));
    robo.set_idle_mode(true, Some(5), Some(2));
    robo.set_curious(true);

    if args.demo {
        let seq = robo.sequences.add("demo");
        seq.step(2000, |r| r.open(None, None));
        seq.step(4000, |r| r.set_mood(Mood::Happy));
        seq.step(4010, |r| r.laugh());
        seq.step(6000, |r| r.set_mood(Mood::Tired));
        seq.step(8000, |r| r.set_mood(Mood::Default));
        seq.step(9000, |r| r.close(None, None));
        // Second act: macro animations and live geometry changes
        seq.step(10000, |r| r.open(None, None));
        seq.step(11500, |r| r.confuse());
        seq.step(13000, |r| {
            let _ = r.wink(None, Some(true));
        });
        seq.step(14500, |r| {
            r.eyes_width(Some(160), Some(140));
            r.eyes_height(Some(160), Some(140));
            r.eyes_radius(Some(18), Some(18));
            r.eyes_spacing(50);
        });
        seq.step(16500, |r| r.set_cyclops(true));
        seq.step(18500, |r| {
            r.set_cyclops(false);
            r.eyes_width(Some(170), Some(170));
            r.eyes_height(Some(180), Some(180));
            r.eyes_radius(Some(23), Some(23));
            r.eyes_spacing(10);
            // Wink turned these off
            r.set_auto_blinker(true, None, None);
            r.set_idle_mode(true, None, None);
        });
        seq.step(19500, |r| r.close(None, None));
        seq.step(20500, |_r| info!("demo sequence finished"));

        robo.set_position(eyes::Direction::Center);
        robo.close(None, None);
        let now = robo.now_ms();
        robo.sequences[0].start(now);
    }

    info!("starting animation loop at {} fps", args.fps);

    // Refresh slightly below the engine's frame rate; the engine drops any
    // excess updates itself
    let tick = Duration::from_millis(u64::from(1000 / args.fps) * 2 / 3);
    loop {
        if let Some(link) = sensor.as_mut() {
            if let Some(mood) = link.poll() {
                if mood != robo.mood() {
                    info!("sensor mood change: {mood:?}");
                    robo.set_mood(mood);
                }
            }
        }

        robo.update();

        if args.demo && robo.sequences.done() {
            let now = robo.now_ms();
            robo.sequences[0].reset();
            robo.sequences[0].start(now);
        }

        thread::sleep(tick);
    }
}
