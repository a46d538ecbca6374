//! Diagnostic visualizer: runs the simulator under the storm cycle and
//! writes PNG debug images to data/debug/.
//!
//! Usage: `visualize [seed] [steps]`

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rill_core::coords::neighbor_differences;
use rill_core::{ErosionParams, RainSchedule, Simulator, Snapshot};

const SIZE: usize = 256;

// ── Colour helpers ────────────────────────────────────────────────────────────

fn channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Shaded land: `c = 0.3 + 0.4·b + curvature`, reddened where bedrock rose.
fn land_color(snap: &Snapshot, x: usize, y: usize) -> [f64; 3] {
    let i = y * snap.width + x;
    let curvature: f64 = neighbor_differences(&snap.bedrock, x, y, snap.width, snap.height).iter().sum();
    let c = 0.3 + 0.4 * snap.bedrock[i] + curvature;
    [c + snap.bedrock_delta[i], c, 0.1]
}

/// Water tint `(0.1·|v|, 0.2 + 50·s, 1)` with alpha `clamp(100·d, 0, 0.5)`.
fn water_color(snap: &Snapshot, speed: &[f64], i: usize) -> ([f64; 3], f64) {
    let rgb = [0.1 * speed[i], 0.2 + 50.0 * snap.sediment[i], 1.0];
    (rgb, (100.0 * snap.water_depth[i]).clamp(0.0, 0.5))
}

/// Erosion in red, deposition in blue, scaled by the largest change.
fn delta_color(delta: f64, max_abs: f64) -> [u8; 3] {
    let t = (delta.abs() / max_abs).clamp(0.0, 1.0);
    let fade = channel(1.0 - t);
    if delta < 0.0 {
        [255, fade, fade]
    } else {
        [fade, fade, 255]
    }
}

fn save(img: &image::RgbImage, dir: &Path, name: &str) -> Result<()> {
    let path = dir.join(name);
    img.save(&path).with_context(|| format!("failed to save {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let seed: u64 = args.next().map(|s| s.parse()).transpose().context("seed must be an integer")?.unwrap_or(42);
    let steps: u32 = args.next().map(|s| s.parse()).transpose().context("steps must be an integer")?.unwrap_or(2000);

    let params = ErosionParams { width: SIZE, height: SIZE, ..ErosionParams::default() };
    let mut sim = Simulator::new(params, seed)?;

    println!("Running {steps} ticks ({SIZE}×{SIZE}, seed {seed})…");
    let report = sim.tick_scheduled(steps, &RainSchedule::storms());
    log::info!("final budget: {report:?}");

    let out_dir = Path::new("data/debug");
    fs::create_dir_all(out_dir).context("cannot create data/debug/")?;

    let snap = sim.snapshot();
    let speed = snap.speed();
    let (w, h) = (snap.width as u32, snap.height as u32);

    // ── 1. land.png ──────────────────────────────────────────────────────────
    let land = image::RgbImage::from_fn(w, h, |x, y| {
        image::Rgb(land_color(&snap, x as usize, y as usize).map(channel))
    });
    save(&land, out_dir, "land.png")?;

    // ── 2. terrain.png (water composited over land) ──────────────────────────
    let terrain = image::RgbImage::from_fn(w, h, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let ground = land_color(&snap, x, y);
        let (water, a) = water_color(&snap, &speed, y * snap.width + x);
        image::Rgb([0usize, 1, 2].map(|k| channel(a * water[k] + (1.0 - a) * ground[k].clamp(0.0, 1.0))))
    });
    save(&terrain, out_dir, "terrain.png")?;

    // ── 3. bedrock_delta.png ─────────────────────────────────────────────────
    let max_abs = snap.bedrock_delta.iter().fold(0.0f64, |m, d| m.max(d.abs())).max(1e-12);
    let delta = image::RgbImage::from_fn(w, h, |x, y| {
        image::Rgb(delta_color(snap.bedrock_delta[y as usize * snap.width + x as usize], max_abs))
    });
    save(&delta, out_dir, "bedrock_delta.png")?;

    println!("Done.");
    Ok(())
}
