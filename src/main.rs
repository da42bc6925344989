//! Plinko Physics headless demo
//!
//! Builds a peg pyramid with goal sensors along the bottom row, drops a few
//! balls and reports which goal each one passed through.
//!
//! Usage: `plinko-physics [settings.json] [balls] [seed]`

use std::collections::HashMap;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use plinko_physics::sim::{Body, BodyId, PhysicsEngine, PhysicsEvent, World};
use plinko_physics::{BodyRegistry, Settings};

const WORLD_WIDTH: f32 = 1280.0;
const WORLD_HEIGHT: f32 = 800.0;

/// Pyramid layout
const ROWS: usize = 16;
const PEG_RADIUS: f32 = 4.0;
const SPACING_X: f32 = 30.0 + PEG_RADIUS * 2.0;
const SPACING_Y: f32 = 25.0 + PEG_RADIUS * 2.0;
const GOAL_WIDTH: f32 = 35.0;
const GOAL_HEIGHT: f32 = 20.0;

/// Dropped balls
const BALL_RADIUS: f32 = 8.0;
const BALL_BOUNCINESS: f32 = 0.5;

const FRAME_DT: f32 = 1.0 / 60.0;
const MAX_FRAMES: u32 = 60 * 60;
/// Frames between drops
const DROP_INTERVAL: u32 = 12;

fn top() -> Vec2 {
    Vec2::new(WORLD_WIDTH / 2.0, WORLD_HEIGHT / 6.0)
}

/// Pegs for every row but the last, goal sensors on the last; returns goal ids
/// left to right
fn build_board(world: &mut World) -> Vec<BodyId> {
    let apex = top();
    let mut goals = Vec::new();
    for row in 2..=ROWS {
        let count = row + 1;
        let row_start = apex.x - SPACING_X * (count - 1) as f32 / 2.0;
        let y = apex.y + row as f32 * SPACING_Y;
        for col in 0..count {
            let x = row_start + col as f32 * SPACING_X;
            if row == ROWS {
                let goal = Body::rectangle(Vec2::new(x - SPACING_X / 2.0, y), GOAL_WIDTH, GOAL_HEIGHT)
                    .fixed()
                    .collide_with_fixed_only();
                goals.push(world.spawn(goal));
            } else {
                world.spawn(Body::circle(Vec2::new(x, y), PEG_RADIUS).fixed());
            }
        }
    }
    goals
}

fn drop_ball(world: &mut World, rng: &mut Pcg32) -> BodyId {
    let span = PEG_RADIUS * 4.0 + SPACING_X;
    let x = top().x - span / 2.0 + rng.random_range(0.0..span);
    let ball = Body::circle(Vec2::new(x, top().y + 10.0), BALL_RADIUS)
        .with_bounciness(BALL_BOUNCINESS)
        .collide_with_fixed_only();
    world.spawn(ball)
}

fn load_settings(path: Option<&String>) -> plinko_physics::Result<Settings> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|e| {
                plinko_physics::PhysicsError::invalid(format!("cannot read {path}: {e}"))
            })?;
            Settings::from_json(&json)
        }
        None => Ok(Settings {
            quad_tree_capacity: 1,
            drag: 0.05,
            gravity: 3.0,
            ..Default::default()
        }),
    }
}

fn main() {
    env_logger::init();
    log::info!("Plinko Physics (headless) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = match load_settings(args.first()) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    let balls: u32 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(20);
    let seed: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(12345);

    let mut engine = match PhysicsEngine::new(settings) {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    let mut world = World::new(WORLD_WIDTH, WORLD_HEIGHT).with_culling(true);
    let goals = build_board(&mut world);
    let mut rng = Pcg32::seed_from_u64(seed);
    log::info!("Board ready: {} bodies, {} goals, seed {}", world.len(), goals.len(), seed);

    // Predict the first ball before it falls
    let first = drop_ball(&mut world, &mut rng);
    if let Some(path) = engine.simulate_body_steps(&world, first, 50, FRAME_DT) {
        if let Some(end) = path.last() {
            println!(
                "Predicted ball {first} after {} steps: pos=({:.1}, {:.1}) vel=({:.2}, {:.2})",
                path.len(),
                end.pos.x,
                end.pos.y,
                end.vel.x,
                end.vel.y
            );
        }
    }

    let mut dropped = 1;
    let mut landed: HashMap<BodyId, usize> = HashMap::new();
    let mut lost = 0;
    for frame in 1..=MAX_FRAMES {
        if dropped < balls && frame % DROP_INTERVAL == 0 {
            drop_ball(&mut world, &mut rng);
            dropped += 1;
        }

        let report = engine.step(&mut world, FRAME_DT);
        // A ball straddling two goals in one tick counts for the nearer one
        let mut reached: HashMap<BodyId, (usize, f32)> = HashMap::new();
        for event in report.events {
            match event {
                PhysicsEvent::Passthrough { body, other } => {
                    let Some(slot) = goals.iter().position(|&g| g == other) else {
                        continue;
                    };
                    let (Some(ball), Some(goal)) = (world.get(body), world.get(other)) else {
                        continue;
                    };
                    let offset = (ball.pos.x - goal.pos.x).abs();
                    let best = reached.entry(body).or_insert((slot, offset));
                    if offset < best.1 {
                        *best = (slot, offset);
                    }
                }
                PhysicsEvent::Culled { id } if !landed.contains_key(&id) => lost += 1,
                _ => {}
            }
        }
        for (body, (slot, _)) in reached {
            landed.entry(body).or_insert_with(|| {
                log::info!("Ball {body} reached goal {slot}");
                slot
            });
        }

        let in_play = world.bodies().iter().any(|b| b.is_free());
        if dropped >= balls && !in_play {
            log::info!("All balls settled after {frame} frames");
            break;
        }
    }

    let mut histogram = vec![0u32; goals.len()];
    for &slot in landed.values() {
        histogram[slot] += 1;
    }
    println!("\nGoal histogram ({} balls, {} lost):", dropped, lost);
    for (slot, count) in histogram.iter().enumerate() {
        println!("{slot:>3} | {}", "#".repeat(*count as usize));
    }
    if let Some(fps) = engine.smoothed_fps() {
        println!("Simulated at a nominal {fps:.0} ticks/s");
    }
}
