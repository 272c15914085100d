mod assets;
mod sim;

use std::net::SocketAddr;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;

use tether::{Backend, ChannelConfig, StatsHandle};

use assets::ProceduralAssets;
use sim::SyntheticWorld;

#[derive(Parser)]
#[command(name = "tether-backend")]
#[command(about = "Synthetic simulation backend: publishes frames, relays input, serves textures")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:9001")]
    resources: SocketAddr,

    #[arg(long, default_value = "127.0.0.1:9002")]
    gameplay: SocketAddr,

    #[arg(long, default_value = "127.0.0.1:9003")]
    input: SocketAddr,

    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(long, default_value_t = 0, help = "Stop after this many frames (0 = run forever)")]
    frames: u64,

    #[arg(long, default_value_t = 8)]
    entities: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = ChannelConfig {
        resources: args.resources,
        gameplay: args.gameplay,
        input: args.input,
    };
    let stats = StatsHandle::new();
    let mut backend = Backend::open(&config, stats.clone())?;
    let assets = ProceduralAssets::with_builtins();
    let tick_rate = args.tick_rate.max(1);
    let mut world = SyntheticWorld::new(tick_rate, args.entities);

    let tick_duration = Duration::from_secs_f64(1.0 / tick_rate as f64);
    log::info!(
        "backend running at {} Hz with {} textures loaded",
        tick_rate,
        assets.len()
    );

    let mut running = true;
    let mut published: u64 = 0;
    while running && (args.frames == 0 || published < args.frames) {
        let tick_started = Instant::now();

        backend.serve_resources(&assets);

        for line in backend.drain_input() {
            running &= handle_console_command(&line, &mut world, &mut backend, &stats);
        }
        if let Some(command) = backend.current_input().cloned() {
            world.apply_input(&command);
        }

        world.advance();
        backend.publish_tick(Some(&world.view()));
        published += 1;

        if published % (tick_rate as u64 * 5) == 0 {
            let snapshot = stats.get();
            log::info!(
                "frame {}: {} bytes sent, avg {:.3} ms/frame, {} subscriber(s)",
                snapshot.frames_sent,
                snapshot.bytes_sent,
                snapshot.timing.avg_ms,
                backend.poll_subscribers()
            );
        }

        let elapsed = tick_started.elapsed();
        if elapsed < tick_duration {
            thread::sleep(tick_duration - elapsed);
        }
    }

    backend.publish_disconnected("backend shutting down");

    let snapshot = stats.get();
    log::info!(
        "done: {} frames, {} bytes sent, timing avg {:.3} ms (min {:.3}, max {:.3})",
        snapshot.frames_sent,
        snapshot.bytes_sent,
        snapshot.timing.avg_ms,
        snapshot.timing.min_ms,
        snapshot.timing.max_ms
    );

    Ok(())
}

// Returns false when the command asks the backend to stop.
fn handle_console_command(
    line: &str,
    world: &mut SyntheticWorld,
    backend: &mut Backend,
    stats: &StatsHandle,
) -> bool {
    let mut words = line.split_whitespace();
    match words.next() {
        Some("pause") => {
            let paused = world.toggle_pause();
            log::info!("simulation {}", if paused { "paused" } else { "resumed" });
        }
        Some("map") => {
            if let Some(name) = words.next() {
                world.change_map(name);
                backend.publish_map_changed(name);
                log::info!("map changed to {name}");
            } else {
                log::warn!("map command without a map name");
            }
        }
        Some("status") => {
            let snapshot = stats.get();
            log::info!(
                "status: map {}, {} frames sent, {} messages received",
                world.map_name(),
                snapshot.frames_sent,
                snapshot.messages_received
            );
        }
        Some("stats_reset") => {
            stats.reset();
            log::info!("stats reset");
        }
        Some("quit") => {
            log::info!("quit requested by frontend");
            return false;
        }
        Some(other) => log::info!("unhandled console command: {other}"),
        None => {}
    }
    true
}
