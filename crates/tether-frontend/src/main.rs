mod input;

use std::net::SocketAddr;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;

use tether::{ChannelConfig, Frontend, FrontendConfig, FrontendEvent, StatsHandle};

use input::ScriptedInput;

#[derive(Parser)]
#[command(name = "tether-frontend")]
#[command(about = "Monitoring frontend: consumes the broadcast, relays input, fetches textures")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:9001")]
    resources: SocketAddr,

    #[arg(long, default_value = "127.0.0.1:9002")]
    gameplay: SocketAddr,

    #[arg(long, default_value = "127.0.0.1:9003")]
    input: SocketAddr,

    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(long, default_value_t = 0, help = "Stop after this many ticks (0 = until disconnected)")]
    ticks: u64,

    #[arg(long, default_value_t = 0, help = "Expected frame count for the delivery report")]
    expect: u64,

    #[arg(long, help = "Fetch this texture once the session is live")]
    fetch: Option<String>,

    #[arg(long, default_value_t = 1000)]
    resource_timeout_ms: u64,

    #[arg(long, help = "Consume only; do not push scripted input")]
    idle: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = ChannelConfig {
        resources: args.resources,
        gameplay: args.gameplay,
        input: args.input,
    };
    let options = FrontendConfig {
        resource_timeout: Duration::from_millis(args.resource_timeout_ms),
    };
    let stats = StatsHandle::new();
    let mut frontend = Frontend::open(&config, options, stats.clone())?;
    let mut scripted = ScriptedInput::new(args.tick_rate);

    let tick_duration = Duration::from_secs_f64(1.0 / args.tick_rate.max(1) as f64);
    log::info!("monitoring {}", args.gameplay);

    let mut pending_fetch = args.fetch.clone();
    let mut last_logged_frame: Option<u32> = None;
    let mut ticks: u64 = 0;
    let mut running = true;

    while running && (args.ticks == 0 || ticks < args.ticks) {
        let tick_started = Instant::now();

        frontend.poll_gameplay();

        if let Some(frame) = frontend.latest() {
            let is_new = last_logged_frame != Some(frame.frame_number);
            if is_new && frame.frame_number % args.tick_rate.max(1) == 0 {
                log::info!(
                    "frame {}: map {}, health {}, armor {}, {} entities",
                    frame.frame_number,
                    frame.game.map_name,
                    frame.player.health,
                    frame.player.armor,
                    frame.entities.len()
                );
                last_logged_frame = Some(frame.frame_number);
            }

            if let Some(name) = pending_fetch.take() {
                match frontend.fetch_texture(0, &name) {
                    Some(image) => log::info!(
                        "fetched texture {name}: {}x{} ({} bytes)",
                        image.width,
                        image.height,
                        image.pixels.len()
                    ),
                    None => log::warn!("texture {name} unavailable"),
                }
            }
        }

        for event in frontend.drain_events() {
            match event {
                FrontendEvent::MapChanged { map_name } => {
                    log::info!("map changed to {map_name}");
                }
                FrontendEvent::Disconnected { reason } => {
                    log::info!("backend disconnected: {reason}");
                    running = false;
                }
            }
        }

        if !args.idle {
            frontend.send_input(scripted.next_command());
        }

        ticks += 1;
        let elapsed = tick_started.elapsed();
        if elapsed < tick_duration {
            thread::sleep(tick_duration - elapsed);
        }
    }

    frontend.close();
    report(&stats, args.expect);
    Ok(())
}

fn report(stats: &StatsHandle, expected: u64) {
    let snapshot = stats.get();
    log::info!(
        "received {} frames ({} bytes), sent {} messages ({} bytes)",
        snapshot.frames_received,
        snapshot.bytes_received,
        snapshot.messages_sent,
        snapshot.bytes_sent
    );

    if expected > 0 {
        let received = snapshot.frames_received;
        if received >= expected {
            log::info!("delivery: all {expected} expected frames received");
        } else {
            let percent = received as f64 * 100.0 / expected as f64;
            log::warn!(
                "delivery: missed {} of {expected} frames ({percent:.1}% received)",
                expected - received
            );
        }
    }
}
