use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tether::channel::{BackendChannels, ChannelConfig, ChannelSocket, Publisher};
use tether::wire::{ControlFrame, InputCommand, ResourceKind, TextureImage};
use tether::{AssetSource, Backend, EntityView, Frontend, FrontendConfig, StatsHandle, WorldView};

static PORT_COUNTER: AtomicU16 = AtomicU16::new(41000);

fn next_port() -> u16 {
    PORT_COUNTER.fetch_add(10, Ordering::SeqCst)
}

fn test_config() -> ChannelConfig {
    let base = next_port();
    ChannelConfig {
        resources: addr(base),
        gameplay: addr(base + 1),
        input: addr(base + 2),
    }
}

fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

fn wait_for(mut condition: impl FnMut() -> bool, timeout_ms: u64) -> bool {
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

fn open_pair(config: &ChannelConfig) -> (Backend, Frontend) {
    let backend = Backend::open(config, StatsHandle::new()).unwrap();
    let frontend = Frontend::open(config, FrontendConfig::default(), StatsHandle::new()).unwrap();
    (backend, frontend)
}

fn sample_view(health: i16) -> WorldView {
    let mut view = WorldView::new(0.5);
    view.player.health = health;
    view.game.in_game = true;
    view.game.map_name = "arena".to_string();
    view.entities.push(EntityView::new(7));
    view
}

struct TestAssets {
    textures: HashMap<String, TextureImage>,
}

impl TestAssets {
    fn with_checker() -> Self {
        let mut textures = HashMap::new();
        textures.insert(
            "conchars".to_string(),
            TextureImage {
                width: 2,
                height: 2,
                pixels: vec![0, 255, 255, 0],
            },
        );
        Self { textures }
    }
}

impl AssetSource for TestAssets {
    fn fetch(&self, name: &str) -> Option<TextureImage> {
        self.textures.get(name).cloned()
    }
}

// The requester side blocks, so the replier side cannot share its thread.
fn serve_resources_in_background(mut backend: Backend, expect: usize) -> thread::JoinHandle<Backend> {
    thread::spawn(move || {
        let assets = TestAssets::with_checker();
        let deadline = Instant::now() + Duration::from_secs(3);
        let mut served = 0;
        while served < expect && Instant::now() < deadline {
            served += backend.serve_resources(&assets);
            thread::sleep(Duration::from_millis(1));
        }
        backend
    })
}

#[test]
fn late_subscriber_does_not_see_earlier_publishes() {
    let config = test_config();
    let mut backend = Backend::open(&config, StatsHandle::new()).unwrap();

    for _ in 0..3 {
        backend.publish_tick(Some(&sample_view(100)));
    }

    let mut frontend =
        Frontend::open(&config, FrontendConfig::default(), StatsHandle::new()).unwrap();
    assert!(
        wait_for(|| backend.poll_subscribers() == 1, 500),
        "subscriber never registered"
    );

    backend.publish_tick(Some(&sample_view(100)));

    assert!(
        wait_for(|| frontend.poll_gameplay(), 500),
        "no frame received after attachment"
    );

    let frame = frontend.latest().expect("cache should be populated");
    assert_eq!(frame.frame_number, 3);
}

#[test]
fn end_to_end_cache_holds_last_message() {
    let config = test_config();
    let (mut backend, mut frontend) = open_pair(&config);

    assert!(wait_for(|| backend.poll_subscribers() == 1, 500));

    // The tick carrying frame_number 42 has the marker health value.
    for n in 0..=42u32 {
        let health = if n == 42 { 75 } else { 100 };
        backend.publish_tick(Some(&sample_view(health)));
    }

    assert!(
        wait_for(
            || {
                frontend.poll_gameplay();
                frontend
                    .latest()
                    .is_some_and(|frame| frame.frame_number == 42)
            },
            1000,
        ),
        "frame 42 never reached the cache"
    );

    let frame = frontend.latest().unwrap();
    assert_eq!(frame.frame_number, 42);
    assert_eq!(frame.player.health, 75);
    assert_eq!(frame.game.map_name, "arena");
    assert_eq!(frame.entities.len(), 1);

    wait_for(|| !frontend.poll_gameplay(), 500);
    assert!(!frontend.poll_gameplay());

    let frame = frontend.latest().unwrap();
    assert_eq!(frame.frame_number, 42);
    assert_eq!(frame.player.health, 75);
}

#[test]
fn input_drain_keeps_only_the_latest_command() {
    let config = test_config();
    let (mut backend, mut frontend) = open_pair(&config);

    for forward in [1.0f32, 2.0, 3.0] {
        let mut cmd = InputCommand::new(0, 0.1);
        cmd.forward_move = forward;
        frontend.send_input(cmd);
    }

    thread::sleep(Duration::from_millis(100));
    let console = backend.drain_input();

    assert!(console.is_empty());
    let current = backend.current_input().expect("input record should be set");
    assert_eq!(current.sequence, 3);
    assert_eq!(current.forward_move, 3.0);
    assert!(backend.has_pending_input());
}

#[test]
fn console_text_survives_the_drain_sideband() {
    let config = test_config();
    let (mut backend, mut frontend) = open_pair(&config);

    for text in ["status", "pause", "map arena"] {
        frontend.send_input(InputCommand::console_only(0, 0.2, text));
    }

    thread::sleep(Duration::from_millis(100));
    let console = backend.drain_input();

    assert_eq!(console, vec!["status", "pause", "map arena"]);
    let current = backend.current_input().unwrap();
    assert_eq!(current.console.as_deref(), Some("map arena"));
    assert_eq!(current.sequence, 3);
}

#[test]
fn resource_fetch_roundtrip_with_name_normalization() {
    let config = test_config();
    let (backend, mut frontend) = open_pair(&config);

    let server = serve_resources_in_background(backend, 1);

    let image = frontend
        .fetch_texture(5, "CONCHARS")
        .expect("texture should be served");

    assert_eq!(image.width, 2);
    assert_eq!(image.height, 2);
    assert_eq!(image.pixels, vec![0, 255, 255, 0]);

    server.join().unwrap();
}

#[test]
fn resource_miss_is_an_empty_reply_within_the_timeout() {
    let config = test_config();
    let (backend, mut frontend) = open_pair(&config);

    let server = serve_resources_in_background(backend, 2);

    let started = Instant::now();
    let response = frontend.fetch_resource(ResourceKind::Texture, 9, Some("nosuchthing"));

    let response = response.expect("miss must still be answered");
    assert!(started.elapsed() < FrontendConfig::default().resource_timeout);
    assert_eq!(response.id, 9);
    assert!(response.payload.is_empty());

    assert_eq!(frontend.fetch_texture(9, "nosuchthing"), None);
    let backend = server.join().unwrap();
    drop(backend);
}

#[test]
fn stale_reply_does_not_corrupt_the_next_exchange() {
    let config = test_config();
    let mut backend = Backend::open(&config, StatsHandle::new()).unwrap();
    let options = FrontendConfig {
        resource_timeout: Duration::from_millis(50),
    };
    let mut frontend = Frontend::open(&config, options, StatsHandle::new()).unwrap();

    // Nobody serving yet: the first exchange times out and its request
    // stays queued on the backend.
    assert!(frontend
        .fetch_resource(ResourceKind::Texture, 1, Some("conchars"))
        .is_none());

    // Answering the abandoned request lands a reply in the requester's
    // socket with no exchange waiting for it.
    let assets = TestAssets::with_checker();
    assert!(wait_for(|| backend.serve_resources(&assets) == 1, 500));
    thread::sleep(Duration::from_millis(50));

    let server = serve_resources_in_background(backend, 1);
    let response = frontend
        .fetch_resource(ResourceKind::Texture, 2, Some("conchars"))
        .expect("fresh exchange should succeed");
    assert_eq!(response.id, 2);

    server.join().unwrap();
}

#[test]
fn subscribe_rejects_mismatched_wire_version() {
    let port = next_port();
    let mut publisher = Publisher::bind(addr(port)).unwrap();
    let socket = ChannelSocket::dial(addr(port)).unwrap();

    let bad = ControlFrame::Subscribe {
        protocol_version: 999,
    };
    socket.send(&bad.encode().unwrap()).unwrap();
    thread::sleep(Duration::from_millis(50));
    publisher.poll_subscriptions();
    assert_eq!(publisher.subscriber_count(), 0);

    let good = ControlFrame::Subscribe {
        protocol_version: tether::PROTOCOL_VERSION,
    };
    socket.send(&good.encode().unwrap()).unwrap();
    assert!(wait_for(
        || {
            publisher.poll_subscriptions();
            publisher.subscriber_count() == 1
        },
        500
    ));
}

#[test]
fn silent_subscribers_expire() {
    let port = next_port();
    let mut publisher = Publisher::bind(addr(port)).unwrap();
    publisher.set_subscriber_ttl(Duration::from_millis(50));

    let socket = ChannelSocket::dial(addr(port)).unwrap();
    let hello = ControlFrame::Subscribe {
        protocol_version: tether::PROTOCOL_VERSION,
    };
    socket.send(&hello.encode().unwrap()).unwrap();

    assert!(wait_for(
        || {
            publisher.poll_subscriptions();
            publisher.subscriber_count() == 1
        },
        500
    ));

    thread::sleep(Duration::from_millis(100));
    publisher.poll_subscriptions();
    assert_eq!(publisher.subscriber_count(), 0);
}

#[test]
fn unsubscribe_detaches_immediately() {
    let config = test_config();
    let (mut backend, mut frontend) = open_pair(&config);

    assert!(wait_for(|| backend.poll_subscribers() == 1, 500));

    frontend.close();
    assert!(wait_for(|| backend.poll_subscribers() == 0, 500));
}

#[test]
fn setup_failure_releases_already_opened_channels() {
    let base = next_port();
    let clashing = ChannelConfig {
        resources: addr(base),
        gameplay: addr(base + 1),
        // Same endpoint as Resources, so the third bind must fail.
        input: addr(base),
    };

    let err = BackendChannels::open(&clashing).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("input"), "unexpected error: {message}");

    let valid = ChannelConfig {
        resources: addr(base),
        gameplay: addr(base + 1),
        input: addr(base + 2),
    };
    let channels = BackendChannels::open(&valid).unwrap();
    drop(channels);
}

#[test]
fn quiet_ticks_publish_nothing() {
    let config = test_config();
    let (mut backend, mut frontend) = open_pair(&config);

    assert!(wait_for(|| backend.poll_subscribers() == 1, 500));

    backend.publish_tick(None);
    thread::sleep(Duration::from_millis(50));

    assert!(!frontend.poll_gameplay());
    assert!(frontend.latest().is_none());
    assert_eq!(backend.stats().get().frames_sent, 0);
}

#[test]
fn map_change_and_disconnect_surface_as_events() {
    let config = test_config();
    let (mut backend, mut frontend) = open_pair(&config);

    assert!(wait_for(|| backend.poll_subscribers() == 1, 500));

    backend.publish_map_changed("arena2");
    backend.publish_disconnected("server going down");

    let mut events = Vec::new();
    wait_for(
        || {
            frontend.poll_gameplay();
            events.extend(frontend.drain_events());
            events.len() >= 2
        },
        1000,
    );

    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        tether::FrontendEvent::MapChanged {
            map_name: "arena2".to_string()
        }
    );
    assert_eq!(
        events[1],
        tether::FrontendEvent::Disconnected {
            reason: "server going down".to_string()
        }
    );

    assert!(frontend.latest().is_none());
}
