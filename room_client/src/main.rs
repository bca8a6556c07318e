//! Headless room client binary.
//!
//! Usage:
//!   cargo run -p room_client -- [--config client.json] [--addr 127.0.0.1:2567] [--room my_room] [--frame-hz 60]
//!
//! The client joins a room, mirrors the room's players into a headless scene,
//! and sends its directional input every frame.
//!
//! Console commands:
//!   press <dir>    - Hold a direction (left, right, up, down)
//!   release <dir>  - Release a direction
//!   status         - Show connection, input, and player positions
//!   quit           - Exit client

use std::env;
use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use room_client::{
    host::HeadlessScene,
    input::{Direction, KeyState},
    room::{ChannelRoom, Room as _, RoomTransport as _},
    transport::TcpRoomTransport,
    GameScene,
};
use room_shared::config::ClientConfig;
use tokio::{sync::mpsc, time::MissedTickBehavior};
use tracing::info;

type Scene = GameScene<ChannelRoom, HeadlessScene, KeyState>;

fn parse_args() -> anyhow::Result<ClientConfig> {
    let args: Vec<String> = env::args().collect();

    let mut cfg = match args.iter().position(|a| a == "--config") {
        Some(i) if i + 1 < args.len() => ClientConfig::load(Path::new(&args[i + 1]))?,
        _ => ClientConfig::default(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.server_addr = args[i + 1].clone();
                i += 2;
            }
            "--room" if i + 1 < args.len() => {
                cfg.room_name = args[i + 1].clone();
                i += 2;
            }
            "--frame-hz" if i + 1 < args.len() => {
                cfg.frame_hz = args[i + 1].parse().context("parse --frame-hz")?;
                i += 2;
            }
            _ => i += 1,
        }
    }
    Ok(cfg)
}

/// Executes one console line. Returns `None` on quit.
fn exec_console(scene: &mut Scene, line: &str) -> Option<Vec<String>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&cmd) = tokens.first() else {
        return Some(Vec::new());
    };

    let out = match cmd {
        "press" | "release" => match tokens.get(1).and_then(|t| Direction::parse(t)) {
            Some(dir) => {
                if cmd == "press" {
                    scene.input_device_mut().press(dir);
                } else {
                    scene.input_device_mut().release(dir);
                }
                vec![]
            }
            None => vec![format!("Usage: {cmd} <left|right|up|down>")],
        },
        "status" => {
            let mut out = Vec::new();
            match scene.session() {
                Some(session) => {
                    out.push(format!(
                        "Room: {} (session {})",
                        session.room().name(),
                        session.room().session_id()
                    ));
                    out.push(format!("Input: {:?}", session.input()));
                    if session.is_send_failing() {
                        out.push("Input link: closed".to_string());
                    }
                    let registry = session.registry();
                    out.push(format!("Players: {}", registry.len()));
                    for id in registry.session_ids() {
                        if let Some(e) = registry.get(&id) {
                            out.push(format!(
                                "  {id}: shown ({:.1}, {:.1}) server ({:.1}, {:.1})",
                                e.displayed.x, e.displayed.y, e.authoritative.x, e.authoritative.y
                            ));
                        }
                    }
                }
                None => out.push("Not connected".to_string()),
            }
            out
        }
        "quit" | "exit" => return None,
        other => vec![format!("Unknown command: {other}")],
    };
    Some(out)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args()?;
    info!(server = %cfg.server_addr, room = %cfg.room_name, frame_hz = cfg.frame_hz, "Starting client");

    let transport = TcpRoomTransport::from_config(&cfg)?;
    let mut scene = Scene::new(&cfg, HeadlessScene::new(), KeyState::default());

    // Set up console input channel.
    let (console_tx, mut console_rx) = mpsc::channel::<String>(32);

    // Spawn stdin reader thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            if stdin.lock().read_line(&mut line).is_err() {
                break;
            }
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    // Frames tick from the start; until the join resolves they are no-ops.
    let join = transport.join_or_create(&cfg.room_name);
    tokio::pin!(join);
    let mut joining = true;

    let frame_interval = Duration::from_secs_f32(1.0 / cfg.frame_hz.max(1) as f32);
    let mut frames = tokio::time::interval(frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let started = tokio::time::Instant::now();
    let mut last_frame = started;

    loop {
        tokio::select! {
            result = &mut join, if joining => {
                joining = false;
                scene.on_join_result(result);
            }
            now = frames.tick() => {
                while let Ok(line) = console_rx.try_recv() {
                    match exec_console(&mut scene, &line) {
                        Some(output) => {
                            for line in output {
                                println!("{}", line);
                            }
                        }
                        None => return Ok(()),
                    }
                }

                let delta_ms = now.duration_since(last_frame).as_secs_f32() * 1000.0;
                let time_ms = now.duration_since(started).as_secs_f64() * 1000.0;
                last_frame = now;
                scene.update(time_ms, delta_ms);
            }
        }
    }
}
