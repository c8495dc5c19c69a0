use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use dispatch_core::{
    update, AppState, AppViewModel, AttachmentRef, ClientId, Msg, Role, SessionConfig,
};
use dispatch_engine::{
    EngineConfig, EngineIdentity, HttpQueueTransport, LocalChatBootstrap, PassthroughUploads,
    TransportSettings, UnlimitedRate,
};

use crate::logging::{self, LogDestination};
use crate::persistence;
use crate::runner::EffectRunner;

pub fn run() -> anyhow::Result<()> {
    logging::initialize(LogDestination::File);

    let settings = TransportSettings {
        base_url: env_or("DISPATCH_QUEUE_URL", &TransportSettings::default().base_url),
        ..TransportSettings::default()
    };
    let session = SessionConfig {
        user_id: env_or("DISPATCH_USER", "guest"),
        model: env_or("DISPATCH_MODEL", "default"),
        ..SessionConfig::default()
    };
    let identity = EngineIdentity {
        user_id: session.user_id.clone(),
        is_authenticated: session.is_authenticated,
        model: session.model.clone(),
        system_prompt: session.system_prompt.clone(),
        enable_search: session.enable_search,
    };

    let transport =
        Arc::new(HttpQueueTransport::new(settings).context("building queue transport")?);
    let engine_config = EngineConfig {
        transport: transport.clone(),
        rate_limiter: Arc::new(UnlimitedRate),
        chat_bootstrap: Arc::new(LocalChatBootstrap::default()),
        attachment_store: Arc::new(PassthroughUploads),
        conversation: transport,
        identity,
    };

    let cache_dir = std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".dispatch");

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let mut runner = EffectRunner::new(engine_config, msg_tx.clone(), cache_dir.clone());
    let mut state = AppState::new(session);

    let cached = persistence::load_transcript(&cache_dir);
    if !cached.is_empty() {
        state = dispatch(state, Msg::RestoreTranscript(cached), &mut runner, &cache_dir);
    }
    if let Some(draft) = persistence::load_draft(&cache_dir) {
        state = dispatch(state, Msg::DraftChanged(draft), &mut runner, &cache_dir);
    }

    let quit = Arc::new(AtomicBool::new(false));
    spawn_input_loop(msg_tx, quit.clone());

    println!("dispatch: type a prompt and press enter");
    println!("commands: /cancel <n>  /retry  /new  /attach <name> <type> <url>  /quit");
    render(&state.view());

    while !quit.load(Ordering::SeqCst) {
        for msg in runner.drain_events() {
            state = dispatch(state, msg, &mut runner, &cache_dir);
        }
        match msg_rx.recv_timeout(Duration::from_millis(20)) {
            Ok(msg) => {
                state = dispatch(state, msg, &mut runner, &cache_dir);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

/// Runs one message through the state machine, executes the effects, and
/// re-renders when anything changed.
fn dispatch(state: AppState, msg: Msg, runner: &mut EffectRunner, cache_dir: &Path) -> AppState {
    if let Msg::DraftChanged(text) = &msg {
        persistence::save_draft(cache_dir, text);
    }
    let (mut state, effects) = update(state, msg);
    runner.run(effects);
    if state.consume_dirty() {
        render(&state.view());
    }
    state
}

fn spawn_input_loop(msg_tx: mpsc::Sender<Msg>, quit: Arc<AtomicBool>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim().to_owned();
            if line.is_empty() {
                continue;
            }
            if let Some(command) = line.strip_prefix('/') {
                if !handle_command(command, &msg_tx, &quit) {
                    break;
                }
            } else {
                let _ = msg_tx.send(Msg::DraftChanged(line));
                let _ = msg_tx.send(Msg::PromptSubmitted);
            }
        }
        quit.store(true, Ordering::SeqCst);
        let _ = msg_tx.send(Msg::NoOp);
    });
}

/// Returns false when the input loop should stop.
fn handle_command(command: &str, msg_tx: &mpsc::Sender<Msg>, quit: &Arc<AtomicBool>) -> bool {
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("quit") => {
            quit.store(true, Ordering::SeqCst);
            let _ = msg_tx.send(Msg::NoOp);
            return false;
        }
        Some("retry") => {
            let _ = msg_tx.send(Msg::PollResumeRequested);
        }
        Some("new") => {
            let _ = msg_tx.send(Msg::ChatSwitched { chat_id: None });
        }
        Some("cancel") => match parts.next().and_then(|n| n.parse::<u64>().ok()) {
            Some(n) => {
                let _ = msg_tx.send(Msg::CancelRequested {
                    client_id: ClientId(n),
                });
            }
            None => eprintln!("usage: /cancel <job number>"),
        },
        Some("attach") => {
            let (name, content_type, url) = (parts.next(), parts.next(), parts.next());
            match (name, content_type, url) {
                (Some(name), Some(content_type), Some(url)) => {
                    let _ = msg_tx.send(Msg::AttachmentStaged(AttachmentRef {
                        name: name.to_owned(),
                        content_type: content_type.to_owned(),
                        url: url.to_owned(),
                    }));
                }
                _ => eprintln!("usage: /attach <name> <content-type> <url>"),
            }
        }
        _ => eprintln!("unknown command: /{command}"),
    }
    true
}

fn render(view: &AppViewModel) {
    println!("----");
    for row in &view.messages {
        let speaker = match row.role {
            Role::User => "you",
            Role::Assistant => " ai",
        };
        let mut line = format!("{speaker}> {}", row.content);
        if !row.attachment_names.is_empty() {
            line.push_str(&format!(" [{}]", row.attachment_names.join(", ")));
        }
        if row.pending {
            if let Some(client_id) = row.client_id {
                line.push_str(&format!("  (queued, /cancel {})", client_id.0));
            }
        }
        println!("{line}");
    }
    if view.degraded {
        println!("status updates are paused; /retry to resume");
    }
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_owned())
}
