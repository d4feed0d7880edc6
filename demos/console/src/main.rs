//! Line-oriented frontend for the usurper client runtime.
//!
//! ```text
//! usurper-console [BASE_URL] [ROOM|new] [NICKNAME]
//! ```
//!
//! Joins (or creates) a room, then reads commands from stdin:
//! `start`, `play <action> [target]`, `pass`, `challenge`,
//! `block <role>`, `pick <n>`, `leave`.

use tokio::sync::mpsc;

use usurper::prelude::*;

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn card(slot: &CardSlot) -> String {
    match (slot.role, slot.revealed) {
        (Some(role), true) => format!("[{role} - revealed]"),
        (Some(role), false) => format!("[{role}]"),
        (None, _) => "[??]".to_string(),
    }
}

fn render(view: &ViewState, me: &PlayerId) {
    let Some(snapshot) = &view.snapshot else {
        return;
    };

    println!("----------------------------------------");
    for (i, p) in snapshot.players.iter().enumerate() {
        let turn = if snapshot.turn == Some(i) { ">" } else { " " };
        let you = if &p.id == me { " (you)" } else { "" };
        let state = if p.alive { "" } else { " OUT" };
        let hand: Vec<String> = p.hand.iter().map(card).collect();
        println!(
            "{turn} {}{you}: {} coins {}{state}",
            p.name,
            p.coins,
            hand.join(" ")
        );
    }
    println!(
        "  deck: {} | trash: {}",
        snapshot.deck_count,
        snapshot
            .trash
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    if snapshot.game_over {
        match &snapshot.winner {
            Some(winner) => println!("  GAME OVER - {winner} wins"),
            None => println!("  GAME OVER"),
        }
    }

    if let Some(prompt) = &view.prompt {
        let countdown = view
            .countdown
            .map(|s| format!(" ({s}s)"))
            .unwrap_or_default();
        match prompt {
            PromptSpec::Reaction {
                action,
                actor,
                options,
            } => {
                let mut choices = vec!["pass".to_string()];
                if options.can_challenge {
                    choices.push("challenge".into());
                }
                for role in &options.block_roles {
                    choices.push(format!("block {role}"));
                }
                println!(
                    "  {actor} plays {action}{countdown} -> {}",
                    choices.join(" / ")
                );
            }
            PromptSpec::BlockReaction {
                action,
                blocker,
                block_card,
                ..
            } => {
                let with = block_card
                    .map(|r| format!(" with {r}"))
                    .unwrap_or_default();
                println!(
                    "  {blocker} blocks {action}{with}{countdown} -> pass / challenge"
                );
            }
            PromptSpec::CardSelection { mode, hand } => {
                let verb = match mode {
                    SelectionMode::Discard => "lose",
                    SelectionMode::Exchange => "exchange",
                };
                let cards: Vec<String> = hand.iter().map(card).collect();
                println!(
                    "  pick a card to {verb}: {} -> pick <0..{}>",
                    cards.join(" "),
                    hand.len().saturating_sub(1)
                );
            }
            PromptSpec::RevealClaim {
                required,
                holds_required,
                hand,
            } => {
                let hint = if *holds_required {
                    format!("you hold {required}")
                } else {
                    format!("you do not hold {required}")
                };
                let cards: Vec<String> = hand.iter().map(card).collect();
                println!(
                    "  prove {required} ({hint}): {} -> pick <n>",
                    cards.join(" ")
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Command parsing
// ---------------------------------------------------------------------------

fn parse_action(word: &str) -> Option<ActionKind> {
    match word {
        "income" => Some(ActionKind::Income),
        "foreign_aid" | "aid" => Some(ActionKind::ForeignAid),
        "coup" => Some(ActionKind::Coup),
        "tax" => Some(ActionKind::Tax),
        "assassinate" => Some(ActionKind::Assassinate),
        "steal" => Some(ActionKind::Steal),
        "exchange" => Some(ActionKind::Exchange),
        _ => None,
    }
}

fn parse_role(word: &str) -> Option<Role> {
    match word.to_ascii_lowercase().as_str() {
        "duke" => Some(Role::Duke),
        "assassin" => Some(Role::Assassin),
        "captain" => Some(Role::Captain),
        "ambassador" => Some(Role::Ambassador),
        "contessa" => Some(Role::Contessa),
        _ => None,
    }
}

/// Resolves a display name to an identity in the current snapshot.
fn resolve_target(view: &ViewState, name: &str) -> Option<PlayerId> {
    view.snapshot.as_ref().and_then(|s| {
        s.players
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.id.clone())
    })
}

fn parse_command(line: &str, view: &ViewState) -> Result<PlayerCommand, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(String::new());
    };
    match head {
        "start" => Ok(PlayerCommand::StartGame),
        "leave" | "quit" => Ok(PlayerCommand::Leave),
        "pass" => Ok(PlayerCommand::Respond(PlayerResponse::Pass)),
        "challenge" => Ok(PlayerCommand::Respond(PlayerResponse::Challenge)),
        "block" => {
            let role = words
                .next()
                .and_then(parse_role)
                .ok_or("usage: block <duke|captain|ambassador|contessa>")?;
            Ok(PlayerCommand::Respond(PlayerResponse::Block(role)))
        }
        "pick" => {
            let index: usize = words
                .next()
                .and_then(|w| w.parse().ok())
                .ok_or("usage: pick <index>")?;
            Ok(PlayerCommand::Respond(PlayerResponse::SelectCard(index)))
        }
        "play" => {
            let kind = words
                .next()
                .and_then(parse_action)
                .ok_or("usage: play <action> [target]")?;
            let target = match words.next() {
                Some(name) => Some(
                    resolve_target(view, name)
                        .ok_or_else(|| format!("no player named {name}"))?,
                ),
                None => None,
            };
            Ok(PlayerCommand::Play { kind, target })
        }
        other => Err(format!("unknown command: {other}")),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Reads stdin lines on a blocking thread.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        loop {
            line.clear();
            match std::io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if tx.send(line.trim().to_string()).is_err() {
                        break;
                    }
                }
            }
        }
    });
    rx
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let base = args
        .next()
        .unwrap_or_else(|| "http://localhost:8000".to_string());
    let room = args.next().unwrap_or_else(|| "new".to_string());
    let nickname = args.next().unwrap_or_else(|| "anonymous".to_string());

    use rand::Rng;
    let player = PlayerId(format!("guest-{:08x}", rand::rng().random::<u32>()));

    let api = HttpApi::new(base);
    let session = if room == "new" {
        let session = Session::create(&api, player, &nickname).await?;
        eprintln!("created room {} - share this code", session.room);
        session
    } else {
        Session::join(&api, RoomCode(room), player, &nickname).await?
    };
    let me = session.player.clone();

    let url = PushChannel::endpoint(api.base(), &session.room, &session.player);
    let push = PushChannel::connect(&url).await?;

    let (runtime, mut handle) = ClientRuntime::new(session, api, push);
    let mut view = handle.view();
    let runtime_task = tokio::spawn(runtime.run());

    let mut lines = stdin_lines();
    eprintln!("commands: start | play <action> [target] | pass | challenge | block <role> | pick <n> | leave");

    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                render(&view.borrow(), &me);
            }
            Some(notice) = handle.notices.recv() => match notice {
                Notice::Info(text) => println!("* {text}"),
                Notice::Error(text) => println!("! {text}"),
            },
            line = lines.recv() => {
                let Some(line) = line else { break };
                if line.is_empty() {
                    continue;
                }
                match parse_command(&line, &view.borrow()) {
                    Ok(command) => {
                        let leaving = command == PlayerCommand::Leave;
                        if !handle.command(command) || leaving {
                            break;
                        }
                    }
                    Err(reason) if reason.is_empty() => {}
                    Err(reason) => println!("! {reason}"),
                }
            }
        }
    }

    let _ = runtime_task.await;
    Ok(())
}
