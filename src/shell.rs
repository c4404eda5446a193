//! Interactive shell: maps the route surface (landing, auth, and the
//! authenticated sub-views) onto the flows. Pure view glue; every failure
//! is printed, never fatal.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use crate::errors::AppError;
use crate::flows::PostImage;
use crate::AppState;

/// Curated reading list shown by the resources view.
const RESOURCES: &[(&str, &str)] = &[
    ("Composting at home", "https://www.epa.gov/recycle/composting-home"),
    ("Reducing household energy use", "https://www.energy.gov/energysaver"),
    ("Plastic-free starter guide", "https://www.plasticfreejuly.org"),
    ("Community garden finder", "https://www.communitygarden.org"),
];

pub async fn run(state: &AppState) -> std::io::Result<()> {
    let snapshot = state.session.resolve().await;
    if snapshot.signed_in() {
        println!("Welcome back, {}!", display_name(&snapshot.green_name));
    } else {
        println!("Welcome to GreenGen. Type `help` for commands.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            prompt();
            continue;
        }

        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match command {
            "help" => print_help(),
            "quit" | "exit" => break,
            "signup" => signup(state, &args).await,
            "login" => login(state, &args).await,
            "logout" => {
                state.account.sign_out().await;
                println!("Signed out.");
            }
            "whoami" => whoami(state),
            "forgot" => forgot(state, &args).await,
            "resetpw" => resetpw(state, &args).await,
            "feed" => feed(state).await,
            "post" => post(state, &args).await,
            "community" => community(state, &args).await,
            "challenge" => challenge(state, &args).await,
            "account" => account(state, &args).await,
            "profile" => profile(state, &args).await,
            "settings" => settings(state, &args).await,
            "feedback" => feedback(state, line).await,
            "resources" => resources(),
            _ => println!("Unknown command. Type `help`."),
        }
        prompt();
    }

    Ok(())
}

fn prompt() {
    print!("greengen> ");
    let _ = std::io::stdout().flush();
}

fn display_name(green_name: &str) -> &str {
    if green_name.is_empty() {
        "GreenGen member"
    } else {
        green_name
    }
}

/// Print a flow outcome: local failures verbatim, remote failures as the
/// view's generic message.
fn report<T>(result: Result<T, AppError>, ok: &str, failed: &str) {
    match result {
        Ok(_) => println!("{}", ok),
        Err(err) if err.is_local() => println!("{}", err.message()),
        Err(err) => {
            tracing::error!("{}", err);
            println!("{}", failed);
        }
    }
}

fn parse_id(arg: Option<&&str>) -> Option<Uuid> {
    match arg.and_then(|s| s.parse::<Uuid>().ok()) {
        Some(id) => Some(id),
        None => {
            println!("Expected an id.");
            None
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  signup <email> <password>        create an account");
    println!("  login <email> <password>         sign in");
    println!("  logout                           sign out");
    println!("  whoami                           show the resolved session");
    println!("  forgot <email>                   request a password-reset mail");
    println!("  resetpw <new> <confirm>          set a new password (reset flow)");
    println!("  feed                             list recent posts");
    println!("  post [--image <path>] [text]     share a post");
    println!("  community create <name> [desc]   create a community");
    println!("  community search <query>         search communities by name");
    println!("  community join <id>              join a community");
    println!("  challenge create <title> [desc]  create a challenge");
    println!("  challenge search [query]         search challenges by title");
    println!("  challenge join <id>              join a challenge");
    println!("  challenge mine                   list my challenges");
    println!("  challenge complete <id>          mark a challenge completed");
    println!("  account password <new> <confirm> change password");
    println!("  account resend                   resend verification mail");
    println!("  account delete                   request account deletion");
    println!("  profile [bio <text>]             show profile / save bio");
    println!("  settings [save <email> <push>]   show / save notification prefs");
    println!("  feedback <text>                  send feedback");
    println!("  resources                        curated sustainability links");
    println!("  quit                             leave");
}

async fn signup(state: &AppState, args: &[&str]) {
    let (Some(email), Some(password)) = (args.first(), args.get(1)) else {
        println!("Usage: signup <email> <password>");
        return;
    };
    report(
        state.account.sign_up(email, password).await,
        "Signup successful! Please check your email to verify.",
        "Signup failed.",
    );
}

async fn login(state: &AppState, args: &[&str]) {
    let (Some(email), Some(password)) = (args.first(), args.get(1)) else {
        println!("Usage: login <email> <password>");
        return;
    };
    match state.account.sign_in(email, password).await {
        Ok(snapshot) => println!("Welcome, {}!", display_name(&snapshot.green_name)),
        Err(err) if err.is_local() => println!("{}", err.message()),
        Err(err) => {
            tracing::error!("{}", err);
            println!("Login failed.");
        }
    }
}

fn whoami(state: &AppState) {
    let snapshot = state.session.snapshot();
    match &snapshot.identity {
        Some(identity) => {
            println!(
                "{} <{}> — email {}",
                display_name(&snapshot.green_name),
                identity.email.as_deref().unwrap_or("unknown"),
                if snapshot.email_verified {
                    "verified"
                } else {
                    "not verified"
                }
            );
        }
        None => println!("Not signed in."),
    }
}

async fn forgot(state: &AppState, args: &[&str]) {
    let Some(email) = args.first() else {
        println!("Usage: forgot <email>");
        return;
    };
    report(
        state.account.request_password_reset(email).await,
        "Password reset link sent! Check your email.",
        "Could not request a reset link.",
    );
}

async fn resetpw(state: &AppState, args: &[&str]) {
    let (new, confirm) = (
        args.first().copied().unwrap_or_default(),
        args.get(1).copied().unwrap_or_default(),
    );
    report(
        state.account.reset_password(new, confirm).await,
        "Password updated successfully!",
        "Failed to update password.",
    );
}

async fn feed(state: &AppState) {
    match state.feed.list_posts().await {
        Ok(posts) if posts.is_empty() => {
            println!("No posts yet. Be the first to share your impact!");
        }
        Ok(posts) => {
            for post in posts {
                println!(
                    "[{}] {}: {}{}",
                    post.created_at.format("%Y-%m-%d %H:%M"),
                    post.author_name(),
                    post.caption.as_deref().unwrap_or(""),
                    post.image_url
                        .as_deref()
                        .map(|url| format!(" (image: {})", url))
                        .unwrap_or_default(),
                );
            }
        }
        Err(err) => {
            tracing::error!("{}", err);
            println!("Could not load the feed.");
        }
    }
}

async fn post(state: &AppState, args: &[&str]) {
    let mut image = None;
    let mut caption_parts = args;

    if args.first() == Some(&"--image") {
        let Some(path) = args.get(1) else {
            println!("Usage: post [--image <path>] [text]");
            return;
        };
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                image = Some(PostImage {
                    file_name: path.to_string(),
                    content_type: content_type_for(path),
                    bytes,
                });
            }
            Err(err) => {
                println!("Could not read {}: {}", path, err);
                return;
            }
        }
        caption_parts = &args[2..];
    }

    let caption = caption_parts.join(" ");
    report(
        state.feed.create_post(&caption, image).await,
        "Post shared successfully!",
        "Failed to share the post. Please try again.",
    );
}

fn content_type_for(path: &str) -> String {
    let ext = path.rsplit('.').next().unwrap_or_default().to_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
    .to_string()
}

async fn community(state: &AppState, args: &[&str]) {
    match args.first().copied() {
        Some("create") => {
            let Some(name) = args.get(1) else {
                println!("Usage: community create <name> [description]");
                return;
            };
            let description = args[2..].join(" ");
            report(
                state.communities.create(name, &description).await,
                "Community created!",
                "Failed to create community.",
            );
        }
        Some("search") => {
            let query = args[1..].join(" ");
            match state.communities.search(&query).await {
                Ok(results) if results.is_empty() => println!("No results found."),
                Ok(results) => {
                    for community in results {
                        println!(
                            "{}  {} — {}",
                            community.id,
                            community.name,
                            community.description.as_deref().unwrap_or(""),
                        );
                    }
                }
                Err(err) => {
                    tracing::error!("{}", err);
                    println!("Search failed.");
                }
            }
        }
        Some("join") => {
            let Some(id) = parse_id(args.get(1)) else { return };
            report(
                state.communities.join(id).await,
                "Joined community!",
                "Failed to join community.",
            );
        }
        _ => println!("Usage: community create|search|join ..."),
    }
}

async fn challenge(state: &AppState, args: &[&str]) {
    match args.first().copied() {
        Some("create") => {
            let Some(title) = args.get(1) else {
                println!("Usage: challenge create <title> [description]");
                return;
            };
            let description = args[2..].join(" ");
            report(
                state.challenges.create(title, &description).await,
                "Challenge created!",
                "Failed to create challenge",
            );
        }
        Some("search") => {
            let query = args[1..].join(" ");
            match state.challenges.search(&query).await {
                Ok(results) if results.is_empty() => println!("No results found."),
                Ok(results) => {
                    for challenge in results {
                        println!(
                            "{}  {} — {}",
                            challenge.id,
                            challenge.title,
                            challenge.description.as_deref().unwrap_or(""),
                        );
                    }
                }
                Err(err) => {
                    tracing::error!("{}", err);
                    println!("Search failed");
                }
            }
        }
        Some("join") => {
            let Some(id) = parse_id(args.get(1)) else { return };
            report(
                state.challenges.join(id).await,
                "Joined challenge!",
                "Failed to join",
            );
        }
        Some("mine") => match state.challenges.list_mine().await {
            Ok(rows) if rows.is_empty() => println!("No challenges yet."),
            Ok(rows) => {
                for row in rows {
                    let title = row
                        .challenges
                        .as_ref()
                        .map(|c| c.title.as_str())
                        .unwrap_or("(unknown)");
                    let completed = row
                        .completed_at
                        .map(|at| format!(" — completed at {}", at.format("%Y-%m-%d %H:%M")))
                        .unwrap_or_default();
                    println!("{} — status: {}{}", title, row.status.as_str(), completed);
                }
            }
            Err(err) => {
                tracing::error!("{}", err);
                println!("Could not load your challenges.");
            }
        },
        Some("complete") => {
            let Some(id) = parse_id(args.get(1)) else { return };
            report(
                state.challenges.complete(id).await,
                "Marked completed!",
                "Failed to mark completed",
            );
        }
        _ => println!("Usage: challenge create|search|join|mine|complete ..."),
    }
}

async fn account(state: &AppState, args: &[&str]) {
    match args.first().copied() {
        Some("password") => {
            let (new, confirm) = (
                args.get(1).copied().unwrap_or_default(),
                args.get(2).copied().unwrap_or_default(),
            );
            report(
                state.account.change_password(new, confirm).await,
                "Password changed successfully",
                "Failed to change password",
            );
        }
        Some("resend") => report(
            state.account.resend_verification().await,
            "Verification email sent",
            "Failed to resend verification email",
        ),
        Some("delete") => {
            println!("{}", state.account.request_account_deletion());
        }
        _ => println!("Usage: account password|resend|delete ..."),
    }
}

async fn profile(state: &AppState, args: &[&str]) {
    match args.first().copied() {
        Some("bio") => {
            let bio = args[1..].join(" ");
            report(
                state.profile.save_bio(&bio).await,
                "Profile saved",
                "Failed to save profile",
            );
        }
        _ => match state.profile.load().await {
            Ok(overview) => {
                println!("Username:    {}", display_name(&overview.green_name));
                println!("Bio:         {}", overview.bio);
                println!("Posts count: {}", overview.posts_count);
            }
            Err(err) if err.is_local() => println!("{}", err.message()),
            Err(err) => {
                tracing::error!("{}", err);
                println!("Could not load your profile.");
            }
        },
    }
}

async fn settings(state: &AppState, args: &[&str]) {
    match args.first().copied() {
        Some("save") => {
            let (Some(email), Some(push)) = (
                args.get(1).and_then(|s| parse_flag(s)),
                args.get(2).and_then(|s| parse_flag(s)),
            ) else {
                println!("Usage: settings save <on|off> <on|off>");
                return;
            };
            report(
                state.settings.save(email, push).await,
                "Preferences saved!",
                "Failed to save preferences",
            );
        }
        _ => match state.settings.load().await {
            Ok(settings) => {
                println!("Email notifications: {}", on_off(settings.email_notifications));
                println!("Push notifications:  {}", on_off(settings.push_notifications));
            }
            Err(err) if err.is_local() => println!("{}", err.message()),
            Err(err) => {
                tracing::error!("{}", err);
                println!("Could not load your settings.");
            }
        },
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

async fn feedback(state: &AppState, line: &str) {
    let text = line.strip_prefix("feedback").unwrap_or_default().trim();
    report(
        state.settings.submit_feedback(text).await,
        "Thank you for your feedback!",
        "Failed to submit feedback",
    );
}

fn resources() {
    println!("Resources:");
    for (title, url) in RESOURCES {
        println!("  {} — {}", title, url);
    }
}
