use clap::Parser;
use directories::ProjectDirs;
use joplin_sticky::api::StickyApi;
use joplin_sticky::commands::config::ConfigAction;
use joplin_sticky::commands::windows::{self, WindowAction};
use joplin_sticky::commands::{auth, CmdMessage, StickyPaths};
use joplin_sticky::config::StickyConfig;
use joplin_sticky::error::{Result, StickyError};
use joplin_sticky::logging;
use joplin_sticky::picker;
use joplin_sticky::render::open_note_url;
use joplin_sticky::settings::Settings;
use joplin_sticky::source::joplin::JoplinClient;
use std::path::PathBuf;

mod args;
mod print;
use args::{Cli, Commands, WindowCommands};
use print::{print_config, print_info, print_messages, print_rows, print_windows};

const HOME_ENV: &str = "STICKY_HOME";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct AppContext {
    api: StickyApi<JoplinClient>,
    config: StickyConfig,
    connected: bool,
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let ctx = init_context()?;

    match cli.command {
        Some(Commands::Auth { token }) => handle_auth(&ctx, token),
        Some(Commands::Ping) => handle_ping(&ctx),
        Some(Commands::Tree) => handle_tree(&ctx),
        Some(Commands::Pick { selector, window }) => handle_pick(&ctx, &selector, window),
        Some(Commands::Info { note_id }) => handle_info(&ctx, &note_id),
        Some(Commands::Link { window }) => handle_link(&ctx, window),
        Some(Commands::Reload) => handle_reload(&ctx),
        Some(Commands::Windows { action }) => handle_windows(&ctx, action),
        Some(Commands::Config { key, value }) => handle_config(&ctx, key, value),
        None => handle_tree(&ctx),
    }
}

fn data_dir() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(home));
    }
    ProjectDirs::from("org", "joplin-sticky-notes", "joplin-sticky-notes")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| StickyError::Config("Could not determine the data directory".into()))
}

fn init_context() -> Result<AppContext> {
    let paths = StickyPaths::new(data_dir()?);
    let config = StickyConfig::load(&paths.data_dir).unwrap_or_default();
    let settings = Settings::load(&paths.data_dir)?;

    let mut client = JoplinClient::new(config.api_url.clone(), config.timeout());
    let connected = settings.api_token.is_some();
    if let Some(token) = settings.api_token {
        client = client.with_token(token);
    }
    let api = StickyApi::new(client, config.fetch_strategy(), paths);

    Ok(AppContext {
        api,
        config,
        connected,
    })
}

fn ensure_connected(ctx: &AppContext) -> Result<()> {
    if ctx.connected {
        return Ok(());
    }
    Err(StickyError::Auth(
        "Not connected to Joplin; run `sticky auth` first".into(),
    ))
}

fn handle_auth(ctx: &AppContext, token: Option<String>) -> Result<()> {
    if let Some(token) = token {
        auth::save_token(ctx.api.paths(), token)?;
        print_messages(&[CmdMessage::success("Token saved.")]);
        return Ok(());
    }

    print_messages(&[CmdMessage::info(
        "Waiting for you to accept the authorization request in Joplin...",
    )]);
    let result = auth::run(
        ctx.api.context().source(),
        &ctx.config.auth_policy(),
        ctx.api.paths(),
    )?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_ping(ctx: &AppContext) -> Result<()> {
    let result = ctx.api.ping()?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_tree(ctx: &AppContext) -> Result<()> {
    ensure_connected(ctx)?;
    let result = ctx.api.refresh_hierarchy()?;
    let rows = result
        .hierarchy
        .as_deref()
        .map(picker::rows)
        .unwrap_or_default();
    print_rows(&rows);
    print_messages(&result.messages);
    Ok(())
}

fn handle_pick(ctx: &AppContext, selector: &str, window: Option<usize>) -> Result<()> {
    ensure_connected(ctx)?;
    let result = ctx.api.pick_into_window(selector, window)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_info(ctx: &AppContext, note_id: &str) -> Result<()> {
    ensure_connected(ctx)?;
    let result = ctx.api.note_info(note_id)?;
    if let Some(info) = &result.info {
        print_info(info);
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_link(ctx: &AppContext, index: usize) -> Result<()> {
    let settings = Settings::load(&ctx.api.paths().data_dir)?;
    let window = windows::get(&settings, index)?;
    match &window.note_id {
        Some(note_id) => println!("{}", open_note_url(note_id)),
        None => print_messages(&[CmdMessage::warning(format!(
            "Window {} shows no note.",
            index
        ))]),
    }
    Ok(())
}

fn handle_reload(ctx: &AppContext) -> Result<()> {
    ensure_connected(ctx)?;
    let result = ctx.api.reload_windows()?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_windows(ctx: &AppContext, action: Option<WindowCommands>) -> Result<()> {
    let action = match action {
        None | Some(WindowCommands::List) => WindowAction::List,
        Some(WindowCommands::New) => WindowAction::New,
        Some(WindowCommands::Clone { index }) => WindowAction::Clone(index),
        Some(WindowCommands::Close { index }) => WindowAction::Close(index),
        Some(WindowCommands::CloseAll) => WindowAction::CloseAll,
        Some(WindowCommands::Toggle { index }) => WindowAction::ToggleBody(index),
        Some(WindowCommands::Hide { index }) => WindowAction::Hide(index),
        Some(WindowCommands::Show { index }) => WindowAction::Show(index),
    };
    let listing = action == WindowAction::List;

    let result = ctx.api.windows(action)?;
    if listing {
        print_windows(&result.windows);
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_config(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(key), None) => ConfigAction::ShowKey(key),
        (Some(key), Some(value)) => ConfigAction::Set(key, value),
    };
    let show_all = matches!(action, ConfigAction::ShowAll);

    let result = ctx.api.config(action)?;
    if let (true, Some(config)) = (show_all, &result.config) {
        print_config(config);
    }
    print_messages(&result.messages);
    Ok(())
}
