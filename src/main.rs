mod app;
mod cli;
mod config;
mod datasources;
mod db;
mod error;
mod logic;
mod models;
mod storage;
mod ui;

use app::{App, LoadState};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use datasources::{AuthClient, CatalogClient};
use db::Database;
use dialoguer::{Input, Password};
use error::{CropSyncError, Result};
use logic::CropStore;
use models::{Crop, RegistrationForm, ThresholdField};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use ui::screens::SelectCropScreen;

type Store = CropStore<CatalogClient, Database>;
type Tui = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let Cli {
        command,
        config: config_path,
        data_dir,
        ..
    } = cli;

    match command {
        Some(Commands::Init) => {
            Config::setup_interactive(config_path)?;
        }
        Some(Commands::Register) => {
            let config = Config::load_or_default(config_path)?;
            register(&config).await?;
        }
        Some(Commands::Check) => {
            let (config, db) = open_local(config_path, data_dir.as_ref())?;
            check(&config, &db).await?;
        }
        None => {
            let (config, db) = open_local(config_path, data_dir.as_ref())?;
            if let Some(crop) = run_tui(&config, db).await? {
                println!("Using {}", crop);
                print_crop(&crop);
            }
        }
        Some(Commands::List) => {
            let store = loaded_store(config_path, data_dir.as_ref()).await?;
            print_crop_list(&store);
        }
        Some(Commands::Show) => {
            let store = loaded_store(config_path, data_dir.as_ref()).await?;
            match store.edited() {
                Some(crop) => {
                    println!("{} [{}]", crop, store.phase().as_str());
                    print_crop(crop);
                }
                None => println!("No crop selected. Run `cropsync select <ID>`."),
            }
        }
        Some(Commands::Select { id }) => {
            let mut store = loaded_store(config_path, data_dir.as_ref()).await?;
            let crop = store.select_crop_by_id(id)?;
            println!("Selected {}", crop);
            print_crop(&crop);
        }
        Some(Commands::Edit { field, value }) => {
            let field = ThresholdField::from_str(&field).ok_or_else(|| {
                let valid: Vec<&str> = ThresholdField::all().iter().map(|f| f.as_str()).collect();
                CropSyncError::InvalidData(format!(
                    "unknown field '{}' (expected one of: {})",
                    field,
                    valid.join(", ")
                ))
            })?;
            let mut store = loaded_store(config_path, data_dir.as_ref()).await?;
            let crop = store.edit_field(field, &value)?;
            println!("Updated {} of {}", field, crop);
            print_crop(&crop);
        }
        Some(Commands::Schedule { id, start, end }) => {
            let mut store = loaded_store(config_path, data_dir.as_ref()).await?;
            let window = store.schedule_irrigation(id, &start, &end)?;
            println!(
                "Irrigation for crop #{} set to {} - {}",
                id, window.start_time, window.end_time
            );
        }
        Some(Commands::Commit) => {
            let mut store = loaded_store(config_path, data_dir.as_ref()).await?;
            let crop = store.commit_selection()?;
            println!("Using {}", crop);
        }
    }

    Ok(())
}

fn open_local(
    config_path: Option<PathBuf>,
    data_dir: Option<&PathBuf>,
) -> Result<(Config, Database)> {
    let config = Config::load_or_default(config_path)?;
    let db = Database::open(data_dir)?;
    Ok((config, db))
}

fn build_store(config: &Config, db: Database) -> Result<Store> {
    let catalog = CatalogClient::new(config.api.clone())?;
    Ok(CropStore::new(catalog, db).with_pruning(config.storage.prune_orphaned_overrides))
}

async fn loaded_store(config_path: Option<PathBuf>, data_dir: Option<&PathBuf>) -> Result<Store> {
    let (config, db) = open_local(config_path, data_dir)?;
    let mut store = build_store(&config, db)?;
    store.load_crops().await?;
    Ok(store)
}

async fn check(config: &Config, db: &Database) -> Result<()> {
    println!("Catalog:       {}", config.api.base_url);
    println!("Local storage: {}", db.path().display());
    println!("Stored keys:   {}", db.storage_keys()?.join(", "));

    let client = CatalogClient::new(config.api.clone())?;
    match client.test_connection().await {
        Ok(true) => println!("Catalog connection: OK"),
        Ok(false) => println!("Catalog connection: responded with an error"),
        Err(e) => println!("Catalog connection: OFFLINE ({})", e),
    }
    Ok(())
}

async fn register(config: &Config) -> Result<()> {
    let prompt_err = |e: dialoguer::Error| CropSyncError::InvalidData(format!("Input error: {}", e));

    let form = RegistrationForm {
        name: Input::new()
            .with_prompt("Name")
            .interact_text()
            .map_err(prompt_err)?,
        email: Input::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(prompt_err)?,
        username: Input::new()
            .with_prompt("Username")
            .interact_text()
            .map_err(prompt_err)?,
        password: Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(prompt_err)?,
        confirm_password: Password::new()
            .with_prompt("Confirm Password")
            .interact()
            .map_err(prompt_err)?,
    };

    let request = form.into_request()?;
    let client = AuthClient::new(config.api.clone())?;
    let reply = client.register(&request).await?;
    println!("{}", reply);
    Ok(())
}

fn print_crop_list(store: &Store) {
    let selected_id = store.selected().map(|c| c.id);
    let overlay = store.repository().overrides().unwrap_or_default();

    println!(
        "  {:>5}  {:<20} {:>14} {:>16} {:>14}",
        "ID", "NAME", "TEMP (°C)", "SOIL MOIST (%)", "HUMIDITY (%)"
    );
    for crop in store.crops() {
        let marker = if Some(crop.id) == selected_id { "*" } else { " " };
        let edited = if overlay.contains_key(&crop.id) {
            " (edited)"
        } else {
            ""
        };
        println!(
            "{} {:>5}  {:<20} {:>14} {:>16} {:>14}{}",
            marker,
            crop.id,
            crop.name,
            format!("{} - {}", crop.min_temperature, crop.max_temperature),
            format!("{} - {}", crop.min_soil_moisture, crop.max_soil_moisture),
            format!("{} - {}", crop.min_humidity, crop.max_humidity),
            edited
        );
    }

    if let Some(crop) = store.selected() {
        if !store.crops().iter().any(|c| c.id == crop.id) {
            println!("* {} is selected but no longer in the catalog", crop);
        }
    }
}

fn print_crop(crop: &Crop) {
    for field in ThresholdField::all() {
        println!("  {:<22} {}", field.label(), field.get(crop));
    }
    match (crop.start_time.as_deref(), crop.end_time.as_deref()) {
        (Some(start), Some(end)) if !start.is_empty() => {
            println!("  {:<22} {} - {}", "Irrigation", start, end)
        }
        _ => {}
    }
    for range in crop.inverted_ranges() {
        println!("  warning: {} minimum exceeds maximum", range.as_str());
    }
}

async fn run_tui(config: &Config, db: Database) -> Result<Option<Crop>> {
    let store = build_store(config, db)?;
    let mut app = App::new(store);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    Ok(app.committed)
}

async fn run_app(terminal: &mut Tui, app: &mut App<CatalogClient, Database>) -> Result<()> {
    loop {
        terminal.draw(|f| {
            let area = f.area();
            let screen = SelectCropScreen::new(app.store.crops(), &app.load_state)
                .with_selection(app.store.selected(), app.store.edited(), app.store.phase())
                .with_cursor(app.select_state.list_index, app.select_state.focused_field)
                .input(app.select_state.input_active, &app.select_state.edit_buffer)
                .with_status(app.status_message.as_deref());
            f.render_widget(screen, area);
        })?;

        // The loading frame is drawn before the fetch starts
        if app.needs_reload {
            app.reload().await;
            continue;
        }

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key(app: &mut App<CatalogClient, Database>, code: KeyCode, modifiers: KeyModifiers) {
    if let KeyCode::Char('c') = code {
        if modifiers.contains(KeyModifiers::CONTROL) {
            app.quit();
            return;
        }
    }

    if app.select_state.input_active {
        handle_input_keys(app, code);
        return;
    }

    match app.load_state {
        LoadState::Loading => {
            if let KeyCode::Char('q') = code {
                app.quit();
            }
        }
        LoadState::Failed(_) => match code {
            KeyCode::Char('r') => app.request_reload(),
            KeyCode::Char('q') | KeyCode::Esc => app.quit(),
            _ => {}
        },
        LoadState::Ready => handle_select_keys(app, code),
    }
}

fn handle_input_keys(app: &mut App<CatalogClient, Database>, code: KeyCode) {
    match code {
        KeyCode::Esc => app.select_state.cancel_input(),
        KeyCode::Enter => app.apply_field_input(),
        KeyCode::Backspace => {
            app.select_state.edit_buffer.pop();
        }
        KeyCode::Char(c) if c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e') => {
            app.select_state.edit_buffer.push(c);
        }
        _ => {}
    }
}

fn handle_select_keys(app: &mut App<CatalogClient, Database>, code: KeyCode) {
    let editing = app.is_editing();
    let count = app.store.crops().len();

    match code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('r') => app.request_reload(),
        KeyCode::Char('e') => app.toggle_editing(),
        KeyCode::Char('u') => app.commit(),
        KeyCode::Esc if editing => app.toggle_editing(),
        KeyCode::Up | KeyCode::BackTab if editing => app.select_state.prev_field(),
        KeyCode::Down | KeyCode::Tab if editing => app.select_state.next_field(),
        KeyCode::Enter if editing => app.begin_field_input(),
        KeyCode::Up => app.select_state.prev(),
        KeyCode::Down => app.select_state.next(count),
        KeyCode::Enter => app.select_highlighted(),
        _ => {}
    }
}
