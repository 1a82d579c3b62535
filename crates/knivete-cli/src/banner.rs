use crate::commands::migrate::MigrateSettings;

const WIDTH: usize = 64;

/// Print the run header with the effective settings.
pub fn print_banner(settings: &MigrateSettings) {
    for line in banner_lines(settings) {
        println!("{line}");
    }
}

fn banner_lines(settings: &MigrateSettings) -> Vec<String> {
    let version = env!("CARGO_PKG_VERSION");
    let mode = if settings.dry_run { "dry-run" } else { "live" };
    let audit = settings
        .http_log
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "off".to_string());
    let config = settings
        .config_source
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    let bookkeeping = format!(
        "{} / {}",
        settings.config.bookkeeping.table, settings.config.bookkeeping.view
    );

    let title = format!("Knivete v{version}");
    let title_dashes = WIDTH.saturating_sub(title.len() + 7);
    let inner = WIDTH - 4;
    let row = |label: &str, value: &str| {
        let text = format!("{label:<12}{value}");
        format!("│ {text:<inner$} │")
    };

    vec![
        format!("╭─── {title} {}╮", "─".repeat(title_dashes)),
        row("Server", &settings.server),
        row("Directory", &settings.directory.display().to_string()),
        row("Mode", mode),
        row("Config", &config),
        row("Bookkeeping", &bookkeeping),
        row("HTTP log", &audit),
        format!("╰{}╯", "─".repeat(WIDTH - 2)),
    ]
}
