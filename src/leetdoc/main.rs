use chrono::{DateTime, Utc};
use clap::Parser;
use colored::*;
use directories::ProjectDirs;
use leetdoc::api::{
    CmdMessage, CmdResult, ConfigAction, Direction, DocApi, LeetdocPaths, MessageLevel,
};
use leetdoc::config::LeetdocConfig;
use leetdoc::container::AddPosition;
use leetdoc::error::{LeetdocError, Result};
use leetdoc::index::DisplayDocument;
use leetdoc::model::Scope;
use leetdoc::store::fs::FileStore;
use leetdoc::terminal::TerminalHost;
use std::path::PathBuf;
use unicode_width::UnicodeWidthStr;

mod args;
use args::{Cli, Commands};

/// Overrides the global store location.
const GLOBAL_DIR_ENV: &str = "LEETDOC_GLOBAL_DIR";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct AppContext {
    api: DocApi<FileStore>,
    scope: Scope,
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut ctx = init_context(&cli)?;

    let result = match cli.command {
        Some(Commands::Init) => ctx.api.init(ctx.scope)?,
        Some(Commands::New { title }) => ctx.api.create_document(ctx.scope, title)?,
        Some(Commands::List) | None => return handle_list(&ctx),
        Some(Commands::Show { docs }) => return handle_show(&ctx, &docs),
        Some(Commands::Add {
            doc,
            section_type,
            title,
            before,
            after,
        }) => {
            let anchor = match (before.as_deref(), after.as_deref()) {
                (Some(sel), _) => Some((sel, AddPosition::Before)),
                (None, Some(sel)) => Some((sel, AddPosition::After)),
                (None, None) => None,
            };
            ctx.api
                .add_section(ctx.scope, &doc, section_type, title, anchor)?
        }
        Some(Commands::Edit { doc, section }) => ctx.api.edit_section(
            ctx.scope,
            &doc,
            &section,
            Box::new(TerminalHost::new()),
        )?,
        Some(Commands::Rm { doc, section }) => ctx.api.remove_section(ctx.scope, &doc, &section)?,
        Some(Commands::Up { doc, section }) => {
            ctx.api
                .move_section(ctx.scope, &doc, &section, Direction::Up)?
        }
        Some(Commands::Down { doc, section }) => {
            ctx.api
                .move_section(ctx.scope, &doc, &section, Direction::Down)?
        }
        Some(Commands::Rename {
            doc,
            section,
            title,
        }) => ctx.api.rename_section(ctx.scope, &doc, &section, title)?,
        Some(Commands::Retitle { doc, title }) => {
            ctx.api.retitle_document(ctx.scope, &doc, title)?
        }
        Some(Commands::Drop { docs }) => ctx.api.delete_documents(ctx.scope, &docs)?,
        Some(Commands::Path { doc }) => {
            println!("{}", ctx.api.document_path(ctx.scope, &doc)?.display());
            return Ok(());
        }
        Some(Commands::Export { docs, out }) => {
            ctx.api.export_documents(ctx.scope, &docs, &out)?
        }
        Some(Commands::Import { paths }) => ctx.api.import_documents(ctx.scope, paths)?,
        Some(Commands::Config { key, value }) => return handle_config(&ctx, key, value),
    };

    finish(&result)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let project_dir = cwd.join(".leetdoc");

    let global_dir = match std::env::var_os(GLOBAL_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => ProjectDirs::from("com", "leetdoc", "leetdoc")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| LeetdocError::Store("Could not determine data dir".to_string()))?,
    };

    let scope = if cli.global {
        Scope::Global
    } else {
        Scope::Project
    };

    let store = FileStore::new(Some(project_dir.clone()), global_dir.clone());
    let paths = LeetdocPaths {
        project: Some(project_dir),
        global: global_dir,
    };

    Ok(AppContext {
        api: DocApi::new(store, paths),
        scope,
    })
}

fn finish(result: &CmdResult) -> Result<()> {
    print_messages(&result.messages);
    if result.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn handle_list(ctx: &AppContext) -> Result<()> {
    let result = ctx.api.list_documents(ctx.scope)?;
    print_documents(&result.listed_documents);
    finish(&result)
}

fn handle_show(ctx: &AppContext, docs: &[String]) -> Result<()> {
    let viewed = ctx.api.view_documents(ctx.scope, docs)?;
    let blocks = ctx.api.render_documents(ctx.scope, docs)?;
    for (i, (doc, lines)) in viewed.affected_documents.iter().zip(blocks).enumerate() {
        if i > 0 {
            println!("\n================================\n");
        }
        println!("{} {}", doc.title.bold(), doc.short_id().dimmed());
        println!("--------------------------------");
        for line in lines {
            if line.starts_with("## ") {
                println!("\n{}", line.yellow());
            } else {
                println!("{}", line);
            }
        }
    }
    finish(&viewed)
}

fn handle_config(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };

    let result = ctx.api.config(ctx.scope, action)?;
    if let (Some(config), true) = (&result.config, result.messages.is_empty()) {
        print_config(config);
    }
    finish(&result)
}

fn print_config(config: &LeetdocConfig) {
    for key in LeetdocConfig::keys() {
        let value = config.get(&key).unwrap_or_default();
        println!("{} = {}", key.bold(), value);
    }
}

fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const COUNT_WIDTH: usize = 14;

fn print_documents(docs: &[DisplayDocument]) {
    if docs.is_empty() {
        println!("No documents found.");
        return;
    }

    for dd in docs {
        let idx_str = format!("{:>3}. ", dd.index);
        let count = match dd.summary.section_count {
            1 => "1 section".to_string(),
            n => format!("{} sections", n),
        };
        let count = format!("{:>width$}", count, width = COUNT_WIDTH);
        let time_ago = format_time_ago(dd.summary.metadata.last_saved_at);

        let fixed_width = idx_str.width() + COUNT_WIDTH + TIME_WIDTH + 2;
        let available = LINE_WIDTH.saturating_sub(fixed_width);
        let title = truncate_to_width(&dd.summary.title, available);
        let padding = available.saturating_sub(title.width());

        println!(
            "{}{}{}{}  {}",
            idx_str.yellow(),
            title,
            " ".repeat(padding),
            count.dimmed(),
            time_ago.dimmed()
        );
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthChar;

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = timeago::Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}
