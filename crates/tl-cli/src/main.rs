use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tl_cli::commands::drag::DragArgs;
use tl_cli::commands::header::HeaderArgs;
use tl_cli::commands::layout::LayoutArgs;
use tl_cli::commands::resources::ResourcesArgs;
use tl_cli::commands::select::SelectArgs;
use tl_cli::commands::util::{load_document, save_document};
use tl_cli::commands::{collapse, drag, header, lanes, layout, resources, select};
use tl_cli::{Cli, Commands, Config};

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

#[expect(
    clippy::too_many_lines,
    reason = "CLI command dispatch is inherently verbose"
)]
fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init: tests may have installed a subscriber already
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = load_config(cli.config.as_deref())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Layout {
            doc,
            zoom,
            view_start,
            view_end,
            sync_parent_dates,
            json,
        } => {
            let document = load_document(doc)?;
            let args = LayoutArgs {
                zoom: *zoom,
                view_start: view_start.clone(),
                view_end: view_end.clone(),
                sync_parent_dates: *sync_parent_dates,
                json: *json,
            };
            layout::run(&mut out, &document, &args, &config)?;
        }
        Commands::Lanes { doc, json } => {
            let document = load_document(doc)?;
            lanes::run(&mut out, &document, *json)?;
        }
        Commands::Resources {
            doc,
            group_by_group,
            hide_empty,
            collapsed_groups,
            view_start,
            view_end,
            json,
        } => {
            let document = load_document(doc)?;
            let args = ResourcesArgs {
                group_by_group: *group_by_group,
                hide_empty: *hide_empty,
                collapsed_groups: collapsed_groups.clone(),
                view_start: view_start.clone(),
                view_end: view_end.clone(),
                json: *json,
            };
            resources::run(&mut out, &document, &args, &config)?;
        }
        Commands::Drag {
            doc,
            item,
            kind,
            dx,
            dy,
            zoom,
            apply,
            json,
        } => {
            let mut document = load_document(doc)?;
            let args = DragArgs {
                item: item.clone(),
                kind: *kind,
                dx: *dx,
                dy: *dy,
                zoom: *zoom,
                apply: *apply,
                json: *json,
            };
            if drag::run(&mut out, &mut document, &args, &config)? {
                save_document(doc, &document)?;
            }
        }
        Commands::Collapse {
            doc,
            item,
            apply,
            json,
        } => {
            let mut document = load_document(doc)?;
            if collapse::run(&mut out, &mut document, item, *apply, *json)? {
                save_document(doc, &document)?;
            }
        }
        Commands::Select {
            doc,
            clicks,
            all,
            json,
        } => {
            let document = load_document(doc)?;
            let args = SelectArgs {
                clicks: clicks.clone(),
                all: *all,
                json: *json,
            };
            select::run(&mut out, &document, &args, &config)?;
        }
        Commands::Header {
            doc,
            zoom,
            view_start,
            view_end,
            json,
        } => {
            let document = load_document(doc)?;
            let args = HeaderArgs {
                zoom: *zoom,
                view_start: view_start.clone(),
                view_end: view_end.clone(),
                json: *json,
            };
            header::run(&mut out, &document, &args, &config)?;
        }
    }

    out.flush()?;
    Ok(())
}
