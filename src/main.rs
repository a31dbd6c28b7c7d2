use clap::{ArgGroup, Parser, Subcommand};
use simple_layout::asset::TagFilter;
use simple_layout::layout::{Site, page_data};
use simple_layout::types::{AssetKind, Position, RouteInfo};
use simple_layout::{config, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "simple-layout")]
#[command(about = "Compose HTML pages from nested templates, views and assets")]
#[command(long_about = "\
Compose HTML pages from nested templates, views and assets

A site is a directory:

  site/
  ├── layout.toml                  # Layout config (optional)
  ├── web/                         # Local css/js assets (web_folder)
  │   ├── css/app.css
  │   └── js/app.js
  ├── templates/
  │   ├── main_template/
  │   │   ├── template.toml        # No parent: root template
  │   │   ├── layout.html          # Page shell with {% … %} directives
  │   │   └── blocks/menu.html     # Block, overridable by child templates
  │   └── blog/
  │       ├── template.toml        # parent = \"main_template\"
  │       └── blocks/menu.html
  └── views/
      ├── welcome.html             # MiniJinja, e.g. {{ user.name }}
      └── blog/post.md             # Markdown view

Directives: title, charset, metadata, http_equiv, breadcrumb,
css [tags | except tags], js [...], section NAME, block NAME, include TEMPLATE.

Run 'simple-layout gen-config' to generate a documented layout.toml.")]
#[command(version)]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    site: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one page to stdout or a file
    Render(RenderArgs),
    /// Validate layout.toml and resolve every template chain
    Check,
    /// Print a stock layout.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
#[command(group(ArgGroup::new("target").required(true).args(["view", "controller"])))]
struct RenderArgs {
    /// View rendered into the default content section
    #[arg(long)]
    view: Option<String>,

    /// Controller whose action view and conventional assets are rendered
    #[arg(long, requires = "action")]
    controller: Option<String>,

    /// Routed action name
    #[arg(long, requires = "controller")]
    action: Option<String>,

    /// Controller sub-directory (e.g. "admin/")
    #[arg(long, requires = "controller")]
    directory: Option<String>,

    /// Render this action's view instead of the routed one
    #[arg(long, requires = "controller")]
    virtual_action: Option<String>,

    /// Template to use instead of default_template
    #[arg(long)]
    template: Option<String>,

    /// Page title
    #[arg(long)]
    title: Option<String>,

    /// JSON file holding the page data object
    #[arg(long)]
    data: Option<PathBuf>,

    /// Autoload css/<view>.css and/or js/<view>.js (comma-separated)
    #[arg(long, value_delimiter = ',')]
    autoload: Vec<AssetKind>,

    /// Register every basic asset from layout.toml
    #[arg(long)]
    basic_assets: bool,

    /// Breadcrumb item as LABEL or LABEL=HREF (repeatable, in order)
    #[arg(long = "crumb")]
    crumbs: Vec<String>,

    /// Write the page to this file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simple_layout=warn".into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Render(args) => render(&cli.site, args)?,
        Command::Check => {
            println!("==> Checking {}", cli.site.display());
            let site = Site::open(&cli.site)?;
            let checks = site.templates().check_all()?;
            output::print_check_output(&checks, site.config());
            let failed = checks.iter().filter(|c| c.chain.is_err()).count();
            if failed > 0 {
                return Err(format!("{failed} template(s) failed to resolve").into());
            }
            println!("==> Site is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn render(root: &Path, args: RenderArgs) -> Result<(), Box<dyn std::error::Error>> {
    let site = Site::open(root)?;

    let route = match &args.controller {
        Some(controller) => {
            let action = args.action.clone().unwrap_or_default();
            RouteInfo::new(controller.as_str(), action)
                .with_directory(args.directory.clone().unwrap_or_default())
        }
        None => RouteInfo::default(),
    };
    let mut layout = site.layout(route);

    if let Some(template) = &args.template {
        layout.set_template(template)?;
    }
    if let Some(title) = &args.title {
        layout.set_title(title.as_str());
    }
    for crumb in &args.crumbs {
        let (label, href) = parse_crumb(crumb);
        layout.add_breadcrumb_item(label, href, Position::Last);
    }
    if args.basic_assets {
        layout.add_basic_assets(&TagFilter::All)?;
    }

    let data = match &args.data {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            page_data(serde_json::from_str(&content)?)?
        }
        None => Default::default(),
    };

    let page = match (&args.view, &args.virtual_action) {
        (Some(view), _) => layout.render_view(view, &data, &args.autoload)?,
        (None, Some(action)) => layout.render_virtual_action_view(action, &data)?,
        (None, None) => layout.render_action_view(&data)?,
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &page)?;
            let chain = site.templates().resolve_chain(layout.template())?;
            output::print_render_summary(&layout, &chain, path, page.len());
        }
        None => print!("{}", page),
    }
    Ok(())
}

/// Split `label=href` at the first `=`; a bare label has no link.
fn parse_crumb(crumb: &str) -> (&str, Option<&str>) {
    match crumb.split_once('=') {
        Some((label, href)) if !href.is_empty() => (label, Some(href)),
        Some((label, _)) => (label, None),
        None => (crumb, None),
    }
}
