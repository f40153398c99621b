use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stylebook::{assemble::Assembler, config, output};

#[derive(Parser)]
#[command(name = "stylebook")]
#[command(about = "Style-guide assembler for reusable template fragments")]
#[command(long_about = "\
Style-guide assembler for reusable template fragments

Your filesystem is the data source. Directories of materials become browsable
collections, views are rendered inside layouts, and every material is
available to every page through the `material` helper.

Project structure:

  .
  ├── stylebook.toml                 # Project config (optional)
  └── src/
      ├── materials/
      │   ├── 01-structures/         # Collection
      │   │   ├── 01-page.html       # → structures.page
      │   │   └── 02-footer.html     # → structures.footer
      │   └── 02-components/
      │       ├── button.html        # → components.button
      │       ├── __base.html        # Partial only, not listed
      │       └── forms/             # Sub-collection of components
      │           └── input.html     # → forms.input
      ├── views/
      │   ├── index.html             # → dist/index.html
      │   ├── pages/about.html       # → dist/pages/about.html
      │   └── layouts/
      │       ├── default.html       # Contains {% body %}
      │       └── includes/head.html # Partial for layouts
      ├── data/site.yml              # → {{site.*}}
      └── docs/intro.md              # → {{docs.intro.content}}

Front matter fields with meaning:
  order   Sort position among siblings
  notes   Markdown shown with the material, not part of its data
  dna     Tags this material exposes for cross-reference scanning
  layout  Layout for a view (default from config)
  dest    Output path override for a view

Run 'stylebook gen-config' to generate a documented stylebook.toml.")]
#[command(version)]
struct Cli {
    /// Project root holding stylebook.toml and the source directories
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Output directory (overrides `dest` in stylebook.toml)
    #[arg(long, global = true)]
    dest: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse everything and write one HTML file per view
    Build,
    /// Parse everything and print the collection trees without writing
    Check,
    /// Print a stock stylebook.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build => {
            let mut assembler = Assembler::new(&cli.root)?;
            if let Some(dest) = &cli.dest {
                assembler.set_dest(dest);
            }
            let dest = assembler.paths().dest.clone();

            println!("==> Assembling {}", cli.root.display());
            let report = assembler.assemble()?;
            output::print_build_output(&report, &dest);
            println!("==> Build complete: {}", dest.display());
        }
        Command::Check => {
            let assembler = Assembler::new(&cli.root)?;
            println!("==> Checking {}", cli.root.display());
            let ctx = assembler.setup()?;
            output::print_check_output(&ctx);
            println!("==> Project is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the fmt subscriber. INFO by default so cross-reference
/// diagnostics show; `RUST_LOG` directives are honoured alongside.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
