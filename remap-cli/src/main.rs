use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use remap::{
    apply_template, list_templates, load_text, missing_source_columns, save, skeleton, summarize,
    validate, Lookups, Table, TemplateRegistry,
};

#[derive(Parser, Debug)]
#[clap(name = "remap", about, version)]
struct Args {
    /// Increase output logging verbosity.
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Map an input CSV file through a template.
    Map {
        /// The input CSV file.
        input: PathBuf,
        /// The mapping template to apply.
        template: PathBuf,
        /// Where to write the mapped CSV.
        #[clap(short, long)]
        output: PathBuf,
    },
    /// Validate a template file and report any problems.
    Validate {
        /// The template file to check.
        template: PathBuf,
    },
    /// Create a new template skeleton in the templates directory.
    New {
        /// A name for the new template.
        name: String,
        /// Directory in which to store templates.
        #[clap(short, long, default_value = "templates")]
        dir: PathBuf,
    },
    /// List the template files in the templates directory.
    Templates {
        /// Directory in which templates are stored.
        #[clap(short, long, default_value = "templates")]
        dir: PathBuf,
    },
    /// Show which input columns feed each output column of a template.
    Summary {
        /// The template file to summarize.
        template: PathBuf,
    },
}

fn main() {
    let args = Args::parse();
    simple_logger::init_with_level(if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    })
    .unwrap();

    match run(args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            log::error!("Failed: {}", e);
            process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<i32> {
    let verbose = args.verbose;
    match args.command {
        Command::Map {
            input,
            template,
            output,
        } => {
            let registry = TemplateRegistry::new();
            let lookups = Lookups::new();
            let table = Table::from_csv_path(&input)
                .wrap_err_with(|| format!("failed to read input table {}", input.display()))?;
            let template = registry
                .get(&template)
                .wrap_err_with(|| format!("failed to load template {}", template.display()))?;
            for column in missing_source_columns(&table, &template) {
                log::warn!("Input has no column \"{}\"; it will map as empty", column);
            }
            let mapped = apply_template(&table, &template, &lookups)
                .wrap_err_with(|| format!("failed to apply template {}", template.name))?;
            mapped
                .to_csv_path(&output)
                .wrap_err_with(|| format!("failed to write {}", output.display()))?;
            if verbose {
                print_table(&mapped.head(20));
            }
            log::info!("Wrote {} rows to {}", mapped.rows(), output.display());
            Ok(0)
        }
        Command::Validate { template } => {
            let validation = validate(&load_text(&template)?)?;
            println!("{}", validation.message());
            Ok(if validation.is_valid() { 0 } else { 1 })
        }
        Command::New { name, dir } => {
            let saved = save(&skeleton(&name), &dir)?;
            if saved.used_fallback {
                log::warn!("Templates directory was not writable");
            }
            println!("{}", saved.path.display());
            Ok(0)
        }
        Command::Templates { dir } => {
            for path in list_templates(&dir) {
                println!("{}", path.display());
            }
            Ok(0)
        }
        Command::Summary { template } => {
            let summary = summarize(&load_text(&template)?)?;
            print_table(&summary);
            Ok(0)
        }
    }
}

fn print_table(table: &Table) {
    println!("{}", table.column_names().join("\t"));
    for i in 0..table.rows() {
        println!("{}", table.row(i).join("\t"));
    }
}
