// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Command line front end for the merge engine
//!
//! Renders a template container (or a single XML part) against a JSON data
//! file, lists the tags of a template, and lists the available filters.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use docmerge::engine::MARKUP_PART;
use docmerge::{
    DocumentPackage, EngineConfig, MergeEngine, MergeError, MergeOptions, NumberLocale,
    PartialMerge,
};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

/// Exit code for a merge whose tags failed
const EXIT_PLACEHOLDERS: i32 = 2;

#[derive(Parser)]
#[command(name = "docmerge")]
#[command(about = "Merge JSON data into document templates")]
#[command(version)]
#[command(author = "OctoFHIR Team <funyloony@gmail.com>")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Number formatting locale for the built-in filters (en-US, en-GB, fr-FR, de-DE)
    #[arg(long, global = true, default_value = "en-US")]
    locale: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct MergeArgs {
    /// JSON file with merge options, e.g. {"paragraphLoop": true}
    #[arg(long)]
    options: Option<PathBuf>,
    /// Repeat whole paragraphs for sections whose markers stand alone
    #[arg(long)]
    paragraph_loop: bool,
    /// Turn newlines in values into line breaks
    #[arg(long)]
    linebreaks: bool,
    /// Text rendered in place of failing tags
    #[arg(long)]
    error_marker: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template against JSON data
    Render {
        /// Template container (.docx, .pptx, zip) or a single .xml part
        template: PathBuf,
        /// JSON data file (reads from stdin if not provided)
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        merge: MergeArgs,
    },
    /// List every tag of a template with its compile status
    Check {
        /// Template container
        template: PathBuf,
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        merge: MergeArgs,
    },
    /// List the registered filters
    Filters,
}

fn main() {
    // Setup human-panic for better error messages
    human_panic::setup_panic!();

    let cli = Cli::parse();
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let Some(locale) = NumberLocale::for_tag(&cli.locale) else {
        bail!("unknown locale '{}'", cli.locale);
    };
    let engine = MergeEngine::new(EngineConfig::with_locale(locale));

    match cli.command {
        Commands::Render {
            template,
            data,
            output,
            merge,
        } => handle_render(&engine, &template, data.as_deref(), &output, &merge),
        Commands::Check {
            template,
            json,
            merge,
        } => handle_check(&engine, &template, json, &merge),
        Commands::Filters => {
            for name in engine.registry().names() {
                let doc = engine
                    .registry()
                    .get(&name)
                    .map(|filter| filter.documentation().to_string())
                    .unwrap_or_default();
                println!("{name:<12} {doc}");
            }
            Ok(0)
        }
    }
}

fn handle_render(
    engine: &MergeEngine,
    template: &Path,
    data: Option<&Path>,
    output: &Path,
    args: &MergeArgs,
) -> Result<i32> {
    let options = merge_options(args)?;
    let data = read_data(data)?;

    let markup = is_markup(template);
    let result = if markup {
        let xml = fs::read_to_string(template)
            .with_context(|| format!("reading template '{}'", template.display()))?;
        engine
            .render_markup(&xml, &data, &options)
            .map(String::into_bytes)
    } else {
        let bytes = fs::read(template)
            .with_context(|| format!("reading template '{}'", template.display()))?;
        engine.merge_bytes(&bytes, &data, &options)
    };

    match result {
        Ok(bytes) => {
            write_output(output, &bytes)?;
            Ok(0)
        }
        Err(err @ MergeError::Placeholders(_)) => {
            eprintln!("{}", err.report().to_json());
            // the document is still complete; failing tags render empty or as the marker
            if let Some(partial) = err.partial() {
                write_output(output, &partial_bytes(partial, markup)?)?;
            }
            Ok(EXIT_PLACEHOLDERS)
        }
        Err(err) => {
            eprintln!("{}", err.report().to_json());
            Ok(1)
        }
    }
}

fn write_output(output: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(output, bytes).with_context(|| format!("writing '{}'", output.display()))?;
    log::info!("Wrote {}", output.display());
    Ok(())
}

/// Bytes of a partially merged document, in the form the template came in
fn partial_bytes(partial: &PartialMerge, markup: bool) -> Result<Vec<u8>> {
    if !markup {
        return Ok(partial.document.write_zip()?);
    }
    partial
        .document
        .part(MARKUP_PART)
        .map(|part| part.data.clone())
        .context("rendered markup part is missing")
}

fn handle_check(engine: &MergeEngine, template: &Path, json: bool, args: &MergeArgs) -> Result<i32> {
    let options = merge_options(args)?;
    let package = if is_markup(template) {
        let xml = fs::read(template)
            .with_context(|| format!("reading template '{}'", template.display()))?;
        DocumentPackage::from_parts(vec![docmerge::PackagePart::new(MARKUP_PART, xml)])
    } else {
        let bytes = fs::read(template)
            .with_context(|| format!("reading template '{}'", template.display()))?;
        DocumentPackage::read_zip(&bytes)?
    };

    let reports = engine.scan(&package, &options)?;
    let failing = reports.iter().filter(|r| r.problem.is_some()).count();
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            let status = report.problem.as_deref().unwrap_or("ok");
            println!(
                "{}\t{}\t{{{}}}\t{status}",
                report.part,
                report.kind.label(),
                report.expression
            );
        }
        println!("{} tags, {failing} with problems", reports.len());
    }
    Ok(if failing > 0 { EXIT_PLACEHOLDERS } else { 0 })
}

fn merge_options(args: &MergeArgs) -> Result<MergeOptions> {
    let mut options = match &args.options {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading options '{}'", path.display()))?;
            MergeOptions::from_json(&json)?
        }
        None => MergeOptions::default(),
    };
    options.paragraph_loop |= args.paragraph_loop;
    options.linebreaks |= args.linebreaks;
    if args.error_marker.is_some() {
        options.error_marker = args.error_marker.clone();
    }
    Ok(options)
}

fn read_data(path: Option<&Path>) -> Result<Value> {
    let text = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading data '{}'", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading data from stdin")?;
            buffer
        }
    };
    serde_json::from_str(&text).context("parsing data JSON")
}

fn is_markup(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_documents_are_written_in_template_form() {
        let engine = MergeEngine::default();
        let err = engine
            .render_markup("<w:t>{a}{b | nope}</w:t>", &json!({"a": "kept"}), &MergeOptions::default())
            .unwrap_err();
        let partial = err.partial().unwrap();

        let markup = partial_bytes(partial, true).unwrap();
        assert_eq!(
            String::from_utf8(markup).unwrap(),
            "<w:t xml:space=\"preserve\">kept</w:t>"
        );

        let zipped = partial_bytes(partial, false).unwrap();
        let package = DocumentPackage::read_zip(&zipped).unwrap();
        assert_eq!(package.parts().len(), 1);
        assert_eq!(package.parts()[0].name, MARKUP_PART);
    }
}
