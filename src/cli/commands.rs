//! CLI command definitions and handlers

use clap::Subcommand;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

use crate::core::models::{
    DocumentTranslateOptions, GlossaryImport, MemoryImport, Translation, TranslateInput,
    TranslateOptions, TranslationStyle,
};
use crate::core::storage::write_to_file;
use crate::services::translator::Translator;

/// Commands for the Lara CLI
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List supported languages
    Languages,

    /// Translate one or more texts
    Translate {
        /// Text to translate, repeat for several texts
        #[arg(required = true)]
        text: Vec<String>,

        /// Target language
        #[arg(short, long)]
        target: String,

        /// Source language (auto-detect if not specified)
        #[arg(short, long)]
        source: Option<String>,

        /// Memory IDs to adapt to
        #[arg(long)]
        adapt_to: Vec<String>,

        /// Glossary IDs to apply
        #[arg(long)]
        glossary: Vec<String>,

        /// Free-form instructions for the translator
        #[arg(long)]
        instruction: Vec<String>,

        /// faithful, fluid or creative
        #[arg(long, value_parser = parse_style)]
        style: Option<TranslationStyle>,

        /// Ask the service not to trace this request
        #[arg(long)]
        no_trace: bool,
    },

    /// Translate a document and save the result
    Document {
        /// Input file
        #[arg(short, long)]
        file: PathBuf,

        /// Output file (default: <name>_<target>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target language
        #[arg(short, long)]
        target: String,

        /// Source language (auto-detect if not specified)
        #[arg(short, long)]
        source: Option<String>,

        /// Output format, e.g. pdf
        #[arg(long)]
        output_format: Option<String>,

        /// Glossary IDs to apply
        #[arg(long)]
        glossary: Vec<String>,

        /// faithful, fluid or creative
        #[arg(long, value_parser = parse_style)]
        style: Option<TranslationStyle>,

        /// Give up after this many seconds
        #[arg(long)]
        max_wait_secs: Option<u64>,
    },

    /// Import a TMX file into a memory
    MemoryImport {
        /// Memory ID
        #[arg(short, long)]
        memory: String,

        /// TMX file, optionally gzipped
        #[arg(short, long)]
        file: PathBuf,

        /// Treat the file as gzip regardless of its extension
        #[arg(long)]
        gzip: bool,
    },

    /// Import a CSV file into a glossary
    GlossaryImport {
        /// Glossary ID
        #[arg(short, long)]
        glossary: String,

        /// CSV file, optionally gzipped
        #[arg(short, long)]
        file: PathBuf,

        /// Treat the file as gzip regardless of its extension
        #[arg(long)]
        gzip: bool,
    },

    /// Export glossary terms
    GlossaryExport {
        /// Glossary ID
        #[arg(short, long)]
        glossary: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Export format
        #[arg(long, default_value = "csv/table-uni")]
        content_type: String,

        /// Source language of a unidirectional export
        #[arg(short, long)]
        source: Option<String>,
    },
}

fn parse_style(value: &str) -> Result<TranslationStyle, String> {
    serde_json::from_value(serde_json::Value::from(value.to_lowercase()))
        .map_err(|_| format!("unknown style '{}' (faithful, fluid, creative)", value))
}

fn progress_bar(len: u64) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?
            .progress_chars("=>-"),
    );
    Ok(pb)
}

fn default_output(file: &Path, target: &str) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let name = match file.extension() {
        Some(ext) => format!("{}_{}.{}", stem, target, ext.to_string_lossy()),
        None => format!("{}_{}", stem, target),
    };
    file.with_file_name(name)
}

/// Handle languages command
pub async fn handle_languages(translator: &Translator) -> anyhow::Result<()> {
    let languages = translator.languages().await?;

    println!("{} supported languages:", languages.len());
    for language in languages {
        println!("   {}", language);
    }

    Ok(())
}

/// Handle text translation command
#[allow(clippy::too_many_arguments)]
pub async fn handle_translate(
    translator: &Translator,
    text: Vec<String>,
    target: String,
    source: Option<String>,
    adapt_to: Vec<String>,
    glossaries: Vec<String>,
    instructions: Vec<String>,
    style: Option<TranslationStyle>,
    no_trace: bool,
) -> anyhow::Result<()> {
    let options = TranslateOptions {
        adapt_to: (!adapt_to.is_empty()).then_some(adapt_to),
        glossaries: (!glossaries.is_empty()).then_some(glossaries),
        instructions: (!instructions.is_empty()).then_some(instructions),
        style,
        no_trace: no_trace.then_some(true),
        ..Default::default()
    };

    let input = match <[String; 1]>::try_from(text) {
        Ok([single]) => TranslateInput::from(single),
        Err(texts) => TranslateInput::from(texts),
    };

    info!("Translating to {}", target);
    let result = translator
        .translate(input, source.as_deref(), &target, Some(&options))
        .await?;

    println!("Source language: {}", result.source_language);
    match &result.translation {
        Translation::Multiple(texts) => {
            for (i, text) in texts.iter().enumerate() {
                println!("{}. {}", i + 1, text);
            }
        }
        other => println!("{}", other),
    }

    Ok(())
}

/// Handle document translation command
#[allow(clippy::too_many_arguments)]
pub async fn handle_document(
    translator: &Translator,
    file: PathBuf,
    output: Option<PathBuf>,
    target: String,
    source: Option<String>,
    output_format: Option<String>,
    glossaries: Vec<String>,
    style: Option<TranslationStyle>,
    max_wait_secs: Option<u64>,
) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let output = output.unwrap_or_else(|| default_output(&file, &target));

    info!("Input: {}", file.display());
    info!("Output: {}", output.display());

    let options = DocumentTranslateOptions {
        glossaries: (!glossaries.is_empty()).then_some(glossaries),
        style,
        output_format,
        max_wait: max_wait_secs.map(Duration::from_secs),
        ..Default::default()
    };

    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Translating {}", file.display()));

    let stream = match translator
        .documents
        .translate(&file, source.as_deref(), &target, Some(&options))
        .await
    {
        Ok(stream) => stream,
        Err(e) => {
            pb.finish_with_message("Failed");
            return Err(e.into());
        }
    };
    let written = write_to_file(stream, &output).await?;
    pb.finish_with_message("Completed");

    println!("\n✅ Document translated!");
    println!("   Output: {}", output.display());
    println!("   Size: {} bytes", written);
    println!("   Time: {:?}", start_time.elapsed());

    Ok(())
}

/// Handle memory import command
pub async fn handle_memory_import(
    translator: &Translator,
    memory: String,
    file: PathBuf,
    gzip: bool,
) -> anyhow::Result<()> {
    let import = translator
        .memories
        .import_tmx(&memory, &file, gzip.then_some(true))
        .await?;

    let pb = progress_bar(100)?;
    pb.set_message(format!("Importing {}", file.display()));
    let import = translator
        .memories
        .wait_for_import(
            import,
            Some(|job: &MemoryImport| pb.set_position((job.progress * 100.0) as u64)),
            None,
        )
        .await?;
    pb.finish_with_message("Completed");

    println!("\n✅ Import {} completed into memory {}", import.id, memory);

    Ok(())
}

/// Handle glossary import command
pub async fn handle_glossary_import(
    translator: &Translator,
    glossary: String,
    file: PathBuf,
    gzip: bool,
) -> anyhow::Result<()> {
    let import = translator
        .glossaries
        .import_csv(&glossary, &file, gzip.then_some(true))
        .await?;

    let pb = progress_bar(100)?;
    pb.set_message(format!("Importing {}", file.display()));
    let import = translator
        .glossaries
        .wait_for_import(
            import,
            Some(|job: &GlossaryImport| pb.set_position((job.progress * 100.0) as u64)),
            None,
        )
        .await?;
    pb.finish_with_message("Completed");

    println!("\n✅ Import {} completed into glossary {}", import.id, glossary);

    Ok(())
}

/// Handle glossary export command
pub async fn handle_glossary_export(
    translator: &Translator,
    glossary: String,
    output: PathBuf,
    content_type: String,
    source: Option<String>,
) -> anyhow::Result<()> {
    let bytes = translator
        .glossaries
        .export(&glossary, &content_type, source.as_deref())
        .await?;
    tokio::fs::write(&output, &bytes).await?;

    println!("✅ Exported {} bytes to {}", bytes.len(), output.display());

    Ok(())
}
