use std::env;
use std::fs;
use std::path::PathBuf;

use docqa_cli::{init_tracing, load_settings, open_service, progress};
use docqa_core::data_processor::DataProcessor;
use docqa_qa::{ExtractiveAnswerer, QaEngine};

const USAGE: &str = "Usage: docqa <ingest|search|ask|status|list|remove> [args...]
  ingest <file>...                          store files as documents
  search <query> [--page N] [--page-size N] paginated lexical search
  ask <question> [--context-limit N]        answer with citations
  status                                    index status
  list                                      loaded documents
  remove <id>                               delete a stored document";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{}", USAGE); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

fn number_flag(args: &[String], i: usize, flag: &str) -> usize {
    match args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) {
        Some(n) => n,
        None => { eprintln!("Error: {} requires a number", flag); std::process::exit(1) }
    }
}

/// Positional words joined by spaces, plus numeric flags.
fn split_flags(args: &[String], flags: &[&str]) -> (String, Vec<(String, usize)>) {
    let mut words = Vec::new();
    let mut values = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if flags.contains(&args[i].as_str()) {
            values.push((args[i].clone(), number_flag(args, i, &args[i])));
            i += 1;
        } else {
            words.push(args[i].as_str());
        }
        i += 1;
    }
    (words.join(" "), values)
}

fn flag(values: &[(String, usize)], name: &str) -> Option<usize> {
    values.iter().rev().find(|(f, _)| f == name).map(|(_, v)| *v)
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let settings = load_settings()?;
    let data_dir = settings.data.documents_dir();
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "ingest" => {
            if args.is_empty() { eprintln!("Usage: docqa ingest <file>..."); std::process::exit(1); }
            fs::create_dir_all(&data_dir)?;
            let processor = DataProcessor::new();
            let pb = progress(args.len() as u64, "files");
            let mut saved = 0usize;
            for arg in &args {
                let path = PathBuf::from(arg);
                pb.set_message(arg.clone());
                let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| arg.clone());
                match fs::read_to_string(&path) {
                    Ok(content) => {
                        let (stored, _) = processor.save_document(&data_dir, &name, &content)?;
                        tracing::info!(file = %stored.display(), "stored document");
                        saved += 1;
                    }
                    Err(e) => tracing::warn!(file = %path.display(), error = %e, "cannot read file, skipping"),
                }
                pb.inc(1);
            }
            pb.finish_and_clear();
            let service = open_service(&settings, &data_dir)?;
            let status = service.status();
            println!("✅ Stored {} of {} files in {}", saved, args.len(), data_dir.display());
            println!("📊 {} documents, {} fragments indexed", status.sources_loaded, status.documents_loaded);
        }
        "search" => {
            let (query, values) = split_flags(&args, &["--page", "--page-size"]);
            if query.trim().is_empty() { eprintln!("Usage: docqa search <query> [--page N] [--page-size N]"); std::process::exit(1); }
            let service = open_service(&settings, &data_dir)?;
            let page = flag(&values, "--page").unwrap_or(1);
            let page_size = flag(&values, "--page-size").unwrap_or_else(|| service.default_page_size());
            let results = service.try_search(&query, page, page_size)?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        "ask" => {
            let (question, values) = split_flags(&args, &["--context-limit"]);
            let service = open_service(&settings, &data_dir)?;
            let limit = flag(&values, "--context-limit").or(settings.qa.context_limit);
            let qa = QaEngine::with_settings(service, Box::new(ExtractiveAnswerer::default()), &settings).with_context_limit(limit);
            let response = qa.answer(&question);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        "status" => {
            let service = open_service(&settings, &data_dir)?;
            println!("{}", serde_json::to_string_pretty(&service.status())?);
        }
        "list" => {
            let service = open_service(&settings, &data_dir)?;
            println!("{}", serde_json::to_string_pretty(&service.list_documents())?);
        }
        "remove" => {
            let Some(id) = args.first() else { eprintln!("Usage: docqa remove <id>"); std::process::exit(1) };
            let removed = DataProcessor::new().delete_document(&data_dir, id)?;
            println!("🗑️  Removed {}", removed.display());
        }
        _ => { eprintln!("Unknown command: {}\n{}", cmd, USAGE); std::process::exit(1); }
    }
    Ok(())
}
