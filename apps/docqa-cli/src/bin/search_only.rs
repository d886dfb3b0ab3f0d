use std::env;
use std::path::PathBuf;

use docqa_cli::{init_tracing, load_settings, open_service};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <query> [documents_dir]", args[0]);
        eprintln!("Example: {} 'crop rotation' ./data", args[0]);
        std::process::exit(1);
    }
    let query_text = &args[1];
    let settings = load_settings()?;
    let data_dir = args.get(2).map(PathBuf::from).unwrap_or_else(|| settings.data.documents_dir());
    println!("🔍 docqa-search\n==============");
    println!("Query: {}", query_text);
    println!("Documents directory: {}", data_dir.display());

    let service = open_service(&settings, &data_dir)?;
    let page = service.try_search(query_text, 1, service.default_page_size())?;
    println!("\n🔍 Found {} results for: \"{}\"", page.total, query_text);
    for (i, result) in page.results.iter().enumerate() {
        println!("\n  {}. score={:.4}  source={}  chunk={}", i + 1, result.relevance_score, result.document_name, result.chunk_index);
        println!("     📝 Context: {}", result.text);
    }
    Ok(())
}
