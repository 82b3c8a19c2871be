use std::env;
use std::path::PathBuf;

use legalqa_core::chunker::Chunker;
use legalqa_core::config::{resolve_with_base, Config, Settings};
use legalqa_core::corpus::CorpusBuilder;
use legalqa_core::store::DirectoryDocumentStore;
use legalqa_core::traits::DocumentStore;
use legalqa_generate::get_default_synthesizer;
use legalqa_pipeline::QueryOrchestrator;
use legalqa_text::TfidfRetriever;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: legalqa <ask|retrieve|docs> [\"<question>\"] [--dir DIR]";

struct Args {
    cmd: String,
    question: Option<String>,
    dir: Option<PathBuf>,
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{}", USAGE); std::process::exit(1); }
    let mut parsed = Args { cmd: args[0].clone(), question: None, dir: None };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--dir" => {
                if i + 1 >= args.len() { eprintln!("--dir requires a path"); std::process::exit(2); }
                parsed.dir = Some(PathBuf::from(&args[i + 1]));
                i += 2; continue;
            }
            s if s.starts_with("--") => { eprintln!("Unknown flag: {}", s); std::process::exit(2); }
            s => {
                if parsed.question.is_none() { parsed.question = Some(s.to_string()); }
                i += 1;
            }
        }
    }
    parsed
}

fn require_question(args: &Args) -> String {
    args.question.clone().unwrap_or_else(|| { eprintln!("Missing \"<question>\" argument\n{}", USAGE); std::process::exit(1) })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let settings: Settings = Config::load().and_then(|c| c.settings())?;
    let args = parse_args();
    let documents_dir = match &args.dir {
        Some(dir) => dir.clone(),
        None => resolve_with_base(&env::current_dir()?, &settings.data.documents_dir),
    };
    let store = DirectoryDocumentStore::new(documents_dir);
    tracing::debug!(dir = %store.root().display(), "document store");

    match args.cmd.as_str() {
        "ask" => {
            let question = require_question(&args);
            let synthesizer = get_default_synthesizer(&settings)?;
            let orchestrator = QueryOrchestrator::from_settings(store, &settings, synthesizer);
            println!("{}", orchestrator.answer_query(&question)?);
        }
        "retrieve" => {
            let question = require_question(&args);
            let corpus = CorpusBuilder::new(Chunker::with_group_size(settings.retrieval.chunk_size)).build_from_store(&store)?;
            if corpus.is_empty() { println!("No documents found in {}", store.root().display()); return Ok(()); }
            let space = TfidfRetriever::default().fit(&corpus)?;
            for (rank, hit) in space.rank(&question).iter().take(5).enumerate() {
                if let Some((chunk, name)) = corpus.get(hit.chunk_index) {
                    let marker = if hit.score > settings.retrieval.relevance_threshold { "" } else { " (below threshold)" };
                    println!("{:>2}. score={:.3} file={} chunk={}{}", rank + 1, hit.score, name, chunk.sequence_index, marker);
                }
            }
        }
        "docs" => {
            let documents = store.list_documents()?;
            let chunker = Chunker::with_group_size(settings.retrieval.chunk_size);
            for doc in &documents {
                println!("{:>4}  {}  ({} chunks)", doc.id, doc.name, chunker.chunk(&doc.content).len());
            }
            println!("{} documents in {}", documents.len(), store.root().display());
        }
        other => { eprintln!("Unknown command: {}\n{}", other, USAGE); std::process::exit(1); }
    }
    Ok(())
}
