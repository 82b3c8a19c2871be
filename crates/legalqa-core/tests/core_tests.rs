use std::fs;
use tempfile::TempDir;

use legalqa_core::chunker::{chunk, Chunker};
use legalqa_core::config::{Config, Settings};
use legalqa_core::corpus::{build_corpus, CorpusBuilder};
use legalqa_core::error::Error;
use legalqa_core::store::{DirectoryDocumentStore, InMemoryDocumentStore};
use legalqa_core::traits::DocumentStore;
use legalqa_core::types::Document;

fn words(n: usize) -> String {
    (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
}

#[test]
fn short_document_is_one_whitespace_normalized_chunk() {
    let chunks = chunk("  This   agreement\nshall\tterminate. ", 300);
    assert_eq!(chunks, vec!["This agreement shall terminate.".to_string()]);
}

#[test]
fn exactly_group_size_tokens_is_one_chunk() {
    let chunks = chunk(&words(300), 300);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].split(' ').count(), 300);
}

#[test]
fn long_document_splits_into_full_groups_and_a_remainder() {
    // 2 * 300 + 7 tokens
    let chunks = Chunker::default().chunk(&words(607));
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].split(' ').count(), 300);
    assert_eq!(chunks[1].split(' ').count(), 300);
    assert_eq!(chunks[2].split(' ').count(), 7);
    assert!(chunks[1].starts_with("w300 "), "groups are contiguous and non-overlapping");
    assert_eq!(chunks[2], "w600 w601 w602 w603 w604 w605 w606");
}

#[test]
fn corpus_keeps_document_and_chunk_order() {
    let docs = vec![
        Document::new(1, "a.txt", words(5)),
        Document::new(2, "empty.txt", ""),
        Document::new(3, "b.txt", "one two three"),
    ];
    let corpus = CorpusBuilder::new(Chunker::with_group_size(2)).build_corpus(&docs);

    assert_eq!(corpus.len(), corpus.source_names().len());
    assert_eq!(corpus.source_names(), &["a.txt", "a.txt", "a.txt", "b.txt", "b.txt"]);
    let texts: Vec<&str> = corpus.texts().collect();
    assert_eq!(texts, vec!["w0 w1", "w2 w3", "w4", "one two", "three"]);
    assert_eq!(corpus.chunks()[2].sequence_index, 2);
    assert_eq!(corpus.chunks()[3].sequence_index, 0);
}

#[test]
fn empty_document_set_builds_empty_corpus() {
    let corpus = build_corpus(&[]);
    assert!(corpus.is_empty());
    assert_eq!(corpus.chunks().len(), 0);
    assert_eq!(corpus.source_names().len(), 0);
}

#[test]
fn in_memory_store_assigns_ids_and_keeps_first_upload() {
    let store = InMemoryDocumentStore::new();
    assert!(store.is_empty().expect("empty"));
    let first = store.store("contract.txt", "first").expect("store").expect("new document");
    let second = store.store("lease.txt", "second").expect("store").expect("new document");
    let dup = store.store("contract.txt", "replacement").expect("store");

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert!(dup.is_none(), "duplicate names are ignored");
    assert_eq!(store.len().expect("len"), 2);

    let docs = store.list_documents().expect("list");
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].content, "first");
}

#[test]
fn directory_store_lists_txt_files_sorted() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("b.txt"), "bravo").unwrap();
    fs::write(dir.join("a.txt"), "alpha").unwrap();
    fs::write(dir.join("nested/c.txt"), "charlie").unwrap();
    fs::write(dir.join("notes.md"), "ignored").unwrap();
    fs::write(dir.join("latin1.txt"), [0x63u8, 0x61, 0x66, 0xE9]).unwrap();

    let docs = DirectoryDocumentStore::new(dir).list_documents().expect("list");
    let names: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "latin1.txt", "c.txt"]);
    assert_eq!(docs.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    assert!(docs[2].content.starts_with("caf"), "invalid UTF-8 is decoded lossily");
}

#[test]
fn directory_store_missing_root_is_storage_unavailable() {
    let tmp = TempDir::new().unwrap();
    let store = DirectoryDocumentStore::new(tmp.path().join("missing"));
    let err = store.list_documents().unwrap_err();
    assert!(matches!(err, Error::StorageUnavailable(_)), "got {err:?}");
}

#[cfg(unix)]
#[test]
fn directory_store_unreadable_entry_is_storage_unavailable() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.txt"), "alpha").unwrap();
    std::os::unix::fs::symlink(dir.join("gone"), dir.join("broken.txt")).unwrap();

    let err = DirectoryDocumentStore::new(dir).list_documents().unwrap_err();
    assert!(matches!(err, Error::StorageUnavailable(_)), "got {err:?}");
}

#[test]
fn config_defaults_files_and_env_overrides() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        jail.create_file("config.toml", "[retrieval]\nchunk_size = 120\n")?;
        jail.create_file("config.test.toml", "[generation]\nnum_beams = 2\n")?;
        jail.set_env("APP_RETRIEVAL__RELEVANCE_THRESHOLD", "0.25");

        let config = Config::load().expect("load");
        let settings = config.settings().expect("settings");
        assert_eq!(settings.retrieval.chunk_size, 120);
        assert_eq!(settings.generation.num_beams, 2);
        assert!((settings.retrieval.relevance_threshold - 0.25).abs() < 1e-6);
        assert_eq!(settings.generation.max_input_tokens, 1024, "unset keys keep defaults");
        assert_eq!(config.get::<usize>("retrieval.chunk_size").expect("get"), 120);
        Ok(())
    });
}

#[test]
fn invalid_settings_are_rejected() {
    let mut settings = Settings::default();
    assert!(settings.validate().is_ok());

    settings.retrieval.chunk_size = 0;
    assert!(matches!(settings.validate(), Err(Error::InvalidConfig(_))));

    let mut settings = Settings::default();
    settings.generation.min_length = 200;
    assert!(matches!(settings.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn config_from_figment_rejects_zero_chunk_size() {
    let figment = figment::Figment::from(figment::providers::Serialized::defaults(Settings::default()))
        .merge(("retrieval.chunk_size", 0));
    let err = Config::from_figment(figment).settings().unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)), "got {err:?}");
}
