use std::fs;

use kra_ai::corpus::{AddPaperInput, ChunkingOptions, CorpusStore};
use pretty_assertions::assert_eq;
use sha2::{Digest, Sha256};

const NOW: &str = "2026-10-19T00:00:00Z";

fn small_chunks(store: CorpusStore) -> CorpusStore {
    store.with_chunking(ChunkingOptions {
        chunk_size: 10,
        overlap: 0,
    })
}

#[test]
fn paper_from_file_takes_id_and_source_from_the_file_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paper = dir.path().join("rag_survey.txt");
    fs::write(&paper, "x".repeat(2000)).expect("write paper");

    let store = CorpusStore::open(dir.path().join("corpus"));
    let res = store
        .add_paper(AddPaperInput {
            path: Some(paper.clone()),
            added_at: NOW.to_string(),
            ..Default::default()
        })
        .expect("add_paper");

    assert_eq!(res.paper_id, "rag_survey");
    assert_eq!(res.source, "rag_survey.txt");
    // 1200-char windows every 1000 chars: [0, 1200) and [1000, 2000).
    assert_eq!(res.chunk_count, 2);
    assert!(!res.replaced);

    let papers = store.list_papers().expect("list_papers");
    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].char_count, 2000);
    assert_eq!(papers[0].origin_path.as_deref(), Some(paper.display().to_string().as_str()));
    assert_eq!(
        papers[0].chunk_ids,
        vec!["rag_survey::chunk-0000".to_string(), "rag_survey::chunk-0001".to_string()]
    );

    let second = store.get_chunk("rag_survey::chunk-0001").expect("chunk");
    assert_eq!(second.text.chars().count(), 1000);
    assert_eq!(second.source, "rag_survey.txt");
}

#[test]
fn readding_a_paper_replaces_its_chunks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = small_chunks(CorpusStore::open(dir.path().to_path_buf()));

    store
        .add_paper(AddPaperInput {
            text: Some("a".repeat(30)),
            paper_id: Some("p1".to_string()),
            added_at: NOW.to_string(),
            ..Default::default()
        })
        .expect("first add");
    let res = store
        .add_paper(AddPaperInput {
            text: Some("b".repeat(10)),
            paper_id: Some("p1".to_string()),
            source: Some("p1.pdf".to_string()),
            added_at: NOW.to_string(),
            ..Default::default()
        })
        .expect("second add");

    assert!(res.replaced);
    assert_eq!(res.chunk_count, 1);
    let chunks = store.list_chunks(Some("p1")).expect("list_chunks");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].source, "p1.pdf");
    assert_eq!(
        store.get_chunk("p1::chunk-0002").expect_err("stale chunk").code,
        "CORPUS_CHUNK_NOT_FOUND"
    );
}

#[test]
fn blank_windows_are_skipped_but_keep_their_index() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = small_chunks(CorpusStore::open(dir.path().to_path_buf()));

    let text = format!("{}{}{}", "a".repeat(10), " ".repeat(10), "b".repeat(10));
    store
        .add_paper(AddPaperInput {
            text: Some(text),
            paper_id: Some("gappy".to_string()),
            added_at: NOW.to_string(),
            ..Default::default()
        })
        .expect("add");

    let indices: Vec<u32> = store
        .list_chunks(None)
        .expect("list")
        .into_iter()
        .map(|c| c.chunk_index)
        .collect();
    assert_eq!(indices, vec![0, 2]);
}

#[test]
fn chunks_are_listed_by_paper_then_index() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = small_chunks(CorpusStore::open(dir.path().to_path_buf()));

    for id in ["zeta", "alpha"] {
        store
            .add_paper(AddPaperInput {
                text: Some("c".repeat(25)),
                paper_id: Some(id.to_string()),
                added_at: NOW.to_string(),
                ..Default::default()
            })
            .expect("add");
    }

    let order: Vec<(String, u32)> = store
        .list_chunks(None)
        .expect("list")
        .into_iter()
        .map(|c| (c.paper_id, c.chunk_index))
        .collect();
    assert_eq!(
        order,
        vec![
            ("alpha".to_string(), 0),
            ("alpha".to_string(), 1),
            ("alpha".to_string(), 2),
            ("zeta".to_string(), 0),
            ("zeta".to_string(), 1),
            ("zeta".to_string(), 2),
        ]
    );

    assert!(store.remove_paper("zeta").expect("remove"));
    assert!(!store.remove_paper("zeta").expect("remove again"));
    assert_eq!(store.list_chunks(None).expect("list").len(), 3);
}

#[test]
fn failed_replacement_keeps_the_previous_paper_readable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = small_chunks(CorpusStore::open(dir.path().to_path_buf()));
    let add = |text: String| {
        store.add_paper(AddPaperInput {
            text: Some(text),
            paper_id: Some("p".to_string()),
            added_at: NOW.to_string(),
            ..Default::default()
        })
    };
    add(format!("{}{}", "a".repeat(10), "b".repeat(10))).expect("first add");

    // A directory where the chunk's temp file goes makes the write fail.
    let file_stem = hex::encode(Sha256::digest("p::chunk-0000".as_bytes()));
    let blocker = dir.path().join("chunks").join(format!("{file_stem}.tmp"));
    fs::create_dir(&blocker).expect("block temp path");

    let err = add("c".repeat(5)).expect_err("write blocked");
    assert_eq!(err.code, "CORPUS_STORE_FAILED");

    let papers = store.list_papers().expect("list_papers");
    assert_eq!(
        papers[0].chunk_ids,
        vec!["p::chunk-0000".to_string(), "p::chunk-0001".to_string()]
    );
    let texts: Vec<String> = store
        .list_chunks(None)
        .expect("list_chunks")
        .iter()
        .map(|c| store.get_chunk(&c.chunk_id).expect("chunk").text)
        .collect();
    assert_eq!(texts, vec!["a".repeat(10), "b".repeat(10)]);

    fs::remove_dir(&blocker).expect("unblock");
    let res = add("c".repeat(5)).expect("retry");
    assert_eq!(res.chunk_count, 1);
    assert_eq!(store.list_chunks(None).expect("list_chunks").len(), 1);
    assert_eq!(
        store.get_chunk("p::chunk-0001").expect_err("stale chunk removed").code,
        "CORPUS_CHUNK_NOT_FOUND"
    );
}
