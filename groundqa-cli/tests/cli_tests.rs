//! Tests for argument handling and an end-to-end run against a mock backend.

use clap::Parser;
use groundqa_cli::{Backend, Cli, EmbedderKind, SAMPLE_POLICY, load_document, render, run};
use mockito::{Matcher, Server};
use serde_json::json;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("groundqa").chain(args.iter().copied())).unwrap()
}

#[test]
fn defaults_follow_the_sample_setup() {
    let cli = parse(&["--backend", "groq", "--embedder", "hash"]);

    assert_eq!(cli.question, "What is the refund policy?");
    assert_eq!(cli.backend, Backend::Groq);
    assert_eq!(cli.embedder, EmbedderKind::Hash);

    let config = cli.rag_config().unwrap();
    assert_eq!((config.chunk_size, config.chunk_overlap, config.top_k), (500, 50, 3));

    let documents = cli.documents().unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].id, "policy");
    assert_eq!(documents[0].text, SAMPLE_POLICY);
}

#[test]
fn inconsistent_window_is_rejected() {
    let cli = parse(&["--chunk-size", "10", "--chunk-overlap", "10"]);
    assert!(cli.rag_config().is_err());
}

#[test]
fn bedrock_generator_validates_sampling_options() {
    let cli = parse(&["--backend", "bedrock", "--bedrock-api-key", "k", "--temperature", "1.5"]);
    assert!(cli.generator().is_err());

    let cli = parse(&["--backend", "bedrock", "--bedrock-api-key", "k", "--model-id", "m"]);
    assert_eq!(cli.generator().unwrap().name(), "m");
}

#[test]
fn groq_generator_is_named_after_its_model() {
    let cli = parse(&["--groq-api-key", "k", "--groq-model", "llama-test"]);
    assert_eq!(cli.generator().unwrap().name(), "llama-test");
}

#[test]
fn non_default_embedding_model_needs_dimensions() {
    let base = ["--embedder", "openai", "--openai-api-key", "k"];

    let small = ["--openai-model", "text-embedding-3-small"];
    let cli = parse(&[&base[..], &small[..]].concat());
    assert_eq!(cli.embedder().unwrap().dimensions(), 1536);

    let large = ["--openai-model", "text-embedding-3-large"];
    let cli = parse(&[&base[..], &large[..]].concat());
    let Err(err) = cli.embedder() else { panic!("expected missing dimensions to be rejected") };
    assert!(err.to_string().contains("--openai-dimensions"));

    let sized = ["--openai-model", "text-embedding-3-large", "--openai-dimensions", "3072"];
    let cli = parse(&[&base[..], &sized[..]].concat());
    assert_eq!(cli.embedder().unwrap().dimensions(), 3072);
}

#[test]
fn corpus_file_becomes_one_document() {
    let path = std::env::temp_dir().join(format!("groundqa-corpus-{}.txt", std::process::id()));
    std::fs::write(&path, "Shipping takes 5 days.").unwrap();

    let document = load_document(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(document.text, "Shipping takes 5 days.");
    assert!(document.id.starts_with("groundqa-corpus-"));
    assert!(document.source_uri.is_some());
}

#[test]
fn missing_corpus_file_is_an_error() {
    let cli = parse(&["--corpus", "/definitely/not/here.txt"]);
    let err = cli.documents().unwrap_err();
    assert!(format!("{err:#}").contains("failed to read corpus"));
}

#[tokio::test]
async fn answers_sample_policy_through_chat_backend() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::Regex("within 30 days of purchase".to_string()))
        .with_status(200)
        .with_body(
            json!({"choices": [{"message": {"content": "Refunds are accepted within 30 days."}}]})
                .to_string(),
        )
        .create_async()
        .await;

    let url = server.url();
    let cli = parse(&[
        "--backend",
        "groq",
        "--embedder",
        "hash",
        "--groq-api-key",
        "test-key",
        "--groq-base-url",
        url.as_str(),
        "--show-sources",
    ]);

    let answer = run(&cli).await.unwrap();

    assert_eq!(answer.text, "Refunds are accepted within 30 days.");
    assert_eq!(
        render(&cli, &answer),
        "Q: What is the refund policy?\nA: Refunds are accepted within 30 days.\nSources: policy"
    );
    mock.assert_async().await;
}
