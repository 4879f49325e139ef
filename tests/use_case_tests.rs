//! End-to-end tests for the use cases over the in-memory store.
//!
//! Text in vector fields is embedded by the deterministic mock service, so a
//! search for the exact text of a record always ranks that record first.

use std::io::Write;
use std::sync::Arc;

use serde_json::json;
use tempfile::NamedTempFile;

use kernel_connectors::{
    CollectionDefinition, Commands, Container, ContainerConfig, DomainError, FilterExpr,
    GetRecordsUseCase, InMemoryVectorStore, ManageCollectionsUseCase, MockEmbedding, RecordKey,
    Router, SearchArgs, SearchRecordsUseCase, SearchRequest, UpsertRecordsUseCase,
    VectorSearchOptions, VectorStoreField,
};
use kernel_connectors::domain::{GetRecordOptions, PropertyType};

const DIMENSIONS: usize = 8;

fn hotel_definition() -> CollectionDefinition {
    CollectionDefinition::new(vec![
        VectorStoreField::key("hotel_id", PropertyType::String),
        VectorStoreField::data("name", PropertyType::String).full_text_indexed(),
        VectorStoreField::data("city", PropertyType::String).indexed(),
        VectorStoreField::data("rating", PropertyType::Float),
        VectorStoreField::vector("description", DIMENSIONS),
    ])
    .expect("valid definition")
}

fn hotels() -> Vec<serde_json::Value> {
    vec![
        json!({"hotel_id": "h1", "name": "Seaside Inn", "city": "Nice", "rating": 4.5,
               "description": "quiet rooms next to the beach"}),
        json!({"hotel_id": "h2", "name": "Mountain Lodge", "city": "Chamonix", "rating": 3.9,
               "description": "ski in ski out chalet with fireplace"}),
        json!({"hotel_id": "h3", "name": "City Loft", "city": "Paris", "rating": 4.8,
               "description": "modern loft near the museums"}),
    ]
}

struct TestEnv {
    collections: ManageCollectionsUseCase,
    upsert: UpsertRecordsUseCase,
    search: SearchRecordsUseCase,
    get: GetRecordsUseCase,
}

async fn setup_test_env() -> TestEnv {
    let store = Arc::new(InMemoryVectorStore::new());
    let embeddings = Arc::new(MockEmbedding::with_dimensions(DIMENSIONS));

    let env = TestEnv {
        collections: ManageCollectionsUseCase::new(store.clone()),
        upsert: UpsertRecordsUseCase::new(store.clone(), embeddings.clone()),
        search: SearchRecordsUseCase::new(store.clone(), embeddings),
        get: GetRecordsUseCase::new(store),
    };
    env.collections
        .create("hotels", hotel_definition())
        .await
        .expect("Failed to create collection");
    env.upsert
        .execute("hotels", hotel_definition(), hotels())
        .await
        .expect("Failed to upsert hotels");
    env
}

#[tokio::test]
async fn test_collections_are_created_listed_and_dropped() {
    let env = setup_test_env().await;

    let names = env.collections.list().await.expect("Failed to list");
    assert_eq!(names, vec!["hotels".to_string()]);
    assert!(env
        .collections
        .exists("hotels", hotel_definition())
        .await
        .unwrap());

    env.collections
        .drop_collection("hotels", hotel_definition())
        .await
        .expect("Failed to drop");
    assert!(!env
        .collections
        .exists("hotels", hotel_definition())
        .await
        .unwrap());
    assert!(env.collections.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upsert_embeds_text_and_returns_keys() {
    let env = setup_test_env().await;

    let keys = env
        .upsert
        .execute(
            "hotels",
            hotel_definition(),
            vec![json!({"name": "No Key Hotel", "description": "generated key"})],
        )
        .await
        .expect("Failed to upsert");
    assert_eq!(keys.len(), 1);
    assert!(matches!(&keys[0], RecordKey::String(s) if !s.is_empty()));

    let records = env
        .get
        .get(
            "hotels",
            hotel_definition(),
            &[RecordKey::from("h1")],
            GetRecordOptions::with_vectors(),
        )
        .await
        .expect("Failed to get");
    assert_eq!(records.len(), 1);
    let vector = records[0].vector("description").expect("vector stored");
    assert_eq!(vector.len(), DIMENSIONS);
}

#[tokio::test]
async fn test_search_ranks_exact_text_first() {
    let env = setup_test_env().await;

    let results = env
        .search
        .execute(
            "hotels",
            hotel_definition(),
            SearchRequest::text("modern loft near the museums"),
        )
        .await
        .expect("Search failed");

    assert_eq!(results.results.len(), 3);
    let best = &results.results[0];
    assert_eq!(best.record.key(), Some(&RecordKey::from("h3")));
    let score = best.score.expect("score present");
    assert!((score - 1.0).abs() < 1e-4, "identical text should score 1, got {score}");
}

#[tokio::test]
async fn test_search_applies_filter_paging_and_total_count() {
    let env = setup_test_env().await;

    let options = VectorSearchOptions::default()
        .with_top(1)
        .with_filter(FilterExpr::ge("rating", 4.0))
        .with_total_count(true);
    let results = env
        .search
        .execute(
            "hotels",
            hotel_definition(),
            SearchRequest::text("quiet rooms next to the beach").with_options(options),
        )
        .await
        .expect("Search failed");

    assert_eq!(results.results.len(), 1);
    assert_eq!(results.total_count, Some(2));
    assert_eq!(results.results[0].record.key(), Some(&RecordKey::from("h1")));
    assert!(results.results[0].record.vectors.is_empty());
}

#[tokio::test]
async fn test_hybrid_search_requires_keyword_match() {
    let env = setup_test_env().await;

    let results = env
        .search
        .execute(
            "hotels",
            hotel_definition(),
            SearchRequest::text("lodge").hybrid(),
        )
        .await
        .expect("Search failed");

    assert_eq!(results.results.len(), 1);
    assert_eq!(results.results[0].record.data["name"], json!("Mountain Lodge"));
}

#[tokio::test]
async fn test_empty_search_text_is_rejected() {
    let env = setup_test_env().await;

    let err = env
        .search
        .execute("hotels", hotel_definition(), SearchRequest::text("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));
}

#[tokio::test]
async fn test_delete_removes_records() {
    let env = setup_test_env().await;

    env.get
        .delete("hotels", hotel_definition(), &[RecordKey::from("h2")])
        .await
        .expect("Failed to delete");

    let records = env
        .get
        .get(
            "hotels",
            hotel_definition(),
            &[RecordKey::from("h1"), RecordKey::from("h2")],
            GetRecordOptions::default(),
        )
        .await
        .expect("Failed to get");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key(), Some(&RecordKey::from("h1")));
}

#[tokio::test]
async fn test_upsert_into_missing_collection_fails() {
    let store = Arc::new(InMemoryVectorStore::new());
    let embeddings = Arc::new(MockEmbedding::with_dimensions(DIMENSIONS));
    let upsert = UpsertRecordsUseCase::new(store, embeddings);

    let err = upsert
        .execute("ghosts", hotel_definition(), hotels())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write temp file");
    file
}

#[tokio::test]
async fn test_router_runs_commands_against_memory_store() {
    let definition = write_temp(
        &serde_json::to_string(&hotel_definition()).expect("definition serializes"),
    );
    let records = write_temp(
        &hotels()
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
    );

    let config = ContainerConfig {
        mock_dimensions: DIMENSIONS,
        ..Default::default()
    };
    let container = Container::with_services(
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(MockEmbedding::with_dimensions(DIMENSIONS)),
        None,
        config,
    );
    let router = Router::new(&container);

    let output = router
        .route(Commands::Create {
            collection: "hotels".into(),
            definition: definition.path().to_path_buf(),
        })
        .await
        .expect("create failed");
    assert!(output.contains("hotels"));

    let output = router
        .route(Commands::Upsert {
            collection: "hotels".into(),
            definition: definition.path().to_path_buf(),
            records: records.path().to_path_buf(),
        })
        .await
        .expect("upsert failed");
    assert!(output.starts_with("Upserted 3 records"));

    let output = router
        .route(Commands::Search(SearchArgs {
            collection: "hotels".into(),
            definition: definition.path().to_path_buf(),
            query: "ski in ski out chalet with fireplace".into(),
            top: 1,
            skip: 0,
            filter: None,
            vector_field: None,
            hybrid: false,
            include_vectors: false,
            total_count: false,
        }))
        .await
        .expect("search failed");
    assert!(output.contains("Mountain Lodge"), "unexpected output: {output}");

    let output = router
        .route(Commands::Get {
            collection: "hotels".into(),
            definition: definition.path().to_path_buf(),
            keys: vec!["h1".into(), "missing".into()],
            include_vectors: false,
        })
        .await
        .expect("get failed");
    assert!(output.contains("Seaside Inn"));

    let err = router
        .route(Commands::Chat {
            prompt: "hello".into(),
            system: None,
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("chat"), "unexpected error: {err}");
}

#[tokio::test]
async fn test_memory_store_persists_between_containers() {
    let data_dir = tempfile::tempdir().expect("Failed to create data dir");
    let definition = write_temp(
        &serde_json::to_string(&hotel_definition()).expect("definition serializes"),
    );
    let records = write_temp(&hotels()[0].to_string());
    let config = || ContainerConfig {
        mock_dimensions: DIMENSIONS,
        data_dir: Some(data_dir.path().to_path_buf()),
        ..Default::default()
    };

    let container = Container::new(config()).await.expect("Failed to build container");
    Router::new(&container)
        .route(Commands::Create {
            collection: "hotels".into(),
            definition: definition.path().to_path_buf(),
        })
        .await
        .expect("create failed");

    let container = Container::new(config()).await.expect("Failed to build container");
    let output = Router::new(&container)
        .route(Commands::Upsert {
            collection: "hotels".into(),
            definition: definition.path().to_path_buf(),
            records: records.path().to_path_buf(),
        })
        .await
        .expect("upsert failed");
    assert!(output.starts_with("Upserted 1 records"), "unexpected output: {output}");

    let container = Container::new(config()).await.expect("Failed to build container");
    let output = Router::new(&container)
        .route(Commands::Get {
            collection: "hotels".into(),
            definition: definition.path().to_path_buf(),
            keys: vec!["h1".into()],
            include_vectors: false,
        })
        .await
        .expect("get failed");
    assert!(output.contains("Seaside Inn"), "unexpected output: {output}");
}
