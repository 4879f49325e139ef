//! Tests for the HTTP connectors against local mock servers.
//!
//! Each test starts an axum server on an ephemeral port that mimics the
//! slice of the vendor API the connector talks to, and records the requests
//! it receives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Json;
use serde_json::{json, Value};

use kernel_connectors::connector::adapter::weaviate::WeaviateClient;
use kernel_connectors::connector::adapter::{
    AzureOpenAiClient, AzureOpenAiSettings, OllamaClient, OllamaSettings, OpenAiClient,
    OpenAiSettings, WeaviateStore,
};
use kernel_connectors::domain::{ChatMessage, ChatSettings, GetRecordOptions, PropertyType};
use kernel_connectors::{
    ChatClient, CollectionDefinition, DomainError, EmbeddingService, FilterExpr, Record,
    RecordKey, VectorSearchOptions, VectorSearchQuery, VectorStore, VectorStoreField,
};

const HOTEL_ID: &str = "4a4f2c8e-0d9b-4b1e-9f5e-0c8a2f4c1d10";

type Recorded = Arc<Mutex<Vec<Value>>>;

async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{addr}")
}

fn hotel_definition() -> CollectionDefinition {
    CollectionDefinition::new(vec![
        VectorStoreField::key("hotel_id", PropertyType::String),
        VectorStoreField::data("hotel_name", PropertyType::String)
            .with_storage_name("hotelName")
            .indexed(),
        VectorStoreField::data("rating", PropertyType::Float),
        VectorStoreField::vector("embedding", 3),
    ])
    .expect("valid definition")
}

fn weaviate_mock(requests: Recorded, batch_reply: Value) -> axum::Router {
    let created = Arc::new(AtomicBool::new(false));
    let class_exists = created.clone();
    let schema_requests = requests.clone();
    let batch_requests = requests.clone();
    let graphql_requests = requests;

    axum::Router::new()
        .route(
            "/v1/schema",
            get(|| async { Json(json!({"classes": [{"class": "Hotels"}, {"class": "Rooms"}]})) })
                .post(move |Json(body): Json<Value>| async move {
                    created.store(true, Ordering::SeqCst);
                    schema_requests.lock().unwrap().push(body.clone());
                    Json(body)
                }),
        )
        .route(
            "/v1/schema/{class}",
            get(move |Path(class): Path<String>| async move {
                if class_exists.load(Ordering::SeqCst) {
                    (StatusCode::OK, Json(json!({"class": class})))
                } else {
                    (StatusCode::NOT_FOUND, Json(Value::Null))
                }
            }),
        )
        .route(
            "/v1/batch/objects",
            post(move |Json(body): Json<Value>| async move {
                batch_requests.lock().unwrap().push(body);
                Json(batch_reply)
            }),
        )
        .route(
            "/v1/graphql",
            post(move |Json(body): Json<Value>| async move {
                graphql_requests.lock().unwrap().push(body);
                Json(json!({"data": {"Get": {"Hotels": [{
                    "hotelName": "Seaside Inn",
                    "rating": 4.5,
                    "_additional": {"id": HOTEL_ID, "distance": 0.125}
                }]}}}))
            }),
        )
        .route(
            "/v1/objects/{class}/{id}",
            get(|Path((_class, id)): Path<(String, String)>| async move {
                if id == HOTEL_ID {
                    (
                        StatusCode::OK,
                        Json(json!({
                            "id": HOTEL_ID,
                            "properties": {"hotelName": "Seaside Inn", "rating": 4.5},
                            "vectors": {"embedding": [0.5, 0.25, 0.0]}
                        })),
                    )
                } else {
                    (StatusCode::NOT_FOUND, Json(Value::Null))
                }
            }),
        )
}

#[tokio::test]
async fn test_weaviate_collection_round_trip() {
    let requests: Recorded = Arc::default();
    let base = serve(weaviate_mock(requests.clone(), json!([{"result": {}}]))).await;
    let store = WeaviateStore::new(WeaviateClient::new(base, None));

    let names = store.list_collection_names().await.expect("Failed to list");
    assert_eq!(names, vec!["Hotels".to_string(), "Rooms".to_string()]);

    let collection = store
        .collection("hotels", hotel_definition())
        .expect("Failed to open collection");
    assert_eq!(collection.name(), "Hotels");
    assert!(!collection.collection_exists().await.unwrap());
    collection
        .ensure_collection_exists()
        .await
        .expect("Failed to create class");
    assert!(collection.collection_exists().await.unwrap());

    let record = Record::new(HOTEL_ID)
        .with_data("hotel_name", "Seaside Inn")
        .with_data("rating", 4.5)
        .with_vector("embedding", vec![0.5, 0.25, 0.0]);
    let keys = collection.upsert(&[record]).await.expect("Failed to upsert");
    assert_eq!(keys, vec![RecordKey::from(HOTEL_ID)]);

    let fetched = collection
        .get(
            &[RecordKey::from(HOTEL_ID), RecordKey::from("00000000-0000-0000-0000-000000000001")],
            &GetRecordOptions::with_vectors(),
        )
        .await
        .expect("Failed to get");
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].data["hotel_name"], json!("Seaside Inn"));
    assert_eq!(fetched[0].vector("embedding"), Some(&[0.5, 0.25, 0.0][..]));

    let options = VectorSearchOptions::default()
        .with_filter(FilterExpr::eq("hotel_name", "Seaside Inn"))
        .with_total_count(true);
    let results = collection
        .search(&VectorSearchQuery::vector(vec![0.5, 0.25, 0.0], options))
        .await
        .expect("Failed to search");
    assert_eq!(results.total_count, Some(1));
    assert_eq!(results.results[0].record.key(), Some(&RecordKey::from(HOTEL_ID)));
    assert_eq!(results.results[0].score, Some(0.125));

    let recorded = requests.lock().unwrap();
    let schema = &recorded[0];
    assert_eq!(schema["class"], "Hotels");
    let batch = &recorded[1];
    assert_eq!(batch["objects"][0]["class"], "Hotels");
    assert_eq!(batch["objects"][0]["properties"]["hotelName"], "Seaside Inn");
    let query = recorded[2]["query"].as_str().expect("query string");
    assert!(query.contains("Hotels"));
    assert!(query.contains("nearVector"));
    assert!(query.contains("hotelName"));
}

#[tokio::test]
async fn test_weaviate_batch_errors_fail_the_upsert() {
    let reply = json!([{"result": {"errors": {"error": [{"message": "invalid vector"}]}}}]);
    let base = serve(weaviate_mock(Arc::default(), reply)).await;
    let store = WeaviateStore::new(WeaviateClient::new(base, None));
    let collection = store.collection("hotels", hotel_definition()).unwrap();

    let record = Record::new(HOTEL_ID).with_vector("embedding", vec![1.0, 0.0, 0.0]);
    let err = collection.upsert(&[record]).await.unwrap_err();

    assert!(matches!(err, DomainError::OperationFailed { .. }));
    assert!(err.to_string().contains("invalid vector"));
}

#[tokio::test]
async fn test_weaviate_missing_endpoints_fail_writes_and_queries() {
    let base = serve(axum::Router::new()).await;
    let store = WeaviateStore::new(WeaviateClient::new(base, None));
    let collection = store.collection("hotels", hotel_definition()).unwrap();

    let record = Record::new(HOTEL_ID).with_vector("embedding", vec![1.0, 0.0, 0.0]);
    let err = collection.upsert(&[record]).await.unwrap_err();
    assert!(matches!(err, DomainError::OperationFailed { .. }), "unexpected error: {err}");
    assert!(err.to_string().contains("404"), "unexpected error: {err}");

    let query = VectorSearchQuery::vector(vec![1.0, 0.0, 0.0], VectorSearchOptions::default());
    let err = collection.search(&query).await.unwrap_err();
    assert!(matches!(err, DomainError::OperationFailed { .. }), "unexpected error: {err}");

    let fetched = collection
        .get(&[RecordKey::from(HOTEL_ID)], &GetRecordOptions::default())
        .await
        .expect("a missing object is not an error");
    assert!(fetched.is_empty());
}

#[tokio::test]
async fn test_weaviate_rejects_non_uuid_keys() {
    let store = WeaviateStore::new(WeaviateClient::new("http://127.0.0.1:9", None));
    let collection = store.collection("hotels", hotel_definition()).unwrap();

    let err = collection
        .upsert(&[Record::new("not-a-uuid")])
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));
}

fn openai_mock(requests: Recorded) -> axum::Router {
    let chat_requests = requests.clone();
    let embedding_requests = requests;
    axum::Router::new()
        .route(
            "/v1/chat/completions",
            post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
                chat_requests.lock().unwrap().push(json!({
                    "authorization": headers.get("authorization").and_then(|v| v.to_str().ok()),
                    "organization": headers
                        .get("openai-organization")
                        .and_then(|v| v.to_str().ok()),
                    "body": body,
                }));
                Json(json!({"choices": [{"message": {"role": "assistant", "content": "Bonjour"}}]}))
            }),
        )
        .route(
            "/v1/embeddings",
            post(move |Json(body): Json<Value>| async move {
                embedding_requests.lock().unwrap().push(body);
                Json(json!({"data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ]}))
            }),
        )
}

#[tokio::test]
async fn test_openai_chat_and_embeddings() {
    let requests: Recorded = Arc::default();
    let base = serve(openai_mock(requests.clone())).await;
    let client = OpenAiClient::new(OpenAiSettings {
        org_id: Some("org-42".into()),
        base_url: Some(format!("{base}/")),
        chat_model_id: Some("gpt-4o-mini".into()),
        embedding_model_id: Some("text-embedding-3-small".into()),
        ..OpenAiSettings::new("sk-test")
    });

    let reply = client
        .complete_prompt("You translate to French.", "Hello")
        .await
        .expect("Chat failed");
    assert_eq!(reply, "Bonjour");

    let vectors = client
        .embed(&["first".to_string(), "second".to_string()])
        .await
        .expect("Embedding failed");
    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);

    let recorded = requests.lock().unwrap();
    assert_eq!(recorded[0]["authorization"], "Bearer sk-test");
    assert_eq!(recorded[0]["organization"], "org-42");
    assert_eq!(recorded[0]["body"]["model"], "gpt-4o-mini");
    assert_eq!(recorded[0]["body"]["messages"][0]["role"], "system");
    assert_eq!(recorded[0]["body"]["messages"][1]["content"], "Hello");
    assert_eq!(recorded[1]["model"], "text-embedding-3-small");
    assert_eq!(recorded[1]["input"], json!(["first", "second"]));
}

#[tokio::test]
async fn test_openai_without_chat_model_is_a_configuration_error() {
    let client = OpenAiClient::new(OpenAiSettings::new("sk-test"));
    let err = client
        .complete(&[ChatMessage::user("hi")], &ChatSettings::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Configuration(_)));
}

#[tokio::test]
async fn test_openai_error_status_is_a_service_error() {
    let app = axum::Router::new().route(
        "/v1/embeddings",
        post(|| async { (StatusCode::UNAUTHORIZED, "invalid api key") }),
    );
    let base = serve(app).await;
    let client = OpenAiClient::new(OpenAiSettings {
        base_url: Some(base),
        embedding_model_id: Some("text-embedding-3-small".into()),
        ..OpenAiSettings::new("sk-wrong")
    });

    let err = client.embed_query("hello").await.unwrap_err();
    assert!(matches!(err, DomainError::Service(_)));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_azure_openai_routes_by_deployment() {
    let requests: Recorded = Arc::default();
    let recorder = requests.clone();
    let app = axum::Router::new().route(
        "/openai/deployments/{deployment}/{*operation}",
        post(
            move |Path((deployment, operation)): Path<(String, String)>,
                  Query(params): Query<HashMap<String, String>>,
                  headers: HeaderMap,
                  Json(body): Json<Value>| async move {
                recorder.lock().unwrap().push(json!({
                    "deployment": deployment,
                    "operation": operation,
                    "api_version": params.get("api-version"),
                    "api_key": headers.get("api-key").and_then(|v| v.to_str().ok()),
                    "body": body,
                }));
                if operation == "embeddings" {
                    Json(json!({"data": [{"index": 0, "embedding": [0.25, 0.75]}]}))
                } else {
                    Json(json!({"choices": [{"message": {"content": "Ciao"}}]}))
                }
            },
        ),
    );
    let base = serve(app).await;

    let mut settings = AzureOpenAiSettings::new(base, "azure-key");
    settings.chat_deployment_name = Some("chat-prod".into());
    settings.embedding_deployment_name = Some("embed-prod".into());
    let client = AzureOpenAiClient::new(settings);

    let reply = client
        .complete(&[ChatMessage::user("Hello")], &ChatSettings::default())
        .await
        .expect("Chat failed");
    assert_eq!(reply.content, "Ciao");
    let vector = client.embed_query("hello").await.expect("Embedding failed");
    assert_eq!(vector, vec![0.25, 0.75]);

    let recorded = requests.lock().unwrap();
    assert_eq!(recorded[0]["deployment"], "chat-prod");
    assert_eq!(recorded[0]["operation"], "chat/completions");
    assert_eq!(recorded[0]["api_version"], "2024-10-21");
    assert_eq!(recorded[0]["api_key"], "azure-key");
    assert!(recorded[0]["body"].get("model").is_none());
    assert_eq!(recorded[1]["deployment"], "embed-prod");
    assert_eq!(recorded[1]["operation"], "embeddings");
}

#[tokio::test]
async fn test_ollama_chat_and_embeddings() {
    let requests: Recorded = Arc::default();
    let chat_requests = requests.clone();
    let embed_requests = requests.clone();
    let app = axum::Router::new()
        .route(
            "/api/chat",
            post(move |Json(body): Json<Value>| async move {
                chat_requests.lock().unwrap().push(body);
                Json(json!({"message": {"role": "assistant", "content": "Hallo"}, "done": true}))
            }),
        )
        .route(
            "/api/embed",
            post(move |Json(body): Json<Value>| async move {
                embed_requests.lock().unwrap().push(body);
                Json(json!({"embeddings": [[0.1, 0.2, 0.3]]}))
            }),
        );
    let base = serve(app).await;

    let client = OllamaClient::new(OllamaSettings {
        host: base,
        chat_model_id: Some("llama3.2".into()),
        embedding_model_id: Some("nomic-embed-text".into()),
    });

    let settings = ChatSettings {
        temperature: Some(0.25),
        ..Default::default()
    };
    let reply = client
        .complete(&[ChatMessage::user("Hello")], &settings)
        .await
        .expect("Chat failed");
    assert_eq!(reply.content, "Hallo");

    let vector = client.embed_query("hello").await.expect("Embedding failed");
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);

    let err = client
        .embed(&["a".to_string(), "b".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Service(_)));

    let recorded = requests.lock().unwrap();
    assert_eq!(recorded[0]["model"], "llama3.2");
    assert_eq!(recorded[0]["stream"], false);
    assert_eq!(recorded[0]["options"]["temperature"], 0.25);
    assert_eq!(recorded[1]["model"], "nomic-embed-text");
    assert_eq!(recorded[1]["input"], json!(["hello"]));
}
