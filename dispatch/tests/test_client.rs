use httpmock::Method::{GET, POST};
use httpmock::MockServer;

use dispatch::{
    Completion, Device, DispatchConfig, Dispatcher, LlmError, Message, OllamaGenerator,
    SamplingOptions, TextGenerator,
};

const COMMIT_PROMPT: &str = include_str!("fixtures/commit_prompt.txt");

fn generate_reply(text: &str) -> String {
    serde_json::json!({
        "model": "gemma:7b-instruct",
        "created_at": "now",
        "response": text,
        "done": true
    })
    .to_string()
}

fn chat_reply(text: &str) -> String {
    serde_json::json!({
        "model": "codellama:7b-instruct",
        "created_at": "now",
        "message": {"role": "assistant", "content": text},
        "done": true
    })
    .to_string()
}

#[tokio::test]
async fn raw_completion_uses_generate_endpoint() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .body_contains("\"model\":\"gemma:7b-instruct\"")
            .body_contains("\"num_predict\":200");
        then.status(200)
            .header("content-type", "application/json")
            .body(generate_reply("50% perfective"));
    });

    let generator = OllamaGenerator::new(server.base_url()).unwrap();
    let out = generator
        .complete(Completion::Raw {
            model: "gemma:7b-instruct".into(),
            prompt: "classify".into(),
            system: None,
            options: SamplingOptions::new(Device::Gpu).max_new_tokens(200),
        })
        .await
        .unwrap();
    mock.assert();
    assert_eq!(out, "50% perfective");
}

#[tokio::test]
async fn chat_completion_uses_chat_endpoint() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/chat")
            .body_contains("\"role\":\"system\"")
            .body_contains("be brief");
        then.status(200)
            .header("content-type", "application/json")
            .body(chat_reply("ok"));
    });

    let generator = OllamaGenerator::new(server.base_url()).unwrap();
    let out = generator
        .complete(Completion::Chat {
            model: "codellama:7b-instruct".into(),
            messages: vec![Message::system("be brief"), Message::user("go")],
            options: SamplingOptions::default(),
        })
        .await
        .unwrap();
    mock.assert();
    assert_eq!(out, "ok");
}

#[tokio::test]
async fn cpu_device_disables_gpu_offload() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .body_contains("\"num_gpu\":0");
        then.status(200)
            .header("content-type", "application/json")
            .body(generate_reply("ok"));
    });

    let generator = OllamaGenerator::new(server.base_url()).unwrap();
    generator
        .complete(Completion::Raw {
            model: "gemma:7b-instruct".into(),
            prompt: "classify".into(),
            system: None,
            options: SamplingOptions::new(Device::Cpu),
        })
        .await
        .unwrap();
    mock.assert();
}

#[tokio::test]
async fn server_failure_becomes_backend_error() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/api/generate");
        then.status(500).body("out of memory");
    });

    let generator = OllamaGenerator::new(server.base_url()).unwrap();
    let err = generator
        .complete(Completion::Raw {
            model: "gemma:7b-instruct".into(),
            prompt: "classify".into(),
            system: None,
            options: SamplingOptions::default(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Backend(_)));
}

#[tokio::test]
async fn installed_model_is_not_pulled() {
    let server = MockServer::start_async().await;
    let tags = server.mock(|when, then| {
        when.method(GET).path("/api/tags");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"models": [{"name": "gemma:7b-instruct", "modified_at": "0", "size": 0}]}"#);
    });
    let pull = server.mock(|when, then| {
        when.method(POST).path("/api/pull");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"status": "success"}"#);
    });

    let generator = OllamaGenerator::new(server.base_url()).unwrap();
    generator.ensure_model("gemma:7b-instruct").await.unwrap();
    tags.assert();
    pull.assert_hits(0);
}

#[tokio::test]
async fn missing_model_is_pulled() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/api/tags");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"models": []}"#);
    });
    let pull = server.mock(|when, then| {
        when.method(POST)
            .path("/api/pull")
            .body_contains("llama2:7b-chat");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"status": "success"}"#);
    });

    let generator = OllamaGenerator::new(server.base_url()).unwrap();
    generator.ensure_model("llama2:7b-chat").await.unwrap();
    pull.assert();
}

#[tokio::test]
async fn dispatches_through_ollama() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .body_contains("gemma:7b-instruct")
            .body_contains("The Commit's affected files");
        then.status(200)
            .header("content-type", "application/json")
            .body(generate_reply("adaptive: 10%, corrective: 20%, perfective: 70%"));
    });

    let config = DispatchConfig {
        ollama_url: server.base_url(),
        ..DispatchConfig::default()
    };
    let dispatcher = Dispatcher::from_config(config).unwrap();
    let out = dispatcher.submit("Gemma7BInstruct", COMMIT_PROMPT).await.unwrap();
    mock.assert();
    assert_eq!(out, "adaptive: 10%, corrective: 20%, perfective: 70%");
}

#[tokio::test]
async fn raw_completion_forwards_system_prompt() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .body_contains("\"system\":\"answer in percent\"");
        then.status(200)
            .header("content-type", "application/json")
            .body(generate_reply("ok"));
    });

    let generator = OllamaGenerator::new(server.base_url()).unwrap();
    generator
        .complete(Completion::Raw {
            model: "gemma:7b-instruct".into(),
            prompt: "classify".into(),
            system: Some("answer in percent".into()),
            options: SamplingOptions::default(),
        })
        .await
        .unwrap();
    mock.assert();
}
