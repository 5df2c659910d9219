#![allow(dead_code)]

use ava::clipboard::MemoryClipboard;
use ava::llm::MockProvider;
use ava::{ActionDispatcher, AvaConfig, EventEmitter, LlmProvider, Session};
use parking_lot::Mutex;
use std::sync::Arc;
use tempfile::TempDir;

pub struct Harness {
    pub dispatcher: ActionDispatcher,
    pub llm: Arc<MockProvider>,
    pub clipboard: Arc<MemoryClipboard>,
    pub session: Session,
    pub dir: TempDir,
}

/// Dispatcher over a scripted provider, an in-memory clipboard and a
/// knowledgebase file in a temp dir.
pub fn harness(llm: MockProvider, configure: impl FnOnce(&mut AvaConfig)) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AvaConfig::default();
    config.knowledgebase_path = dir.path().join("knowledgebase.jsonl");
    configure(&mut config);

    let llm = Arc::new(llm);
    let clipboard = Arc::new(MemoryClipboard::new());
    let session = Session::from_config(&config);
    let provider: Arc<dyn LlmProvider> = llm.clone();
    let dispatcher = ActionDispatcher::new(Arc::new(config), provider)
        .unwrap()
        .with_clipboard(clipboard.clone());

    Harness {
        dispatcher,
        llm,
        clipboard,
        session,
        dir,
    }
}

/// Records every emitted event in order.
#[derive(Default)]
pub struct RecordingEmitter {
    pub events: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingEmitter {
    pub fn tokens(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|(event, _)| event == "token")
            .filter_map(|(_, data)| data["token"].as_str().map(str::to_string))
            .collect()
    }
}

impl EventEmitter for RecordingEmitter {
    fn emit(&self, event: &str, data: serde_json::Value) {
        self.events.lock().push((event.to_string(), data));
    }
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn words(n: usize) -> String {
    (0..n)
        .map(|i| format!("word{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}
