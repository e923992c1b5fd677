//! Smoke client against a live router on an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;

use tempfile::TempDir;

use pdf_courier::config::SmokeArgs;
use pdf_courier::engine::Renderer;
use pdf_courier::page::PageStyle;
use pdf_courier::server::{router, AppState};
use pdf_courier::smoke::{self, SmokeError};
use pdf_courier::RenderError;

struct FailingRenderer;

impl Renderer for FailingRenderer {
    fn render(&self, _html: &str, _styles: &[PageStyle]) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::new("engine exploded"))
    }
}

async fn spawn_service(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let app = router(state, 10 * 1024 * 1024);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server runs");
    });
    addr
}

fn args(addr: SocketAddr, dir: &TempDir) -> SmokeArgs {
    SmokeArgs {
        base_url: format!("http://{addr}/"),
        output: dir.path().join("test_output.pdf"),
        timeout: 30,
    }
}

#[tokio::test]
async fn smoke_run_writes_pdf() {
    let addr = spawn_service(AppState::default()).await;
    let dir = TempDir::new().expect("temp dir");
    let args = args(addr, &dir);

    let report = smoke::run(&args).await.expect("smoke run succeeds");
    assert_eq!(report.filename, "test_document.pdf");
    assert!(report.size_bytes > 0);
    assert_eq!(report.output, args.output);

    let written = std::fs::read(&args.output).expect("output written");
    assert!(written.starts_with(b"%PDF-"));
    assert_eq!(written.len(), report.size_bytes);
}

#[tokio::test]
async fn smoke_run_reports_rejection() {
    let addr = spawn_service(AppState::new(Arc::new(FailingRenderer))).await;
    let dir = TempDir::new().expect("temp dir");
    let args = args(addr, &dir);

    match smoke::run(&args).await {
        Err(SmokeError::Rejected { status, error }) => {
            assert_eq!(status, 500);
            assert_eq!(error, "PDF conversion failed: engine exploded");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(!args.output.exists());
}

#[tokio::test]
async fn smoke_run_reports_unreachable_service() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    let dir = TempDir::new().expect("temp dir");

    let err = smoke::run(&args(addr, &dir)).await.unwrap_err();
    assert!(matches!(err, SmokeError::Request { .. }), "{err}");
}
