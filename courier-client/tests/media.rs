mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::header;
use courier_client::{Config, MediaError, MediaTransfer};
use courier_gateway::File;
use courier_tl as tl;
use courier_tl::{Function, Object};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use common::{FakeGateway, FakeTransport, MemoryStorage, client, config, rpc};

fn location() -> tl::enums::InputFileLocation {
    tl::enums::InputFileLocation::InputDocumentFileLocation(tl::types::InputDocumentFileLocation {
        id:             1,
        access_hash:    2,
        file_reference: vec![3],
        thumb_size:     String::new(),
    })
}

/// Serves `content` in `upload.getFile` chunks.
fn serve(content: Vec<u8>, file_type: tl::enums::storage::FileType) -> impl FnMut(&Function) -> Result<Object, courier_client::InvocationError> {
    move |f| match f {
        Function::UploadGetFile(req) => {
            let start = (req.offset as usize).min(content.len());
            let end   = (start + req.limit as usize).min(content.len());
            Ok(Object::File(tl::enums::upload::File::File(tl::types::upload::File {
                r#type: file_type,
                mtime:  0,
                bytes:  content[start..end].to_vec(),
            })))
        }
        other => Err(rpc(400, other.name())),
    }
}

fn small_chunks() -> Config {
    Config { chunk_size: 512, ..config() }
}

fn offsets(transport: &FakeTransport) -> Vec<(i64, i32)> {
    transport
        .calls()
        .into_iter()
        .filter_map(|f| match f {
            Function::UploadGetFile(req) => Some((req.offset, req.limit)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn download_streams_chunks_into_storage() {
    let content: Vec<u8> = (0..1200u32).map(|i| i as u8).collect();
    let transport = FakeTransport::new(serve(content.clone(), tl::enums::storage::FileType::Pdf));
    let storage = Arc::new(MemoryStorage::default());
    let gateway = FakeGateway::new(&[]);
    let media = MediaTransfer::new(client(&transport, small_chunks()), Arc::clone(&storage) as _, gateway.handle());

    let file = media.download_to_storage(&CancellationToken::new(), File::default(), location()).await.unwrap();

    assert_eq!(offsets(&transport), vec![(0, 512), (512, 512), (1024, 512)]);
    let frames = storage.frames.lock().unwrap().clone();
    let sizes: Vec<usize> = frames.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![512, 512, 176, 0]);
    assert_eq!(frames.concat(), content);

    assert_eq!(file.id, 7);
    assert_eq!(file.size, 1200);
    assert_eq!(file.mime, "application/pdf");
    assert!(file.name.starts_with("doc_") && file.name.ends_with(".pdf"), "{}", file.name);
    assert_eq!(file.url, "https://chat.example.com/any/file/7/download");

    let uploads = storage.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].mime, "application/pdf");
    assert!(!uploads[0].uuid.is_empty());
}

#[tokio::test]
async fn exact_multiple_ends_with_an_empty_chunk() {
    let transport = FakeTransport::new(serve(vec![1; 1024], tl::enums::storage::FileType::Unknown));
    let storage = Arc::new(MemoryStorage::default());
    let media = MediaTransfer::new(
        client(&transport, small_chunks()),
        Arc::clone(&storage) as _,
        FakeGateway::new(&[]).handle(),
    );
    let seed = File { name: "report.bin".into(), mime: "application/x-thing".into(), ..File::default() };
    let file = media.download_to_storage(&CancellationToken::new(), seed, location()).await.unwrap();

    assert_eq!(offsets(&transport).len(), 3);
    let sizes: Vec<usize> = storage.frames.lock().unwrap().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![512, 512, 0]);
    assert_eq!(file.name, "report.bin");
    assert_eq!(file.mime, "application/x-thing");
}

#[tokio::test(start_paused = true)]
async fn flood_wait_is_absorbed() {
    let flooded = Arc::new(AtomicBool::new(false));
    let mut inner = serve(vec![9; 100], tl::enums::storage::FileType::Jpeg);
    let once = Arc::clone(&flooded);
    let transport = FakeTransport::new(move |f| {
        if !once.swap(true, Ordering::SeqCst) {
            return Err(rpc(420, "FLOOD_WAIT_2"));
        }
        inner(f)
    });
    let storage = Arc::new(MemoryStorage::default());
    let media = MediaTransfer::new(client(&transport, config()), Arc::clone(&storage) as _, FakeGateway::new(&[]).handle());

    let file = media.download_to_storage(&CancellationToken::new(), File::default(), location()).await.unwrap();

    assert_eq!(offsets(&transport), vec![(0, 512 * 1024), (0, 512 * 1024)]);
    assert_eq!(file.mime, "image/jpeg");
    assert_eq!(file.size, 100);
}

#[tokio::test]
async fn cdn_redirect_is_not_followed() {
    let transport = FakeTransport::new(|_| {
        Ok(Object::File(tl::enums::upload::File::CdnRedirect(tl::types::upload::FileCdnRedirect {
            dc_id: 203,
            ..Default::default()
        })))
    });
    let media = MediaTransfer::new(
        client(&transport, config()),
        Arc::new(MemoryStorage::default()),
        FakeGateway::new(&[]).handle(),
    );
    let err = media.download_to_storage(&CancellationToken::new(), File::default(), location()).await.unwrap_err();
    assert!(matches!(err, MediaError::CdnRedirect { dc_id: 203 }));
}

#[tokio::test]
async fn other_errors_abort_the_download() {
    let transport = FakeTransport::new(|_| Err(rpc(400, "FILE_REFERENCE_EXPIRED")));
    let storage = Arc::new(MemoryStorage::default());
    let media = MediaTransfer::new(client(&transport, config()), Arc::clone(&storage) as _, FakeGateway::new(&[]).handle());
    let err = media.download_to_storage(&CancellationToken::new(), File::default(), location()).await.unwrap_err();
    assert!(matches!(err, MediaError::Invocation(e) if e.is("FILE_REFERENCE_EXPIRED")));
    assert!(storage.uploads.lock().unwrap().is_empty());
}

// ── Upload ────────────────────────────────────────────────────────────────────

/// Serves `body` as a PDF with a `Content-Length` on a local port.
async fn host(body: Vec<u8>) -> String {
    let app = axum::Router::new().route(
        "/files/report",
        axum::routing::get(move || async move { ([(header::CONTENT_TYPE, "application/pdf")], body) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}/files/report")
}

/// Serves `pieces` with chunked transfer encoding and no length.
async fn host_chunked(pieces: Vec<Vec<u8>>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = sock.read(&mut request).await.unwrap();
        let mut out = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n".to_vec();
        for piece in pieces {
            out.extend_from_slice(format!("{:x}\r\n", piece.len()).as_bytes());
            out.extend_from_slice(&piece);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"0\r\n\r\n");
        sock.write_all(&out).await.unwrap();
        sock.shutdown().await.unwrap();
    });
    format!("http://{addr}/notes")
}

fn accept_parts(f: &Function) -> Result<Object, courier_client::InvocationError> {
    match f {
        Function::UploadSaveFilePart(_) | Function::UploadSaveBigFilePart(_) => Ok(Object::Bool(true)),
        other => Err(rpc(400, other.name())),
    }
}

#[tokio::test]
async fn large_body_is_sent_as_big_file_parts() {
    let transport = FakeTransport::new(accept_parts);
    let cfg = Config { chunk_size: 4 * 1024 * 1024, ..config() };
    let media = MediaTransfer::new(client(&transport, cfg), Arc::new(MemoryStorage::default()), FakeGateway::new(&[]).handle());
    let body: Vec<u8> = (0..10 * 1024 * 1024u32).map(|i| (i % 251) as u8).collect();
    let file = File { url: host(body.clone()).await, ..File::default() };

    let uploaded = media.upload_from_url(&CancellationToken::new(), &file).await.unwrap();

    let parts: Vec<_> = transport
        .calls()
        .into_iter()
        .map(|f| match f {
            Function::UploadSaveBigFilePart(p) => p,
            other => panic!("unexpected {}", other.name()),
        })
        .collect();
    let shape: Vec<(i32, i32, usize)> = parts.iter().map(|p| (p.file_part, p.file_total_parts, p.bytes.len())).collect();
    assert_eq!(shape, vec![(0, 3, 4 << 20), (1, 3, 4 << 20), (2, 3, 2 << 20)]);
    assert!(parts.iter().all(|p| p.file_id == parts[0].file_id));
    assert_eq!(parts.into_iter().flat_map(|p| p.bytes).collect::<Vec<_>>(), body);

    assert_eq!(uploaded.name, "report.pdf");
    assert_eq!(uploaded.mime, "application/pdf");
    assert_eq!(uploaded.size, body.len());
    let tl::enums::InputFile::Big(input) = &uploaded.file else { panic!("{:?}", uploaded.file) };
    assert_eq!(input.parts, 3);
}

#[tokio::test]
async fn small_body_is_sent_as_file_parts() {
    let transport = FakeTransport::new(accept_parts);
    let media = MediaTransfer::new(client(&transport, small_chunks()), Arc::new(MemoryStorage::default()), FakeGateway::new(&[]).handle());
    let file = File { url: host(vec![5; 1100]).await, name: "scan".into(), ..File::default() };

    let uploaded = media.upload_from_url(&CancellationToken::new(), &file).await.unwrap();

    let shape: Vec<(i32, usize)> = transport
        .calls()
        .into_iter()
        .map(|f| match f {
            Function::UploadSaveFilePart(p) => (p.file_part, p.bytes.len()),
            other => panic!("unexpected {}", other.name()),
        })
        .collect();
    assert_eq!(shape, vec![(0, 512), (1, 512), (2, 76)]);
    assert_eq!(uploaded.name, "scan.pdf");
    let tl::enums::InputFile::InputFile(input) = &uploaded.file else { panic!("{:?}", uploaded.file) };
    assert_eq!(input.parts, 3);
}

#[tokio::test]
async fn body_without_length_is_decided_at_the_end() {
    let transport = FakeTransport::new(accept_parts);
    let media = MediaTransfer::new(client(&transport, small_chunks()), Arc::new(MemoryStorage::default()), FakeGateway::new(&[]).handle());
    let file = File { url: host_chunked(vec![vec![1; 300], vec![2; 300], vec![3; 100]]).await, ..File::default() };

    let uploaded = media.upload_from_url(&CancellationToken::new(), &file).await.unwrap();

    assert_eq!(transport.names(), vec!["upload.saveFilePart", "upload.saveFilePart"]);
    assert_eq!(uploaded.size, 700);
    assert_eq!(uploaded.mime, "text/plain");
    assert!(matches!(uploaded.file, tl::enums::InputFile::InputFile(ref f) if f.parts == 2));
}

#[tokio::test]
async fn http_errors_stop_the_upload() {
    let transport = FakeTransport::new(accept_parts);
    let media = MediaTransfer::new(client(&transport, config()), Arc::new(MemoryStorage::default()), FakeGateway::new(&[]).handle());
    let url = host(vec![1]).await.replace("/files/report", "/missing");

    let err = media.upload_from_url(&CancellationToken::new(), &File { url, ..File::default() }).await.unwrap_err();
    assert!(matches!(err, MediaError::HttpStatus { status: 404, .. }), "{err:?}");
    assert!(transport.calls().is_empty());
}
