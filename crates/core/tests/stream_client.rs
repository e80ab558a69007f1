use docstream_core::{
    normalize, ApiClient, CancellationToken, ClientConfig, ClientError, RelevanceTier,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Serves exactly one request, answering with `status_line` and then writing `body_parts`
/// one at a time with a flush and short pause between them.
async fn serve_once(
    status_line: &'static str,
    content_type: &'static str,
    body_parts: Vec<&'static str>,
) -> Result<String, Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        if read_request(&mut socket).await.is_err() {
            return;
        }

        let head = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: {content_type}\r\nConnection: close\r\n\r\n"
        );
        if socket.write_all(head.as_bytes()).await.is_err() {
            return;
        }
        for part in body_parts {
            if socket.write_all(part.as_bytes()).await.is_err() {
                return;
            }
            let _ = socket.flush().await;
            tokio::time::sleep(Duration::from_millis(15)).await;
        }
        let _ = socket.shutdown().await;
    });

    Ok(format!("http://{address}"))
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut request = Vec::new();
    let mut buffer = [0u8; 1024];

    let header_end = loop {
        let read = socket.read(&mut buffer).await?;
        if read == 0 {
            return Ok(request);
        }
        request.extend_from_slice(&buffer[..read]);
        if let Some(position) = request.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while request.len() < header_end + content_length {
        let read = socket.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        request.extend_from_slice(&buffer[..read]);
    }

    Ok(request)
}

fn client(base_url: String) -> Result<ApiClient, ClientError> {
    ApiClient::new(&ClientConfig {
        base_url,
        request_timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    })
}

#[tokio::test]
async fn ingest_reassembles_events_split_across_network_chunks(
) -> Result<(), Box<dyn std::error::Error>> {
    let base_url = serve_once(
        "200 OK",
        "text/event-stream",
        vec![
            "data: {\"status\":\"processing\",\"current\":1,\"total\":2,",
            "\"filename\":\"a.txt\",\"message\":\"reading\"}\n\ndata: {\"status\":\"proc",
            "essing\",\"current\":2,\"total\":2,\"filename\":\"b.txt\",\"message\":\"stemming\"}\n\n",
            "data: {\"status\":\"complete\",\"documents\":[{\"id\":1,\"filename\":\"a.txt\",\"word_count\":12},",
            "{\"id\":2,\"filename\":\"b.txt\",\"word_count\":30}]}\n\n",
        ],
    )
    .await?;

    let api = client(base_url)?;
    let mut progress = Vec::new();
    let report = api
        .ingest("/data/corpus", &CancellationToken::new(), |state| {
            if let Some(snapshot) = state.progress() {
                progress.push((snapshot.current, snapshot.filename.clone()));
            }
        })
        .await?;

    // the transport may coalesce parts, so only the last update is certain
    assert_eq!(progress.last(), Some(&(2, "b.txt".to_string())));
    assert!(progress.windows(2).all(|pair| pair[0].0 <= pair[1].0));
    assert_eq!(report.events_applied, 3);
    let filenames: Vec<_> = report.documents.iter().map(|doc| doc.filename.as_str()).collect();
    assert_eq!(filenames, ["a.txt", "b.txt"]);
    Ok(())
}

#[tokio::test]
async fn stream_that_closes_early_is_reported_incomplete(
) -> Result<(), Box<dyn std::error::Error>> {
    let base_url = serve_once(
        "200 OK",
        "text/event-stream",
        vec!["data: {\"status\":\"processing\",\"current\":1,\"total\":5,\"filename\":\"a.txt\",\"message\":\"reading\"}\n\n"],
    )
    .await?;

    let result = client(base_url)?
        .ingest("/data/corpus", &CancellationToken::new(), |_| {})
        .await;

    assert!(matches!(
        result,
        Err(ClientError::IncompleteSession { events: 1 })
    ));
    Ok(())
}

#[tokio::test]
async fn failed_stream_request_surfaces_server_detail() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = serve_once(
        "400 Bad Request",
        "application/json",
        vec![r#"{"detail":"Folder does not exist"}"#],
    )
    .await?;

    let error = client(base_url)?
        .ingest("/missing", &CancellationToken::new(), |_| {})
        .await
        .err()
        .ok_or("expected the request to fail")?;

    match &error {
        ClientError::Api {
            endpoint, status, ..
        } => {
            assert_eq!(endpoint, "/api/upload-stream");
            assert_eq!(*status, 400);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(error.user_message(), "Folder does not exist");
    Ok(())
}

#[tokio::test]
async fn search_results_normalize_against_the_top_hit() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = serve_once(
        "200 OK",
        "application/json",
        vec![
            r#"{"status":"success","query_original":"Kucing","query_processed":"kucing","query_tokens":["kucing"],"total_results":2,"showing":2,"#,
            r#""results":[{"rank":1,"doc_index":0,"similarity":0.8,"filename":"a.txt","original_text":"Kucing","processed_text":"kucing","word_count":1},{"rank":2,"doc_index":1,"similarity":0.2,"filename":"b.txt","original_text":"anjing","processed_text":"anjing","word_count":1}]}"#,
        ],
    )
    .await?;

    let response = client(base_url)?.search("Kucing", Some(2)).await?;
    assert_eq!(response.query_tokens, ["kucing"]);

    let ranked = normalize(&response.results);
    assert_eq!(ranked[0].normalized_score, 100.0);
    assert_eq!(ranked[1].normalized_score, 25.0);
    assert_eq!(ranked[1].tier, RelevanceTier::LowRelevance);
    Ok(())
}
