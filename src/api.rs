use crate::{
    constants::{ASK_PATH, ASK_STREAM_PATH, QUESTION_PARAM},
    errors::{AskchatError, AskchatResult},
    logging::{log_api_call, summarize},
    models::ApiCallLog,
};
use chrono::Utc;
use futures::{future::BoxFuture, stream::BoxStream, FutureExt, StreamExt};
use reqwest::{Client, RequestBuilder, Response, Url};
use std::time::Instant;

/// Raw body chunks of a streamed answer, in arrival order. The stream ending
/// is the completion signal.
pub type ChunkStream = BoxStream<'static, AskchatResult<Vec<u8>>>;

/// The backend that answers questions.
///
/// Both calls return `'static` futures so the controller can run them on a
/// separate task while the UI keeps handling input.
pub trait AnswerService: Send + Sync + 'static {
    /// Fetches the whole answer at once.
    fn ask(&self, question: &str) -> BoxFuture<'static, AskchatResult<String>>;

    /// Opens the answer as an incremental byte stream.
    fn ask_stream(&self, question: &str) -> BoxFuture<'static, AskchatResult<ChunkStream>>;
}

/// `AnswerService` over `GET /ask` and `GET /ask-stream`.
#[derive(Debug, Clone)]
pub struct HttpAnswerService {
    client: Client,
    base_url: String,
}

impl HttpAnswerService {
    pub fn new(base_url: &str) -> AskchatResult<Self> {
        Url::parse(base_url)
            .map_err(|e| AskchatError::config_error(format!("Invalid base_url: {}", e)))?;

        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, path: &str, question: &str) -> RequestBuilder {
        self.client
            .get(self.endpoint(path))
            .query(&[(QUESTION_PARAM, question)])
    }
}

impl AnswerService for HttpAnswerService {
    fn ask(&self, question: &str) -> BoxFuture<'static, AskchatResult<String>> {
        let request = self.request(ASK_PATH, question);
        let endpoint = self.endpoint(ASK_PATH);
        let summary = summarize(question);

        async move {
            let response = send(request, endpoint, summary).await?;
            response
                .text()
                .await
                .map_err(|e| AskchatError::transport_error(format!("Failed to read answer: {}", e)))
        }
        .boxed()
    }

    fn ask_stream(&self, question: &str) -> BoxFuture<'static, AskchatResult<ChunkStream>> {
        let request = self.request(ASK_STREAM_PATH, question);
        let endpoint = self.endpoint(ASK_STREAM_PATH);
        let summary = summarize(question);

        async move {
            let response = send(request, endpoint, summary).await?;
            let stream = response.bytes_stream().map(|item| {
                item.map(|bytes| bytes.to_vec())
                    .map_err(|e| AskchatError::stream_error(format!("Stream read error: {}", e)))
            });
            Ok(stream.boxed())
        }
        .boxed()
    }
}

/// Sends the request, records it in the call log and rejects non-success
/// statuses.
async fn send(
    request: RequestBuilder,
    endpoint: String,
    summary: String,
) -> AskchatResult<Response> {
    let start_time = Instant::now();
    let result = request.send().await;

    let response_status = result
        .as_ref()
        .map(|response| response.status().as_u16())
        .unwrap_or(0);
    log_api_call(&ApiCallLog {
        timestamp: Utc::now(),
        endpoint,
        request_summary: summary,
        response_status,
        response_time_ms: start_time.elapsed().as_millis(),
    });

    let response =
        result.map_err(|e| AskchatError::transport_error(format!("Request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AskchatError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    async fn collect(mut stream: ChunkStream) -> AskchatResult<Vec<u8>> {
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend(chunk?);
        }
        Ok(body)
    }

    #[tokio::test]
    async fn test_ask_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ask"))
            .and(query_param("question", "hello"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hi there"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let service = HttpAnswerService::new(&mock_server.uri()).unwrap();
        let answer = service.ask("hello").await.unwrap();

        assert_eq!(answer, "hi there");
    }

    #[tokio::test]
    async fn test_question_is_url_encoded() {
        let mock_server = MockServer::start().await;
        let question = "что такое Rust? a&b=c #1";

        Mock::given(method("GET"))
            .and(path("/ask"))
            .and(query_param("question", question))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let service = HttpAnswerService::new(&format!("{}/", mock_server.uri())).unwrap();
        assert_eq!(service.ask(question).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_ask_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model offline"))
            .mount(&mock_server)
            .await;

        let service = HttpAnswerService::new(&mock_server.uri()).unwrap();
        match service.ask("hello").await {
            Err(AskchatError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "model offline");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ask_stream_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ask-stream"))
            .and(query_param("question", "hello"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Здравствуйте!"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let service = HttpAnswerService::new(&mock_server.uri()).unwrap();
        let stream = service.ask_stream("hello").await.unwrap();
        let body = collect(stream).await.unwrap();

        assert_eq!(String::from_utf8(body).unwrap(), "Здравствуйте!");
    }

    #[tokio::test]
    async fn test_ask_stream_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ask-stream"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let service = HttpAnswerService::new(&mock_server.uri()).unwrap();
        assert!(matches!(
            service.ask_stream("hello").await,
            Err(AskchatError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        // Reserve a port, then close it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let service = HttpAnswerService::new(&format!("http://127.0.0.1:{}", port)).unwrap();
        let err = service.ask("hello").await.unwrap_err();

        assert!(matches!(err, AskchatError::Transport(_)));
        assert!(err.is_connectivity());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            HttpAnswerService::new("localhost without scheme"),
            Err(AskchatError::Config(_))
        ));
    }
}
