//! End-to-end test harness for the StorePulse dashboard.
//!
//! Each test gets its own dashboard bound to an ephemeral port and its own
//! `mockito` server standing in for the analytics backend. The HTTP client
//! keeps cookies, so a test behaves like one browser session.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storepulse-integration-tests
//! ```

use mockito::ServerGuard;
use storepulse_dashboard::config::DashboardConfig;
use storepulse_dashboard::state::AppState;

/// A running dashboard, its fake backend, and a browser-like client.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub backend: ServerGuard,
}

impl TestApp {
    /// Start a dashboard against a fresh fake backend.
    ///
    /// # Panics
    ///
    /// Panics if the dashboard cannot be configured or bound.
    pub async fn spawn() -> Self {
        let backend = mockito::Server::new_async().await;
        let backend_url = backend.url();

        let config = DashboardConfig::from_lookup(|key| match key {
            "DASHBOARD_BACKEND_URL" => Some(backend_url.clone()),
            "DASHBOARD_REQUEST_TIMEOUT_SECS" => Some("5".to_owned()),
            _ => None,
        })
        .expect("test configuration");
        let state = AppState::new(config).expect("application state");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local address");
        let app = storepulse_dashboard::app(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("dashboard server");
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("http client");

        Self {
            base_url: format!("http://{addr}"),
            client,
            backend,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a page, following redirects. Returns the final path, status and body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn get(&self, path: &str) -> Page {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request");
        Page::read(response).await
    }

    /// POST a form, following redirects.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> Page {
        let response = self
            .client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request");
        Page::read(response).await
    }
}

/// A fetched page after redirects.
#[derive(Debug)]
pub struct Page {
    pub path: String,
    pub status: reqwest::StatusCode,
    pub body: String,
}

impl Page {
    async fn read(response: reqwest::Response) -> Self {
        let path = response.url().path().to_owned();
        let status = response.status();
        let body = response.text().await.expect("response body");
        Self { path, status, body }
    }
}
