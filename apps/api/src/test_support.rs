//! Helpers shared by unit tests across modules.

use axum::body::Body;
use axum::Router;
use http_body_util::BodyExt;

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub async fn response_json<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A job page copied out of LinkedIn, UI chrome included.
pub const LINKEDIN_SAMPLE: &str = "Acme Corp
Share
Show more options
Senior Backend Engineer
Remote (US) · 2 days ago · Over 100 applicants
Remote
Full-time
Easy Apply
Save
Save
Meet the hiring team
Hiring Manager: Jane Doe
About the job
We are building the payments core at Acme Corp.

The salary range for this role is $150,000 - $190,000 per year.

Requirements:
- 5+ years of experience building backend services
- Strong Rust and PostgreSQL skills
- Experience operating Kubernetes clusters
";
