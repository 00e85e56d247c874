//! Fetch one file over SFTP and print the response.
//!
//! ```sh
//! SFTP_USER=foo SFTP_PASSWORD=bar cargo run --example fetch -- sftp://127.0.0.1:22/etc/hostname
//! ```

use http::Request;
use sftp_http::{Credentials, HostKeyPolicy, Result, RoundTripper};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sftp://127.0.0.1:22/etc/hostname".to_string());
    let user = std::env::var("SFTP_USER").unwrap_or_else(|_| "foo".to_string());
    let password = std::env::var("SFTP_PASSWORD").unwrap_or_else(|_| "bar".to_string());

    let credentials = Credentials::new(user)
        .password(password)
        .host_keys(HostKeyPolicy::AcceptAny);
    let rt = RoundTripper::new(credentials);

    let request = Request::get(url.as_str()).body(())?;
    let response = rt.round_trip(&request).await?;

    println!("{:?} {}", response.version(), response.status());
    for (name, value) in response.headers() {
        println!("{name}: {}", value.to_str().unwrap_or("<binary>"));
    }
    println!();

    let body = response.into_body().collect().await?;
    println!("{}", String::from_utf8_lossy(&body));

    rt.close().await
}
