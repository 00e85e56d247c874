//! Page through a remote directory a few entries at a time.
//!
//! ```sh
//! SFTP_USER=foo SFTP_PASSWORD=bar cargo run --example browse -- sftp://127.0.0.1:22/home/foo
//! ```

use sftp_http::{Credentials, Error, FileSystem, HostKeyPolicy, Result};

const PAGE: usize = 5;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sftp://127.0.0.1:22/".to_string());
    let user = std::env::var("SFTP_USER").unwrap_or_else(|_| "foo".to_string());
    let password = std::env::var("SFTP_PASSWORD").unwrap_or_else(|_| "bar".to_string());

    let credentials = Credentials::new(user)
        .password(password)
        .host_keys(HostKeyPolicy::AcceptAny);
    let fs = FileSystem::connect(&url, &credentials).await?;

    let mut dir = fs.open("/").await?;
    println!("{} on {}", dir.name(), fs.host());

    let mut page = 1;
    loop {
        match dir.read_dir(PAGE).await {
            Ok(entries) => {
                println!("-- page {page}");
                for entry in entries {
                    let kind = if entry.attrs.is_dir() { "d" } else { "-" };
                    println!("{kind} {:>10} {}", entry.attrs.len(), entry.name);
                }
                page += 1;
            }
            Err(Error::EndOfSequence) => break,
            Err(e) => return Err(e),
        }
    }

    dir.close().await?;
    fs.close().await
}
