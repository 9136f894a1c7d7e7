//! `tunestat login`: browser navigation to the backend login endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tunestat_core::config::{Config, ENV_NO_BROWSER};
use url::Url;

use super::{MountOptions, resolve, status};

/// Port the backend redirects to after a completed login.
pub const DEFAULT_RETURN_PORT: u16 = 3000;

const RETURN_TIMEOUT: Duration = Duration::from_secs(120);

pub async fn run(config: &Config, options: MountOptions, wait: bool, port: u16) -> Result<()> {
    let login_url = config.endpoint("login")?;

    if !wait {
        open_login(&login_url);
        println!("After logging in, run `tunestat status`.");
        return Ok(());
    }

    // Bind before navigating so the redirect cannot arrive first.
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("Failed to listen on 127.0.0.1:{port}"))?;
    open_login(&login_url);
    println!("Waiting for the login redirect on http://127.0.0.1:{port}/ ...");

    let referer = tokio::time::timeout(RETURN_TIMEOUT, wait_for_return(&listener))
        .await
        .context("Timed out waiting for the login redirect")??;
    tracing::debug!(referer = ?referer, "login redirect received");

    let options = MountOptions {
        referrer: referer.or(options.referrer),
        ephemeral: options.ephemeral,
    };
    let (state, login_url) = resolve(config, &options).await?;
    status::print_human(&state, &login_url);
    Ok(())
}

fn open_login(url: &Url) {
    println!("Opening {url}");
    if std::env::var_os(ENV_NO_BROWSER).is_some() {
        return;
    }
    if let Err(err) = open::that(url.as_str()) {
        tracing::warn!(error = %err, "failed to open browser");
        println!("Could not open a browser. Visit the URL above to log in.");
    }
}

/// Accepts one request and returns its `Referer` header, if any.
async fn wait_for_return(listener: &TcpListener) -> Result<Option<String>> {
    let (mut stream, _) = listener
        .accept()
        .await
        .context("Failed to accept the login redirect")?;

    let mut buffer = vec![0u8; 8192];
    let read = stream
        .read(&mut buffer)
        .await
        .context("Failed to read the login redirect")?;
    let request = String::from_utf8_lossy(&buffer[..read]);
    let referer = extract_referer(&request);

    let _ = stream.write_all(return_response().as_bytes()).await;
    let _ = stream.shutdown().await;
    Ok(referer)
}

fn extract_referer(request: &str) -> Option<String> {
    request
        .lines()
        .skip(1)
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("referer"))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn return_response() -> String {
    let body = "<html><body><h3>Back from login</h3><p>You can close this window.</p></body></html>";
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpStream;

    use super::*;

    #[test]
    fn referer_header_is_case_insensitive() {
        let request = "GET / HTTP/1.1\r\nHost: 127.0.0.1:3000\r\nreferer: https://accounts.spotify.com/\r\n\r\n";
        assert_eq!(
            extract_referer(request).as_deref(),
            Some("https://accounts.spotify.com/")
        );
    }

    #[test]
    fn missing_referer_is_none() {
        let request = "GET / HTTP/1.1\r\nHost: 127.0.0.1:3000\r\n\r\n";
        assert_eq!(extract_referer(request), None);
    }

    #[test]
    fn body_lines_are_not_headers() {
        let request = "POST / HTTP/1.1\r\nHost: x\r\n\r\nReferer: https://accounts.spotify.com/";
        assert_eq!(extract_referer(request), None);
    }

    #[tokio::test]
    async fn captures_referer_from_redirect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream
                .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nReferer: https://accounts.spotify.com/en/login\r\n\r\n")
                .await
                .unwrap();
            let mut response = String::new();
            stream.read_to_string(&mut response).await.unwrap();
            response
        });

        let referer = wait_for_return(&listener).await.unwrap();
        assert_eq!(
            referer.as_deref(),
            Some("https://accounts.spotify.com/en/login")
        );
        assert!(client.await.unwrap().starts_with("HTTP/1.1 200 OK"));
    }
}
