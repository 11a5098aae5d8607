use anyhow::{Context, Result};
use log::debug;
use reqwest::blocking::Client;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

pub const CHUNK_SIZE: usize = 8192;

/// Stream `url` into `dest_path` in fixed-size chunks, returning the byte count.
///
/// The destination is only created once the server has answered with a
/// success status. A failed transfer leaves whatever was written in place.
pub fn download_to(client: &Client, url: &str, dest_path: &Path, timeout: Duration) -> Result<u64> {
    debug!("GET {}", url);
    let mut response = client
        .get(url)
        .timeout(timeout)
        .send()
        .context("Failed to download package")?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status: {}", response.status());
    }

    let total_size = response.content_length();
    let mut file = std::fs::File::create(dest_path)
        .with_context(|| format!("Failed to create {}", dest_path.display()))?;

    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let bytes_read = response
            .read(&mut buffer)
            .context("Failed to read from download stream")?;

        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .context("Failed to write downloaded file")?;

        downloaded += bytes_read as u64;
    }

    file.flush().context("Failed to write downloaded file")?;

    match total_size {
        Some(total) => debug!("wrote {} of {} bytes to {}", downloaded, total, dest_path.display()),
        None => debug!("wrote {} bytes to {}", downloaded, dest_path.display()),
    }
    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{serve, CannedResponse};

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    #[test]
    fn test_download_is_byte_identical() {
        let body = payload(CHUNK_SIZE * 5 + 123);
        let base = serve(vec![("/pkg.deb", CannedResponse::ok(body.clone()))]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("pkg.deb");

        let written = download_to(
            &Client::new(),
            &format!("{}/pkg.deb", base),
            &dest,
            Duration::from_secs(10),
        )
        .unwrap();

        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[test]
    fn test_download_empty_body() {
        let base = serve(vec![("/empty.deb", CannedResponse::ok(Vec::new()))]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("empty.deb");

        let written = download_to(
            &Client::new(),
            &format!("{}/empty.deb", base),
            &dest,
            Duration::from_secs(10),
        )
        .unwrap();

        assert_eq!(written, 0);
        assert!(std::fs::read(&dest).unwrap().is_empty());
    }

    #[test]
    fn test_download_error_status_creates_no_file() {
        let base = serve(vec![("/pkg.deb", CannedResponse::status(503))]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("pkg.deb");

        let err = download_to(
            &Client::new(),
            &format!("{}/pkg.deb", base),
            &dest,
            Duration::from_secs(10),
        )
        .unwrap_err();

        assert!(err.to_string().contains("503"));
        assert!(!dest.exists());
    }

    #[test]
    fn test_download_unwritable_destination() {
        let base = serve(vec![("/pkg.deb", CannedResponse::ok(payload(10)))]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing").join("pkg.deb");

        assert!(
            download_to(
                &Client::new(),
                &format!("{}/pkg.deb", base),
                &dest,
                Duration::from_secs(10),
            )
            .is_err()
        );
    }
}
