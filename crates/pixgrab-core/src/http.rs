//! HTTP GET primitive.
//!
//! Uses the curl crate (libcurl). One `Easy` handle per request, so the
//! fetcher is safe to share across pool workers. Every call runs on the
//! current thread.

use crate::error::FetchError;
use crate::storage::PartFile;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Performs one request per call. Implemented by [`CurlFetcher`]; tests
/// substitute in-memory fakes.
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the full response body.
    fn get(&self, url: &str, headers: &HashMap<String, String>) -> Result<Vec<u8>, FetchError>;

    /// GET `url` and stream the body into `dest`. Returns bytes written.
    fn download(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        dest: &Path,
    ) -> Result<u64, FetchError>;
}

/// libcurl-backed fetcher with fixed timeouts.
#[derive(Debug, Clone, Copy)]
pub struct CurlFetcher {
    connect_timeout: Duration,
    timeout: Duration,
}

impl Default for CurlFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(15), Duration::from_secs(60))
    }
}

impl CurlFetcher {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Self {
        Self {
            connect_timeout,
            timeout,
        }
    }

    fn easy(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<curl::easy::Easy, FetchError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;

        // Build curl list for custom headers (e.g. "Name: value").
        let mut list = curl::easy::List::new();
        for (k, v) in headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        if !headers.is_empty() {
            easy.http_headers(list)?;
        }
        Ok(easy)
    }
}

impl Fetcher for CurlFetcher {
    fn get(&self, url: &str, headers: &HashMap<String, String>) -> Result<Vec<u8>, FetchError> {
        let mut easy = self.easy(url, headers)?;
        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }
        check_status(&mut easy)?;
        Ok(body)
    }

    fn download(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        dest: &Path,
    ) -> Result<u64, FetchError> {
        let mut easy = self.easy(url, headers)?;
        let mut part = PartFile::create(dest)?;
        let outcome = transfer_into(&mut easy, &mut part)
            .and_then(|()| check_status(&mut easy))
            .and_then(|()| check_length(&mut easy, part.written()));
        match outcome {
            Ok(()) => Ok(part.finalize()?),
            Err(e) => {
                part.discard();
                Err(e)
            }
        }
    }
}

fn transfer_into(easy: &mut curl::easy::Easy, part: &mut PartFile) -> Result<(), FetchError> {
    let mut write_err = None;
    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match part.append(data) {
            Ok(()) => Ok(data.len()),
            Err(e) => {
                write_err = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.perform()
    };
    if let Some(e) = write_err {
        return Err(FetchError::Storage(e));
    }
    performed?;
    Ok(())
}

fn check_status(easy: &mut curl::easy::Easy) -> Result<(), FetchError> {
    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(FetchError::Http(code));
    }
    Ok(())
}

fn check_length(easy: &mut curl::easy::Easy, received: u64) -> Result<(), FetchError> {
    let advertised = easy.content_length_download()?;
    if advertised >= 0.0 && advertised as u64 != received {
        return Err(FetchError::PartialTransfer {
            expected: advertised as u64,
            received,
        });
    }
    Ok(())
}
