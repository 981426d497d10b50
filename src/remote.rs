use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_LENGTH, HeaderMap, HeaderValue, RANGE, USER_AGENT};

use crate::error::FetchError;
use crate::index::ByteRange;

#[derive(Debug, Clone, Copy)]
pub struct ProbeInfo {
    pub status: u16,
    pub ok: bool,
    pub content_length: Option<u64>,
}

pub trait RemoteClient {
    fn head(&self, url: &str) -> Result<ProbeInfo, FetchError>;

    fn ping(&self, url: &str) -> Result<(), FetchError>;

    fn get_text(&self, url: &str) -> Result<String, FetchError>;

    fn download(
        &self,
        url: &str,
        dest: &mut dyn Write,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<u64, FetchError>;

    fn download_range(
        &self,
        url: &str,
        range: &ByteRange,
        dest: &mut dyn Write,
    ) -> Result<u64, FetchError>;
}

impl<T: RemoteClient + ?Sized> RemoteClient for &T {
    fn head(&self, url: &str) -> Result<ProbeInfo, FetchError> {
        (**self).head(url)
    }

    fn ping(&self, url: &str) -> Result<(), FetchError> {
        (**self).ping(url)
    }

    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        (**self).get_text(url)
    }

    fn download(
        &self,
        url: &str,
        dest: &mut dyn Write,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<u64, FetchError> {
        (**self).download(url, dest, progress)
    }

    fn download_range(
        &self,
        url: &str,
        range: &ByteRange,
        dest: &mut dyn Write,
    ) -> Result<u64, FetchError> {
        (**self).download_range(url, range, dest)
    }
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("gribfetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| FetchError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| FetchError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, FetchError> {
        if response.status().is_success() {
            return Ok(response);
        }
        Err(FetchError::HttpStatus {
            url: response.url().to_string(),
            status: response.status().as_u16(),
        })
    }

    fn send_with_retries<F>(&self, mut make_req: F) -> Result<reqwest::blocking::Response, FetchError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(FetchError::Http(err.to_string()));
                }
            }
        }
    }
}

impl RemoteClient for HttpClient {
    fn head(&self, url: &str) -> Result<ProbeInfo, FetchError> {
        let response = self.send_with_retries(|| self.client.head(url))?;
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        Ok(ProbeInfo {
            status: response.status().as_u16(),
            ok: response.status().is_success(),
            content_length,
        })
    }

    fn ping(&self, url: &str) -> Result<(), FetchError> {
        self.client
            .head(url)
            .timeout(Duration::from_secs(10))
            .send()
            .map_err(|err| FetchError::Http(err.to_string()))?;
        Ok(())
    }

    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.send_with_retries(|| self.client.get(url))?;
        let response = Self::handle_status(response)?;
        response
            .text()
            .map_err(|err| FetchError::Http(err.to_string()))
    }

    fn download(
        &self,
        url: &str,
        dest: &mut dyn Write,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<u64, FetchError> {
        let response = self.send_with_retries(|| self.client.get(url))?;
        let mut response = Self::handle_status(response)?;
        let total = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());

        let mut buffer = [0u8; 64 * 1024];
        let mut transferred = 0u64;
        loop {
            let read = response
                .read(&mut buffer)
                .map_err(|err| FetchError::Http(err.to_string()))?;
            if read == 0 {
                break;
            }
            dest.write_all(&buffer[..read])
                .map_err(|err| FetchError::Filesystem(err.to_string()))?;
            transferred += read as u64;
            progress(transferred, total);
        }
        Ok(transferred)
    }

    fn download_range(
        &self,
        url: &str,
        range: &ByteRange,
        dest: &mut dyn Write,
    ) -> Result<u64, FetchError> {
        let header = format!("bytes={range}");
        let response = self.send_with_retries(|| self.client.get(url).header(RANGE, &header))?;
        let mut response = Self::handle_status(response)?;
        let mut sink = CountingWriter {
            inner: dest,
            written: 0,
        };
        std::io::copy(&mut response, &mut sink)
            .map_err(|err| FetchError::Http(err.to_string()))?;
        Ok(sink.written)
    }
}

struct CountingWriter<'a> {
    inner: &'a mut dyn Write,
    written: u64,
}

impl Write for CountingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
