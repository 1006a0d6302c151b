//! AWS Signature Version 4 for admin API requests.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use jiff::Timestamp;
use sha2::{Digest, Sha256};
use url::Url;

use crate::Credentials;

type HmacSha256 = Hmac<Sha256>;

pub(crate) const SIGN_V4_ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub(crate) const SERVICE_TYPE_S3: &str = "s3";

/// Signs requests for a single region and service.
pub(crate) struct RequestSigner<'a> {
    credentials: &'a Credentials,
    region: &'a str,
    service: &'a str,
}

impl<'a> RequestSigner<'a> {
    pub(crate) fn new(credentials: &'a Credentials, region: &'a str, service: &'a str) -> Self {
        Self {
            credentials,
            region,
            service,
        }
    }

    /// Signs a request and returns the `Authorization` header value.
    ///
    /// `host` and `x-amz-date` are added to `headers`; every entry in
    /// `headers` is signed, so the caller must send all of them. Header
    /// names must be lowercase.
    pub(crate) fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &mut BTreeMap<String, String>,
        payload_hash: &str,
        timestamp: Timestamp,
    ) -> String {
        let amz_date = timestamp.strftime("%Y%m%dT%H%M%SZ").to_string();
        let date = timestamp.strftime("%Y%m%d").to_string();

        headers.insert("host".to_owned(), host_header(url));
        headers.insert("x-amz-date".to_owned(), amz_date.clone());

        let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");
        let canonical_request = canonical_request(method, url, headers, &signed_headers, payload_hash);

        let scope = format!("{date}/{}/{}/aws4_request", self.region, self.service);
        let string_to_sign = format!(
            "{SIGN_V4_ALGORITHM}\n{amz_date}\n{scope}\n{}",
            hex_sha256(canonical_request.as_bytes())
        );

        let signing_key = self.signing_key(&date);
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        format!(
            "{SIGN_V4_ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.credentials.access_key()
        )
    }

    fn signing_key(&self, date: &str) -> Vec<u8> {
        let secret = format!("AWS4{}", self.credentials.secret_key());
        let date_key = hmac_sha256(secret.as_bytes(), date.as_bytes());
        let region_key = hmac_sha256(&date_key, self.region.as_bytes());
        let service_key = hmac_sha256(&region_key, self.service.as_bytes());
        hmac_sha256(&service_key, b"aws4_request")
    }
}

/// Returns the hex-encoded SHA-256 of `data`.
pub(crate) fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC pads or hashes the key to the block size, so every length is valid.
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// `host[:port]` as sent in the `Host` header; default ports are omitted.
fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    }
}

fn canonical_request(
    method: &str,
    url: &Url,
    headers: &BTreeMap<String, String>,
    signed_headers: &str,
    payload_hash: &str,
) -> String {
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{}\n", value.trim()))
        .collect();

    [
        method,
        url.path(),
        &canonical_query(url),
        &canonical_headers,
        signed_headers,
        payload_hash,
    ]
    .join("\n")
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (uri_encode(&k), uri_encode(&v)))
        .collect();
    pairs.sort();

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn uri_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn example_credentials() -> Credentials {
        Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY")
    }

    #[test]
    fn test_empty_payload_hash() {
        assert_eq!(hex_sha256(b""), EMPTY_SHA256);
    }

    #[test]
    fn test_get_vanilla() {
        // From the AWS SigV4 test suite.
        let credentials = example_credentials();
        let signer = RequestSigner::new(&credentials, "us-east-1", "service");
        let url = Url::parse("https://example.amazonaws.com/").unwrap();
        let timestamp: Timestamp = "2015-08-30T12:36:00Z".parse().unwrap();

        let mut headers = BTreeMap::new();
        let authorization = signer.sign("GET", &url, &mut headers, EMPTY_SHA256, timestamp);

        assert_eq!(
            authorization,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
             SignedHeaders=host;x-amz-date, \
             Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
        );
        assert_eq!(headers["host"], "example.amazonaws.com");
        assert_eq!(headers["x-amz-date"], "20150830T123600Z");
    }

    #[test]
    fn test_extra_headers_are_signed() {
        let credentials = example_credentials();
        let signer = RequestSigner::new(&credentials, "us-east-1", SERVICE_TYPE_S3);
        let url = Url::parse("http://localhost:9000/minio/admin/v3/info").unwrap();
        let timestamp: Timestamp = "2024-01-01T00:00:00Z".parse().unwrap();

        let mut headers = BTreeMap::new();
        headers.insert("x-amz-content-sha256".to_owned(), EMPTY_SHA256.to_owned());
        let authorization = signer.sign("GET", &url, &mut headers, EMPTY_SHA256, timestamp);

        assert!(authorization.contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date"));
        assert!(authorization.contains("/20240101/us-east-1/s3/aws4_request"));
        assert_eq!(headers["host"], "localhost:9000");
    }

    #[test]
    fn test_canonical_query_is_sorted_and_encoded() {
        let url = Url::parse("http://localhost/?b=2&a=x y&a=1").unwrap();
        assert_eq!(canonical_query(&url), "a=1&a=x%20y&b=2");
    }

    #[test]
    fn test_hmac_accepts_key_longer_than_block() {
        // RFC 4231, test case 6.
        let key = [0xaa; 131];
        let mac = hmac_sha256(&key, b"Test Using Larger Than Block-Size Key - Hash Key First");
        assert_eq!(
            hex::encode(mac),
            "60e431591ee0b67f0d8a26aacbf5b77f8e0bc6213728c5140546040f0ee37f54"
        );
        assert_eq!(hmac_sha256(b"", b"").len(), 32);
    }

    #[test]
    fn test_uri_encode() {
        assert_eq!(uri_encode("abc-_.~"), "abc-_.~");
        assert_eq!(uri_encode("a/b c"), "a%2Fb%20c");
    }
}
