//! WHOIS proxy response model
//!
//! Every field defaults when missing: the provider omits whole blocks for
//! unregistered domains and empty lists are normal.

use serde::{Deserialize, Serialize};

/// `code` value the provider uses for a successful lookup
pub const SUCCESS_CODE: i64 = 200;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhoisResponse {
    pub code: i64,
    pub state: String,
    #[serde(rename = "_links")]
    pub links: Links,
    pub results: WhoisResults,
}

impl WhoisResponse {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: Link,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhoisResults {
    pub domain: String,
    pub servername: String,
    pub tld: String,
    pub registered: bool,
    pub reserved: bool,
    pub client_hold: bool,
    pub detail: WhoisDetail,
    pub raw: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhoisDetail {
    pub registrant: Vec<String>,
    pub admin: Vec<String>,
    pub tech: Vec<String>,
    /// Not always strings in practice
    pub billing: Vec<serde_json::Value>,
    pub status: Vec<String>,
    pub date: Vec<String>,
    pub name_server: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_body_uses_defaults() {
        let res: WhoisResponse =
            serde_json::from_str(r#"{"code":200,"results":{"registered":false}}"#).unwrap();
        assert!(res.is_success());
        assert!(!res.results.registered);
        assert!(res.results.detail.date.is_empty());
        assert!(res.results.raw.is_empty());
    }

    #[test]
    fn test_full_body() {
        let body = r#"{
            "code": 200,
            "state": "success",
            "_links": {"self": {"href": "/whois/example.com"}},
            "results": {
                "domain": "example.com",
                "servername": "whois.verisign-grs.com",
                "tld": "com",
                "registered": true,
                "reserved": false,
                "client_hold": false,
                "detail": {
                    "registrant": ["Example Org"],
                    "admin": [],
                    "tech": [],
                    "billing": [null, 3],
                    "status": ["clientDeleteProhibited"],
                    "date": ["Creation Date: 1995-08-14"],
                    "name_server": ["a.iana-servers.net", "b.iana-servers.net"]
                },
                "raw": ["Domain Name: EXAMPLE.COM"]
            }
        }"#;
        let res: WhoisResponse = serde_json::from_str(body).unwrap();
        assert_eq!(res.links.self_link.href, "/whois/example.com");
        assert_eq!(res.results.tld, "com");
        assert_eq!(res.results.detail.name_server.len(), 2);
        assert_eq!(res.results.detail.billing.len(), 2);
    }

    #[test]
    fn test_error_code_is_not_success() {
        let res: WhoisResponse = serde_json::from_str(r#"{"code":404,"state":"error"}"#).unwrap();
        assert!(!res.is_success());
        assert_eq!(res.results, WhoisResults::default());
    }
}
