use serde::Deserialize;

/// Namespace id of regular articles.
pub const ARTICLE_NAMESPACE: i64 = 0;

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: String,
    #[serde(default)]
    pub info: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryMembersResponse {
    #[serde(default)]
    pub query: Option<CategoryMembersQuery>,
    #[serde(default, rename = "continue")]
    pub continuation: Option<Continuation>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryMembersQuery {
    #[serde(default)]
    pub categorymembers: Vec<CategoryMember>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryMember {
    pub ns: i64,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct Continuation {
    #[serde(default)]
    pub cmcontinue: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractResponse {
    #[serde(default)]
    pub query: Option<ExtractQuery>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractQuery {
    #[serde(default)]
    pub pages: Vec<ExtractPage>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractPage {
    #[serde(default)]
    pub extract: Option<String>,
    #[serde(default)]
    pub missing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category_members_with_continuation() {
        let body = r#"{
            "batchcomplete": true,
            "continue": {"cmcontinue": "page|ABC|123", "continue": "-||"},
            "query": {"categorymembers": [
                {"pageid": 1, "ns": 0, "title": "Atom"},
                {"pageid": 2, "ns": 14, "title": "Category:Subatomic particles"}
            ]}
        }"#;

        let response: CategoryMembersResponse = serde_json::from_str(body).unwrap();
        let members = response.query.unwrap().categorymembers;

        assert_eq!(members.len(), 2);
        assert_eq!(members[1].ns, 14);
        assert_eq!(
            response.continuation.unwrap().cmcontinue.as_deref(),
            Some("page|ABC|123")
        );
    }

    #[test]
    fn test_parse_missing_page() {
        let body = r#"{"query": {"pages": [{"ns": 0, "title": "Nope", "missing": true}]}}"#;

        let response: ExtractResponse = serde_json::from_str(body).unwrap();
        let page = &response.query.unwrap().pages[0];

        assert!(page.missing);
        assert!(page.extract.is_none());
    }

    #[test]
    fn test_parse_api_error() {
        let body = r#"{"error": {"code": "maxlag", "info": "Waiting for replicas"}}"#;

        let response: ExtractResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.error.unwrap().code, "maxlag");
    }
}
