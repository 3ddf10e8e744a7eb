use anyhow::{Result, anyhow};
use url::Url;

pub const BASE_URL: &str = "https://sheets.googleapis.com";
pub const API_VERSION: &str = "v4";

/// Appends percent-encoded path segments to `base`. Worksheet names routinely contain spaces
/// (e.g. `Form Responses 1`), so ranges must never be spliced into the path as raw text.
pub fn join_segments<'a>(base: &Url, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| anyhow!("`{base}` cannot be used as a base URL"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_worksheet_names() {
        let base = Url::parse(BASE_URL).unwrap();
        let url = join_segments(&base, ["v4", "values", "Form Responses 1"]).unwrap();
        assert_eq!(url.path(), "/v4/values/Form%20Responses%201");
    }

    #[test]
    fn rejects_non_base_urls() {
        let base = Url::parse("mailto:someone@example.com").unwrap();
        assert!(join_segments(&base, ["v4"]).is_err());
    }
}
