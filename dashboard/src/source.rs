use vigilcore::detection::{FetchFuture, PointQuery, PointSet, PointSource};
use vigilcore::prelude::OverlayError;

/// Point source backed by the detection API over HTTP.
///
/// Transport and decode failures surface as `OverlayError::Fetch`, so a
/// tile keeps its last rendered overlay while the backend is unreachable.
pub struct HttpPointSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPointSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, query: &PointQuery) -> String {
        let mut url = format!(
            "{}/cameras/{}/detections?days={}",
            self.base_url.trim_end_matches('/'),
            query.camera_id,
            query.time_window_days
        );
        if let Some(filter) = &query.class_filter {
            let classes: Vec<&str> = filter.iter().map(String::as_str).collect();
            url.push_str("&classes=");
            url.push_str(&classes.join(","));
        }
        url
    }
}

impl PointSource for HttpPointSource {
    fn fetch(&self, query: PointQuery) -> FetchFuture<'_> {
        let url = self.endpoint(&query);
        let request = self.client.get(&url);
        Box::pin(async move {
            let response = request
                .send()
                .await
                .map_err(|error| OverlayError::Fetch(error.to_string()))?;
            if !response.status().is_success() {
                return Err(OverlayError::Fetch(format!(
                    "{} returned {}",
                    url,
                    response.status()
                )));
            }
            response
                .json::<PointSet>()
                .await
                .map_err(|error| OverlayError::Fetch(error.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn endpoint_includes_window_and_classes() {
        let source = HttpPointSource::new("http://127.0.0.1:8000/api/");
        let mut query = PointQuery::new("cam-4", 30);
        let mut filter = BTreeSet::new();
        filter.insert("car".to_string());
        filter.insert("person".to_string());
        query.class_filter = Some(filter);

        assert_eq!(
            source.endpoint(&query),
            "http://127.0.0.1:8000/api/cameras/cam-4/detections?days=30&classes=car,person"
        );
    }

    #[test]
    fn endpoint_omits_classes_when_unfiltered() {
        let source = HttpPointSource::new("http://127.0.0.1:8000");
        let query = PointQuery::new("cam-1", 7);
        assert_eq!(
            source.endpoint(&query),
            "http://127.0.0.1:8000/cameras/cam-1/detections?days=7"
        );
    }
}
