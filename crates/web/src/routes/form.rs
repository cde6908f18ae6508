//! The add/edit store form: multipart parsing and the values shown back.

use axum::extract::Multipart;

use delicious_core::{StoreInput, TAG_CHOICES};

use crate::error::AppError;
use crate::models::Store;
use crate::services::PhotoUpload;

/// A parsed store submission.
#[derive(Debug, Default)]
pub struct StoreForm {
    pub input: StoreInput,
    /// Present only when a non-empty file was chosen.
    pub photo: Option<PhotoUpload>,
}

impl StoreForm {
    /// Read every part of a multipart store submission.
    ///
    /// Fields: `name`, `description`, repeated `tags`, `address`, `lng`,
    /// `lat` and an optional `photo` file. Unknown fields are ignored.
    /// Coordinates that do not parse are treated as missing.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the body is not valid multipart.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "photo" {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let chosen = field.file_name().is_some_and(|f| !f.is_empty());
                let bytes = field.bytes().await?;
                if chosen && !bytes.is_empty() {
                    form.photo = Some(PhotoUpload {
                        content_type,
                        bytes,
                    });
                }
                continue;
            }

            let value = field.text().await?;
            let input = &mut form.input;
            match name.as_str() {
                "name" => input.name = value,
                "description" => input.description = value,
                "tags" => input.tags.push(value),
                "address" => input.address = value,
                "lng" => input.lng = parse_coordinate(&value),
                "lat" => input.lat = parse_coordinate(&value),
                _ => {}
            }
        }

        Ok(form)
    }
}

fn parse_coordinate(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// One checkbox of the tag picker.
#[derive(Debug, Clone)]
pub struct TagChoice {
    pub name: &'static str,
    pub checked: bool,
}

/// Values echoed back into the form inputs.
#[derive(Debug, Clone, Default)]
pub struct FormValues {
    pub name: String,
    pub description: String,
    pub address: String,
    pub lng: String,
    pub lat: String,
    pub tags: Vec<TagChoice>,
}

impl FormValues {
    /// Blank form with no tags checked.
    #[must_use]
    pub fn empty() -> Self {
        Self::from(&StoreInput::default())
    }
}

fn tag_choices(selected: &[String]) -> Vec<TagChoice> {
    TAG_CHOICES
        .iter()
        .map(|&name| TagChoice {
            name,
            checked: selected.iter().any(|t| t == name),
        })
        .collect()
}

fn coordinate_text(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl From<&StoreInput> for FormValues {
    fn from(input: &StoreInput) -> Self {
        Self {
            name: input.name.clone(),
            description: input.description.clone(),
            address: input.address.clone(),
            lng: coordinate_text(input.lng),
            lat: coordinate_text(input.lat),
            tags: tag_choices(&input.tags),
        }
    }
}

impl From<&Store> for FormValues {
    fn from(store: &Store) -> Self {
        let point = store.location.coordinates;
        Self {
            name: store.name.clone(),
            description: store.description.clone(),
            address: store.location.address.clone(),
            lng: point.lng().to_string(),
            lat: point.lat().to_string(),
            tags: tag_choices(&store.tags),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::extract::{DefaultBodyLimit, FromRequest};
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use tower::ServiceExt;

    use super::*;
    use crate::config::DEFAULT_MAX_UPLOAD_BYTES;

    const BOUNDARY: &str = "XdelicousX";

    fn multipart_body(parts: &[(&str, Option<(&str, &str)>, &str)]) -> String {
        let mut body = String::new();
        for (name, file, value) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match file {
                Some((filename, content_type)) => {
                    body.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    ));
                }
                None => {
                    body.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                    ));
                }
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn multipart_request(parts: &[(&str, Option<(&str, &str)>, &str)]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/add")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    async fn parse(parts: &[(&str, Option<(&str, &str)>, &str)]) -> StoreForm {
        let request = multipart_request(parts);
        let multipart = Multipart::from_request(request, &()).await.unwrap();
        StoreForm::from_multipart(multipart).await.unwrap()
    }

    #[tokio::test]
    async fn test_parses_fields_and_repeated_tags() {
        let form = parse(&[
            ("name", None, "Cafe Milano"),
            ("description", None, "Espresso"),
            ("tags", None, "Wifi"),
            ("tags", None, "Open Late"),
            ("address", None, "1 Bank St"),
            ("lng", None, "-0.09"),
            ("lat", None, "51.5"),
            ("csrf", None, "ignored"),
        ])
        .await;

        assert_eq!(form.input.name, "Cafe Milano");
        assert_eq!(form.input.tags, vec!["Wifi", "Open Late"]);
        assert_eq!(form.input.lng, Some(-0.09));
        assert_eq!(form.input.lat, Some(51.5));
        assert!(form.photo.is_none());
    }

    #[tokio::test]
    async fn test_empty_file_input_is_no_photo() {
        let form = parse(&[
            ("name", None, "Cafe"),
            ("photo", Some(("", "application/octet-stream")), ""),
        ])
        .await;
        assert!(form.photo.is_none());
    }

    #[tokio::test]
    async fn test_keeps_declared_content_type() {
        let form = parse(&[("photo", Some(("notes.txt", "text/plain")), "hello")]).await;
        let photo = form.photo.unwrap();
        assert_eq!(photo.content_type, "text/plain");
        assert_eq!(&photo.bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_bad_coordinates_are_missing() {
        let form = parse(&[("lng", None, "west-ish"), ("lat", None, "")]).await;
        assert_eq!(form.input.lng, None);
        assert_eq!(form.input.lat, None);
    }

    async fn photo_len(multipart: Multipart) -> Result<String, AppError> {
        let form = StoreForm::from_multipart(multipart).await?;
        Ok(form.photo.map_or(0, |p| p.bytes.len()).to_string())
    }

    /// Posts a three megabyte photo, larger than axum's 2 MB default.
    async fn post_phone_photo(router: Router) -> (StatusCode, String) {
        let photo = "x".repeat(3 * 1024 * 1024);
        let request = multipart_request(&[
            ("name", None, "Cafe Milano"),
            ("photo", Some(("phone.jpg", "image/jpeg")), photo.as_str()),
        ]);
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_upload_ceiling_admits_phone_photos() {
        let router = Router::new()
            .route("/add", post(photo_len))
            .layer(DefaultBodyLimit::max(DEFAULT_MAX_UPLOAD_BYTES));
        let (status, body) = post_phone_photo(router).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, (3 * 1024 * 1024).to_string());
    }

    #[tokio::test]
    async fn test_default_body_limit_rejects_phone_photos() {
        let router = Router::new().route("/add", post(photo_len));
        let (status, _) = post_phone_photo(router).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_form_values_check_selected_tags() {
        let input = StoreInput {
            tags: vec!["Licensed".to_string()],
            lng: Some(2.5),
            ..StoreInput::default()
        };
        let values = FormValues::from(&input);
        assert_eq!(values.lng, "2.5");
        assert_eq!(values.lat, "");
        let checked: Vec<&str> = values
            .tags
            .iter()
            .filter(|t| t.checked)
            .map(|t| t.name)
            .collect();
        assert_eq!(checked, vec!["Licensed"]);
        assert_eq!(FormValues::empty().tags.len(), TAG_CHOICES.len());
    }
}
