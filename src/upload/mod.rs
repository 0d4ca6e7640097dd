use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use axum::extract::multipart::Field;
use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::AppError;

/// MIME types accepted for photo uploads. Enforced here, on the server, even
/// though clients are expected to pre-check.
pub const ALLOWED_IMAGE_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// A photo that has been written to the upload directory. `url_path` is what
/// gets stored on the record and served back under `/uploads`.
#[derive(Debug)]
pub struct StoredPhoto {
    pub url_path: String,
    pub disk_path: PathBuf,
}

pub fn is_allowed_content_type(content_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&content_type)
}

/// Extension of the client-supplied filename, lowercased and restricted to
/// short alphanumeric suffixes. Anything else is dropped.
fn sanitized_extension(file_name: Option<&str>) -> String {
    let ext = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return String::new();
    }
    format!(".{}", ext.to_ascii_lowercase())
}

/// Collision-resistant name: millisecond timestamp plus a random fragment,
/// keeping the original extension when it is sane.
fn unique_file_name(original: Option<&str>) -> String {
    let fragment = Uuid::new_v4().simple().to_string();
    format!(
        "photo-{}-{}{}",
        Utc::now().timestamp_millis(),
        &fragment[..8],
        sanitized_extension(original)
    )
}

/// Streams a multipart field to the upload directory, enforcing the MIME
/// allow-list and the size cap. A field that exceeds the cap has its partial
/// file removed before the error is returned.
pub async fn store_photo(
    upload_dir: &str,
    max_bytes: usize,
    mut field: Field<'_>,
) -> Result<StoredPhoto, AppError> {
    let content_type = field.content_type().unwrap_or("").to_string();
    if !is_allowed_content_type(&content_type) {
        return Err(AppError::Validation(
            "Unsupported image type; expected JPEG, PNG, GIF or WebP".into(),
        ));
    }

    let file_name = unique_file_name(field.file_name());
    let disk_path = Path::new(upload_dir).join(&file_name);

    fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::Storage(format!("failed to create upload dir: {}", e)))?;
    let mut file = fs::File::create(&disk_path)
        .await
        .map_err(|e| AppError::Storage(format!("failed to create upload file: {}", e)))?;

    let mut written = 0usize;
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(&disk_path).await;
                return Err(e.into());
            }
        };

        written += chunk.len();
        if written > max_bytes {
            drop(file);
            let _ = fs::remove_file(&disk_path).await;
            return Err(AppError::Validation(format!(
                "File is too large; maximum size is {} bytes",
                max_bytes
            )));
        }

        if let Err(e) = file.write_all(&chunk).await {
            drop(file);
            let _ = fs::remove_file(&disk_path).await;
            return Err(AppError::Storage(format!("failed to write upload: {}", e)));
        }
    }

    file.flush()
        .await
        .map_err(|e| AppError::Storage(format!("failed to flush upload: {}", e)))?;

    Ok(StoredPhoto {
        url_path: format!("/uploads/{}", file_name),
        disk_path,
    })
}

/// Drains a multipart form into plain text fields plus an optional stored
/// photo (the `photo` field, when it carries a file). Any mid-stream failure
/// removes a photo that already reached the disk.
pub async fn collect_form(
    upload_dir: &str,
    max_bytes: usize,
    mut multipart: Multipart,
) -> Result<(HashMap<String, String>, Option<StoredPhoto>), AppError> {
    let mut fields = HashMap::new();
    let mut photo: Option<StoredPhoto> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                if let Some(stored) = &photo {
                    discard(stored).await;
                }
                return Err(e.into());
            }
        };

        let name = field.name().map(str::to_string);
        let has_file = field.file_name().is_some();

        match name.as_deref() {
            Some("photo") if has_file => {
                match store_photo(upload_dir, max_bytes, field).await {
                    // Repeated photo fields keep the last file only.
                    Ok(stored) => {
                        if let Some(prev) = photo.replace(stored) {
                            discard(&prev).await;
                        }
                    }
                    Err(e) => {
                        if let Some(stored) = &photo {
                            discard(stored).await;
                        }
                        return Err(e);
                    }
                }
            }
            Some(name) => {
                let key = name.to_string();
                match field.text().await {
                    Ok(value) => {
                        fields.insert(key, value);
                    }
                    Err(e) => {
                        if let Some(stored) = &photo {
                            discard(stored).await;
                        }
                        return Err(e.into());
                    }
                }
            }
            None => {}
        }
    }

    Ok((fields, photo))
}

/// Removes a stored photo, used when record validation fails after the file
/// already hit the disk. Best effort.
pub async fn discard(photo: &StoredPhoto) {
    if let Err(e) = fs::remove_file(&photo.disk_path).await {
        tracing::warn!(
            "failed to remove orphaned upload {}: {}",
            photo.disk_path.display(),
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_covers_common_image_types() {
        assert!(is_allowed_content_type("image/jpeg"));
        assert!(is_allowed_content_type("image/webp"));
        assert!(!is_allowed_content_type("application/pdf"));
        assert!(!is_allowed_content_type("text/html"));
        assert!(!is_allowed_content_type(""));
    }

    #[test]
    fn extension_is_kept_only_when_sane() {
        assert_eq!(sanitized_extension(Some("cat.JPG")), ".jpg");
        assert_eq!(sanitized_extension(Some("archive.tar.gz")), ".gz");
        assert_eq!(sanitized_extension(Some("noext")), "");
        assert_eq!(sanitized_extension(Some("weird.j%g")), "");
        assert_eq!(sanitized_extension(None), "");
    }

    #[test]
    fn generated_names_do_not_collide() {
        let a = unique_file_name(Some("rex.png"));
        let b = unique_file_name(Some("rex.png"));
        assert_ne!(a, b);
        assert!(a.starts_with("photo-"));
        assert!(a.ends_with(".png"));
    }

    #[tokio::test]
    async fn discard_removes_the_file() {
        let dir = std::env::temp_dir().join(format!("uploads-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).await.unwrap();
        let disk_path = dir.join("photo-test.png");
        fs::write(&disk_path, b"not really a png").await.unwrap();

        let photo = StoredPhoto {
            url_path: "/uploads/photo-test.png".into(),
            disk_path: disk_path.clone(),
        };
        discard(&photo).await;

        assert!(!disk_path.exists());
        let _ = fs::remove_dir_all(&dir).await;
    }
}
