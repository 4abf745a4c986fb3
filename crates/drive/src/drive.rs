//! Google Drive v3 over blocking HTTP.

use crate::{DriveError, DriveResult, RemoteStore};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const BOUNDARY: &str = "reportgen_drive_upload_boundary";

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileRef {
    id: Option<String>,
    web_view_link: Option<String>,
}

/// A [`RemoteStore`] backed by Google Drive.
///
/// Every uploaded file is shared as readable by anyone with the link.
pub struct DriveStore {
    access_token: String,
    timeout: Duration,
}

impl std::fmt::Debug for DriveStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveStore")
            .field("access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DriveStore {
    /// Creates a store that authenticates with an OAuth2 bearer `access_token`.
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            access_token: access_token.into(),
            timeout,
        }
    }

    /// A client per call keeps the store usable from any blocking thread.
    fn client(&self) -> DriveResult<Client> {
        Ok(Client::builder().timeout(self.timeout).build()?)
    }

    fn set_permission_anyone_reader(&self, client: &Client, file_id: &str) -> DriveResult<()> {
        let response = client
            .post(format!("{FILES_URL}/{file_id}/permissions"))
            .bearer_auth(&self.access_token)
            .query(&[("fields", "id")])
            .json(&serde_json::json!({ "type": "anyone", "role": "reader" }))
            .send()?;
        check_status("permissions.create", response)?;
        Ok(())
    }
}

impl RemoteStore for DriveStore {
    fn ensure_folder(&self, name: &str) -> DriveResult<String> {
        let client = self.client()?;
        let query = folder_query(name);

        let response = client
            .get(FILES_URL)
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("fields", "files(id,name)"),
            ])
            .send()?;
        let list: FileList = check_status("files.list", response)?.json()?;
        if let Some(id) = list.files.into_iter().find_map(|f| f.id) {
            return Ok(id);
        }

        let response = client
            .post(FILES_URL)
            .bearer_auth(&self.access_token)
            .query(&[("fields", "id")])
            .json(&serde_json::json!({ "name": name, "mimeType": FOLDER_MIME_TYPE }))
            .send()?;
        let created: FileRef = check_status("files.create (folder)", response)?.json()?;
        tracing::info!(folder = name, "Created Drive folder");
        created.id.ok_or(DriveError::MissingField {
            operation: "files.create (folder)",
            field: "id",
        })
    }

    fn upload(&self, local_path: &Path, display_name: &str, folder_id: &str) -> DriveResult<String> {
        let content = std::fs::read(local_path).map_err(|e| {
            DriveError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read {}: {}", local_path.display(), e),
            ))
        })?;
        let mime_type = reportgen_files::media_type_for(display_name, &[]);
        let metadata = serde_json::json!({ "name": display_name, "parents": [folder_id] });
        let body = multipart_related_body(BOUNDARY, &metadata, &mime_type, &content);

        let client = self.client()?;
        let response = client
            .post(UPLOAD_URL)
            .bearer_auth(&self.access_token)
            .query(&[("uploadType", "multipart"), ("fields", "id,webViewLink")])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={BOUNDARY}"),
            )
            .body(body)
            .send()?;
        let uploaded: FileRef = check_status("files.create (upload)", response)?.json()?;

        let id = uploaded.id.ok_or(DriveError::MissingField {
            operation: "files.create (upload)",
            field: "id",
        })?;
        self.set_permission_anyone_reader(&client, &id)?;

        uploaded.web_view_link.ok_or(DriveError::MissingField {
            operation: "files.create (upload)",
            field: "webViewLink",
        })
    }
}

fn check_status(operation: &'static str, response: Response) -> DriveResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(DriveError::Status {
        operation,
        status: status.as_u16(),
        body,
    })
}

/// Drive search query for a non-trashed folder called `name`.
fn folder_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!("name = '{escaped}' and mimeType = '{FOLDER_MIME_TYPE}' and trashed = false")
}

/// A `multipart/related` body: JSON metadata part followed by the media part.
fn multipart_related_body(
    boundary: &str,
    metadata: &serde_json::Value,
    mime_type: &str,
    content: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 512);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_query() {
        assert_eq!(
            folder_query("Temp_S1"),
            "name = 'Temp_S1' and mimeType = 'application/vnd.google-apps.folder' and trashed = false"
        );
    }

    #[test]
    fn test_folder_query_escapes_quotes() {
        assert!(folder_query("it's").starts_with(r"name = 'it\'s'"));
    }

    #[test]
    fn test_multipart_related_body_layout() {
        let metadata = serde_json::json!({ "name": "a.png" });
        let body = multipart_related_body("B", &metadata, "image/png", b"DATA");
        let text = String::from_utf8(body).unwrap();

        assert_eq!(
            text,
            "--B\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{\"name\":\"a.png\"}\r\n\
             --B\r\nContent-Type: image/png\r\n\r\nDATA\r\n--B--\r\n"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let store = DriveStore::new("secret-token", Duration::from_secs(5));
        let debug = format!("{store:?}");
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn test_upload_missing_file_is_io_error() {
        let store = DriveStore::new("token", Duration::from_secs(1));
        let temp = tempfile::TempDir::new().unwrap();
        let err = store
            .upload(&temp.path().join("missing.docx"), "missing.docx", "folder")
            .unwrap_err();
        assert!(matches!(err, DriveError::Io(_)));
    }

    #[test]
    fn test_file_list_tolerates_missing_files_field() {
        let list: FileList = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
        let file: FileRef =
            serde_json::from_str(r#"{"id":"1","webViewLink":"https://x"}"#).unwrap();
        assert_eq!(file.web_view_link.as_deref(), Some("https://x"));
    }
}
