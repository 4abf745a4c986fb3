/// Directory under the storage root holding one working directory per session.
pub const SESSIONS_FOLDER_NAME: &str = "temp_sessions";

/// Fallback media type when neither the file name nor its content identifies one.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";
