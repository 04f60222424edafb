//! Room socket URL construction.

use url::Url;

use crate::{
    errors::{ProtocolError, Result},
    room::RoomId,
};

/// Build the socket URL for a room.
///
/// The room name is appended as a path segment with a trailing slash
/// (`{base}/{room}/`). The query always carries `user_id`; `token` is added
/// when given, for servers that authenticate through the query string.
///
/// # Errors
///
/// [`ProtocolError::InvalidEndpoint`] if `base` does not parse or cannot carry
/// path segments.
pub fn room_endpoint(base: &str, room: &RoomId, user_id: u64, token: Option<&str>) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| ProtocolError::InvalidEndpoint(e.to_string()))?;

    url.path_segments_mut()
        .map_err(|()| ProtocolError::InvalidEndpoint(format!("{base} cannot be a base")))?
        .pop_if_empty()
        .push(room.as_str())
        .push("");

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("user_id", &user_id.to_string());
        if let Some(token) = token {
            query.append_pair("token", token);
        }
    }

    Ok(url)
}
