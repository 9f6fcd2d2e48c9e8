//! Field names of the two JSON-lines source datasets.
//!
//! Both datasets are read schema-on-read; these names are the ones the
//! dimension and fact projections depend on.

/// Song/artist catalog records (`song_data`).
pub mod catalog {
    pub const SONG_ID: &str = "song_id";
    pub const TITLE: &str = "title";
    pub const ARTIST_ID: &str = "artist_id";
    pub const YEAR: &str = "year";
    pub const DURATION: &str = "duration";
    pub const ARTIST_NAME: &str = "artist_name";
    pub const ARTIST_LOCATION: &str = "artist_location";
    pub const ARTIST_LATITUDE: &str = "artist_latitude";
    pub const ARTIST_LONGITUDE: &str = "artist_longitude";
}

/// User activity log records (`log_data`).
pub mod events {
    pub const PAGE: &str = "page";
    pub const TS: &str = "ts";
    pub const USER_ID: &str = "userId";
    pub const FIRST_NAME: &str = "firstName";
    pub const LAST_NAME: &str = "lastName";
    pub const GENDER: &str = "gender";
    pub const LEVEL: &str = "level";
    pub const SONG: &str = "song";
    pub const ARTIST: &str = "artist";
    pub const LENGTH: &str = "length";
    pub const SESSION_ID: &str = "sessionId";
    pub const LOCATION: &str = "location";
    pub const USER_AGENT: &str = "userAgent";
}

/// `page` value marking a song-play action.
pub const NEXT_SONG_PAGE: &str = "NextSong";
