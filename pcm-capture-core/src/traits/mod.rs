pub mod media_source;
