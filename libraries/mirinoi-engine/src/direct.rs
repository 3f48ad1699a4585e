/// Pass-through stream resolution
use mirinoi_core::{validate, MirinoiError, StreamResolver};

/// Resolver for sources that are already playable (local files, direct
/// stream URLs)
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectResolver;

impl StreamResolver for DirectResolver {
    fn resolve(&self, source_url: &str) -> mirinoi_core::Result<String> {
        if !validate::is_non_empty(source_url) {
            return Err(MirinoiError::resolution("empty source"));
        }
        Ok(source_url.trim().to_string())
    }
}
