pub mod auth;
pub mod catalog;

pub use auth::AuthClient;
pub use catalog::CatalogClient;

use crate::error::Result;
use crate::models::Crop;

/// Source of the authoritative crop list.
#[allow(async_fn_in_trait)]
pub trait CropCatalog {
    async fn fetch_all(&self) -> Result<Vec<Crop>>;
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("http://localhost:8080/", "/crops/all"),
            "http://localhost:8080/crops/all"
        );
        assert_eq!(
            endpoint("http://localhost:8080/api", "auth/register"),
            "http://localhost:8080/api/auth/register"
        );
    }
}
