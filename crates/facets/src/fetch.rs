use std::sync::mpsc::Sender;

use bus::{CoreCommand, RequestId};

/// Starts a fragment request. The response comes back later through
/// [`FacetFilters::on_fetch_done`](crate::FacetFilters::on_fetch_done), tagged with the same
/// `request_id`.
pub trait Fetcher {
    fn fetch(&mut self, request_id: RequestId, url: &str) -> Result<(), String>;
}

impl Fetcher for Sender<CoreCommand> {
    fn fetch(&mut self, request_id: RequestId, url: &str) -> Result<(), String> {
        self.send(CoreCommand::FetchSection {
            request_id,
            url: url.to_string(),
        })
        .map_err(|e| format!("network runtime is gone: {e}"))
    }
}
