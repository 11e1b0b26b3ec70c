use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use bus::{CoreCommand, CoreEvent};
use net::{NetConfig, fetch_text};
use url::Url;

/// Services fetch commands until `Shutdown` or until every command sender is dropped.
///
/// Each request runs on its own thread, so responses may arrive in any order; there is
/// no cancellation.
pub fn start_net_runtime(
    base: Url,
    config: NetConfig,
    cmd_rx: Receiver<CoreCommand>,
    evt_tx: Sender<CoreEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                CoreCommand::FetchSection { request_id, url } => {
                    let absolute = match base.join(&url) {
                        Ok(u) => u,
                        Err(e) => {
                            let _ = evt_tx.send(CoreEvent::FetchError {
                                request_id,
                                url,
                                error: format!("bad url: {e}"),
                            });
                            continue;
                        }
                    };
                    let evt_tx = evt_tx.clone();
                    let config = config.clone();
                    thread::spawn(move || {
                        log::debug!(target: "runtime_net", "request {request_id}: GET {absolute}");
                        let evt = match fetch_text(absolute.as_str(), &config) {
                            Ok(res) => {
                                log::debug!(
                                    target: "runtime_net",
                                    "request {request_id}: {} bytes in {}ms",
                                    res.body.len(),
                                    res.duration_ms
                                );
                                CoreEvent::FetchDone {
                                    request_id,
                                    url,
                                    body: res.body,
                                }
                            }
                            Err(e) => CoreEvent::FetchError {
                                request_id,
                                url,
                                error: e.to_string(),
                            },
                        };
                        let _ = evt_tx.send(evt);
                    });
                }
                CoreCommand::Shutdown => break,
            }
        }
    })
}
